//! Declared melds: runs, triplets, and quads.

use crate::tile::{Kind, TileId, TileInstance, Wind};
use serde::{Deserialize, Serialize};

/// The three shapes a meld can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeldKind {
    /// A run of three consecutive simples in one suit.
    Shunzi,
    /// A triplet of one kind.
    Kezi,
    /// A quad of one kind.
    Gangzi,
}

/// Which seat a meld's claimed tile came from, and which tile it was — `None` for
/// a concealed (self-drawn) meld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedFrom {
    pub seat: Wind,
    pub tile: TileId,
}

/// A declared meld belonging to a player.
///
/// `tiles` is always stored in canonical order: triplets/quads sorted by
/// [`Kind::order_value`], runs in the sequence that places the claimed tile (if
/// any) at its natural slot in the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub kind: MeldKind,
    pub tiles: Vec<TileInstance>,
    /// Concealed kongs are the only closed meld; everything else claimed from a
    /// discard, or an upgraded kong, is open.
    pub open: bool,
    pub claimed_from: Option<ClaimedFrom>,
}

impl Meld {
    pub fn tile_count(&self) -> usize {
        match self.kind {
            MeldKind::Shunzi | MeldKind::Kezi => 3,
            MeldKind::Gangzi => 4,
        }
    }

    /// Builds a Kezi (triplet) from three same-kind tiles, sorted canonically.
    pub fn kezi(mut tiles: [TileInstance; 3], claimed_from: Option<ClaimedFrom>) -> Self {
        tiles.sort_by_key(|t| t.id.raw());
        Meld {
            kind: MeldKind::Kezi,
            tiles: tiles.to_vec(),
            open: claimed_from.is_some(),
            claimed_from,
        }
    }

    /// Builds a Gangzi (quad) from four same-kind tiles. `concealed` overrides the
    /// usual open-iff-claimed rule, since a concealed kong formed from one's own
    /// draw has no `claimed_from` but should still be closed.
    pub fn gangzi(mut tiles: [TileInstance; 4], claimed_from: Option<ClaimedFrom>, concealed: bool) -> Self {
        tiles.sort_by_key(|t| t.id.raw());
        Meld {
            kind: MeldKind::Gangzi,
            tiles: tiles.to_vec(),
            open: !concealed,
            claimed_from,
        }
    }

    /// Upgrades an existing open Kezi to a Gangzi by adding the fourth tile
    /// (add-gang). The meld stays open.
    pub fn upgrade_to_gangzi(kezi: Meld, fourth: TileInstance) -> Self {
        assert_eq!(kezi.kind, MeldKind::Kezi, "can only add-gang onto a Kezi");
        let mut tiles = kezi.tiles;
        tiles.push(fourth);
        tiles.sort_by_key(|t| t.id.raw());
        Meld {
            kind: MeldKind::Gangzi,
            tiles,
            open: true,
            claimed_from: kezi.claimed_from,
        }
    }

    /// Builds a Shunzi (run) given the three tiles in canonical sequence order
    /// (ascending by number).
    pub fn shunzi(tiles_in_sequence: [TileInstance; 3], claimed_from: Option<ClaimedFrom>) -> Self {
        Meld {
            kind: MeldKind::Shunzi,
            tiles: tiles_in_sequence.to_vec(),
            open: claimed_from.is_some(),
            claimed_from,
        }
    }

    pub fn kind_of_kezi_or_gangzi(&self) -> Option<Kind> {
        match self.kind {
            MeldKind::Kezi | MeldKind::Gangzi => self.tiles.first().map(|t| t.kind),
            MeldKind::Shunzi => None,
        }
    }
}
