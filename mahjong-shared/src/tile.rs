//! Tile identity, ordering, and deck construction.
//!
//! A round's tiles are minted fresh by [`generate_tileset`] — tile ids are only
//! guaranteed unique *within a round*, never globally, since a new round discards
//! the old set entirely.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// One of the three numbered suits. Honor tiles (winds, dragons) have no suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize)]
pub enum Suit {
    Coins,
    Bamboo,
    Characters,
}

/// Seat/round wind. Also used to label the wind-honor tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize)]
pub enum Wind {
    East,
    South,
    West,
    North,
}

impl Wind {
    /// Next wind in turn order, wrapping `North` back around to `East`.
    pub fn next(self) -> Self {
        match self {
            Wind::East => Wind::South,
            Wind::South => Wind::West,
            Wind::West => Wind::North,
            Wind::North => Wind::East,
        }
    }

    /// Turn-order distance to `other`, e.g. `East.distance_to(South) == 1`.
    pub fn distance_to(mut self, other: Self) -> u8 {
        let mut count = 0;
        while self != other {
            self = self.next();
            count += 1;
        }
        count
    }
}

/// Dragon honor tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize)]
pub enum Dragon {
    White,
    Green,
    Red,
}

/// The two color groups a tile's suit can fall into (§3 data model). Used by the
/// AI danger heuristic to judge which kinds are structurally "central".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorGroup {
    Numbered,
    Honor,
}

/// The playable kind of a tile. Equality for rule purposes is by `Kind`, not by
/// `TileId` — two tiles of the same kind are interchangeable for melds/wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    Simple(Suit, u8),
    Wind(Wind),
    Dragon(Dragon),
}

impl Kind {
    pub fn is_honor(self) -> bool {
        matches!(self, Kind::Wind(..) | Kind::Dragon(..))
    }

    pub fn color_group(self) -> ColorGroup {
        if self.is_honor() {
            ColorGroup::Honor
        } else {
            ColorGroup::Numbered
        }
    }

    /// Integer order value used for visual sort and for scoring "centrality".
    ///
    /// Simples sort by suit then number; honors sort after all simples, winds
    /// before dragons.
    pub fn order_value(self) -> u16 {
        match self {
            Kind::Simple(suit, number) => {
                let suit_index = match suit {
                    Suit::Coins => 0,
                    Suit::Bamboo => 1,
                    Suit::Characters => 2,
                };
                suit_index * 9 + (number as u16 - 1)
            }

            Kind::Wind(wind) => {
                let base = 27;
                base + match wind {
                    Wind::East => 0,
                    Wind::South => 1,
                    Wind::West => 2,
                    Wind::North => 3,
                }
            }

            Kind::Dragon(dragon) => {
                let base = 31;
                base + match dragon {
                    Dragon::White => 0,
                    Dragon::Green => 1,
                    Dragon::Red => 2,
                }
            }
        }
    }

    /// How far `number` sits from the middle of its suit's 1-9 range, used by the
    /// AI danger heuristic to prefer keeping "central" (more flexible) tiles.
    /// Honor tiles are single-kind, so they're scored as non-central.
    pub fn centrality(self) -> u8 {
        match self {
            Kind::Simple(_, number) => 4 - 5u8.abs_diff(number).min(4),
            Kind::Wind(..) | Kind::Dragon(..) => 0,
        }
    }
}

/// Unique identifier for a tile instance within a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    pub fn new(raw: u32) -> Self {
        TileId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A concrete tile copy: its round-scoped identity plus the kind it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileInstance {
    pub id: TileId,
    pub kind: Kind,
}

impl TileInstance {
    pub fn new(id: TileId, kind: Kind) -> Self {
        Self { id, kind }
    }
}

/// All playable kinds, in a fixed canonical order (simples then winds then
/// dragons), used to build a fresh deck.
pub fn all_kinds() -> Vec<Kind> {
    use strum::IntoEnumIterator;

    let mut kinds = Vec::with_capacity(34);
    for suit in Suit::iter() {
        for number in 1..=9 {
            kinds.push(Kind::Simple(suit, number));
        }
    }
    for wind in Wind::iter() {
        kinds.push(Kind::Wind(wind));
    }
    for dragon in Dragon::iter() {
        kinds.push(Kind::Dragon(dragon));
    }
    kinds
}

/// Builds a fresh, unshuffled set of tile instances for one round: `copies_per_kind`
/// copies of each of the 34 playable kinds, with sequential, round-unique ids.
///
/// Mirrors invariant P1/I1: the resulting length is always
/// `all_kinds().len() * copies_per_kind`.
pub fn generate_tileset(copies_per_kind: u32) -> Vec<TileInstance> {
    let mut tiles = Vec::with_capacity(all_kinds().len() * copies_per_kind as usize);
    let mut next_id = 0u32;

    for kind in all_kinds() {
        for _ in 0..copies_per_kind {
            tiles.push(TileInstance::new(TileId(next_id), kind));
            next_id += 1;
        }
    }

    tiles
}

/// Determines if three kinds form a chow/run (a consecutive sequence of simples in
/// the same suit). Returns `true` if any permutation of the three is a valid run.
pub fn is_run<T, U, V>(first: T, second: U, third: V) -> bool
where
    T: Into<Kind>,
    U: Into<Kind>,
    V: Into<Kind>,
{
    let (first, second, third) = match (first.into(), second.into(), third.into()) {
        (Kind::Simple(s1, n1), Kind::Simple(s2, n2), Kind::Simple(s3, n3))
            if s1 == s2 && s1 == s3 =>
        {
            (n1, n2, n3)
        }
        _ => return false,
    };

    is_sequence(&[first, second, third])
        || is_sequence(&[first, third, second])
        || is_sequence(&[second, first, third])
        || is_sequence(&[second, third, first])
        || is_sequence(&[third, first, second])
        || is_sequence(&[third, second, first])
}

/// Checks if `values` form a strictly ascending-by-one sequence. Empty and
/// single-element slices are trivially sequences.
fn is_sequence(values: &[u8]) -> bool {
    if values.is_empty() {
        return true;
    }

    let mut last = values[0];
    for &next in &values[1..] {
        let expected = match last.checked_add(1) {
            Some(value) => value,
            None => return false,
        };

        if next != expected {
            return false;
        }

        last = next;
    }

    true
}

impl From<Wind> for Kind {
    fn from(wind: Wind) -> Self {
        Kind::Wind(wind)
    }
}

impl From<Dragon> for Kind {
    fn from(dragon: Dragon) -> Self {
        Kind::Dragon(dragon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn wind_cycle() {
        let mut wind = Wind::East;
        wind = wind.next();
        assert_eq!(Wind::South, wind);
        wind = wind.next();
        assert_eq!(Wind::West, wind);
        wind = wind.next();
        assert_eq!(Wind::North, wind);
        wind = wind.next();
        assert_eq!(Wind::East, wind);
    }

    #[test]
    fn wind_distance() {
        assert_eq!(Wind::East.distance_to(Wind::North), 3);
        assert_eq!(Wind::North.distance_to(Wind::East), 1);
        assert_eq!(Wind::East.distance_to(Wind::East), 0);
    }

    #[test]
    fn generate_tileset_counts() {
        let tiles = generate_tileset(4);
        assert_eq!(tiles.len(), 34 * 4);

        let unique_ids: std::collections::HashSet<_> = tiles.iter().map(|t| t.id).collect();
        assert_eq!(unique_ids.len(), tiles.len(), "tile ids must be unique within a round");

        for kind in all_kinds() {
            let count = tiles.iter().filter(|t| t.kind == kind).count();
            assert_eq!(count, 4, "expected 4 copies of {:?}", kind);
        }
    }

    #[test]
    fn run_detection_rejects_honors() {
        assert!(!is_run(
            Dragon::White,
            Kind::Simple(Suit::Coins, 1),
            Kind::Simple(Suit::Coins, 2),
        ));
    }

    #[test]
    fn run_detection_rejects_mismatched_suits() {
        assert!(!is_run(
            Kind::Simple(Suit::Coins, 1),
            Kind::Simple(Suit::Coins, 2),
            Kind::Simple(Suit::Bamboo, 3),
        ));
    }

    #[test]
    fn run_detection_all_permutations() {
        let kinds = [
            Kind::Simple(Suit::Coins, 4),
            Kind::Simple(Suit::Coins, 5),
            Kind::Simple(Suit::Coins, 6),
        ];

        for permutation in kinds.iter().permutations(3) {
            assert!(is_run(*permutation[0], *permutation[1], *permutation[2]));
        }
    }

    #[test]
    fn order_value_is_monotonic_within_suit() {
        let values: Vec<_> = (1..=9)
            .map(|n| Kind::Simple(Suit::Bamboo, n).order_value())
            .collect();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(values, sorted);
    }

    #[test]
    fn centrality_peaks_at_five() {
        assert_eq!(Kind::Simple(Suit::Coins, 5).centrality(), 4);
        assert_eq!(Kind::Simple(Suit::Coins, 1).centrality(), 0);
        assert_eq!(Kind::Simple(Suit::Coins, 9).centrality(), 0);
        assert_eq!(Kind::Wind(Wind::East).centrality(), 0);
    }
}
