//! Per-seat state: hand, melds, presence, and the transient claim-decision cache.

use crate::claim::ClaimDecision;
use crate::meld::Meld;
use crate::tile::{Kind, TileInstance};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Opaque identifier for a transport connection, assigned once per connection by
/// the Room Engine's connection-id generator. `None` means the seat is currently
/// unattached (offline human, or an AI that was never attached).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display("{}", _0)]
pub struct ConnectionId(pub u64);

/// All state tracked for one of the four seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub hand: Vec<TileInstance>,
    pub melds: Vec<Meld>,
    pub score: i64,

    pub is_dealer: bool,
    pub is_host: bool,
    pub is_human: bool,
    pub is_online: bool,
    pub connection: Option<ConnectionId>,

    /// Set while this seat is eligible to respond to an in-flight claim
    /// collection; cleared once resolution runs.
    pub pending_claim: Option<ClaimDecision>,
    /// Flips true the instant this seat's claim decision is recorded, so a second
    /// submission from the same seat during the same collection is rejected
    /// outright (§4.4 anti-race).
    pub has_responded: bool,
}

impl PlayerRecord {
    /// A fresh, empty seat for an AI player, online by construction (AI seats are
    /// never "disconnected" in the human sense).
    pub fn new_ai(name: String) -> Self {
        PlayerRecord {
            name,
            hand: Vec::new(),
            melds: Vec::new(),
            score: 0,
            is_dealer: false,
            is_host: false,
            is_human: false,
            is_online: true,
            connection: None,
            pending_claim: None,
            has_responded: false,
        }
    }

    /// A fresh, empty seat for a human player who just joined.
    pub fn new_human(name: String, connection: ConnectionId) -> Self {
        PlayerRecord {
            name,
            hand: Vec::new(),
            melds: Vec::new(),
            score: 0,
            is_dealer: false,
            is_host: false,
            is_human: true,
            is_online: true,
            connection: Some(connection),
            pending_claim: None,
            has_responded: false,
        }
    }

    /// Visible tile count: hand plus every tile locked up in a meld, used by the
    /// projection and by the tile-conservation invariant (P1).
    pub fn total_tile_count(&self) -> usize {
        self.hand.len() + self.melds.iter().map(Meld::tile_count).sum::<usize>()
    }

    pub fn mark_offline(&mut self) {
        self.is_online = false;
        self.connection = None;
    }

    pub fn reconnect(&mut self, connection: ConnectionId) {
        self.is_online = true;
        self.connection = Some(connection);
    }

    /// Resets the transient claim-collection bookkeeping. Called once per
    /// collection cycle starts and once resolution finishes.
    pub fn clear_claim_state(&mut self) {
        self.pending_claim = None;
        self.has_responded = false;
    }

    pub fn count_of_kind(&self, kind: Kind) -> usize {
        self.hand.iter().filter(|t| t.kind == kind).count()
    }
}
