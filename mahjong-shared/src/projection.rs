//! Builds the per-recipient broadcast view of a round (§4.7 masking rule): a
//! seat's real hand is visible only to its own online human occupant, and to
//! everyone once the round has settled. Every other seat gets an
//! opaque, same-length placeholder.

use crate::config::RoomConfig;
use crate::meld::Meld;
use crate::player::PlayerRecord;
use crate::round::{Phase, RoundOutcome, RoundState};
use crate::tile::{TileInstance, Wind};
use crate::timer::ActiveTimer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A seat's hand as seen by one particular recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandView {
    Visible(Vec<TileInstance>),
    Hidden { count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatProjection {
    pub seat: Wind,
    pub name: String,
    pub hand: HandView,
    pub melds: Vec<Meld>,
    pub score: i64,
    pub is_dealer: bool,
    pub is_host: bool,
    pub is_human: bool,
    pub is_online: bool,
}

/// The full state one recipient is sent after every action (§6). Built fresh
/// on every change rather than diffed, matching the rest of the room
/// engine's "re-broadcast the whole picture" style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomProjection {
    pub seats: Vec<SeatProjection>,
    pub deck_remaining: usize,
    pub discard_pile: Vec<(TileInstance, Wind)>,
    pub phase_label: String,
    pub current_seat: Option<Wind>,
    pub dealer: Wind,
    pub turn_number: u32,
    /// Only set for the recipient whose own turn it currently is.
    pub last_drawn: Option<TileInstance>,
    pub last_discard: Option<(TileInstance, Wind)>,
    pub active_timer: Option<ActiveTimer>,
    pub eligible_claims: Vec<Wind>,
    /// Only populated for the recipient who is the eligible chi claimant.
    pub chi_options: Vec<[TileInstance; 2]>,
    pub winners: Vec<Wind>,
    pub round_number: u32,
    pub num_rounds: u32,
    pub match_over: bool,
    pub host_name: Option<String>,
    pub config: RoomConfig,
}

/// Builds the projection of `round`/`seats` as seen by `recipient`.
/// `recipient` is `None` for a lobby observer with no seat of their own.
#[allow(clippy::too_many_arguments)]
pub fn project(
    round: &RoundState,
    seats: &BTreeMap<Wind, PlayerRecord>,
    recipient: Option<Wind>,
    config: &RoomConfig,
    active_timer: Option<ActiveTimer>,
    round_number: u32,
    num_rounds: u32,
    match_over: bool,
) -> RoomProjection {
    let reveal_all = matches!(round.phase, Phase::Settled { .. }) || match_over;

    let seat_projections = seats
        .iter()
        .map(|(&seat, record)| {
            let owner_online_human = recipient == Some(seat) && record.is_human && record.is_online;
            let hand = if reveal_all || owner_online_human {
                HandView::Visible(record.hand.clone())
            } else {
                HandView::Hidden { count: record.hand.len() }
            };
            SeatProjection {
                seat,
                name: record.name.clone(),
                hand,
                melds: record.melds.clone(),
                score: record.score,
                is_dealer: record.is_dealer,
                is_host: record.is_host,
                is_human: record.is_human,
                is_online: record.is_online,
            }
        })
        .collect();

    let current_seat = match &round.phase {
        Phase::AwaitingDraw { turn } | Phase::AwaitingDiscard { turn } => Some(*turn),
        _ => None,
    };

    let last_drawn = match recipient {
        Some(seat) if current_seat == Some(seat) => round.drawn_tile,
        _ => None,
    };

    let (eligible_claims, chi_options) = match &round.phase {
        Phase::CollectingClaims { eligible, .. } => {
            let eligible_seats = eligible.keys().copied().collect();
            let chi = recipient
                .and_then(|seat| eligible.get(&seat))
                .map(|options| options.chi.clone())
                .unwrap_or_default();
            (eligible_seats, chi)
        }
        _ => (Vec::new(), Vec::new()),
    };

    let winners = match &round.phase {
        Phase::Settled { outcome: RoundOutcome::Win { winners, .. } } => winners.clone(),
        _ => Vec::new(),
    };

    let host_name = seats.values().find(|record| record.is_host).map(|record| record.name.clone());

    RoomProjection {
        seats: seat_projections,
        deck_remaining: round.wall.len(),
        discard_pile: round.discard_pile.clone(),
        phase_label: phase_label(&round.phase),
        current_seat,
        dealer: round.dealer,
        turn_number: round.turn_number,
        last_drawn,
        last_discard: round.discard_pile.first().copied(),
        active_timer,
        eligible_claims,
        chi_options,
        winners,
        round_number,
        num_rounds,
        match_over,
        host_name,
        config: config.clone(),
    }
}

fn phase_label(phase: &Phase) -> String {
    match phase {
        Phase::AwaitingDraw { .. } => "AwaitingDraw".into(),
        Phase::AwaitingDiscard { .. } => "AwaitingDiscard".into(),
        Phase::CollectingClaims { .. } => "CollectingClaims".into(),
        Phase::Settled { outcome: RoundOutcome::ExhaustiveDraw } => "RoundOverDraw".into(),
        Phase::Settled { outcome: RoundOutcome::Win { .. } } => "RoundOverWin".into(),
    }
}
