//! The Claim Arbiter: eligibility, collection bookkeeping, and priority
//! resolution for a single discard (§4.4).

use crate::rules;
use crate::tile::{Kind, TileInstance, Wind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A seat's one-shot decision in response to a discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimDecision {
    Pass,
    Hu,
    Peng(Kind),
    Gang(Kind),
    Chi([TileInstance; 2]),
}

/// The set of claims a single seat is eligible to make on the current discard.
/// `None` fields mean that claim type isn't available to this seat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimOptions {
    pub hu: bool,
    pub gang: Option<Kind>,
    pub peng: Option<Kind>,
    /// Only ever populated for the seat immediately right of the discarder.
    pub chi: Vec<[TileInstance; 2]>,
}

impl ClaimOptions {
    pub fn is_empty(&self) -> bool {
        !self.hu && self.gang.is_none() && self.peng.is_none() && self.chi.is_empty()
    }

    pub fn allows(&self, decision: &ClaimDecision) -> bool {
        match decision {
            ClaimDecision::Pass => true,
            ClaimDecision::Hu => self.hu,
            ClaimDecision::Peng(kind) => self.peng == Some(*kind),
            ClaimDecision::Gang(kind) => self.gang == Some(*kind),
            ClaimDecision::Chi(tiles) => self.chi.iter().any(|option| option == tiles),
        }
    }
}

/// Computes what `hand` (a non-discarding seat's hand, with `melds` already taken
/// into account) is eligible to claim on `discard`. `is_right_neighbor` gates chi
/// eligibility to the single seat immediately clockwise of the discarder.
pub fn eligibility(
    hand: &[TileInstance],
    melds: &[crate::meld::Meld],
    discard: TileInstance,
    is_right_neighbor: bool,
) -> ClaimOptions {
    let mut hypothetical_hand = hand.to_vec();
    hypothetical_hand.push(discard);

    ClaimOptions {
        hu: rules::check_win(&hypothetical_hand, melds),
        gang: rules::can_ming_gang(hand, discard.kind).then_some(discard.kind),
        peng: rules::can_peng(hand, discard.kind).then_some(discard.kind),
        chi: if is_right_neighbor {
            rules::chi_options(hand, discard)
        } else {
            Vec::new()
        },
    }
}

/// The outcome of resolving a fully-collected (or deadline-expired) set of claim
/// decisions, per the priority ladder Hu > Gang > Peng > Chi > Pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// One or more seats legally won on the discard (multi-ron).
    MultiHu { winners: Vec<Wind> },
    Gang { claimant: Wind, kind: Kind },
    Peng { claimant: Wind, kind: Kind },
    Chi { claimant: Wind, tiles: [TileInstance; 2] },
    AllPass,
}

/// Resolves the submitted decisions for one discard. `submitted` must contain an
/// entry for every eligible seat (unresponded eligible seats are recorded as
/// `Pass` by the claim-global timer before this is called). `validate_hu` re-checks
/// a claimed Hu against the live hand at resolution time, since the baseline
/// arbiter does not trust the eligibility snapshot taken at collection start.
///
/// This function only depends on the *contents* of `submitted`, never the order
/// decisions arrived in (L1: deterministic resolution).
pub fn resolve<F>(submitted: &BTreeMap<Wind, ClaimDecision>, validate_hu: F) -> ClaimOutcome
where
    F: Fn(Wind) -> bool,
{
    let mut valid_winners: Vec<Wind> = submitted
        .iter()
        .filter(|(_, decision)| matches!(decision, ClaimDecision::Hu))
        .map(|(&seat, _)| seat)
        .filter(|&seat| validate_hu(seat))
        .collect();
    valid_winners.sort();

    if !valid_winners.is_empty() {
        return ClaimOutcome::MultiHu { winners: valid_winners };
    }

    if let Some((&claimant, &ClaimDecision::Gang(kind))) = submitted
        .iter()
        .find(|(_, decision)| matches!(decision, ClaimDecision::Gang(_)))
    {
        return ClaimOutcome::Gang { claimant, kind };
    }

    if let Some((&claimant, &ClaimDecision::Peng(kind))) = submitted
        .iter()
        .find(|(_, decision)| matches!(decision, ClaimDecision::Peng(_)))
    {
        return ClaimOutcome::Peng { claimant, kind };
    }

    if let Some((&claimant, ClaimDecision::Chi(tiles))) = submitted
        .iter()
        .find(|(_, decision)| matches!(decision, ClaimDecision::Chi(_)))
    {
        return ClaimOutcome::Chi { claimant, tiles: *tiles };
    }

    ClaimOutcome::AllPass
}
