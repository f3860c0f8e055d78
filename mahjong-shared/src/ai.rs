//! The AI Service: pure decision functions standing in for an unoccupied
//! seat (§4.5). Each entry point mirrors a client action one-for-one, so the
//! room engine can call these exactly where it would otherwise be waiting on
//! a human's `ClientAction`.

use crate::claim::{ClaimDecision, ClaimOptions};
use crate::meld::Meld;
use crate::rules;
use crate::tile::{ColorGroup, Kind, TileInstance, Wind};

/// What to do right after drawing, in priority order: win, concealed kong,
/// add-gang, or discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfDrawnAction {
    Hu,
    ConcealedKong(Kind),
    AddGang(Kind),
    Discard(TileInstance),
}

/// Decides what a seat does with a tile it just drew.
pub fn self_drawn(
    hand: &[TileInstance],
    melds: &[Meld],
    drawn: TileInstance,
    discard_pile: &[(TileInstance, Wind)],
) -> SelfDrawnAction {
    let mut hypothetical = hand.to_vec();
    hypothetical.push(drawn);
    if rules::check_win(&hypothetical, melds) {
        return SelfDrawnAction::Hu;
    }

    if let Some(kind) = rules::can_an_gang(hand, Some(drawn)).into_iter().next() {
        return SelfDrawnAction::ConcealedKong(kind);
    }

    if let Some(kind) = rules::can_add_gang(melds, drawn) {
        return SelfDrawnAction::AddGang(kind);
    }

    SelfDrawnAction::Discard(discard_choice(&hypothetical, discard_pile))
}

/// Decides how to respond to another seat's discard: hu beats gang beats
/// peng beats chi beats pass, same priority order the claim arbiter resolves
/// with, so an AI never submits a claim that would lose to one of its own
/// alternatives.
pub fn claim_decision(options: &ClaimOptions) -> ClaimDecision {
    if options.hu {
        return ClaimDecision::Hu;
    }
    if let Some(kind) = options.gang {
        return ClaimDecision::Gang(kind);
    }
    if let Some(kind) = options.peng {
        return ClaimDecision::Peng(kind);
    }
    if let Some(&tiles) = options.chi.first() {
        return ClaimDecision::Chi(tiles);
    }
    ClaimDecision::Pass
}

/// Picks the single worst tile to keep out of `hand`, by the heuristic in
/// §4.5: duplicates and run potential are worth keeping, central/undiscarded
/// kinds are dangerous to let go, and kinds already sitting in the discard
/// pile are safer to part with since nobody else needs them for a pair.
pub fn discard_choice(hand: &[TileInstance], discard_pile: &[(TileInstance, Wind)]) -> TileInstance {
    hand.iter()
        .copied()
        .min_by(|a, b| {
            score_for_discard(*a, hand, discard_pile)
                .cmp(&score_for_discard(*b, hand, discard_pile))
                .then_with(|| a.kind.order_value().cmp(&b.kind.order_value()))
                .then_with(|| group_rank(a.kind).cmp(&group_rank(b.kind)))
        })
        .expect("a seat's hand is never empty when it's asked to discard")
}

fn group_rank(kind: Kind) -> u8 {
    match kind.color_group() {
        ColorGroup::Honor => 0,
        ColorGroup::Numbered => 1,
    }
}

fn score_for_discard(tile: TileInstance, hand: &[TileInstance], discard_pile: &[(TileInstance, Wind)]) -> i64 {
    let count_in_hand = hand.iter().filter(|t| t.kind == tile.kind).count();
    let duplicate_score = match count_in_hand {
        0 | 1 => 0,
        2 => 5,
        3 => 15,
        _ => 25,
    };

    let run_score = if !rules::chi_options(hand, tile).is_empty() { 8 } else { 0 };

    let base = 2 * tile.kind.order_value() as i64;

    let discarded_before = discard_pile.iter().filter(|(t, _)| t.kind == tile.kind).count() as i64;
    let danger_score = 2 * tile.kind.centrality() as i64;
    let safety_credit = 3 * discarded_before;

    duplicate_score + run_score + base + danger_score - safety_credit
}

/// Picks a random think-delay within `[min_ms, max_ms]`, used by the room
/// engine to schedule an AI seat's response instead of acting instantly.
pub fn think_delay_ms<R: rand::Rng>(rng: &mut R, min_ms: u64, max_ms: u64) -> u64 {
    if max_ms <= min_ms {
        return min_ms;
    }
    rng.gen_range(min_ms, max_ms + 1)
}
