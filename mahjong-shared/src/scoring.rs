//! The Scoring Rule: a pluggable hook for turning a round's outcome into
//! score deltas (§4.2). Only the baseline flat schedule is implemented; fan
//! or yaju-based scoring is an explicit Open Question left to a different
//! `ScoringRule` impl.

use crate::tile::Wind;
use std::collections::BTreeMap;

/// Computes the per-seat score delta for each way a round can end. Kept
/// separate from [`crate::round::RoundState`] so a richer schedule can be
/// swapped in without touching the phase state machine.
pub trait ScoringRule {
    /// A single seat wins off another seat's discard.
    fn discard_win(&self, winner: Wind, discarder: Wind) -> BTreeMap<Wind, i64>;

    /// A seat wins off its own draw; the cost is split across the others.
    fn self_draw_win(&self, winner: Wind, others: &[Wind]) -> BTreeMap<Wind, i64>;

    /// Two or more seats win simultaneously off the same discard. Each winner
    /// scores independently against the discarder.
    fn multi_ron(&self, winners: &[Wind], discarder: Wind) -> BTreeMap<Wind, i64>;

    /// The round ends with no winner.
    fn exhaustive_draw(&self) -> BTreeMap<Wind, i64>;
}

/// The flat schedule fixed by the baseline spec: 100 points for a discard
/// win, 600 split in equal ceiling shares across the losers on a self-draw,
/// nothing on a draw game.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineScoring;

const DISCARD_WIN_POINTS: i64 = 100;
const SELF_DRAW_POOL: i64 = DISCARD_WIN_POINTS * 6;

impl ScoringRule for BaselineScoring {
    fn discard_win(&self, winner: Wind, discarder: Wind) -> BTreeMap<Wind, i64> {
        let mut deltas = BTreeMap::new();
        *deltas.entry(winner).or_insert(0) += DISCARD_WIN_POINTS;
        *deltas.entry(discarder).or_insert(0) -= DISCARD_WIN_POINTS;
        deltas
    }

    fn self_draw_win(&self, winner: Wind, others: &[Wind]) -> BTreeMap<Wind, i64> {
        let mut deltas = BTreeMap::new();
        if others.is_empty() {
            return deltas;
        }

        let share = ceiling_div(SELF_DRAW_POOL, others.len() as i64);
        for &other in others {
            *deltas.entry(other).or_insert(0) -= share;
        }
        *deltas.entry(winner).or_insert(0) += share * others.len() as i64;
        deltas
    }

    fn multi_ron(&self, winners: &[Wind], discarder: Wind) -> BTreeMap<Wind, i64> {
        let mut deltas = BTreeMap::new();
        for &winner in winners {
            for (seat, delta) in self.discard_win(winner, discarder) {
                *deltas.entry(seat).or_insert(0) += delta;
            }
        }
        deltas
    }

    fn exhaustive_draw(&self) -> BTreeMap<Wind, i64> {
        BTreeMap::new()
    }
}

fn ceiling_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_win_is_zero_sum_between_winner_and_discarder() {
        let deltas = BaselineScoring.discard_win(Wind::South, Wind::East);
        assert_eq!(deltas[&Wind::South], 100);
        assert_eq!(deltas[&Wind::East], -100);
    }

    #[test]
    fn self_draw_splits_evenly_across_three_others() {
        let others = [Wind::South, Wind::West, Wind::North];
        let deltas = BaselineScoring.self_draw_win(Wind::East, &others);
        assert_eq!(deltas[&Wind::East], 600);
        for seat in others {
            assert_eq!(deltas[&seat], -200);
        }
    }

    #[test]
    fn multi_ron_charges_discarder_once_per_winner() {
        let deltas = BaselineScoring.multi_ron(&[Wind::South, Wind::West], Wind::East);
        assert_eq!(deltas[&Wind::South], 100);
        assert_eq!(deltas[&Wind::West], 100);
        assert_eq!(deltas[&Wind::East], -200);
    }

    #[test]
    fn exhaustive_draw_changes_nothing() {
        assert!(BaselineScoring.exhaustive_draw().is_empty());
    }
}
