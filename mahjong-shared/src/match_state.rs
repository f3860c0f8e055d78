//! The Match Controller: round sequencing, dealer rotation, and rematch
//! voting across a match's lifetime (§3 Match State, §4.8).

use crate::player::PlayerRecord;
use crate::round::{RoundOutcome, RoundState};
use crate::tile::Wind;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a room's match, assigned by the Room Engine.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display("{}", _0)]
#[repr(transparent)]
pub struct MatchId(u32);

impl MatchId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A seat's vote in the post-match rematch prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RematchVote {
    StayForRematch,
    Leave,
}

/// The match as a whole: seats, the round currently in progress, and the
/// bookkeeping needed to decide when the match ends and what happens after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub id: MatchId,
    pub seats: BTreeMap<Wind, PlayerRecord>,
    pub round: RoundState,
    /// 1-indexed; round 1 is East's first deal.
    pub round_number: u32,
    pub round_cap: u32,
    pub match_over: bool,
    /// Populated only once `match_over` is true; cleared whenever a new match
    /// starts. A seat absent from this map hasn't voted yet.
    pub rematch_votes: BTreeMap<Wind, RematchVote>,
}

/// All four winds, used to pick a uniformly random starting dealer.
const ALL_WINDS: [Wind; 4] = [Wind::East, Wind::South, Wind::West, Wind::North];

impl MatchState {
    /// Starts a brand new match (`isNewMatch`, §4.2): the dealer for round 1
    /// is chosen uniformly at random rather than defaulting to East.
    pub fn new<R: rand::Rng>(
        id: MatchId,
        mut seats: BTreeMap<Wind, PlayerRecord>,
        round_cap: u32,
        copies_per_kind: u32,
        rng: &mut R,
    ) -> Self {
        use rand::seq::SliceRandom;
        let dealer = *ALL_WINDS.choose(rng).expect("ALL_WINDS is non-empty");
        let round = RoundState::deal(dealer, &mut seats, copies_per_kind, rng);
        MatchState {
            id,
            seats,
            round,
            round_number: 1,
            round_cap,
            match_over: false,
            rematch_votes: BTreeMap::new(),
        }
    }

    /// Ends the current round with `outcome`, rotates the dealer per standard
    /// rule (the dealer keeps the seat on a dealer win; otherwise, including
    /// an exhaustive draw, the seat passes clockwise), and either deals the
    /// next round or ends the match once `round_cap` is reached.
    pub fn advance_round<R: rand::Rng>(&mut self, outcome: RoundOutcome, copies_per_kind: u32, rng: &mut R) {
        let dealer_won = matches!(&outcome, RoundOutcome::Win { winners, .. } if winners.contains(&self.round.dealer));
        self.round.settle(outcome);

        if self.round_number >= self.round_cap {
            self.match_over = true;
            return;
        }

        let next_dealer = if dealer_won { self.round.dealer } else { self.round.dealer.next() };
        self.round_number += 1;
        self.round = RoundState::deal(next_dealer, &mut self.seats, copies_per_kind, rng);
    }

    pub fn record_rematch_vote(&mut self, seat: Wind, vote: RematchVote) {
        self.rematch_votes.insert(seat, vote);
    }

    pub fn all_online_seats_voted(&self) -> bool {
        self.seats
            .iter()
            .filter(|(_, record)| record.is_online)
            .all(|(seat, _)| self.rematch_votes.contains_key(seat))
    }

    /// A rematch proceeds only if every online seat voted to stay; any
    /// `Leave` vote (or the room filling empty seats with AI) ends the match
    /// for good. Scores carry over into the new match on a rematch.
    pub fn rematch_agreed(&self) -> bool {
        self.all_online_seats_voted()
            && self
                .rematch_votes
                .values()
                .all(|vote| matches!(vote, RematchVote::StayForRematch))
    }

    /// Starts a fresh match reusing `self`'s seats and their accumulated
    /// scores, resetting round bookkeeping and votes. Dealer is re-chosen at
    /// random, same as any other `isNewMatch` start (§4.2, §4.8).
    pub fn start_rematch<R: rand::Rng>(&mut self, new_id: MatchId, copies_per_kind: u32, rng: &mut R) {
        use rand::seq::SliceRandom;

        for record in self.seats.values_mut() {
            record.clear_claim_state();
        }

        let dealer = *ALL_WINDS.choose(rng).expect("ALL_WINDS is non-empty");
        self.id = new_id;
        self.round = RoundState::deal(dealer, &mut self.seats, copies_per_kind, rng);
        self.round_number = 1;
        self.match_over = false;
        self.rematch_votes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn seats() -> BTreeMap<Wind, PlayerRecord> {
        let mut map = BTreeMap::new();
        for wind in [Wind::East, Wind::South, Wind::West, Wind::North] {
            map.insert(wind, PlayerRecord::new_ai(format!("{:?}", wind)));
        }
        map
    }

    #[test]
    fn match_ends_after_round_cap() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let mut m = MatchState::new(MatchId::new(1), seats(), 1, 4, &mut rng);
        assert!(!m.match_over);
        m.advance_round(RoundOutcome::ExhaustiveDraw, 4, &mut rng);
        assert!(m.match_over);
    }

    #[test]
    fn dealer_rotates_between_rounds_on_a_non_dealer_outcome() {
        let mut rng = Pcg64Mcg::seed_from_u64(8);
        let mut m = MatchState::new(MatchId::new(1), seats(), 4, 4, &mut rng);
        let first_dealer = m.round.dealer;
        m.advance_round(RoundOutcome::ExhaustiveDraw, 4, &mut rng);
        assert_eq!(m.round.dealer, first_dealer.next());
    }

    #[test]
    fn dealer_keeps_the_seat_on_a_dealer_win() {
        let mut rng = Pcg64Mcg::seed_from_u64(14);
        let mut m = MatchState::new(MatchId::new(1), seats(), 4, 4, &mut rng);
        let dealer = m.round.dealer;
        m.advance_round(RoundOutcome::Win { winners: vec![dealer], discarder: None }, 4, &mut rng);
        assert_eq!(m.round.dealer, dealer);
    }

    #[test]
    fn rematch_requires_unanimous_stay() {
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let mut m = MatchState::new(MatchId::new(1), seats(), 1, 4, &mut rng);
        m.advance_round(RoundOutcome::ExhaustiveDraw, 4, &mut rng);

        for wind in [Wind::East, Wind::South, Wind::West] {
            m.record_rematch_vote(wind, RematchVote::StayForRematch);
        }
        assert!(!m.rematch_agreed(), "not everyone has voted yet");

        m.record_rematch_vote(Wind::North, RematchVote::Leave);
        assert!(m.all_online_seats_voted());
        assert!(!m.rematch_agreed());
    }

    #[test]
    fn score_carries_over_into_rematch() {
        let mut rng = Pcg64Mcg::seed_from_u64(10);
        let mut m = MatchState::new(MatchId::new(1), seats(), 1, 4, &mut rng);
        m.seats.get_mut(&Wind::East).unwrap().score += 500;
        m.start_rematch(MatchId::new(2), 4, &mut rng);
        assert_eq!(m.seats[&Wind::East].score, 500);
        assert_eq!(m.round_number, 1);
        assert!(!m.match_over);
    }
}
