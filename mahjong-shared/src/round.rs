//! The Round Controller: one round's phase state machine, from deal to
//! settlement (§4.2, §4.3).

use crate::claim::{ClaimDecision, ClaimOptions, ClaimOutcome};
use crate::meld::{ClaimedFrom, Meld, MeldKind};
use crate::player::PlayerRecord;
use crate::rules::{self, RuleError};
use crate::scoring::ScoringRule;
use crate::tile::{generate_tileset, Kind, TileId, TileInstance, Wind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use take_if::TakeIf;
use thiserror::Error;

/// How many tiles are dealt to a hand before the dealer's first extra draw.
pub const INITIAL_HAND_SIZE: usize = 13;

/// Which sub-state a round is currently sitting in. Exactly one is active at a
/// time; timers and incoming actions are both gated on the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the seat at `turn` to draw.
    AwaitingDraw { turn: Wind },
    /// `turn` has drawn and must discard, declare self-hu, or declare a gang.
    AwaitingDiscard { turn: Wind },
    /// A discard is live and the room is collecting claim decisions from every
    /// eligible seat (global-collect model, §4.4).
    CollectingClaims {
        discarder: Wind,
        discard: TileInstance,
        eligible: BTreeMap<Wind, ClaimOptions>,
        responded: BTreeMap<Wind, ClaimDecision>,
    },
    /// The round ended: exhaustive draw, a win, or an abort.
    Settled { outcome: RoundOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Win { winners: Vec<Wind>, discarder: Option<Wind> },
    ExhaustiveDraw,
}

/// One round's full mutable state: wall, seats' hands/melds, and phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub dealer: Wind,
    pub wall: Vec<TileInstance>,
    pub phase: Phase,
    /// The most recently drawn tile for whichever seat is mid-turn, kept
    /// separate from `hand` until it's discarded or melded so self-hu/an-gang
    /// checks can distinguish "just drawn" from "already in hand".
    pub drawn_tile: Option<TileInstance>,
    /// Every discard made this round that's still sitting unclaimed, most
    /// recent first. A discard is removed the moment a claim consumes it;
    /// passed-on discards stay visible for the rest of the round.
    pub discard_pile: Vec<(TileInstance, Wind)>,
    /// Count of draws made so far this round, starting at 0 for the freshly
    /// dealt round and incrementing on every successful [`RoundState::draw`].
    /// Exposed to the projection and used to recognize a heavenly/earthly
    /// hand (a self-drawn win before any discard has happened).
    pub turn_number: u32,
}

impl RoundState {
    /// Deals a fresh round: builds and shuffles a wall, gives each seat 13
    /// tiles, draws the dealer's 14th tile into `drawn_tile`, and opens the
    /// round with the dealer already in `AwaitingDiscard` (§4.2).
    pub fn deal<R: rand::Rng>(
        dealer: Wind,
        seats: &mut BTreeMap<Wind, PlayerRecord>,
        copies_per_kind: u32,
        rng: &mut R,
    ) -> Self {
        use rand::seq::SliceRandom;

        let mut wall = generate_tileset(copies_per_kind);
        wall.shuffle(rng);

        for (&wind, seat) in seats.iter_mut() {
            seat.hand.clear();
            seat.melds.clear();
            seat.clear_claim_state();
            seat.is_dealer = wind == dealer;
        }

        let seat_order = [Wind::East, Wind::South, Wind::West, Wind::North];
        for _ in 0..INITIAL_HAND_SIZE {
            for &wind in &seat_order {
                if let Some(tile) = wall.pop() {
                    seats.get_mut(&wind).expect("all four seats present").hand.push(tile);
                }
            }
        }

        let drawn_tile = wall.pop();

        RoundState {
            dealer,
            wall,
            phase: Phase::AwaitingDiscard { turn: dealer },
            drawn_tile,
            discard_pile: Vec::new(),
            turn_number: 1,
        }
    }

    /// Draws the next wall tile for `turn`, transitioning to `AwaitingDiscard`.
    /// Returns [`RoundError::WallExhausted`] (caller settles as an exhaustive
    /// draw) if the wall is empty.
    pub fn draw(&mut self, turn: Wind) -> Result<TileInstance, RoundError> {
        match &self.phase {
            Phase::AwaitingDraw { turn: expected } if *expected == turn => {}
            _ => return Err(RoundError::WrongPhase),
        }

        let tile = self.wall.pop().ok_or(RoundError::WallExhausted)?;
        self.drawn_tile = Some(tile);
        self.turn_number += 1;
        self.phase = Phase::AwaitingDiscard { turn };
        Ok(tile)
    }

    /// `turn` discards the tile identified by `tile_id` — either the tile
    /// just drawn or one already sitting in hand — opening claim collection
    /// across the other three seats, or advancing straight to the next
    /// seat's turn if nobody has an eligible claim.
    pub fn discard(
        &mut self,
        turn: Wind,
        seats: &mut BTreeMap<Wind, PlayerRecord>,
        tile_id: TileId,
    ) -> Result<TileInstance, RoundError> {
        match &self.phase {
            Phase::AwaitingDiscard { turn: expected } if *expected == turn => {}
            _ => return Err(RoundError::WrongPhase),
        }

        let record = seats.get_mut(&turn).ok_or(RoundError::NotEligible)?;

        let tile = match self.drawn_tile.take_if(|drawn| drawn.id == tile_id) {
            Some(drawn) => drawn,
            None => {
                if let Some(drawn) = self.drawn_tile.take() {
                    record.hand.push(drawn);
                }
                let index = record.hand.iter().position(|t| t.id == tile_id).ok_or(RoundError::TileNotInHand)?;
                record.hand.remove(index)
            }
        };

        self.discard_pile.insert(0, (tile, turn));

        let mut eligible = BTreeMap::new();
        for (&seat, other) in seats.iter() {
            if seat == turn {
                continue;
            }
            let options =
                crate::claim::eligibility(&other.hand, &other.melds, tile, rules::right_neighbor_of(turn) == seat);
            if !options.is_empty() {
                eligible.insert(seat, options);
            }
        }

        self.phase = if eligible.is_empty() {
            Phase::AwaitingDraw { turn: turn.next() }
        } else {
            Phase::CollectingClaims { discarder: turn, discard: tile, eligible, responded: BTreeMap::new() }
        };

        Ok(tile)
    }

    /// Records `seat`'s claim decision during collection. Rejects a second
    /// submission from the same seat (§4.4 anti-race) and decisions outside
    /// that seat's eligible set.
    pub fn submit_claim(&mut self, seat: Wind, decision: ClaimDecision) -> Result<(), RoundError> {
        let (eligible, responded) = match &mut self.phase {
            Phase::CollectingClaims { eligible, responded, .. } => (eligible, responded),
            _ => return Err(RoundError::WrongPhase),
        };

        if responded.contains_key(&seat) {
            return Err(RoundError::AlreadyResponded);
        }

        let options = eligible.get(&seat).ok_or(RoundError::NotEligible)?;
        if !options.allows(&decision) {
            return Err(RoundError::IllegalClaim);
        }

        responded.insert(seat, decision);
        Ok(())
    }

    /// True once every eligible seat has responded — the signal to resolve
    /// early rather than wait out the claim-global timer.
    pub fn all_claims_in(&self) -> bool {
        match &self.phase {
            Phase::CollectingClaims { eligible, responded, .. } => {
                eligible.keys().all(|seat| responded.contains_key(seat))
            }
            _ => false,
        }
    }

    /// Resolves the current claim collection, defaulting any eligible seat
    /// that never responded to `Pass` (called by the claim-global timer on
    /// expiry, or immediately once [`RoundState::all_claims_in`] is true).
    pub fn resolve_claims<F>(&mut self, validate_hu: F) -> Result<ClaimOutcome, RoundError>
    where
        F: Fn(Wind) -> bool,
    {
        let (eligible, responded) = match &self.phase {
            Phase::CollectingClaims { eligible, responded, .. } => (eligible, responded),
            _ => return Err(RoundError::WrongPhase),
        };

        let mut responded = responded.clone();
        for seat in eligible.keys() {
            responded.entry(*seat).or_insert(ClaimDecision::Pass);
        }

        Ok(crate::claim::resolve(&responded, validate_hu))
    }

    /// Resolves the current claim collection and fully applies the result:
    /// builds the claimed meld (or settles the round on a win), applies
    /// `scoring`'s deltas, removes the consumed discard from the pile, and
    /// advances the phase — everything the room engine needs after a claim
    /// collection ends, in one call.
    pub fn finish_claim_resolution<F, S>(
        &mut self,
        seats: &mut BTreeMap<Wind, PlayerRecord>,
        validate_hu: F,
        scoring: &S,
    ) -> Result<ClaimOutcome, RoundError>
    where
        F: Fn(Wind) -> bool,
        S: ScoringRule,
    {
        let discarder = self.discarder().ok_or(RoundError::WrongPhase)?;
        let discard = self.current_discard().ok_or(RoundError::WrongPhase)?;
        let outcome = self.resolve_claims(validate_hu)?;

        match &outcome {
            ClaimOutcome::MultiHu { winners } => {
                let deltas = scoring.multi_ron(winners, discarder);
                for (seat, delta) in deltas {
                    if let Some(record) = seats.get_mut(&seat) {
                        record.score += delta;
                    }
                }
                self.remove_discard(discard, discarder);
                self.settle(RoundOutcome::Win { winners: winners.clone(), discarder: Some(discarder) });
            }
            ClaimOutcome::AllPass => {
                self.phase = Phase::AwaitingDraw { turn: discarder.next() };
            }
            _ => {
                self.remove_discard(discard, discarder);
                if let Some(phase) = apply_claim(&outcome, discarder, discard, seats)? {
                    self.phase = phase;
                }
            }
        }

        for record in seats.values_mut() {
            record.clear_claim_state();
        }

        Ok(outcome)
    }

    /// `seat` declares a win off its own just-drawn tile. Returns `Ok(false)`
    /// (a false hu, not an error — the seat stays mid-turn and the caller
    /// restarts its timer) if the hand doesn't actually decompose.
    pub fn self_drawn_hu<S: ScoringRule>(
        &mut self,
        seat: Wind,
        seats: &mut BTreeMap<Wind, PlayerRecord>,
        scoring: &S,
    ) -> Result<bool, RoundError> {
        match &self.phase {
            Phase::AwaitingDiscard { turn } if *turn == seat => {}
            _ => return Err(RoundError::WrongPhase),
        }

        let drawn = self.drawn_tile.ok_or(RoundError::IllegalClaim)?;
        let record = seats.get(&seat).ok_or(RoundError::NotEligible)?;
        let mut hypothetical = record.hand.clone();
        hypothetical.push(drawn);
        if !rules::check_win(&hypothetical, &record.melds) {
            return Ok(false);
        }

        let record = seats.get_mut(&seat).expect("checked above");
        record.hand.push(drawn);
        self.drawn_tile = None;

        let others: Vec<Wind> = seats.keys().copied().filter(|&s| s != seat).collect();
        let deltas = scoring.self_draw_win(seat, &others);
        for (s, delta) in deltas {
            if let Some(r) = seats.get_mut(&s) {
                r.score += delta;
            }
        }

        self.settle(RoundOutcome::Win { winners: vec![seat], discarder: None });
        Ok(true)
    }

    /// `seat` declares a concealed kong (an-gang) using four copies of `kind`
    /// held across its hand and just-drawn tile. Stays mid-turn: the seat
    /// must then draw a replacement tile.
    pub fn an_gang(&mut self, seat: Wind, kind: Kind, seats: &mut BTreeMap<Wind, PlayerRecord>) -> Result<(), RoundError> {
        match &self.phase {
            Phase::AwaitingDiscard { turn } if *turn == seat => {}
            _ => return Err(RoundError::WrongPhase),
        }

        let record = seats.get_mut(&seat).ok_or(RoundError::NotEligible)?;
        let drawn = self.drawn_tile;
        if !rules::can_an_gang(&record.hand, drawn).contains(&kind) {
            return Err(RoundError::IllegalClaim);
        }

        let tiles: [TileInstance; 4] = if drawn.map(|t| t.kind) == Some(kind) {
            let mut three = rules::remove_from_hand(&mut record.hand, kind, 3)?;
            three.push(drawn.expect("checked above"));
            three.try_into().expect("exactly four tiles for an-gang")
        } else {
            let four = rules::remove_from_hand(&mut record.hand, kind, 4)?;
            if let Some(leftover) = drawn {
                record.hand.push(leftover);
            }
            four.try_into().expect("exactly four tiles for an-gang")
        };

        record.melds.push(Meld::gangzi(tiles, None, true));

        self.drawn_tile = None;
        self.phase = Phase::AwaitingDraw { turn: seat };
        Ok(())
    }

    /// `seat` upgrades an existing open Kezi of `kind` to a Gangzi using the
    /// tile it just drew (add-gang). Stays mid-turn: the seat must then draw
    /// a replacement tile.
    pub fn add_gang(&mut self, seat: Wind, kind: Kind, seats: &mut BTreeMap<Wind, PlayerRecord>) -> Result<(), RoundError> {
        match &self.phase {
            Phase::AwaitingDiscard { turn } if *turn == seat => {}
            _ => return Err(RoundError::WrongPhase),
        }

        let drawn = self.drawn_tile.ok_or(RoundError::IllegalClaim)?;
        if drawn.kind != kind {
            return Err(RoundError::IllegalClaim);
        }

        let record = seats.get_mut(&seat).ok_or(RoundError::NotEligible)?;
        let index = record
            .melds
            .iter()
            .position(|m| m.kind == MeldKind::Kezi && m.open && m.kind_of_kezi_or_gangzi() == Some(kind))
            .ok_or(RoundError::IllegalClaim)?;

        let kezi = record.melds.remove(index);
        record.melds.push(Meld::upgrade_to_gangzi(kezi, drawn));

        self.drawn_tile = None;
        self.phase = Phase::AwaitingDraw { turn: seat };
        Ok(())
    }

    /// Ends the round, recording why (win or exhaustive draw).
    pub fn settle(&mut self, outcome: RoundOutcome) {
        self.phase = Phase::Settled { outcome };
    }

    /// Ends the round as an exhaustive draw, applying `scoring`'s draw-game
    /// deltas first — empty for the baseline flat schedule, but left open for
    /// a tenpai/noten payment schedule per the scoring Open Question (§4.2).
    pub fn settle_exhaustive_draw<S: ScoringRule>(&mut self, seats: &mut BTreeMap<Wind, PlayerRecord>, scoring: &S) {
        for (seat, delta) in scoring.exhaustive_draw() {
            if let Some(record) = seats.get_mut(&seat) {
                record.score += delta;
            }
        }
        self.settle(RoundOutcome::ExhaustiveDraw);
    }

    pub fn discarder(&self) -> Option<Wind> {
        match &self.phase {
            Phase::CollectingClaims { discarder, .. } => Some(*discarder),
            _ => None,
        }
    }

    pub fn current_discard(&self) -> Option<TileInstance> {
        match &self.phase {
            Phase::CollectingClaims { discard, .. } => Some(*discard),
            _ => None,
        }
    }

    fn remove_discard(&mut self, tile: TileInstance, discarder: Wind) {
        if let Some(pos) = self.discard_pile.iter().position(|(t, s)| t.id == tile.id && *s == discarder) {
            self.discard_pile.remove(pos);
        }
    }
}

/// Applies a resolved `ClaimOutcome` to `seats`, building the meld (if any) and
/// moving control to the claimant's turn. The discarded tile must already have
/// been removed from the discarder's hand by the caller before this runs.
pub fn apply_claim(
    outcome: &ClaimOutcome,
    discarder: Wind,
    discard: TileInstance,
    seats: &mut BTreeMap<Wind, PlayerRecord>,
) -> Result<Option<Phase>, RoundError> {
    match outcome {
        ClaimOutcome::AllPass => Ok(None),
        ClaimOutcome::MultiHu { .. } => Ok(None), // settlement handled by the caller.
        ClaimOutcome::Chi { claimant, tiles } => {
            let record = seats.get_mut(claimant).ok_or(RoundError::NotEligible)?;
            for tile in tiles {
                remove_one(&mut record.hand, *tile)?;
            }
            let ordered = rules::canonical_run_order(*tiles, discard);
            record.melds.push(Meld::shunzi(ordered, Some(ClaimedFrom { seat: discarder, tile: discard.id })));
            Ok(Some(Phase::AwaitingDiscard { turn: *claimant }))
        }
        ClaimOutcome::Peng { claimant, kind } => {
            let record = seats.get_mut(claimant).ok_or(RoundError::NotEligible)?;
            let mut pair = rules::remove_from_hand(&mut record.hand, *kind, 2)?;
            pair.push(discard);
            let tiles: [TileInstance; 3] = pair.try_into().expect("exactly three tiles");
            record.melds.push(Meld::kezi(tiles, Some(ClaimedFrom { seat: discarder, tile: discard.id })));
            Ok(Some(Phase::AwaitingDiscard { turn: *claimant }))
        }
        ClaimOutcome::Gang { claimant, kind } => {
            let record = seats.get_mut(claimant).ok_or(RoundError::NotEligible)?;
            let mut triplet = rules::remove_from_hand(&mut record.hand, *kind, 3)?;
            triplet.push(discard);
            let tiles: [TileInstance; 4] = triplet.try_into().expect("exactly four tiles");
            record.melds.push(Meld::gangzi(tiles, Some(ClaimedFrom { seat: discarder, tile: discard.id }), false));
            Ok(Some(Phase::AwaitingDraw { turn: *claimant }))
        }
    }
}

fn remove_one(hand: &mut Vec<TileInstance>, tile: TileInstance) -> Result<(), RoundError> {
    let index = hand.iter().position(|t| t.id == tile.id).ok_or(RoundError::NotEligible)?;
    hand.remove(index);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("action does not match the round's current phase")]
    WrongPhase,
    #[error("seat already submitted a claim decision this round")]
    AlreadyResponded,
    #[error("seat is not eligible to make this claim")]
    NotEligible,
    #[error("decision is not among this seat's eligible claims")]
    IllegalClaim,
    #[error("wall has no tiles left to draw")]
    WallExhausted,
    #[error("tile is not in the seat's hand or just-drawn tile")]
    TileNotInHand,
    #[error(transparent)]
    Rule(#[from] RuleError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerRecord;
    use crate::scoring::BaselineScoring;
    use crate::tile::{Suit, TileId};
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
    fn deal_gives_thirteen_tiles_each_plus_the_dealers_opening_draw() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let mut s = seats();
        let round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        for record in s.values() {
            assert_eq!(record.hand.len(), INITIAL_HAND_SIZE);
        }
        assert_eq!(round.wall.len(), 34 * 4 - INITIAL_HAND_SIZE * 4 - 1);
        assert_eq!(round.phase, Phase::AwaitingDiscard { turn: Wind::East });
        assert!(round.drawn_tile.is_some());
        assert_eq!(round.turn_number, 1);
    }

    #[test]
    fn discard_of_the_dealers_opening_draw_opens_claim_collection() {
        let mut rng = Pcg64Mcg::seed_from_u64(2);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        let drawn = round.drawn_tile.expect("dealer's opening draw");

        round.discard(Wind::East, &mut s, drawn.id).unwrap();
        assert!(matches!(round.phase, Phase::CollectingClaims { discarder: Wind::East, .. }));
        assert_eq!(round.discard_pile[0].0, drawn);
    }

    #[test]
    fn discard_with_no_eligible_claims_advances_straight_to_next_seat() {
        let mut rng = Pcg64Mcg::seed_from_u64(21);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);

        // An isolated honor tile nobody else holds duplicates of or can chi.
        let discard = TileInstance::new(TileId::new(8000), Kind::Dragon(crate::tile::Dragon::White));
        round.drawn_tile = Some(discard);
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };

        round.discard(Wind::East, &mut s, discard.id).unwrap();
        assert_eq!(round.phase, Phase::AwaitingDraw { turn: Wind::South });
    }

    #[test]
    fn submit_claim_rejects_double_response() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let mut s = seats();
        s.get_mut(&Wind::South).unwrap().hand = vec![
            TileInstance::new(TileId::new(9001), Kind::Simple(Suit::Coins, 5)),
            TileInstance::new(TileId::new(9002), Kind::Simple(Suit::Coins, 5)),
        ];
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        let discard = TileInstance::new(TileId::new(9999), Kind::Simple(Suit::Coins, 5));
        round.drawn_tile = Some(discard);
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };
        round.discard(Wind::East, &mut s, discard.id).unwrap();

        round.submit_claim(Wind::South, ClaimDecision::Peng(Kind::Simple(Suit::Coins, 5))).unwrap();
        let result = round.submit_claim(Wind::South, ClaimDecision::Pass);
        assert_eq!(result, Err(RoundError::AlreadyResponded));
    }

    #[test]
    fn finish_claim_resolution_applies_peng_and_scores_nothing() {
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let mut s = seats();
        s.get_mut(&Wind::South).unwrap().hand = vec![
            TileInstance::new(TileId::new(9001), Kind::Simple(Suit::Coins, 5)),
            TileInstance::new(TileId::new(9002), Kind::Simple(Suit::Coins, 5)),
        ];
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        let discard = TileInstance::new(TileId::new(9999), Kind::Simple(Suit::Coins, 5));
        round.drawn_tile = Some(discard);
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };
        round.discard(Wind::East, &mut s, discard.id).unwrap();
        round.submit_claim(Wind::South, ClaimDecision::Peng(Kind::Simple(Suit::Coins, 5))).unwrap();

        let outcome = round.finish_claim_resolution(&mut s, |_| false, &BaselineScoring).unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Peng { claimant: Wind::South, kind: Kind::Simple(Suit::Coins, 5) }
        );
        assert_eq!(round.phase, Phase::AwaitingDiscard { turn: Wind::South });
        assert_eq!(s[&Wind::South].melds.len(), 1);
        assert!(round.discard_pile.is_empty());
        assert_eq!(s[&Wind::South].score, 0);
    }

    #[test]
    fn finish_claim_resolution_applies_multi_hu_scoring() {
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        let discard = TileInstance::new(TileId::new(9999), Kind::Simple(Suit::Coins, 5));

        let mut eligible = BTreeMap::new();
        eligible.insert(Wind::South, ClaimOptions { hu: true, ..Default::default() });
        eligible.insert(Wind::West, ClaimOptions { hu: true, ..Default::default() });
        round.phase = Phase::CollectingClaims { discarder: Wind::East, discard, eligible, responded: BTreeMap::new() };
        round.discard_pile.insert(0, (discard, Wind::East));

        round.submit_claim(Wind::South, ClaimDecision::Hu).unwrap();
        round.submit_claim(Wind::West, ClaimDecision::Hu).unwrap();

        let outcome = round.finish_claim_resolution(&mut s, |_| true, &BaselineScoring).unwrap();
        assert_eq!(outcome, ClaimOutcome::MultiHu { winners: vec![Wind::South, Wind::West] });
        assert_eq!(s[&Wind::South].score, 100);
        assert_eq!(s[&Wind::West].score, 100);
        assert_eq!(s[&Wind::East].score, -200);
        assert!(matches!(round.phase, Phase::Settled { .. }));
    }

    #[test]
    fn self_drawn_hu_settles_round_and_splits_score() {
        let mut rng = Pcg64Mcg::seed_from_u64(6);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);

        // Hand the dealer a complete 13-tile shape plus a winning 14th draw.
        let mut id = 20_000u32;
        let mut next_tile = |kind| {
            let t = TileInstance::new(TileId::new(id), kind);
            id += 1;
            t
        };
        s.get_mut(&Wind::East).unwrap().hand = vec![
            next_tile(Kind::Simple(Suit::Coins, 1)),
            next_tile(Kind::Simple(Suit::Coins, 2)),
            next_tile(Kind::Simple(Suit::Coins, 3)),
            next_tile(Kind::Simple(Suit::Coins, 4)),
            next_tile(Kind::Simple(Suit::Coins, 5)),
            next_tile(Kind::Simple(Suit::Coins, 6)),
            next_tile(Kind::Simple(Suit::Bamboo, 1)),
            next_tile(Kind::Simple(Suit::Bamboo, 2)),
            next_tile(Kind::Simple(Suit::Bamboo, 3)),
            next_tile(Kind::Simple(Suit::Characters, 1)),
            next_tile(Kind::Simple(Suit::Characters, 1)),
            next_tile(Kind::Simple(Suit::Characters, 1)),
            next_tile(Kind::Simple(Suit::Characters, 9)),
        ];
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };
        round.drawn_tile = Some(next_tile(Kind::Simple(Suit::Characters, 9)));

        let won = round.self_drawn_hu(Wind::East, &mut s, &BaselineScoring).unwrap();
        assert!(won);
        assert_eq!(s[&Wind::East].score, 600);
        assert_eq!(s[&Wind::South].score, -200);
        assert!(matches!(
            round.phase,
            Phase::Settled { outcome: RoundOutcome::Win { discarder: None, .. } }
        ));
    }

    #[test]
    fn self_drawn_hu_reports_false_hu_without_disturbing_phase() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };
        round.drawn_tile = Some(TileInstance::new(TileId::new(30_000), Kind::Simple(Suit::Coins, 1)));

        let won = round.self_drawn_hu(Wind::East, &mut s, &BaselineScoring).unwrap();
        assert!(!won);
        assert_eq!(round.phase, Phase::AwaitingDiscard { turn: Wind::East });
    }

    #[test]
    fn an_gang_consumes_four_copies_and_awaits_replacement_draw() {
        let mut rng = Pcg64Mcg::seed_from_u64(8);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);

        s.get_mut(&Wind::East).unwrap().hand = vec![
            TileInstance::new(TileId::new(40_000), Kind::Simple(Suit::Coins, 3)),
            TileInstance::new(TileId::new(40_001), Kind::Simple(Suit::Coins, 3)),
            TileInstance::new(TileId::new(40_002), Kind::Simple(Suit::Coins, 3)),
        ];
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };
        round.drawn_tile = Some(TileInstance::new(TileId::new(40_003), Kind::Simple(Suit::Coins, 3)));

        round.an_gang(Wind::East, Kind::Simple(Suit::Coins, 3), &mut s).unwrap();

        assert_eq!(round.phase, Phase::AwaitingDraw { turn: Wind::East });
        assert!(round.drawn_tile.is_none());
        let melds = &s[&Wind::East].melds;
        assert_eq!(melds.len(), 1);
        assert_eq!(melds[0].kind, MeldKind::Gangzi);
        assert!(!melds[0].open, "concealed kong must stay closed");
        assert!(s[&Wind::East].hand.is_empty());
    }

    #[test]
    fn add_gang_upgrades_open_kezi_and_awaits_replacement_draw() {
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);

        let kezi = Meld::kezi(
            [
                TileInstance::new(TileId::new(50_000), Kind::Simple(Suit::Bamboo, 7)),
                TileInstance::new(TileId::new(50_001), Kind::Simple(Suit::Bamboo, 7)),
                TileInstance::new(TileId::new(50_002), Kind::Simple(Suit::Bamboo, 7)),
            ],
            Some(ClaimedFrom { seat: Wind::South, tile: TileId::new(50_002) }),
        );
        s.get_mut(&Wind::East).unwrap().melds = vec![kezi];
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };
        round.drawn_tile = Some(TileInstance::new(TileId::new(50_003), Kind::Simple(Suit::Bamboo, 7)));

        round.add_gang(Wind::East, Kind::Simple(Suit::Bamboo, 7), &mut s).unwrap();

        assert_eq!(round.phase, Phase::AwaitingDraw { turn: Wind::East });
        let melds = &s[&Wind::East].melds;
        assert_eq!(melds.len(), 1);
        assert_eq!(melds[0].kind, MeldKind::Gangzi);
        assert!(melds[0].open, "add-gang stays open like the kezi it came from");
    }

    #[test]
    fn remove_from_hand_fails_when_insufficient() {
        let mut rng = Pcg64Mcg::seed_from_u64(10);
        let mut s = seats();
        let mut round = RoundState::deal(Wind::East, &mut s, 4, &mut rng);
        round.phase = Phase::AwaitingDiscard { turn: Wind::East };

        let result = round.an_gang(Wind::East, Kind::Simple(Suit::Coins, 1), &mut s);
        assert_eq!(result, Err(RoundError::IllegalClaim));
    }
}
