//! Integration tests driving `MatchState` through a handful of full rounds,
//! checking that phase transitions, scores, and dealer rotation stay
//! consistent the way the Round/Match Controllers promise (§4.2, §4.8, §8).

use mahjong::claim::ClaimDecision;
use mahjong::match_state::{MatchId, MatchState, RematchVote};
use mahjong::player::PlayerRecord;
use mahjong::round::{Phase, RoundOutcome};
use mahjong::scoring::BaselineScoring;
use mahjong::tile::Wind;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeMap;

fn ai_seats() -> BTreeMap<Wind, PlayerRecord> {
    let mut map = BTreeMap::new();
    for wind in [Wind::East, Wind::South, Wind::West, Wind::North] {
        map.insert(wind, PlayerRecord::new_ai(format!("{:?}", wind)));
    }
    map
}

/// S1: after dealing, every seat has 13 tiles, the dealer already holds its
/// opening 14th tile as `drawn_tile`, the wall holds the remainder, and the
/// dealer is first to act — from `AwaitingDiscard`, not `AwaitingDraw`.
#[test]
fn opening_deal_matches_s1() {
    let mut rng = Pcg64Mcg::seed_from_u64(100);
    let m = MatchState::new(MatchId::new(1), ai_seats(), 8, 4, &mut rng);

    for record in m.seats.values() {
        assert_eq!(record.hand.len(), 13);
    }
    assert_eq!(m.round.wall.len(), 34 * 4 - 13 * 4 - 1);
    assert_eq!(m.round.phase, Phase::AwaitingDiscard { turn: m.round.dealer });
    assert!(m.round.drawn_tile.is_some());
    assert!(m.seats[&m.round.dealer].is_dealer);
}

/// S2: the dealer discards its opening draw and nobody else can claim it;
/// with `claim-global` unreachable in a unit test, the engine-level
/// equivalent is an empty eligible set advancing straight back to
/// `AwaitingDraw`.
#[test]
fn draw_discard_with_no_claims_advances_to_next_seat() {
    let mut rng = Pcg64Mcg::seed_from_u64(101);
    let mut m = MatchState::new(MatchId::new(1), ai_seats(), 8, 4, &mut rng);
    let dealer = m.round.dealer;
    let drawn = m.round.drawn_tile.expect("dealer's opening draw");

    let outcome = m.round.discard(dealer, &mut m.seats, drawn.id).unwrap();
    assert_eq!(outcome, drawn);

    // Either nobody had an eligible claim (straight to the next seat) or a
    // claim collection opened — both are valid depending on the shuffled
    // hands, but the phase must be one of the two expected shapes.
    assert!(matches!(
        m.round.phase,
        Phase::AwaitingDraw { .. } | Phase::CollectingClaims { .. }
    ));
}

/// B1 / S1 boundary: a round that runs out of wall before anyone wins settles
/// as an exhaustive draw, and the match advances the dealer per the standard
/// non-dealer-win rule.
#[test]
fn wall_exhaustion_settles_as_draw_and_rotates_dealer() {
    let mut rng = Pcg64Mcg::seed_from_u64(102);
    let mut m = MatchState::new(MatchId::new(1), ai_seats(), 8, 4, &mut rng);
    let starting_dealer = m.round.dealer;

    // Drain the wall and put some seat on the clock to draw, rather than
    // playing every intervening turn — what's under test is the empty-wall
    // boundary a draw can hit, not how a seat gets there.
    m.round.wall.clear();
    m.round.phase = Phase::AwaitingDraw { turn: starting_dealer.next() };
    assert_eq!(m.round.draw(starting_dealer.next()), Err(mahjong::round::RoundError::WallExhausted));

    m.round.settle(RoundOutcome::ExhaustiveDraw);
    assert!(matches!(m.round.phase, Phase::Settled { outcome: RoundOutcome::ExhaustiveDraw }));

    m.advance_round(RoundOutcome::ExhaustiveDraw, 4, &mut rng);
    assert_eq!(m.round.dealer, starting_dealer.next());
    assert_eq!(m.round_number, 2);
}

/// B3 / S4: two seats declare Hu on the same discard. Both win, the discarder
/// pays both, and the round settles with both winners recorded.
#[test]
fn multi_ron_pays_both_winners() {
    let mut rng = Pcg64Mcg::seed_from_u64(103);
    let mut m = MatchState::new(MatchId::new(1), ai_seats(), 8, 4, &mut rng);

    let discarder = m.round.dealer;
    let winner_a = discarder.next();
    let winner_b = winner_a.next();

    let mut eligible = BTreeMap::new();
    eligible.insert(winner_a, mahjong::claim::ClaimOptions { hu: true, ..Default::default() });
    eligible.insert(winner_b, mahjong::claim::ClaimOptions { hu: true, ..Default::default() });
    let discard = mahjong::tile::TileInstance::new(mahjong::tile::TileId::new(90_000), mahjong::tile::Kind::Dragon(mahjong::tile::Dragon::Red));
    m.round.phase = Phase::CollectingClaims { discarder, discard, eligible, responded: BTreeMap::new() };
    m.round.discard_pile.insert(0, (discard, discarder));

    m.round.submit_claim(winner_a, ClaimDecision::Hu).unwrap();
    m.round.submit_claim(winner_b, ClaimDecision::Hu).unwrap();

    let outcome = m.round.finish_claim_resolution(&mut m.seats, |_| true, &BaselineScoring).unwrap();
    assert_eq!(outcome, mahjong::claim::ClaimOutcome::MultiHu { winners: vec![winner_a, winner_b] });
    assert_eq!(m.seats[&winner_a].score, 100);
    assert_eq!(m.seats[&winner_b].score, 100);
    assert_eq!(m.seats[&discarder].score, -200);
    assert!(matches!(m.round.phase, Phase::Settled { .. }));
}

/// S6: at match end, unanimous rematch votes preserve every seat's score
/// across the new match.
#[test]
fn rematch_preserves_scores_across_a_new_match() {
    let mut rng = Pcg64Mcg::seed_from_u64(104);
    let mut m = MatchState::new(MatchId::new(1), ai_seats(), 1, 4, &mut rng);
    m.seats.get_mut(&Wind::East).unwrap().score += 300;
    m.seats.get_mut(&Wind::South).unwrap().score -= 300;
    m.advance_round(RoundOutcome::ExhaustiveDraw, 4, &mut rng);
    assert!(m.match_over);

    for wind in [Wind::East, Wind::South, Wind::West, Wind::North] {
        m.record_rematch_vote(wind, RematchVote::StayForRematch);
    }
    assert!(m.rematch_agreed());

    let scores_before: BTreeMap<Wind, i64> = m.seats.iter().map(|(&w, r)| (w, r.score)).collect();
    m.start_rematch(MatchId::new(2), 4, &mut rng);

    for (wind, score) in scores_before {
        assert_eq!(m.seats[&wind].score, score, "score for {:?} must carry over", wind);
    }
    assert_eq!(m.round_number, 1);
    assert!(!m.match_over);
}
