//! The Rule Evaluator: pure functions over hands, melds, and candidate tiles.
//!
//! Nothing in this module touches a `RoundState` or a `PlayerRecord` — it only
//! answers "is this legal" and "what are the options", so it can be unit tested
//! directly and reused by both the engine and the AI service.

use crate::meld::{ClaimedFrom, Meld, MeldKind};
use crate::tile::{Kind, Suit, TileInstance, Wind};
use std::collections::BTreeMap;
use thiserror::Error;

/// True iff `hand` contains at least two tiles of `kind`, i.e. a Peng claim is legal.
pub fn can_peng(hand: &[TileInstance], kind: Kind) -> bool {
    count_of_kind(hand, kind) >= 2
}

/// True iff `hand` contains at least three tiles of `kind`, i.e. claiming the
/// discard completes an open Gangzi (ming-gang).
pub fn can_ming_gang(hand: &[TileInstance], kind: Kind) -> bool {
    count_of_kind(hand, kind) >= 3
}

/// Every kind for which `hand` (plus an optional just-drawn tile) holds all four
/// copies, i.e. candidates for a concealed kong (an-gang).
pub fn can_an_gang(hand: &[TileInstance], drawn: Option<TileInstance>) -> Vec<Kind> {
    let mut counts: BTreeMap<Kind, u8> = BTreeMap::new();
    for tile in hand.iter().chain(drawn.iter()) {
        *counts.entry(tile.kind).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|&(_, count)| count >= 4)
        .map(|(kind, _)| kind)
        .collect()
}

/// The kind of an existing open Kezi that `drawn` can be added to (add-gang), if
/// any. There can be at most one, since `drawn` is a single tile of one kind.
pub fn can_add_gang(melds: &[Meld], drawn: TileInstance) -> Option<Kind> {
    melds.iter().find_map(|meld| {
        if meld.kind == MeldKind::Kezi && meld.open && meld.kind_of_kezi_or_gangzi() == Some(drawn.kind) {
            Some(drawn.kind)
        } else {
            None
        }
    })
}

/// The three canonical 2-tile combinations a suited tile can chi onto: the pair
/// directly below, the pair straddling it, and the pair directly above.
fn chi_partner_kinds(kind: Kind) -> Vec<[Kind; 2]> {
    let (suit, number) = match kind {
        Kind::Simple(suit, number) => (suit, number),
        _ => return Vec::new(),
    };

    let mut options = Vec::with_capacity(3);
    let mk = |n: u8| Kind::Simple(suit, n);

    if number >= 3 {
        options.push([mk(number - 2), mk(number - 1)]);
    }
    if number >= 2 && number <= 8 {
        options.push([mk(number - 1), mk(number + 1)]);
    }
    if number <= 7 {
        options.push([mk(number + 1), mk(number + 2)]);
    }

    options
}

/// Enumerates all distinct 2-tile combinations in `hand` that, together with
/// `tile`, form a canonical run. Each combination carries the actual tile
/// instances from the hand (first match per kind), in ascending sequence order.
pub fn chi_options(hand: &[TileInstance], tile: TileInstance) -> Vec<[TileInstance; 2]> {
    let mut results = Vec::new();

    for [first_kind, second_kind] in chi_partner_kinds(tile.kind) {
        let first = hand.iter().find(|t| t.kind == first_kind);
        let second = hand.iter().find(|t| t.kind == second_kind);

        if let (Some(&first), Some(&second)) = (first, second) {
            results.push([first, second]);
        }
    }

    results
}

/// Given a chi's two hand tiles plus the claimed tile, returns the three tiles in
/// canonical ascending-sequence order (so the claimed tile sits at its natural
/// slot, per §4.1's ordering rule).
pub fn canonical_run_order(hand_tiles: [TileInstance; 2], claimed: TileInstance) -> [TileInstance; 3] {
    let mut tiles = [hand_tiles[0], hand_tiles[1], claimed];
    tiles.sort_by_key(|t| match t.kind {
        Kind::Simple(_, number) => number,
        _ => unreachable!("chi only ever involves simples"),
    });
    tiles
}

/// True iff `hand` (13+ tiles) plus any existing `melds` decomposes into 4 melds
/// and 1 pair (the standard winning shape). Seven-pairs and other special hands
/// are out of scope for the baseline evaluator; see [`crate::scoring::ScoringRule`]
/// for where richer hand types would hook in.
pub fn check_win(hand: &[TileInstance], melds: &[Meld]) -> bool {
    let melds_needed = match 4usize.checked_sub(melds.len()) {
        Some(n) => n,
        None => return false,
    };

    let mut counts: BTreeMap<Kind, u8> = BTreeMap::new();
    for tile in hand {
        *counts.entry(tile.kind).or_default() += 1;
    }

    let total_tiles: u8 = counts.values().sum();
    if total_tiles as usize != melds_needed * 3 + 2 {
        return false;
    }

    decompose(&mut counts, melds_needed, false)
}

fn decompose(counts: &mut BTreeMap<Kind, u8>, melds_needed: usize, have_pair: bool) -> bool {
    counts.retain(|_, count| *count > 0);

    if counts.is_empty() {
        return melds_needed == 0 && have_pair;
    }

    let &kind = counts.keys().next().unwrap();
    let count = counts[&kind];

    // Try a pair first (only one allowed, and only taken once).
    if !have_pair && count >= 2 {
        *counts.get_mut(&kind).unwrap() -= 2;
        if decompose(counts, melds_needed, true) {
            *counts.get_mut(&kind).unwrap() += 2;
            return true;
        }
        *counts.get_mut(&kind).unwrap() += 2;
    }

    if melds_needed > 0 {
        // Try a triplet.
        if count >= 3 {
            *counts.get_mut(&kind).unwrap() -= 3;
            if decompose(counts, melds_needed - 1, have_pair) {
                *counts.get_mut(&kind).unwrap() += 3;
                return true;
            }
            *counts.get_mut(&kind).unwrap() += 3;
        }

        // Try a run starting at `kind`.
        if let Kind::Simple(suit, number) = kind {
            if number <= 7 {
                let second = Kind::Simple(suit, number + 1);
                let third = Kind::Simple(suit, number + 2);
                let has_run = counts.get(&second).copied().unwrap_or(0) > 0
                    && counts.get(&third).copied().unwrap_or(0) > 0;

                if has_run {
                    *counts.get_mut(&kind).unwrap() -= 1;
                    *counts.entry(second).or_default() -= 1;
                    *counts.entry(third).or_default() -= 1;

                    if decompose(counts, melds_needed - 1, have_pair) {
                        *counts.get_mut(&kind).unwrap() += 1;
                        *counts.entry(second).or_default() += 1;
                        *counts.entry(third).or_default() += 1;
                        return true;
                    }

                    *counts.get_mut(&kind).unwrap() += 1;
                    *counts.entry(second).or_default() += 1;
                    *counts.entry(third).or_default() += 1;
                }
            }
        }
    }

    false
}

fn count_of_kind(hand: &[TileInstance], kind: Kind) -> usize {
    hand.iter().filter(|t| t.kind == kind).count()
}

/// Removes `n` tiles of `kind` from `hand`, returning the removed instances, or
/// [`RuleError::NotEnoughTiles`] if fewer than `n` are present. `hand` is left
/// untouched on failure.
pub fn remove_from_hand(
    hand: &mut Vec<TileInstance>,
    kind: Kind,
    n: usize,
) -> Result<Vec<TileInstance>, RuleError> {
    if count_of_kind(hand, kind) < n {
        return Err(RuleError::NotEnoughTiles { kind, needed: n });
    }

    let mut removed = Vec::with_capacity(n);
    let mut index = 0;
    while removed.len() < n {
        if hand[index].kind == kind {
            removed.push(hand.remove(index));
        } else {
            index += 1;
        }
    }

    Ok(removed)
}

/// Seat to the immediate right of `discarder` — the only seat eligible to chi.
pub fn right_neighbor_of(discarder: Wind) -> Wind {
    discarder.next()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("hand does not contain {needed} copies of {kind:?}")]
    NotEnoughTiles { kind: Kind, needed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileId;

    fn tile(id: u32, kind: Kind) -> TileInstance {
        TileInstance::new(TileId::new(id), kind)
    }

    fn simple(suit: Suit, number: u8) -> Kind {
        Kind::Simple(suit, number)
    }

    #[test]
    fn peng_requires_two() {
        let hand = vec![tile(0, simple(Suit::Coins, 3)), tile(1, simple(Suit::Coins, 3))];
        assert!(can_peng(&hand, simple(Suit::Coins, 3)));
        assert!(!can_peng(&hand, simple(Suit::Coins, 4)));
    }

    #[test]
    fn ming_gang_requires_three() {
        let hand = vec![
            tile(0, simple(Suit::Coins, 3)),
            tile(1, simple(Suit::Coins, 3)),
            tile(2, simple(Suit::Coins, 3)),
        ];
        assert!(can_ming_gang(&hand, simple(Suit::Coins, 3)));
    }

    #[test]
    fn an_gang_needs_all_four_across_hand_and_drawn() {
        let hand = vec![
            tile(0, simple(Suit::Coins, 3)),
            tile(1, simple(Suit::Coins, 3)),
            tile(2, simple(Suit::Coins, 3)),
        ];
        let drawn = tile(3, simple(Suit::Coins, 3));
        assert_eq!(can_an_gang(&hand, Some(drawn)), vec![simple(Suit::Coins, 3)]);
        assert_eq!(can_an_gang(&hand, None), Vec::<Kind>::new());
    }

    #[test]
    fn chi_options_enumerates_all_three_shapes() {
        let hand = vec![
            tile(0, simple(Suit::Coins, 3)),
            tile(1, simple(Suit::Coins, 4)),
            tile(2, simple(Suit::Coins, 6)),
            tile(3, simple(Suit::Coins, 7)),
        ];
        let claimed = tile(4, simple(Suit::Coins, 5));

        let options = chi_options(&hand, claimed);
        // 3-4 forms 3-4-5, 6-7 forms 5-6-7. No 4-6 pair in hand so only two options.
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn canonical_run_places_claimed_tile_in_sequence() {
        let hand_tiles = [tile(0, simple(Suit::Coins, 3)), tile(1, simple(Suit::Coins, 4))];
        let claimed = tile(2, simple(Suit::Coins, 5));
        let ordered = canonical_run_order(hand_tiles, claimed);
        assert_eq!(
            ordered.map(|t| t.kind),
            [simple(Suit::Coins, 3), simple(Suit::Coins, 4), simple(Suit::Coins, 5)],
        );
    }

    #[test]
    fn check_win_standard_hand() {
        // Four runs in Coins (1-2-3, 4-5-6) plus melds elsewhere, and a pair.
        let mut id = 0u32;
        let mut next = |kind| {
            let t = tile(id, kind);
            id += 1;
            t
        };

        let hand = vec![
            next(simple(Suit::Coins, 1)),
            next(simple(Suit::Coins, 2)),
            next(simple(Suit::Coins, 3)),
            next(simple(Suit::Coins, 4)),
            next(simple(Suit::Coins, 5)),
            next(simple(Suit::Coins, 6)),
            next(simple(Suit::Bamboo, 9)),
            next(simple(Suit::Bamboo, 9)),
        ];

        let melds = vec![
            Meld::kezi(
                [
                    tile(100, simple(Suit::Characters, 1)),
                    tile(101, simple(Suit::Characters, 1)),
                    tile(102, simple(Suit::Characters, 1)),
                ],
                None,
            ),
            Meld::kezi(
                [
                    tile(110, Kind::Wind(Wind::East)),
                    tile(111, Kind::Wind(Wind::East)),
                    tile(112, Kind::Wind(Wind::East)),
                ],
                Some(ClaimedFrom {
                    seat: Wind::South,
                    tile: TileId::new(999),
                }),
            ),
        ];

        assert!(check_win(&hand, &melds));
    }

    #[test]
    fn check_win_rejects_incomplete_hand() {
        let hand = vec![tile(0, simple(Suit::Coins, 1)), tile(1, simple(Suit::Coins, 2))];
        assert!(!check_win(&hand, &[]));
    }

    #[test]
    fn remove_from_hand_fails_when_insufficient() {
        let mut hand = vec![tile(0, simple(Suit::Coins, 1))];
        let result = remove_from_hand(&mut hand, simple(Suit::Coins, 1), 2);
        assert!(result.is_err());
        assert_eq!(hand.len(), 1, "hand must be untouched on failure");
    }
}
