use std::collections::HashMap;
use std::hash::Hash;

use itertools::{Either, Itertools};
use serde::Serialize;

use lotto539_db::models::{Draw, DrawOrder};

pub const DEFAULT_LOOKBACK: usize = 30;

/// Mise candidate, numéros dans l'ordre du classement.
/// Une paire est stockée triée (a < b).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Bet(Vec<u8>);

impl Bet {
    pub fn new(numbers: Vec<u8>) -> Self {
        Self(numbers)
    }

    pub fn numbers(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Bet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    /// Les k numéros les plus fréquents.
    Numbers(usize),
    /// La paire de numéros sortie ensemble le plus souvent.
    Pair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TiePolicy {
    /// Égalités départagées par ordre de première apparition.
    FirstSeen,
    /// Pas de mise si la frontière du top-k est à égalité.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyWindow,
    NotEnoughCandidates { needed: usize, found: usize },
    TiedBoundary { count: u32 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyWindow => write!(f, "fenêtre vide"),
            SkipReason::NotEnoughCandidates { needed, found } => {
                write!(f, "{} candidats distincts au lieu de {}", found, needed)
            }
            SkipReason::TiedBoundary { count } => write!(
                f,
                "égalité à la frontière du classement ({} occurrences), sélection non unique",
                count
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Bet(Bet),
    Skip(SkipReason),
}

impl Selection {
    pub fn bet(&self) -> Option<&Bet> {
        match self {
            Selection::Bet(bet) => Some(bet),
            Selection::Skip(_) => None,
        }
    }
}

/// Tirages `[start, start + lookback)`, tronqués aux bornes de la suite.
pub fn window(draws: &[Draw], start: usize, lookback: usize) -> &[Draw] {
    let end = start.saturating_add(lookback).min(draws.len());
    &draws[start.min(end)..end]
}

/// Compte les éléments et les classe par fréquence décroissante.
/// À égalité, l'ordre de première apparition est conservé (tri stable).
pub fn rank_by_frequency<T, I>(items: I) -> Vec<(T, u32)>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, u32)> = Vec::new();

    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn number_frequencies<'a>(draws: impl IntoIterator<Item = &'a Draw>) -> Vec<(u8, u32)> {
    rank_by_frequency(draws.into_iter().flat_map(|d| d.numbers.iter().copied()))
}

/// Paires (a < b) issues des numéros triés de chaque tirage.
pub fn pair_frequencies<'a>(draws: impl IntoIterator<Item = &'a Draw>) -> Vec<((u8, u8), u32)> {
    rank_by_frequency(draws.into_iter().flat_map(|d| {
        let mut sorted = d.numbers;
        sorted.sort_unstable();
        sorted.into_iter().tuple_combinations::<(u8, u8)>()
    }))
}

fn top_k<T: Copy>(ranked: &[(T, u32)], k: usize, tie: TiePolicy) -> Result<Vec<T>, SkipReason> {
    if ranked.is_empty() {
        return Err(SkipReason::EmptyWindow);
    }
    if ranked.len() < k {
        return Err(SkipReason::NotEnoughCandidates {
            needed: k,
            found: ranked.len(),
        });
    }
    if tie == TiePolicy::Strict && k > 0 {
        if let Some(&(_, next)) = ranked.get(k) {
            let boundary = ranked[k - 1].1;
            if next == boundary {
                return Err(SkipReason::TiedBoundary { count: boundary });
            }
        }
    }
    Ok(ranked.iter().take(k).map(|(item, _)| *item).collect())
}

/// Choisit la mise à partir des tirages `[start, start + lookback)` de `draws`
/// (du plus récent au plus ancien). `count_order` fixe l'ordre de comptage,
/// donc le départage des égalités.
pub fn select(
    draws: &[Draw],
    start: usize,
    lookback: usize,
    target: Target,
    tie: TiePolicy,
    count_order: DrawOrder,
) -> Selection {
    let window = window(draws, start, lookback);
    let counted = match count_order {
        DrawOrder::NewestFirst => Either::Left(window.iter()),
        DrawOrder::OldestFirst => Either::Right(window.iter().rev()),
    };
    let picked = match target {
        Target::Numbers(k) => top_k(&number_frequencies(counted), k, tie).map(Bet::new),
        Target::Pair => top_k(&pair_frequencies(counted), 1, tie)
            .map(|pairs| Bet::new(pairs.into_iter().flat_map(|(a, b)| [a, b]).collect())),
    };
    match picked {
        Ok(bet) => Selection::Bet(bet),
        Err(reason) => Selection::Skip(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draw(d: u32, numbers: [u8; 5]) -> Draw {
        Draw::new(NaiveDate::from_ymd_opt(2025, 1, d).unwrap(), numbers).unwrap()
    }

    fn two_draws() -> Vec<Draw> {
        vec![draw(5, [1, 2, 3, 4, 5]), draw(4, [1, 2, 6, 7, 8])]
    }

    #[test]
    fn test_window_clipped() {
        let draws = two_draws();
        assert_eq!(window(&draws, 0, 30).len(), 2);
        assert_eq!(window(&draws, 1, 30).len(), 1);
        assert_eq!(window(&draws, 2, 30).len(), 0);
        assert_eq!(window(&draws, 5, 30).len(), 0);
        assert_eq!(window(&draws, 0, 1).len(), 1);
    }

    #[test]
    fn test_number_frequencies_first_seen_order() {
        let ranked = number_frequencies(&two_draws());
        assert_eq!(
            ranked,
            vec![(1, 2), (2, 2), (3, 1), (4, 1), (5, 1), (6, 1), (7, 1), (8, 1)]
        );
    }

    #[test]
    fn test_select_top5_two_draws() {
        let selection = select(&two_draws(), 0, DEFAULT_LOOKBACK, Target::Numbers(5), TiePolicy::FirstSeen, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Bet(Bet::new(vec![1, 2, 3, 4, 5])));
    }

    #[test]
    fn test_select_top2() {
        let selection = select(&two_draws(), 0, DEFAULT_LOOKBACK, Target::Numbers(2), TiePolicy::FirstSeen, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Bet(Bet::new(vec![1, 2])));
    }

    #[test]
    fn test_pair_frequencies() {
        let ranked = pair_frequencies(&two_draws());
        assert_eq!(ranked[0], ((1, 2), 2));
        assert!(ranked[1..].iter().all(|(_, c)| *c == 1));
        // 10 paires par tirage, (1,2) partagée
        assert_eq!(ranked.len(), 19);
    }

    #[test]
    fn test_pairs_built_from_sorted_numbers() {
        let draws = vec![draw(5, [9, 3, 7, 1, 5])];
        let ranked = pair_frequencies(&draws);
        assert_eq!(ranked[0].0, (1, 3));
        assert!(ranked.iter().all(|((a, b), _)| a < b));
    }

    #[test]
    fn test_select_pair_unique_top() {
        let selection = select(&two_draws(), 0, DEFAULT_LOOKBACK, Target::Pair, TiePolicy::Strict, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Bet(Bet::new(vec![1, 2])));
    }

    #[test]
    fn test_strict_skips_tied_boundary() {
        // 1..4 deux fois, 5 et 6 une fois : 5e et 6e à égalité
        let draws = vec![draw(5, [1, 2, 3, 4, 5]), draw(4, [1, 2, 3, 4, 6])];
        let selection = select(&draws, 0, DEFAULT_LOOKBACK, Target::Numbers(5), TiePolicy::Strict, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Skip(SkipReason::TiedBoundary { count: 1 }));

        let loose = select(&draws, 0, DEFAULT_LOOKBACK, Target::Numbers(5), TiePolicy::FirstSeen, DrawOrder::NewestFirst);
        assert_eq!(loose, Selection::Bet(Bet::new(vec![1, 2, 3, 4, 5])));
    }

    #[test]
    fn test_strict_accepts_ties_inside_top_k() {
        // 1..5 deux fois, le reste une fois : égalités internes seulement
        let draws = vec![
            draw(6, [1, 2, 3, 4, 5]),
            draw(5, [1, 2, 3, 4, 5]),
            draw(4, [6, 7, 8, 9, 10]),
        ];
        let selection = select(&draws, 0, DEFAULT_LOOKBACK, Target::Numbers(5), TiePolicy::Strict, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Bet(Bet::new(vec![1, 2, 3, 4, 5])));
    }

    #[test]
    fn test_strict_exactly_k_candidates() {
        let draws = vec![draw(5, [1, 2, 3, 4, 5])];
        let selection = select(&draws, 0, DEFAULT_LOOKBACK, Target::Numbers(5), TiePolicy::Strict, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Bet(Bet::new(vec![1, 2, 3, 4, 5])));
    }

    #[test]
    fn test_strict_pair_tie_skips() {
        let draws = vec![draw(5, [1, 2, 3, 4, 5])];
        let selection = select(&draws, 0, DEFAULT_LOOKBACK, Target::Pair, TiePolicy::Strict, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Skip(SkipReason::TiedBoundary { count: 1 }));
    }

    #[test]
    fn test_empty_window() {
        let draws = two_draws();
        let selection = select(&draws, 2, DEFAULT_LOOKBACK, Target::Numbers(5), TiePolicy::FirstSeen, DrawOrder::NewestFirst);
        assert_eq!(selection, Selection::Skip(SkipReason::EmptyWindow));
    }

    #[test]
    fn test_not_enough_candidates() {
        let draws = vec![draw(5, [1, 2, 3, 4, 5])];
        let selection = select(&draws, 0, DEFAULT_LOOKBACK, Target::Numbers(6), TiePolicy::FirstSeen, DrawOrder::NewestFirst);
        assert_eq!(
            selection,
            Selection::Skip(SkipReason::NotEnoughCandidates { needed: 6, found: 5 })
        );
    }

    #[test]
    fn test_count_order_breaks_ties() {
        // toutes les paires à égalité : la première rencontrée l'emporte
        let draws = vec![draw(5, [1, 2, 3, 4, 5]), draw(4, [10, 11, 12, 13, 14])];
        let newest = select(&draws, 0, 2, Target::Pair, TiePolicy::FirstSeen, DrawOrder::NewestFirst);
        assert_eq!(newest, Selection::Bet(Bet::new(vec![1, 2])));
        let oldest = select(&draws, 0, 2, Target::Pair, TiePolicy::FirstSeen, DrawOrder::OldestFirst);
        assert_eq!(oldest, Selection::Bet(Bet::new(vec![10, 11])));
    }

    #[test]
    fn test_bet_display() {
        assert_eq!(Bet::new(vec![12, 3, 39]).to_string(), "[12, 3, 39]");
    }
}
