use chrono::NaiveDate;
use itertools::Itertools;

use lotto539_db::models::{Draw, POOL_SIZE};

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub count: u32,
    /// Part des tirages contenant le numéro, en pourcentage.
    pub percentage: f64,
    /// Tirages écoulés depuis la dernière sortie.
    pub gap: u32,
}

#[derive(Debug, Clone)]
pub struct PairStats {
    pub pair: (u8, u8),
    pub count: u32,
    pub percentage: f64,
}

fn percentage(count: u32, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Statistiques des numéros 1..=39, par fréquence décroissante.
/// `draws[0]` = tirage le plus récent.
pub fn compute_number_stats(draws: &[Draw]) -> Vec<NumberStats> {
    let mut stats: Vec<NumberStats> = (1..=POOL_SIZE)
        .map(|n| NumberStats {
            number: n,
            count: 0,
            percentage: 0.0,
            gap: draws.len() as u32,
        })
        .collect();

    for (i, draw) in draws.iter().enumerate() {
        for &n in &draw.numbers {
            let Some(stat) = n.checked_sub(1).and_then(|i| stats.get_mut(i as usize)) else {
                log::warn!("Numéro hors plage ignoré : {} ({})", n, draw.date_label());
                continue;
            };
            if stat.count == 0 {
                stat.gap = i as u32;
            }
            stat.count += 1;
        }
    }

    for stat in &mut stats {
        stat.percentage = percentage(stat.count, draws.len());
    }
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Statistiques des 741 paires possibles, par fréquence décroissante.
pub fn compute_pair_stats(draws: &[Draw]) -> Vec<PairStats> {
    let pairs: Vec<(u8, u8)> = (1..=POOL_SIZE).tuple_combinations().collect();
    let mut counts = vec![0u32; pairs.len()];

    for draw in draws {
        let mut sorted = draw.numbers;
        sorted.sort_unstable();
        for (a, b) in sorted.into_iter().tuple_combinations::<(u8, u8)>() {
            if let Ok(idx) = pairs.binary_search(&(a, b)) {
                counts[idx] += 1;
            }
        }
    }

    let mut stats: Vec<PairStats> = pairs
        .into_iter()
        .zip(counts)
        .map(|(pair, count)| PairStats {
            pair,
            count,
            percentage: percentage(count, draws.len()),
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Fenêtre de `lookback` tirages à partir de `date` (incluse), en remontant le temps.
/// Date absente ou inconnue : les `lookback` tirages les plus récents.
pub fn window_at(draws: &[Draw], date: Option<NaiveDate>, lookback: usize) -> (&[Draw], String) {
    if let Some(date) = date {
        if let Some(start) = draws.iter().position(|d| d.date == date) {
            let end = start.saturating_add(lookback).min(draws.len());
            let title = format!("{} et {} tirages précédents", date.format("%Y/%m/%d"), lookback);
            return (&draws[start..end], title);
        }
        log::warn!("Date {} absente de la base, utilisation des derniers tirages", date);
    }
    let end = lookback.min(draws.len());
    (&draws[..end], format!("{} derniers tirages", lookback))
}

pub fn top_numbers(draws: &[Draw], count: usize) -> Vec<u8> {
    compute_number_stats(draws)
        .into_iter()
        .take(count)
        .map(|s| s.number)
        .collect()
}

pub fn top_pair(draws: &[Draw]) -> Option<(u8, u8)> {
    compute_pair_stats(draws)
        .first()
        .filter(|s| s.count > 0)
        .map(|s| s.pair)
}
