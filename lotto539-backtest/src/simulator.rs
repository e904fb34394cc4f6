use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use lotto539_db::models::{Draw, DrawSequence};

use crate::payout::evaluate;
use crate::selector::{Bet, Selection, SkipReason, rank_by_frequency, select};
use crate::strategy::{StrategyConfig, WindowPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Placed,
    Skipped(SkipReason),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Placed => write!(f, "mise jouée"),
            Status::Skipped(reason) => write!(f, "mise sautée : {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodResult {
    /// Rang chronologique du tirage joué (1 = le plus ancien).
    pub period: usize,
    pub date: NaiveDate,
    pub bet: Option<Bet>,
    pub winning_numbers: [u8; 5],
    pub matches: Option<usize>,
    pub prize: u64,
    pub cost: u64,
    pub net_gain: i64,
    pub status: Status,
}

impl PeriodResult {
    pub fn is_win(&self) -> bool {
        self.prize > 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub periods: usize,
    pub bets: usize,
    pub skipped: usize,
    pub wins: usize,
    pub cost: u64,
    pub winnings: u64,
}

impl Totals {
    fn record(&mut self, result: &PeriodResult) {
        self.periods += 1;
        match result.status {
            Status::Placed => self.bets += 1,
            Status::Skipped(_) => self.skipped += 1,
        }
        if result.is_win() {
            self.wins += 1;
        }
        self.cost += result.cost;
        self.winnings += result.prize;
    }

    pub fn net(&self) -> i64 {
        self.winnings as i64 - self.cost as i64
    }

    /// ROI en pourcentage, `None` sans mise.
    pub fn roi(&self) -> Option<f64> {
        (self.cost > 0).then(|| self.net() as f64 / self.cost as f64 * 100.0)
    }

    /// Périodes gagnantes sur mises jouées, en pourcentage.
    pub fn win_rate(&self) -> Option<f64> {
        (self.bets > 0).then(|| self.wins as f64 / self.bets as f64 * 100.0)
    }

    /// Mises jouées sur périodes analysées, en pourcentage.
    pub fn bet_rate(&self) -> Option<f64> {
        (self.periods > 0).then(|| self.bets as f64 / self.periods as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetStats {
    pub bet: Bet,
    pub count: usize,
    pub wins: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthStats {
    pub bets: usize,
    pub wins: usize,
    pub net: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backtest {
    /// Du tirage joué le plus récent au plus ancien.
    pub results: Vec<PeriodResult>,
    pub totals: Totals,
}

impl Backtest {
    /// Nombre de numéros trouvés -> nombre de mises, mises jouées uniquement.
    pub fn match_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for matches in self.results.iter().filter_map(|r| r.matches) {
            *histogram.entry(matches).or_insert(0) += 1;
        }
        histogram
    }

    /// Mises les plus jouées, par nombre décroissant ; à égalité, la première
    /// jouée dans l'ordre chronologique passe devant.
    pub fn top_bets(&self, limit: usize) -> Vec<BetStats> {
        let placed = self
            .results
            .iter()
            .rev()
            .filter_map(|r| r.bet.as_ref().map(|bet| (bet, r.is_win())));

        let mut wins: HashMap<&Bet, usize> = HashMap::new();
        for (bet, won) in placed.clone() {
            if won {
                *wins.entry(bet).or_insert(0) += 1;
            }
        }

        rank_by_frequency(placed.map(|(bet, _)| bet))
            .into_iter()
            .take(limit)
            .map(|(bet, count)| BetStats {
                bet: bet.clone(),
                count: count as usize,
                wins: wins.get(bet).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Bilan par mois `(année, mois)`, mises jouées uniquement.
    pub fn monthly(&self) -> BTreeMap<(i32, u32), MonthStats> {
        let mut months: BTreeMap<(i32, u32), MonthStats> = BTreeMap::new();
        for result in self.results.iter().filter(|r| r.status == Status::Placed) {
            let month = months.entry((result.date.year(), result.date.month())).or_default();
            month.bets += 1;
            if result.is_win() {
                month.wins += 1;
            }
            month.net += result.net_gain;
        }
        months
    }
}

/// Indices (dans la vue du plus récent au plus ancien) des tirages joués
/// et début de la fenêtre correspondante.
fn evaluable_periods(len: usize, lookback: usize, window: WindowPolicy) -> Vec<(usize, usize)> {
    match window {
        WindowPolicy::Overlapping => (1..len).map(|i| (i, i - 1)).collect(),
        WindowPolicy::StrictHistory => (0..len)
            .take_while(|i| i + lookback < len)
            .map(|i| (i, i + 1))
            .collect(),
    }
}

fn play_period(draws: &[Draw], index: usize, start: usize, config: &StrategyConfig) -> PeriodResult {
    let draw = &draws[index];
    let selection = select(
        draws,
        start,
        config.lookback,
        config.target,
        config.tie_policy,
        config.window.count_order(),
    );
    let outcome = evaluate(selection.bet(), &draw.numbers, &config.payout);
    let status = match &selection {
        Selection::Bet(_) => Status::Placed,
        Selection::Skip(reason) => Status::Skipped(reason.clone()),
    };

    PeriodResult {
        period: draws.len() - index,
        date: draw.date,
        bet: selection.bet().cloned(),
        winning_numbers: draw.numbers,
        matches: outcome.matches,
        prize: outcome.prize,
        cost: outcome.cost,
        net_gain: outcome.net_gain(),
        status,
    }
}

/// Rejoue la stratégie sur toute la suite. Déterministe.
pub fn simulate(sequence: &DrawSequence, config: &StrategyConfig) -> Backtest {
    let draws = sequence.newest_first();
    let mut results = Vec::new();
    let mut totals = Totals::default();

    for (index, start) in evaluable_periods(draws.len(), config.lookback, config.window) {
        let result = play_period(&draws, index, start, config);
        if let Status::Skipped(reason) = &result.status {
            log::debug!("Période {} sautée : {}", result.period, reason);
        }
        totals.record(&result);
        results.push(result);
    }

    log::info!(
        "{} : {} périodes, {} mises, net {}",
        config.kind,
        totals.periods,
        totals.bets,
        totals.net()
    );

    Backtest { results, totals }
}
