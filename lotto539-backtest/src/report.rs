use std::fmt::Write;

use itertools::Itertools;

use crate::simulator::{Backtest, Status};
use crate::strategy::StrategyConfig;

const TOP_BETS: usize = 10;

/// Montant avec séparateur de milliers : `-1234567` -> `-1,234,567`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "N/A".to_string(),
    }
}

pub fn format_numbers(numbers: &[u8]) -> String {
    format!("[{}]", numbers.iter().join(", "))
}

/// Rapport texte complet d'une simulation. Aucune écriture disque ici.
pub fn render(config: &StrategyConfig, backtest: &Backtest) -> String {
    let mut out = String::new();
    write_report(&mut out, config, backtest).ok();
    out
}

fn write_report(out: &mut String, config: &StrategyConfig, backtest: &Backtest) -> std::fmt::Result {
    let totals = &backtest.totals;
    let table = &config.payout;

    writeln!(out, "{}", config.title())?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Stratégie : {}", config.description())?;
    if let Some(note) = config.tie_note() {
        writeln!(out, "Optimisation : {}", note)?;
    }
    writeln!(out)?;

    writeln!(out, "Barème des gains :")?;
    for (matches, prize) in &table.prizes {
        writeln!(
            out,
            "  {} numéros trouvés sur {} : {}",
            matches,
            table.bet_size,
            format_amount(*prize as i64)
        )?;
    }
    writeln!(out, "  Coût d'une mise : {}", format_amount(table.cost as i64))?;
    writeln!(out)?;

    writeln!(out, "Répartition des résultats (mises jouées uniquement) :")?;
    for (matches, count) in backtest.match_histogram().iter().rev() {
        let prize = table.prize(*matches, table.bet_size);
        if prize > 0 {
            writeln!(
                out,
                "  {} numéros trouvés : {} fois, gain unitaire {}",
                matches,
                count,
                format_amount(prize as i64)
            )?;
        } else {
            writeln!(out, "  {} numéros trouvés : {} fois, sans gain", matches, count)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Bilan financier :")?;
    writeln!(out, "  Périodes analysées : {}", totals.periods)?;
    writeln!(out, "  Mises jouées : {}", totals.bets)?;
    if config.tie_note().is_some() {
        writeln!(out, "  Périodes sautées : {}", totals.skipped)?;
    }
    writeln!(out, "  Périodes gagnantes : {}", totals.wins)?;
    writeln!(out, "  Taux de gain : {}", format_percent(totals.win_rate()))?;
    if config.tie_note().is_some() {
        writeln!(out, "  Taux de mise : {}", format_percent(totals.bet_rate()))?;
    }
    writeln!(out, "  Coût total : {}", format_amount(totals.cost as i64))?;
    writeln!(out, "  Gains totaux : {}", format_amount(totals.winnings as i64))?;
    writeln!(out, "  Résultat net : {}", format_amount(totals.net()))?;
    writeln!(out, "  Retour sur investissement : {}", format_percent(totals.roi()))?;
    writeln!(out)?;

    let top_bets = backtest.top_bets(TOP_BETS);
    if !top_bets.is_empty() {
        writeln!(out, "Mises les plus jouées (top {}) :", TOP_BETS)?;
        for (i, stats) in top_bets.iter().enumerate() {
            writeln!(
                out,
                "  {:2}. {} : {} fois, {} gagnantes ({:.1}%)",
                i + 1,
                stats.bet,
                stats.count,
                stats.wins,
                stats.wins as f64 / stats.count as f64 * 100.0
            )?;
        }
        writeln!(out)?;
    }

    let monthly = backtest.monthly();
    if !monthly.is_empty() {
        writeln!(out, "Bilan mensuel :")?;
        writeln!(out, "  {:<8} {:>6} {:>9} {:>8} {:>12}", "Mois", "Mises", "Gagnantes", "Taux", "Net")?;
        for ((year, month), stats) in &monthly {
            writeln!(
                out,
                "  {:<8} {:>6} {:>9} {:>7.1}% {:>12}",
                format!("{}/{:02}", year, month),
                stats.bets,
                stats.wins,
                stats.wins as f64 / stats.bets as f64 * 100.0,
                format_amount(stats.net)
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Détail des mises :")?;
    writeln!(out, "{}", "-".repeat(60))?;
    for result in &backtest.results {
        writeln!(out, "Période {} ({})", result.period, result.date.format("%Y/%m/%d"))?;
        match (&result.bet, &result.status) {
            (Some(bet), _) => {
                writeln!(out, "  Mise : {}", bet)?;
                writeln!(out, "  Tirage : {}", format_numbers(&result.winning_numbers))?;
                writeln!(out, "  Numéros trouvés : {}", result.matches.unwrap_or(0))?;
                if result.is_win() {
                    writeln!(out, "  Gain : {} (gagnant)", format_amount(result.prize as i64))?;
                } else {
                    writeln!(out, "  Gain : 0")?;
                }
            }
            (None, status) => {
                let reason = match status {
                    Status::Skipped(reason) => reason.to_string(),
                    Status::Placed => String::new(),
                };
                writeln!(out, "  Mise : aucune (période sautée : {})", reason)?;
                writeln!(out, "  Tirage : {}", format_numbers(&result.winning_numbers))?;
                writeln!(out, "  Coût : 0")?;
                writeln!(out, "  Gain : 0")?;
            }
        }
        writeln!(out, "  Net : {}", format_amount(result.net_gain))?;
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::DEFAULT_LOOKBACK;
    use crate::simulator::simulate;
    use crate::strategy::StrategyKind;
    use chrono::NaiveDate;
    use lotto539_db::models::{Draw, DrawOrder, DrawSequence, make_test_draws};

    fn draw(d: u32, numbers: [u8; 5]) -> Draw {
        Draw::new(NaiveDate::from_ymd_opt(2025, 1, d).unwrap(), numbers).unwrap()
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(50), "50");
        assert_eq!(format_amount(1_125), "1,125");
        assert_eq!(format_amount(8_000_000), "8,000,000");
        assert_eq!(format_amount(-7_999_950), "-7,999,950");
        assert_eq!(format_amount(-100), "-100");
        assert_eq!(format_amount(123_456), "123,456");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(12.345)), "12.35%");
        assert_eq!(format_percent(None), "N/A");
    }

    #[test]
    fn test_render_pair_win() {
        let seq = DrawSequence::new(
            vec![draw(5, [1, 2, 3, 4, 5]), draw(4, [1, 2, 6, 7, 8])],
            DrawOrder::NewestFirst,
        );
        let config = StrategyKind::Top2Pair.config(DEFAULT_LOOKBACK);
        let report = render(&config, &simulate(&seq, &config));

        assert!(report.starts_with("39 Lotto (二合)"));
        assert!(report.contains("2 numéros trouvés sur 2 : 1,125"));
        assert!(report.contains("2 numéros trouvés : 1 fois, gain unitaire 1,125"));
        assert!(report.contains("Résultat net : 1,100"));
        assert!(report.contains("Retour sur investissement : 4400.00%"));
        assert!(report.contains("Période 1 (2025/01/04)"));
        assert!(report.contains("Mise : [1, 2]"));
        assert!(report.contains("Tirage : [1, 2, 6, 7, 8]"));
        assert!(!report.contains("Périodes sautées"));
    }

    #[test]
    fn test_render_empty_backtest_reports_not_applicable() {
        let seq = DrawSequence::new(vec![draw(5, [1, 2, 3, 4, 5])], DrawOrder::NewestFirst);
        let config = StrategyKind::Top5.config(DEFAULT_LOOKBACK);
        let report = render(&config, &simulate(&seq, &config));
        assert!(report.contains("Périodes analysées : 0"));
        assert!(report.contains("Taux de gain : N/A"));
        assert!(report.contains("Retour sur investissement : N/A"));
        assert!(!report.contains("Bilan mensuel"));
    }

    #[test]
    fn test_render_skip_reason() {
        let seq = DrawSequence::new(
            vec![draw(5, [1, 2, 3, 4, 5]), draw(4, [1, 2, 3, 4, 6]), draw(3, [1, 2, 3, 4, 7])],
            DrawOrder::NewestFirst,
        );
        let config = StrategyKind::Top5Strict.config(DEFAULT_LOOKBACK);
        let report = render(&config, &simulate(&seq, &config));
        assert!(report.contains("Optimisation :"));
        assert!(report.contains("Périodes sautées : 2"));
        assert!(report.contains("Taux de mise : 0.00%"));
        assert!(report.contains("Mise : aucune (période sautée : égalité"));
    }

    #[test]
    fn test_render_lists_every_period() {
        let seq = DrawSequence::new(make_test_draws(40), DrawOrder::NewestFirst);
        let config = StrategyKind::Top5.config(DEFAULT_LOOKBACK);
        let backtest = simulate(&seq, &config);
        let report = render(&config, &backtest);
        assert_eq!(report.matches("Période ").count(), backtest.results.len());
        assert!(report.contains("Bilan mensuel :"));
        assert!(report.contains("Mises les plus jouées"));
    }
}
