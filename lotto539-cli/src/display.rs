use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use itertools::Itertools;

use crate::analysis::{NumberStats, PairStats};
use crate::scrape::ScrapeResult;
use lotto539_backtest::report::{format_amount, format_percent};
use lotto539_backtest::simulator::Totals;
use lotto539_backtest::strategy::StrategyConfig;
use lotto539_db::models::Draw;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Numéros"]);
    for draw in draws {
        let mut sorted = draw.numbers;
        sorted.sort_unstable();
        let numbers = sorted.iter().map(|n| format!("{:2}", n)).join(" - ");
        table.add_row(vec![draw.date_label(), numbers]);
    }
    println!("{table}");
}

pub fn display_number_stats(stats: &[NumberStats], title: &str) {
    println!("\n📊 Fréquence des numéros : {}\n", title);

    let mut table = new_table(vec!["Rang", "Numéro", "Sorties", "% des tirages", "Retard"]);
    for (i, stat) in stats.iter().enumerate() {
        let number = Cell::new(format!("{:2}", stat.number));
        table.add_row(vec![
            Cell::new(i + 1),
            if i < 5 { number.fg(Color::Green) } else { number },
            Cell::new(stat.count),
            Cell::new(format!("{:.2}%", stat.percentage)),
            Cell::new(stat.gap),
        ]);
    }
    println!("{table}");
}

pub fn display_pair_stats(stats: &[PairStats], limit: usize) {
    println!("\n── Paires les plus fréquentes (top {}) ──", limit);

    let mut table = new_table(vec!["Rang", "Paire", "Sorties", "% des tirages"]);
    for (i, stat) in stats.iter().take(limit).enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:02} - {:02}", stat.pair.0, stat.pair.1),
            stat.count.to_string(),
            format!("{:.2}%", stat.percentage),
        ]);
    }
    println!("{table}");
}

pub fn display_backtest_summary(rows: &[(StrategyConfig, Totals)]) {
    println!("\n🎯 Bilan des simulations\n");

    let mut table = new_table(vec![
        "Stratégie", "Fenêtre", "Périodes", "Mises", "Gagnantes", "Taux", "Coût", "Gains", "Net", "ROI",
    ]);
    for (config, totals) in rows {
        let net = totals.net();
        let color = if net >= 0 { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new(config.kind.slug()),
            Cell::new(config.lookback),
            Cell::new(totals.periods),
            Cell::new(totals.bets),
            Cell::new(totals.wins),
            Cell::new(format_percent(totals.win_rate())),
            Cell::new(format_amount(totals.cost as i64)),
            Cell::new(format_amount(totals.winnings as i64)),
            Cell::new(format_amount(net)).fg(color),
            Cell::new(format_percent(totals.roi())).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_scrape_summary(result: &ScrapeResult) {
    println!("Mise à jour terminée :");
    println!("  Tirages en base avant : {}", result.existing);
    println!("  Tirages récupérés     : {}", result.scraped);
    println!("  Insérés               : {}", result.inserted);
    println!("  Doublons ignorés      : {}", result.skipped);
    println!("  Total en base         : {}", result.total);
    if let Some(latest) = &result.latest {
        println!("  Dernier tirage        : {}", latest.date_label());
    }
}
