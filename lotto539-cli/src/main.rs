mod analysis;
mod display;
mod scrape;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::analysis::{compute_number_stats, compute_pair_stats, top_numbers, top_pair, window_at};
use crate::display::{
    display_backtest_summary, display_draws, display_number_stats, display_pair_stats,
    display_scrape_summary,
};
use lotto539_backtest::report::{format_numbers, render};
use lotto539_backtest::selector::DEFAULT_LOOKBACK;
use lotto539_backtest::simulator::{Totals, simulate};
use lotto539_backtest::strategy::{StrategyConfig, StrategyKind};
use lotto539_db::models::{DrawSequence, parse_date};
use lotto539_db::store::{data_path, load_draws};

const EMPTY_STORE: &str = "Base vide. Lancez d'abord : lotto539 scrape";

/// Une stratégie, ou `all` pour les quatre.
#[derive(Debug, Clone)]
struct StrategySet(Vec<StrategyKind>);

fn parse_strategy_set(raw: &str) -> Result<StrategySet, String> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(StrategySet(StrategyKind::ALL.to_vec()));
    }
    StrategyKind::from_str(raw, true).map(|kind| StrategySet(vec![kind]))
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| format!("{:#}", e))
}

#[derive(Parser)]
#[command(name = "lotto539", about = "Simulation de stratégies de mise Lotto 539")]
struct Cli {
    /// Fichier JSON des tirages
    #[arg(long, global = true, default_value_os_t = data_path())]
    data: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Afficher le chemin du fichier de données
    DataPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Afficher les fréquences des numéros et des paires
    Stats {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "30")]
        window: usize,

        /// Premier tirage de la fenêtre (YYYY/MM/DD), le plus récent par défaut
        #[arg(short, long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Nombre de paires à afficher
        #[arg(short, long, default_value = "20")]
        pairs: usize,
    },

    /// Rejouer une stratégie sur l'historique et écrire les rapports
    Backtest {
        /// Stratégie (top5, top5-strict, top2-pair, frequent-pair) ou all
        #[arg(short, long, default_value = "all", value_parser = parse_strategy_set)]
        strategy: StrategySet,

        /// Nombre de tirages de la fenêtre de fréquence
        #[arg(short, long, default_value_t = DEFAULT_LOOKBACK)]
        lookback: usize,

        /// Répertoire des rapports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },

    /// Récupérer les derniers tirages en ligne et mettre à jour le fichier
    Scrape {
        /// Nombre de pages à parcourir
        #[arg(short, long, default_value = "3")]
        pages: u32,

        /// Pause entre deux pages (ms)
        #[arg(long, default_value = "2000")]
        delay_ms: u64,

        /// Webhook Discord pour la notification
        #[arg(long, env = "DISCORD_WEBHOOK_URL")]
        webhook: Option<String>,

        /// Ne pas envoyer de notification
        #[arg(long)]
        no_notify: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = cli.data;

    match cli.command {
        Command::DataPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&path, last),
        Command::Stats { window, date, pairs } => cmd_stats(&path, window, date, pairs),
        Command::Backtest {
            strategy,
            lookback,
            output,
        } => cmd_backtest(&path, &strategy.0, lookback, &output),
        Command::Scrape {
            pages,
            delay_ms,
            webhook,
            no_notify,
        } => cmd_scrape(&path, pages, Duration::from_millis(delay_ms), webhook, no_notify),
    }
}

/// Fichier absent ou invalide : erreur. Fichier sans tirage : message et `None`.
fn load_non_empty(path: &Path) -> Result<Option<DrawSequence>> {
    let sequence = load_draws(path)?;
    if sequence.is_empty() {
        println!("{}", EMPTY_STORE);
        return Ok(None);
    }
    Ok(Some(sequence))
}

fn cmd_list(path: &Path, last: usize) -> Result<()> {
    let Some(sequence) = load_non_empty(path)? else {
        return Ok(());
    };
    let draws = sequence.newest_first();
    display_draws(&draws[..last.min(draws.len())]);
    Ok(())
}

fn cmd_stats(path: &Path, window: usize, date: Option<NaiveDate>, pairs: usize) -> Result<()> {
    let Some(sequence) = load_non_empty(path)? else {
        return Ok(());
    };
    let draws = sequence.newest_first();
    let (selected, title) = window_at(&draws, date, window);

    display_number_stats(&compute_number_stats(selected), &title);
    display_pair_stats(&compute_pair_stats(selected), pairs);

    println!("\nTop 5 : {}", format_numbers(&top_numbers(selected, 5)));
    if let Some((a, b)) = top_pair(selected) {
        println!("Paire la plus fréquente : {}", format_numbers(&[a, b]));
    }
    Ok(())
}

#[derive(Serialize)]
struct SummaryEntry<'a> {
    strategy: &'a StrategyConfig,
    totals: &'a Totals,
    report: String,
}

fn cmd_backtest(path: &Path, kinds: &[StrategyKind], lookback: usize, output: &Path) -> Result<()> {
    let Some(sequence) = load_non_empty(path)? else {
        return Ok(());
    };
    fs::create_dir_all(output)
        .with_context(|| format!("Impossible de créer le répertoire {}", output.display()))?;

    let mut rows = Vec::with_capacity(kinds.len());
    let mut report_files = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let config = kind.config(lookback);
        let backtest = simulate(&sequence, &config);

        let report_path = output.join(format!("{}.txt", kind.slug()));
        fs::write(&report_path, render(&config, &backtest))
            .with_context(|| format!("Impossible d'écrire {}", report_path.display()))?;
        log::info!("Rapport {} écrit dans {}", kind, report_path.display());

        report_files.push(report_path.display().to_string());
        rows.push((config, backtest.totals));
    }

    let summary: Vec<SummaryEntry> = rows
        .iter()
        .zip(report_files)
        .map(|((strategy, totals), report)| SummaryEntry {
            strategy,
            totals,
            report,
        })
        .collect();
    let summary_path = output.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Impossible d'écrire {}", summary_path.display()))?;

    display_backtest_summary(&rows);
    println!("\nRapports écrits dans {}", output.display());
    Ok(())
}

fn cmd_scrape(
    path: &Path,
    pages: u32,
    delay: Duration,
    webhook: Option<String>,
    no_notify: bool,
) -> Result<()> {
    let client = scrape::build_client()?;
    let scraped = scrape::scrape_recent(&client, pages, delay)?;
    if scraped.is_empty() {
        log::warn!("Aucun tirage récupéré");
    }

    let result = scrape::update_store(path, scraped)?;
    display_scrape_summary(&result);

    if no_notify {
        return Ok(());
    }
    match webhook {
        Some(url) => {
            if let Err(e) = scrape::notify(&client, &url, &result) {
                log::error!("Notification non envoyée : {:#}", e);
            }
        }
        None => log::warn!("DISCORD_WEBHOOK_URL non défini, notification ignorée"),
    }
    Ok(())
}
