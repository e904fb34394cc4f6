use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use serde::Serialize;

use lotto539_db::models::{Draw, parse_date};
use lotto539_db::store::{load_draws_or_empty, merge_draws, save_draws};

pub const BASE_URL: &str = "https://www.pilio.idv.tw/lto539/list539BIG.asp";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const TIMEOUT: Duration = Duration::from_secs(10);
const WEEKDAYS: [char; 7] = ['一', '二', '三', '四', '五', '六', '日'];

pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Impossible de créer le client HTTP")
}

pub fn fetch_page(client: &Client, page: u32) -> Result<String> {
    let response = client
        .get(BASE_URL)
        .query(&[("indexpage", page.to_string()), ("orderby", "new".to_string())])
        .send()
        .with_context(|| format!("Échec de la requête page {}", page))?
        .error_for_status()
        .with_context(|| format!("Réponse en erreur page {}", page))?;
    // la page est servie en UTF-8 quel que soit l'en-tête
    let bytes = response.bytes()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Texte visible : balises supprimées, entités courantes décodées.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRecord {
    date: String,
    numbers: Vec<u8>,
}

fn take_digits(chars: &[char], pos: usize, min: usize, max: usize) -> Option<(u32, usize)> {
    let len = chars[pos.min(chars.len())..]
        .iter()
        .take(max)
        .take_while(|c| c.is_ascii_digit())
        .count();
    if len < min {
        return None;
    }
    let value = chars[pos..pos + len]
        .iter()
        .fold(0u32, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0));
    Some((value, pos + len))
}

fn skip_whitespace(chars: &[char], mut pos: usize) -> (usize, usize) {
    let mut newlines = 0;
    while pos < chars.len() && chars[pos].is_whitespace() {
        if chars[pos] == '\n' {
            newlines += 1;
        }
        pos += 1;
    }
    (pos, newlines)
}

fn eat(chars: &[char], pos: usize, c: char) -> Option<usize> {
    (chars.get(pos) == Some(&c)).then_some(pos + 1)
}

/// `YYYY/MM/DD[(週)]`, une ligne vide, puis 5 numéros séparés par des virgules.
fn match_record(chars: &[char], start: usize) -> Option<(RawRecord, usize)> {
    let (_, pos) = take_digits(chars, start, 4, 4)?;
    let pos = eat(chars, pos, '/')?;
    let (_, pos) = take_digits(chars, pos, 2, 2)?;
    let pos = eat(chars, pos, '/')?;
    let (_, mut pos) = take_digits(chars, pos, 2, 2)?;
    let date: String = chars[start..pos].iter().collect();

    if chars.get(pos) == Some(&'(')
        && chars.get(pos + 1).is_some_and(|c| WEEKDAYS.contains(c))
        && chars.get(pos + 2) == Some(&')')
    {
        pos += 3;
    }

    let (mut pos, newlines) = skip_whitespace(chars, pos);
    if newlines < 2 {
        return None;
    }

    let mut numbers = Vec::with_capacity(5);
    for i in 0..5 {
        if i > 0 {
            pos = eat(chars, pos, ',')?;
            pos = skip_whitespace(chars, pos).0;
        }
        let (n, next) = take_digits(chars, pos, 1, 2)?;
        numbers.push(n as u8);
        pos = next;
    }

    Some((RawRecord { date, numbers }, pos))
}

fn find_records(text: &str) -> Vec<RawRecord> {
    let chars: Vec<char> = text.chars().collect();
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        match match_record(&chars, pos) {
            Some((record, end)) => {
                records.push(record);
                pos = end;
            }
            None => pos += 1,
        }
    }
    records
}

/// Extrait les tirages d'une page. Les enregistrements invalides sont ignorés.
pub fn parse_draws(html: &str) -> Vec<Draw> {
    find_records(&html_to_text(html))
        .into_iter()
        .filter_map(|record| {
            let parsed = parse_date(&record.date).and_then(|date| {
                let numbers = <[u8; 5]>::try_from(record.numbers.as_slice())
                    .context("nombre de numéros invalide")?;
                Draw::new(date, numbers)
            });
            match parsed {
                Ok(draw) => Some(draw),
                Err(e) => {
                    log::warn!("Tirage ignoré ({} {:?}) : {:#}", record.date, record.numbers, e);
                    None
                }
            }
        })
        .collect()
}

/// Récupère les `pages` premières pages, du plus récent au plus ancien.
pub fn scrape_recent(client: &Client, pages: u32, delay: Duration) -> Result<Vec<Draw>> {
    let pb = ProgressBar::new(pages as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut draws = Vec::new();
    for page in 1..=pages {
        pb.set_message(format!("page {}", page));
        match fetch_page(client, page) {
            Ok(html) => {
                let found = parse_draws(&html);
                log::info!("Page {} : {} tirages", page, found.len());
                draws.extend(found);
            }
            Err(e) => log::warn!("Page {} ignorée : {:#}", page, e),
        }
        pb.inc(1);
        if page < pages {
            thread::sleep(delay);
        }
    }
    pb.finish_with_message("Récupération terminée");

    draws.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(draws)
}

#[derive(Debug)]
pub struct ScrapeResult {
    pub existing: usize,
    pub scraped: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub total: usize,
    pub latest: Option<Draw>,
}

/// Charge la base, ajoute les nouveaux tirages et sauvegarde.
pub fn update_store(path: &Path, scraped: Vec<Draw>) -> Result<ScrapeResult> {
    let existing = load_draws_or_empty(path)?.into_draws();
    let existing_count = existing.len();
    let scraped_count = scraped.len();

    let merged = merge_draws(existing, scraped);
    save_draws(path, &merged.draws)?;

    Ok(ScrapeResult {
        existing: existing_count,
        scraped: scraped_count,
        inserted: merged.inserted,
        skipped: merged.skipped,
        total: merged.draws.len(),
        latest: merged.draws.first().cloned(),
    })
}

#[derive(Debug, Serialize)]
struct WebhookMessage {
    content: String,
    username: &'static str,
}

fn notification_message(result: &ScrapeResult, latest: &Draw) -> WebhookMessage {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    WebhookMessage {
        content: format!(
            "✅ **Mise à jour Lotto 539 terminée**\n\n\
             📅 Dernier tirage : `{}`\n\
             📊 Tirages en base : **{}**\n\
             🆕 Nouveaux tirages : **{}**\n\
             🕐 Mise à jour : `{}`",
            latest.date_label(),
            result.total,
            result.inserted,
            now
        ),
        username: "Moniteur Lotto 539",
    }
}

/// Publie un résumé sur le webhook Discord.
pub fn notify(client: &Client, webhook_url: &str, result: &ScrapeResult) -> Result<()> {
    let Some(latest) = &result.latest else {
        log::warn!("Aucun tirage en base, pas de notification");
        return Ok(());
    };
    let response = client
        .post(webhook_url)
        .json(&notification_message(result, latest))
        .send()
        .context("Échec de l'envoi de la notification")?
        .error_for_status()
        .context("Notification refusée")?;
    log::info!("Notification envoyée (statut {})", response.status());
    Ok(())
}
