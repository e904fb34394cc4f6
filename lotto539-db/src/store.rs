use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Draw, DrawOrder, DrawSequence};

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<NaiveDateTime>,
    #[serde(default)]
    total_records: usize,
    data: Vec<Draw>,
}

pub fn data_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lottery_data.json");
    path
}

/// Charge le fichier JSON. Les tirages sont déclarés `NewestFirst`.
pub fn load_draws(path: &Path) -> Result<DrawSequence> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let file: StoreFile = serde_json::from_str(&json)
        .with_context(|| format!("Fichier de tirages invalide {:?}", path))?;
    log::debug!("{} tirages chargés depuis {:?}", file.data.len(), path);
    Ok(DrawSequence::new(file.data, DrawOrder::NewestFirst))
}

/// Comme `load_draws`, mais un fichier absent donne une suite vide.
pub fn load_draws_or_empty(path: &Path) -> Result<DrawSequence> {
    if path.exists() {
        load_draws(path)
    } else {
        log::info!("Aucun fichier {:?}, démarrage avec une base vide", path);
        Ok(DrawSequence::new(Vec::new(), DrawOrder::NewestFirst))
    }
}

pub fn save_draws(path: &Path, draws: &[Draw]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let file = StoreFile {
        last_updated: Some(Local::now().naive_local()),
        total_records: draws.len(),
        data: draws.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    log::info!("{} tirages sauvegardés dans {:?}", draws.len(), path);
    Ok(())
}

#[derive(Debug)]
pub struct MergeResult {
    pub draws: Vec<Draw>,
    pub inserted: usize,
    pub skipped: usize,
}

/// Ajoute les tirages dont la date est inconnue, puis trie du plus récent au plus ancien.
pub fn merge_draws(existing: Vec<Draw>, incoming: Vec<Draw>) -> MergeResult {
    let mut known: HashSet<_> = existing.iter().map(|d| d.date).collect();
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    let mut skipped = 0;

    for draw in incoming {
        if known.insert(draw.date) {
            merged.push(draw);
        } else {
            skipped += 1;
        }
    }
    let inserted = merged.len();
    merged.extend(existing);
    merged.sort_by(|a, b| b.date.cmp(&a.date));

    MergeResult {
        draws: merged,
        inserted,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draws;
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lotto539_{}_{}.json", name, std::process::id()))
    }

    fn draw(y: i32, m: u32, d: u32, numbers: [u8; 5]) -> Draw {
        Draw::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), numbers).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save_load");
        let draws = make_test_draws(5);
        save_draws(&path, &draws).unwrap();

        let loaded = load_draws(&path).unwrap();
        assert_eq!(loaded.order(), DrawOrder::NewestFirst);
        assert_eq!(loaded.draws(), draws.as_slice());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["total_records"], 5);
        assert!(raw["last_updated"].is_string());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = temp_path("missing");
        assert!(load_draws(&path).is_err());
        assert!(load_draws_or_empty(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let path = temp_path("malformed");
        std::fs::write(&path, r#"{"data":[{"date":"2025/01/05","numbers":[1,2,3]}]}"#).unwrap();
        assert!(load_draws(&path).is_err());
        std::fs::write(&path, "pas du json").unwrap();
        assert!(load_draws(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_minimal_document() {
        let path = temp_path("minimal");
        std::fs::write(
            &path,
            r#"{"data":[{"date":"2025/01/05","numbers":[1,2,3,4,5]},{"date":"2025/01/04","numbers":[1,2,6,7,8]}]}"#,
        )
        .unwrap();
        let seq = load_draws(&path).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.draws()[1].numbers, [1, 2, 6, 7, 8]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_merge_deduplicates_by_date() {
        let existing = vec![draw(2025, 1, 4, [1, 2, 3, 4, 5]), draw(2025, 1, 3, [6, 7, 8, 9, 10])];
        let incoming = vec![
            draw(2025, 1, 6, [11, 12, 13, 14, 15]),
            draw(2025, 1, 4, [31, 32, 33, 34, 35]),
            draw(2025, 1, 5, [16, 17, 18, 19, 20]),
        ];
        let result = merge_draws(existing, incoming);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);

        let dates: Vec<String> = result.draws.iter().map(|d| d.date_label()).collect();
        assert_eq!(dates, vec!["2025/01/06", "2025/01/05", "2025/01/04", "2025/01/03"]);
        // l'existant gagne sur le doublon
        assert_eq!(result.draws[2].numbers, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_merge_ignores_duplicates_within_incoming() {
        let incoming = vec![draw(2025, 1, 6, [1, 2, 3, 4, 5]), draw(2025, 1, 6, [1, 2, 3, 4, 5])];
        let result = merge_draws(Vec::new(), incoming);
        assert_eq!(result.inserted, 1);
        assert_eq!(result.draws.len(), 1);
    }
}
