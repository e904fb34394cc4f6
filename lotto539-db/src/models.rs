use std::borrow::Cow;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const POOL_SIZE: u8 = 39;
pub const PICK_COUNT: usize = 5;
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Un tirage du Lotto 539. Les numéros gardent l'ordre de publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DrawRecord", into = "DrawRecord")]
pub struct Draw {
    pub date: NaiveDate,
    pub numbers: [u8; 5],
}

impl Draw {
    pub fn new(date: NaiveDate, numbers: [u8; 5]) -> Result<Self> {
        validate_numbers(&numbers)?;
        Ok(Self { date, numbers })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(chrono::NaiveTime::MIN)
    }

    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Forme JSON d'un tirage, telle que stockée dans `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DrawRecord {
    date: String,
    numbers: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl TryFrom<DrawRecord> for Draw {
    type Error = anyhow::Error;

    fn try_from(record: DrawRecord) -> Result<Self> {
        let date = parse_date(&record.date)?;
        let numbers: [u8; 5] = record
            .numbers
            .as_slice()
            .try_into()
            .with_context(|| {
                format!(
                    "Tirage du {} : {} numéros au lieu de {}",
                    record.date,
                    record.numbers.len(),
                    PICK_COUNT
                )
            })?;
        Draw::new(date, numbers).with_context(|| format!("Tirage du {}", record.date))
    }
}

impl From<Draw> for DrawRecord {
    fn from(draw: Draw) -> Self {
        DrawRecord {
            date: draw.date_label(),
            numbers: draw.numbers.to_vec(),
            timestamp: Some(draw.timestamp().format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

pub fn validate_numbers(numbers: &[u8]) -> Result<()> {
    if numbers.len() != PICK_COUNT {
        bail!("Attendu {} numéros, reçu {}", PICK_COUNT, numbers.len());
    }
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            bail!("Numéro {} hors limites (1-{})", n, POOL_SIZE);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrder {
    NewestFirst,
    OldestFirst,
}

/// Suite de tirages dont l'ordre est explicite.
/// Le fichier JSON est persisté en `NewestFirst`.
#[derive(Debug, Clone)]
pub struct DrawSequence {
    draws: Vec<Draw>,
    order: DrawOrder,
}

impl DrawSequence {
    pub fn new(draws: Vec<Draw>, order: DrawOrder) -> Self {
        let sequence = Self { draws, order };
        if !sequence.is_consistent() {
            log::warn!("Les tirages ne respectent pas l'ordre déclaré ({:?})", order);
        }
        sequence
    }

    pub fn order(&self) -> DrawOrder {
        self.order
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn into_draws(self) -> Vec<Draw> {
        self.draws
    }

    /// Inverse la suite et l'ordre déclaré.
    pub fn reversed(mut self) -> Self {
        self.draws.reverse();
        self.order = match self.order {
            DrawOrder::NewestFirst => DrawOrder::OldestFirst,
            DrawOrder::OldestFirst => DrawOrder::NewestFirst,
        };
        self
    }

    /// Vue `draws[0]` = tirage le plus récent, quel que soit l'ordre stocké.
    pub fn newest_first(&self) -> Cow<'_, [Draw]> {
        match self.order {
            DrawOrder::NewestFirst => Cow::Borrowed(&self.draws),
            DrawOrder::OldestFirst => Cow::Owned(self.draws.iter().rev().cloned().collect()),
        }
    }

    fn is_consistent(&self) -> bool {
        self.draws.windows(2).all(|w| match self.order {
            DrawOrder::NewestFirst => w[0].date >= w[1].date,
            DrawOrder::OldestFirst => w[0].date <= w[1].date,
        })
    }
}

/// Tirages de test, du plus récent au plus ancien, à partir du 2025/01/31.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let latest = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap_or_default();
    (0..n)
        .map(|i| {
            let base = (i % 7) as u8;
            Draw {
                date: latest - chrono::Days::new(i as u64),
                numbers: [
                    base * 5 + 1,
                    base * 5 + 2,
                    base * 5 + 3,
                    base * 5 + 4,
                    (base * 5 + 9) % POOL_SIZE + 1,
                ],
            }
        })
        .collect()
}
