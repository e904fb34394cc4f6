use serde::Serialize;

use crate::selector::Bet;

/// Barème fixe d'un jeu : coût d'une mise et gain par nombre de numéros trouvés.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutTable {
    pub name: &'static str,
    /// Nombre de numéros d'une mise valide pour ce barème.
    pub bet_size: usize,
    pub cost: u64,
    /// (numéros trouvés, gain), trié par numéros trouvés décroissants.
    pub prizes: Vec<(usize, u64)>,
}

impl PayoutTable {
    /// Lotto 539, mise de 5 numéros.
    pub fn lotto539() -> Self {
        Self {
            name: "Lotto 539",
            bet_size: 5,
            cost: 50,
            prizes: vec![(5, 8_000_000), (4, 20_000), (3, 300), (2, 50)],
        }
    }

    /// 39 Lotto, « deux numéros » (二合) : les deux numéros doivent sortir.
    pub fn pair() -> Self {
        Self {
            name: "39 Lotto (二合)",
            bet_size: 2,
            cost: 25,
            prizes: vec![(2, 1_125)],
        }
    }

    pub fn prize(&self, matches: usize, bet_size: usize) -> u64 {
        if bet_size != self.bet_size {
            return 0;
        }
        self.prizes
            .iter()
            .find(|(m, _)| *m == matches)
            .map(|(_, p)| *p)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub matches: Option<usize>,
    pub prize: u64,
    pub cost: u64,
}

impl Outcome {
    pub fn net_gain(&self) -> i64 {
        self.prize as i64 - self.cost as i64
    }
}

pub fn count_matches(bet: &[u8], winning: &[u8]) -> usize {
    bet.iter().filter(|n| winning.contains(n)).count()
}

/// Compare une mise au tirage. Sans mise : ni coût ni gain.
pub fn evaluate(bet: Option<&Bet>, winning: &[u8; 5], table: &PayoutTable) -> Outcome {
    match bet {
        None => Outcome {
            matches: None,
            prize: 0,
            cost: 0,
        },
        Some(bet) => {
            let matches = count_matches(bet.numbers(), winning);
            Outcome {
                matches: Some(matches),
                prize: table.prize(matches, bet.len()),
                cost: table.cost,
            }
        }
    }
}
