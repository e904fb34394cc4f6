use serde::Serialize;

use lotto539_db::models::DrawOrder;

use crate::payout::PayoutTable;
use crate::selector::{DEFAULT_LOOKBACK, Target, TiePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindowPolicy {
    /// La fenêtre commence au tirage qui suit (plus récent) la période jouée
    /// et s'étend vers le passé ; tronquée en fin de suite.
    Overlapping,
    /// Uniquement les tirages strictement antérieurs à la période jouée,
    /// fenêtre toujours complète.
    StrictHistory,
}

impl WindowPolicy {
    /// Ordre de comptage de la fenêtre, qui départage les égalités.
    pub fn count_order(&self) -> DrawOrder {
        match self {
            WindowPolicy::Overlapping => DrawOrder::NewestFirst,
            WindowPolicy::StrictHistory => DrawOrder::OldestFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Top 5 des numéros les plus fréquents (Lotto 539)
    Top5,
    /// Top 5, uniquement quand le classement est sans ambiguïté
    Top5Strict,
    /// Top 2 des numéros joués en « deux numéros » (39 Lotto)
    Top2Pair,
    /// Paire la plus fréquente des tirages précédents (39 Lotto)
    FrequentPair,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Top5,
        StrategyKind::Top5Strict,
        StrategyKind::Top2Pair,
        StrategyKind::FrequentPair,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            StrategyKind::Top5 => "top5",
            StrategyKind::Top5Strict => "top5-strict",
            StrategyKind::Top2Pair => "top2-pair",
            StrategyKind::FrequentPair => "frequent-pair",
        }
    }

    pub fn config(self, lookback: usize) -> StrategyConfig {
        let (target, tie_policy, window, payout) = match self {
            StrategyKind::Top5 => (
                Target::Numbers(5),
                TiePolicy::FirstSeen,
                WindowPolicy::Overlapping,
                PayoutTable::lotto539(),
            ),
            StrategyKind::Top5Strict => (
                Target::Numbers(5),
                TiePolicy::Strict,
                WindowPolicy::Overlapping,
                PayoutTable::lotto539(),
            ),
            StrategyKind::Top2Pair => (
                Target::Numbers(2),
                TiePolicy::FirstSeen,
                WindowPolicy::Overlapping,
                PayoutTable::pair(),
            ),
            StrategyKind::FrequentPair => (
                Target::Pair,
                TiePolicy::FirstSeen,
                WindowPolicy::StrictHistory,
                PayoutTable::pair(),
            ),
        };
        StrategyConfig {
            kind: self,
            target,
            lookback,
            tie_policy,
            window,
            payout,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub target: Target,
    pub lookback: usize,
    pub tie_policy: TiePolicy,
    pub window: WindowPolicy,
    pub payout: PayoutTable,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyKind::Top5.config(DEFAULT_LOOKBACK)
    }
}

impl StrategyConfig {
    pub fn title(&self) -> String {
        match self.tie_policy {
            TiePolicy::FirstSeen => format!("{} : rapport de simulation des mises", self.payout.name),
            TiePolicy::Strict => format!(
                "{} : rapport de simulation des mises (version optimisée)",
                self.payout.name
            ),
        }
    }

    pub fn description(&self) -> String {
        let source = match self.window {
            WindowPolicy::Overlapping => format!("des {} derniers tirages à partir de la période précédente", self.lookback),
            WindowPolicy::StrictHistory => format!("des {} tirages précédant la période jouée", self.lookback),
        };
        match self.target {
            Target::Numbers(k) => format!("jouer les {} numéros les plus fréquents {}", k, source),
            Target::Pair => format!("jouer la paire sortie le plus souvent ensemble {}", source),
        }
    }

    pub fn tie_note(&self) -> Option<&'static str> {
        match self.tie_policy {
            TiePolicy::Strict => Some("mise uniquement lorsque le classement est unique, sinon la période est sautée"),
            TiePolicy::FirstSeen => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let top5 = StrategyKind::Top5.config(30);
        assert_eq!(top5.target, Target::Numbers(5));
        assert_eq!(top5.payout.cost, 50);

        let strict = StrategyKind::Top5Strict.config(30);
        assert_eq!(strict.tie_policy, TiePolicy::Strict);

        let top2 = StrategyKind::Top2Pair.config(30);
        assert_eq!(top2.target, Target::Numbers(2));
        assert_eq!(top2.payout, PayoutTable::pair());

        let pair = StrategyKind::FrequentPair.config(30);
        assert_eq!(pair.target, Target::Pair);
        assert_eq!(pair.window, WindowPolicy::StrictHistory);
    }

    #[test]
    fn test_bet_size_matches_payout_table() {
        for kind in StrategyKind::ALL {
            let config = kind.config(30);
            let bet_size = match config.target {
                Target::Numbers(k) => k,
                Target::Pair => 2,
            };
            assert_eq!(bet_size, config.payout.bet_size, "{}", kind);
        }
    }

    #[test]
    fn test_default_config() {
        let config = StrategyConfig::default();
        assert_eq!(config.kind, StrategyKind::Top5);
        assert_eq!(config.lookback, DEFAULT_LOOKBACK);
    }

    #[test]
    fn test_description_mentions_lookback() {
        assert!(StrategyKind::FrequentPair.config(20).description().contains("20"));
    }
}
