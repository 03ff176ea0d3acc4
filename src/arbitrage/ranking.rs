//! Ordering and cutoffs for finished opportunity lists.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::calculator::ArbitrageOpportunity;

/// How a finished opportunity list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RankingStrategy {
    /// Highest profit first; ties keep discovery order.
    #[default]
    ProfitDescending,
    /// Earliest start first; unknown start times last.
    DateAscending,
}

impl RankingStrategy {
    /// Compare two opportunities under this strategy.
    pub fn compare(&self, a: &ArbitrageOpportunity, b: &ArbitrageOpportunity) -> Ordering {
        match self {
            RankingStrategy::ProfitDescending => b.profit.cmp(&a.profit),
            RankingStrategy::DateAscending => match (a.commence_time, b.commence_time) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// Stable sort in place.
pub fn rank(opportunities: &mut [ArbitrageOpportunity], strategy: RankingStrategy) {
    opportunities.sort_by(|a, b| strategy.compare(a, b));
}

/// Keep opportunities with `profit >= min_profit`. Order is preserved.
pub fn apply_min_profit(
    opportunities: Vec<ArbitrageOpportunity>,
    min_profit: Decimal,
) -> Vec<ArbitrageOpportunity> {
    if min_profit <= Decimal::ZERO {
        return opportunities;
    }
    opportunities
        .into_iter()
        .filter(|opp| opp.profit >= min_profit)
        .collect()
}
