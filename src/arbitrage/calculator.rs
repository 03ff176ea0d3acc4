//! Implied probability, profit and stake calculations for arbitrage opportunities.

use std::collections::HashMap;
use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::aggregator::BestOdds;
use super::timeframe::format_match_date;
use crate::error::Ineligible;
use crate::odds::Match;

/// Margin below 1.0 the implied probability must clear. Keeps break-even
/// sets from registering as profitable.
pub const ARBITRAGE_EPSILON: Decimal = dec!(0.00001);

/// Decimal places kept on profit and stake percentages.
const PERCENT_DP: u32 = 2;

/// One bet in an arbitrage opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbitrageLeg {
    /// Outcome name.
    pub team: String,
    /// Best decimal price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Bookmaker offering the price.
    pub bookmaker: String,
    /// Share of the total outlay, in percent (2 dp).
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    /// Where to place the bet.
    pub link: String,
}

/// Result of pricing a full outcome set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrageBook {
    /// Sum of `1 / price` over required outcomes.
    pub implied_probability: Decimal,
    /// `(1 - implied_probability) * 100`, rounded to 2 dp.
    pub profit: Decimal,
    /// One leg per required outcome, in outcome order.
    pub legs: Vec<ArbitrageLeg>,
}

/// Detected arbitrage opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbitrageOpportunity {
    /// Provider sport key.
    pub sport: String,
    /// `"<home> vs. <away>"`.
    pub event: String,
    /// Start time as `YYYY-MM-DD HH:MM:SS`, or `TBD`.
    pub date: String,
    /// Guaranteed return in percent (2 dp).
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    /// Match had already started at evaluation time.
    pub is_live: bool,
    /// One bet per required outcome.
    pub odds: Vec<ArbitrageLeg>,
    /// Raw start time, kept for date ranking.
    #[serde(skip)]
    pub commence_time: Option<i64>,
}

impl ArbitrageOpportunity {
    /// Attach match details to a priced book.
    pub fn from_book<Tz>(record: &Match, book: ArbitrageBook, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            sport: record.sport_key.clone(),
            event: record.event_label(),
            date: format_match_date(record.commence_time, &now.timezone()),
            profit: book.profit,
            is_live: record.has_started(now.timestamp()),
            odds: book.legs,
            commence_time: record.commence_time.filter(|ts| *ts != 0),
        }
    }

    /// Sum of stake percentages; 100 within rounding.
    pub fn total_stake(&self) -> Decimal {
        self.odds.iter().map(|leg| leg.stake).sum()
    }
}

/// Sum of `1 / price` over the required outcomes.
///
/// Prices so small that the sum leaves the `Decimal` range are reported as
/// [`Ineligible::InvalidPrice`].
pub fn implied_probability(
    required_outcomes: &[String],
    best_odds: &HashMap<String, BestOdds>,
) -> Result<Decimal, Ineligible> {
    required_outcomes.iter().try_fold(Decimal::ZERO, |sum, outcome| {
        let best = best_odds.get(outcome).ok_or_else(|| Ineligible::MissingBestOdds {
            outcome: outcome.clone(),
        })?;
        sum.checked_add(inverse(outcome, best.price)?)
            .ok_or_else(|| Ineligible::InvalidPrice {
                outcome: outcome.clone(),
                price: best.price,
            })
    })
}

fn inverse(outcome: &str, price: Decimal) -> Result<Decimal, Ineligible> {
    if price <= Decimal::ZERO {
        return Err(Ineligible::InvalidPrice {
            outcome: outcome.to_string(),
            price,
        });
    }
    Decimal::ONE
        .checked_div(price)
        .ok_or_else(|| Ineligible::InvalidPrice {
            outcome: outcome.to_string(),
            price,
        })
}

/// Price the outcome set and, if it is an arbitrage, allocate stakes.
///
/// Returns `Ok(None)` when the set is not profitable, including when the
/// profit rounds to zero.
pub fn calculate_arbitrage(
    required_outcomes: &[String],
    best_odds: &HashMap<String, BestOdds>,
) -> Result<Option<ArbitrageBook>, Ineligible> {
    let implied = implied_probability(required_outcomes, best_odds)?;

    if implied >= Decimal::ONE - ARBITRAGE_EPSILON {
        return Ok(None);
    }

    let profit = ((Decimal::ONE - implied) * Decimal::ONE_HUNDRED).round_dp(PERCENT_DP);
    if profit <= Decimal::ZERO {
        return Ok(None);
    }

    let mut legs = Vec::with_capacity(required_outcomes.len());
    for outcome in required_outcomes {
        // Coverage and price validity were checked while summing.
        let Some(best) = best_odds.get(outcome) else {
            return Err(Ineligible::MissingBestOdds {
                outcome: outcome.clone(),
            });
        };
        let stake = (inverse(outcome, best.price)? / implied * Decimal::ONE_HUNDRED).round_dp(PERCENT_DP);

        legs.push(ArbitrageLeg {
            team: outcome.clone(),
            price: best.price,
            bookmaker: best.bookmaker.clone(),
            stake,
            link: best.link.clone(),
        });
    }

    Ok(Some(ArbitrageBook {
        implied_probability: implied,
        profit,
        legs,
    }))
}
