//! Match records as supplied by the odds provider.
//!
//! Decoding is lenient per field: a bad price or timestamp becomes `None`
//! instead of failing the whole batch, and is dealt with by the aggregator.

use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Market key for head-to-head (outright winner) prices.
pub const H2H_MARKET: &str = "h2h";

/// One match and every bookmaker's posted markets for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Provider sport key, e.g. `soccer_epl`.
    #[serde(default)]
    pub sport_key: String,
    /// Home team name.
    #[serde(default)]
    pub home_team: String,
    /// Away team name.
    #[serde(default)]
    pub away_team: String,
    /// Unix start time in seconds.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub commence_time: Option<i64>,
    /// Quotes in provider order.
    #[serde(default, rename = "bookmakers")]
    pub bookmaker_quotes: Vec<BookmakerQuote>,
}

impl Match {
    /// Display label, `"<home> vs. <away>"`.
    pub fn event_label(&self) -> String {
        format!("{} vs. {}", self.home_team.trim(), self.away_team.trim())
    }

    /// Whether both team names are present.
    pub fn has_teams(&self) -> bool {
        !self.home_team.trim().is_empty() && !self.away_team.trim().is_empty()
    }

    /// Start time with `0` standing in for unknown.
    pub fn start_timestamp(&self) -> i64 {
        self.commence_time.unwrap_or(0)
    }

    /// True once a known start time is at or before `now`.
    pub fn has_started(&self, now: i64) -> bool {
        let start = self.start_timestamp();
        start != 0 && start <= now
    }
}

/// A single bookmaker's markets for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerQuote {
    /// Bookmaker display name.
    #[serde(default)]
    pub title: String,
    /// Deep link to the event on the bookmaker's site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// All markets posted; only `h2h` is evaluated.
    #[serde(default)]
    pub markets: Vec<Market>,
}

impl BookmakerQuote {
    /// Outcomes from head-to-head markets, other market types ignored.
    pub fn h2h_outcomes(&self) -> impl Iterator<Item = &OutcomePrice> {
        self.markets
            .iter()
            .filter(|market| market.key == H2H_MARKET)
            .flat_map(|market| market.outcomes.iter())
    }

    /// The bookmaker's own link, if non-blank.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// One market (e.g. `h2h`) within a bookmaker quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Market type key.
    #[serde(default)]
    pub key: String,
    /// Quoted outcomes.
    #[serde(default)]
    pub outcomes: Vec<OutcomePrice>,
}

/// A bookmaker's decimal price for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomePrice {
    /// Outcome name (team or "Draw").
    #[serde(default)]
    pub name: String,
    /// Decimal odds; `None` when absent or non-numeric.
    #[serde(
        default,
        deserialize_with = "lenient_price",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Decimal>,
}

impl OutcomePrice {
    /// Build an outcome price.
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price: Some(price),
        }
    }
}

/// A sport listed by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    /// Sport key used in odds requests.
    pub key: String,
    /// Group, e.g. "Soccer".
    #[serde(default)]
    pub group: String,
    /// Human title.
    #[serde(default)]
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// In season.
    #[serde(default)]
    pub active: bool,
    /// Futures-only sport without h2h markets.
    #[serde(default)]
    pub has_outrights: bool,
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp()))
        }
        _ => None,
    }))
}
