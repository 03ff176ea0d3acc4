//! Outcome discovery and best-price selection for a single match.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::{trace, warn};
use url::Url;

use crate::error::Ineligible;
use crate::odds::Match;

/// Base for links generated when a bookmaker supplies none.
const SEARCH_URL: &str = "https://www.google.com/search";

/// Best price found for one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestOdds {
    /// Highest decimal price.
    pub price: Decimal,
    /// Bookmaker offering it.
    pub bookmaker: String,
    /// Where to place the bet.
    pub link: String,
}

/// Required outcomes and the best price for each, for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Distinct outcome names in first-seen order.
    pub required_outcomes: Vec<String>,
    /// Best price per outcome name.
    pub best_odds: HashMap<String, BestOdds>,
}

/// Restricts which bookmakers' prices are considered. Empty allows all.
///
/// Titles compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmakerFilter {
    titles: HashSet<String>,
}

impl BookmakerFilter {
    /// Allow only these bookmaker titles.
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            titles: titles
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Allow every bookmaker.
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether no restriction applies.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Whether a bookmaker title passes.
    pub fn allows(&self, title: &str) -> bool {
        self.titles.is_empty() || self.titles.contains(&title.trim().to_lowercase())
    }
}

/// Distinct, trimmed, non-empty h2h outcome names across every quote.
///
/// Ignores the bookmaker filter so the full outcome set is always required.
pub fn discover_outcomes(record: &Match) -> Vec<String> {
    let mut outcomes: Vec<String> = Vec::new();

    for outcome in record.bookmaker_quotes.iter().flat_map(|q| q.h2h_outcomes()) {
        let name = outcome.name.trim();
        if !name.is_empty() && !outcomes.iter().any(|o| o == name) {
            outcomes.push(name.to_string());
        }
    }

    outcomes
}

/// Discover required outcomes and select the best price per outcome.
///
/// Ties keep the earliest bookmaker in input order. Invalid prices are
/// skipped with a warning without affecting other quotes.
pub fn aggregate(record: &Match, filter: &BookmakerFilter) -> Result<Aggregation, Ineligible> {
    let quotes = record.bookmaker_quotes.len();
    if quotes < 2 {
        return Err(Ineligible::InsufficientBookmakers { count: quotes });
    }

    let required_outcomes = discover_outcomes(record);
    if required_outcomes.len() < 2 {
        return Err(Ineligible::InsufficientOutcomes {
            count: required_outcomes.len(),
        });
    }

    let event = record.event_label();
    let mut best_odds: HashMap<String, BestOdds> = HashMap::new();

    for quote in record
        .bookmaker_quotes
        .iter()
        .filter(|q| filter.allows(&q.title))
    {
        for outcome in quote.h2h_outcomes() {
            let name = outcome.name.trim();
            if name.is_empty() {
                continue;
            }

            let price = match outcome.price {
                Some(price) if price > Decimal::ZERO => price,
                other => {
                    warn!(
                        event = %event,
                        bookmaker = %quote.title,
                        outcome = %name,
                        price = ?other,
                        "Ignoring invalid price"
                    );
                    continue;
                }
            };

            let improves = best_odds
                .get(name)
                .map_or(true, |current| price > current.price);

            if improves {
                trace!(outcome = %name, bookmaker = %quote.title, price = %price, "New best price");
                let link = quote
                    .link()
                    .map(str::to_string)
                    .unwrap_or_else(|| betting_link(&record.sport_key, &event, &quote.title));
                best_odds.insert(
                    name.to_string(),
                    BestOdds {
                        price,
                        bookmaker: quote.title.clone(),
                        link,
                    },
                );
            }
        }
    }

    Ok(Aggregation {
        required_outcomes,
        best_odds,
    })
}

/// Search link for a bookmaker's market on an event.
pub fn betting_link(sport: &str, event: &str, bookmaker: &str) -> String {
    let query = format!("{bookmaker} {event} {sport} betting odds");
    match Url::parse_with_params(SEARCH_URL, &[("q", query.as_str())]) {
        Ok(url) => url.into(),
        Err(_) => SEARCH_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::{BookmakerQuote, Market, OutcomePrice};
    use rust_decimal_macros::dec;

    fn quote(title: &str, prices: &[(&str, Option<Decimal>)]) -> BookmakerQuote {
        BookmakerQuote {
            title: title.to_string(),
            link: None,
            markets: vec![Market {
                key: "h2h".to_string(),
                outcomes: prices
                    .iter()
                    .map(|(name, price)| OutcomePrice {
                        name: name.to_string(),
                        price: *price,
                    })
                    .collect(),
            }],
        }
    }

    fn record(quotes: Vec<BookmakerQuote>) -> Match {
        Match {
            sport_key: "basketball_nba".to_string(),
            home_team: "A".to_string(),
            away_team: "B".to_string(),
            commence_time: Some(1_767_225_600),
            bookmaker_quotes: quotes,
        }
    }

    #[test]
    fn selects_highest_price_per_outcome() {
        let m = record(vec![
            quote("X", &[("A", Some(dec!(2.10))), ("B", Some(dec!(2.05)))]),
            quote("Y", &[("A", Some(dec!(2.00))), ("B", Some(dec!(2.20)))]),
        ]);

        let agg = aggregate(&m, &BookmakerFilter::any()).unwrap();

        assert_eq!(agg.required_outcomes, vec!["A", "B"]);
        assert_eq!(agg.best_odds["A"].price, dec!(2.10));
        assert_eq!(agg.best_odds["A"].bookmaker, "X");
        assert_eq!(agg.best_odds["B"].price, dec!(2.20));
        assert_eq!(agg.best_odds["B"].bookmaker, "Y");
    }

    #[test]
    fn equal_prices_keep_first_bookmaker() {
        let m = record(vec![
            quote("First", &[("A", Some(dec!(2.0))), ("B", Some(dec!(1.9)))]),
            quote("Second", &[("A", Some(dec!(2.00))), ("B", Some(dec!(1.8)))]),
        ]);

        let agg = aggregate(&m, &BookmakerFilter::any()).unwrap();
        assert_eq!(agg.best_odds["A"].bookmaker, "First");
    }

    #[test]
    fn single_bookmaker_is_ineligible() {
        let m = record(vec![quote("X", &[("A", Some(dec!(1.80))), ("B", Some(dec!(2.10)))])]);
        assert_eq!(
            aggregate(&m, &BookmakerFilter::any()),
            Err(Ineligible::InsufficientBookmakers { count: 1 })
        );
    }

    #[test]
    fn single_outcome_is_ineligible() {
        let m = record(vec![
            quote("X", &[("A", Some(dec!(1.80)))]),
            quote("Y", &[(" A ", Some(dec!(1.90))), ("", Some(dec!(3.0)))]),
        ]);
        assert_eq!(
            aggregate(&m, &BookmakerFilter::any()),
            Err(Ineligible::InsufficientOutcomes { count: 1 })
        );
    }

    #[test]
    fn non_h2h_markets_are_ignored() {
        let mut totals = quote("Y", &[("Over", Some(dec!(5.0))), ("Under", Some(dec!(5.0)))]);
        totals.markets[0].key = "totals".to_string();
        let m = record(vec![quote("X", &[("A", Some(dec!(1.8))), ("B", Some(dec!(2.1)))]), totals]);

        let agg = aggregate(&m, &BookmakerFilter::any()).unwrap();
        assert_eq!(agg.required_outcomes, vec!["A", "B"]);
        assert!(!agg.best_odds.contains_key("Over"));
    }

    #[test]
    fn zero_and_missing_prices_do_not_block_other_quotes() {
        let m = record(vec![
            quote("X", &[("A", Some(dec!(0))), ("B", None)]),
            quote("Y", &[("A", Some(dec!(2.5))), ("B", Some(dec!(1.7)))]),
        ]);

        let agg = aggregate(&m, &BookmakerFilter::any()).unwrap();
        assert_eq!(agg.best_odds["A"].bookmaker, "Y");
        assert_eq!(agg.best_odds["B"].price, dec!(1.7));
    }

    #[test]
    fn filter_applies_to_prices_not_outcome_discovery() {
        let m = record(vec![
            quote("X", &[("A", Some(dec!(2.1))), ("B", Some(dec!(2.05)))]),
            quote("Y", &[("A", Some(dec!(2.0))), ("Draw", Some(dec!(3.3)))]),
        ]);

        let agg = aggregate(&m, &BookmakerFilter::new(["x"])).unwrap();
        assert_eq!(agg.required_outcomes, vec!["A", "B", "Draw"]);
        assert!(agg.best_odds.contains_key("A"));
        assert!(!agg.best_odds.contains_key("Draw"));
    }

    #[test]
    fn supplied_link_wins_over_generated() {
        let mut x = quote("X", &[("A", Some(dec!(2.1))), ("B", Some(dec!(2.05)))]);
        x.link = Some("https://x.example/event".to_string());
        let y = quote("Y", &[("A", Some(dec!(2.0))), ("B", Some(dec!(2.2)))]);

        let agg = aggregate(&record(vec![x, y]), &BookmakerFilter::any()).unwrap();
        assert_eq!(agg.best_odds["A"].link, "https://x.example/event");
        assert!(agg.best_odds["B"].link.starts_with(SEARCH_URL));
    }

    #[test]
    fn generated_link_is_encoded() {
        let link = betting_link("soccer_epl", "A vs. B", "Bet & Win");
        assert!(link.starts_with("https://www.google.com/search?q="));
        assert!(link.contains("Bet+%26+Win"));
    }

    #[test]
    fn bookmaker_filter_semantics() {
        assert!(BookmakerFilter::any().allows("anything"));
        assert!(BookmakerFilter::new(Vec::<String>::new()).is_empty());

        let filter = BookmakerFilter::new(["TAB", " Sportsbet "]);
        assert!(filter.allows("tab"));
        assert!(filter.allows("SportsBet"));
        assert!(!filter.allows("Neds"));
    }
}
