//! End-to-end tests for the scan pipeline and HTTP API.
//!
//! Everything runs against the mock provider; no network access is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use arby::api::{create_router, AppState};
use arby::arbitrage::{scan, ScanRequest, Timeframe};
use arby::config::Config;
use arby::odds::{
    BookmakerQuote, Market, Match, MockFailure, MockOddsProvider, OutcomePrice, RegionTable,
    SnapshotStore,
};

fn quote(title: &str, prices: &[(&str, Decimal)]) -> BookmakerQuote {
    BookmakerQuote {
        title: title.to_string(),
        link: None,
        markets: vec![Market {
            key: "h2h".to_string(),
            outcomes: prices
                .iter()
                .map(|(name, price)| OutcomePrice::new(*name, *price))
                .collect(),
        }],
    }
}

fn match_with(sport: &str, start: Option<i64>, quotes: Vec<BookmakerQuote>) -> Match {
    Match {
        sport_key: sport.to_string(),
        home_team: "A".to_string(),
        away_team: "B".to_string(),
        commence_time: start,
        bookmaker_quotes: quotes,
    }
}

/// Bookmaker X: A=2.10, B=2.05. Bookmaker Y: A=2.00, B=2.20.
fn scenario_one(sport: &str, start: Option<i64>) -> Match {
    match_with(
        sport,
        start,
        vec![
            quote("X", &[("A", dec!(2.10)), ("B", dec!(2.05))]),
            quote("Y", &[("A", dec!(2.00)), ("B", dec!(2.20))]),
        ],
    )
}

fn evaluation_time() -> DateTime<Utc> {
    // Wednesday
    DateTime::parse_from_rfc3339("2026-10-14T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn app(provider: &MockOddsProvider, snapshot_dir: &std::path::Path) -> Router {
    let config = Config {
        default_regions: "au".to_string(),
        snapshot_dir: snapshot_dir.display().to_string(),
        ..Config::default()
    };
    create_router(AppState::new(config, Arc::new(provider.clone())))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

// === Pipeline scenarios ===

#[test]
fn arbitrage_found_across_two_bookmakers() {
    let report = scan(
        &[scenario_one("basketball_nba", None)],
        &ScanRequest::default(),
        &evaluation_time(),
    );

    assert_eq!(report.opportunities.len(), 1);
    let opp = &report.opportunities[0];
    assert_eq!(opp.event, "A vs. B");
    assert_eq!(opp.profit, dec!(6.93));

    let legs: Vec<_> = opp
        .odds
        .iter()
        .map(|l| (l.team.as_str(), l.price, l.bookmaker.as_str(), l.stake))
        .collect();
    assert_eq!(
        legs,
        vec![
            ("A", dec!(2.10), "X", dec!(51.16)),
            ("B", dec!(2.20), "Y", dec!(48.84)),
        ]
    );
    assert_eq!(opp.total_stake(), dec!(100));
}

#[test]
fn single_bookmaker_yields_nothing() {
    let record = match_with(
        "basketball_nba",
        None,
        vec![quote("X", &[("A", dec!(1.80)), ("B", dec!(2.10))])],
    );

    let report = scan(&[record], &ScanRequest::default(), &evaluation_time());
    assert!(report.opportunities.is_empty());
    assert_eq!(report.skipped, 1);
}

#[test]
fn break_even_is_excluded() {
    let record = match_with(
        "basketball_nba",
        None,
        vec![
            quote("X", &[("A", dec!(2.0)), ("B", dec!(1.9))]),
            quote("Y", &[("A", dec!(1.9)), ("B", dec!(2.0))]),
        ],
    );

    let report = scan(&[record], &ScanRequest::default(), &evaluation_time());
    assert!(report.opportunities.is_empty());
    assert_eq!(report.skipped, 0);
}

#[test]
fn tomorrow_is_in_week_but_not_today() {
    let tomorrow = (evaluation_time() + Duration::days(1)).timestamp();
    let matches = [scenario_one("basketball_nba", Some(tomorrow))];

    let today = ScanRequest {
        timeframe: Timeframe::Today,
        ..ScanRequest::default()
    };
    let week = ScanRequest {
        timeframe: Timeframe::Week,
        ..ScanRequest::default()
    };

    assert!(scan(&matches, &today, &evaluation_time()).opportunities.is_empty());
    let report = scan(&matches, &week, &evaluation_time());
    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(report.opportunities[0].date, "2026-10-15 12:00:00");
}

#[test]
fn zero_price_does_not_block_valid_quotes() {
    let record = match_with(
        "basketball_nba",
        None,
        vec![
            quote("X", &[("A", dec!(0)), ("B", dec!(2.05))]),
            quote("Y", &[("A", dec!(2.10)), ("B", dec!(2.20))]),
        ],
    );

    let report = scan(&[record], &ScanRequest::default(), &evaluation_time());
    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(report.opportunities[0].odds[0].bookmaker, "Y");
    assert_eq!(report.opportunities[0].odds[0].price, dec!(2.10));
}

#[test]
fn region_resolution_is_case_insensitive() {
    let table = RegionTable::default();
    assert_eq!(table.resolve(&["Australia"]), vec!["au"]);
    assert_eq!(table.resolve(&["australia"]), vec!["au"]);
    assert!(table.resolve(&["mars"]).is_empty());
}

// === HTTP API ===

#[tokio::test]
async fn odds_endpoint_returns_ranked_opportunities() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockOddsProvider::new();

    let mut richer = scenario_one("basketball_nba", None);
    richer.home_team = "C".to_string();
    richer.away_team = "D".to_string();
    richer.bookmaker_quotes = vec![
        quote("X", &[("C", dec!(2.50)), ("D", dec!(2.05))]),
        quote("Y", &[("C", dec!(2.00)), ("D", dec!(2.20))]),
    ];
    provider.set_matches("basketball_nba", vec![scenario_one("basketball_nba", None), richer]);

    let (status, body) = get_json(
        app(&provider, dir.path()),
        "/api/odds?sport=basketball_nba&regions=Australia,AU",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["event"], "C vs. D");
    assert_eq!(list[1]["profit"], serde_json::json!(6.93));
    assert_eq!(list[1]["date"], "TBD");
    assert_eq!(list[1]["is_live"], false);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].regions, vec!["au"]);
}

#[tokio::test]
async fn odds_endpoint_applies_bookmaker_filter_and_min_profit() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockOddsProvider::new();
    provider.set_matches("basketball_nba", vec![scenario_one("basketball_nba", None)]);

    let (status, body) = get_json(
        app(&provider, dir.path()),
        "/api/odds?sport=basketball_nba&min_profit=7",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = get_json(
        app(&provider, dir.path()),
        "/api/odds?sport=basketball_nba&bookmakers=x",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // X alone quotes 2.10 / 2.05, a thinner arbitrage than the combined book.
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["profit"], serde_json::json!(3.6));
    assert!(list[0]["odds"]
        .as_array()
        .unwrap()
        .iter()
        .all(|leg| leg["bookmaker"] == "X"));
}

#[tokio::test]
async fn provider_failures_map_to_status_codes() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockOddsProvider::new();
    provider.fail_sport("auth", MockFailure::Authentication);
    provider.fail_sport("limited", MockFailure::RateLimited);
    provider.fail_sport("garbled", MockFailure::Malformed);

    for (sport, expected) in [
        ("auth", StatusCode::BAD_GATEWAY),
        ("limited", StatusCode::TOO_MANY_REQUESTS),
        ("garbled", StatusCode::BAD_GATEWAY),
    ] {
        let (status, _) = get_json(app(&provider, dir.path()), &format!("/api/odds?sport={sport}")).await;
        assert_eq!(status, expected, "sport {sport}");
    }
}

#[tokio::test]
async fn live_endpoint_merges_sports_and_skips_failures() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockOddsProvider::new();
    let now = Utc::now();
    let soon = (now + Duration::hours(30)).timestamp();
    let later = (now + Duration::hours(60)).timestamp();
    let started = (now - Duration::hours(1)).timestamp();

    provider.set_matches("basketball_nba", vec![scenario_one("basketball_nba", Some(later))]);
    provider.set_matches(
        "soccer_epl",
        vec![
            scenario_one("soccer_epl", Some(soon)),
            scenario_one("soccer_epl", Some(started)),
        ],
    );
    provider.set_matches("tennis_atp", Vec::new());
    provider.fail_sport("tennis_atp", MockFailure::RateLimited);

    let (status, body) = get_json(app(&provider, dir.path()), "/api/live").await;

    assert_eq!(status, StatusCode::OK);
    let sports: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["sport"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(sports, vec!["soccer_epl", "basketball_nba"]);
    assert_eq!(provider.requests().len(), 3);
}

#[tokio::test]
async fn live_endpoint_fails_when_every_sport_fails() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockOddsProvider::new();
    provider.set_matches("basketball_nba", Vec::new());
    provider.fail_sport("basketball_nba", MockFailure::Authentication);

    let (status, _) = get_json(app(&provider, dir.path()), "/api/live").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn snapshot_replay_skips_provider() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store
        .save("nba-night", &[scenario_one("basketball_nba", None)])
        .await
        .unwrap();

    let provider = MockOddsProvider::new();
    let (status, body) = get_json(app(&provider, dir.path()), "/api/odds?snapshot=nba-night").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(provider.requests().is_empty());

    let (status, body) = get_json(app(&provider, dir.path()), "/api/snapshots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["nba-night"]));

    let (status, _) = get_json(app(&provider, dir.path()), "/api/odds?snapshot=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(app(&provider, dir.path()), "/api/odds?snapshot=../etc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reference_tables_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockOddsProvider::new();
    provider.set_matches("soccer_epl", Vec::new());

    let (status, regions) = get_json(app(&provider, dir.path()), "/api/regions").await;
    assert_eq!(status, StatusCode::OK);
    assert!(regions
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["label"] == "australia" && r["code"] == "au"));

    let (status, bookmakers) = get_json(app(&provider, dir.path()), "/api/bookmakers").await;
    assert_eq!(status, StatusCode::OK);
    assert!(bookmakers
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["title"] == "TAB" && b["region"] == "au"));

    let (status, sports) = get_json(app(&provider, dir.path()), "/api/sports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sports[0]["key"], "soccer_epl");
}
