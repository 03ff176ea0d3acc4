//! HTTP API handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use futures::future::join_all;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::arbitrage::{
    scan, scan_sports, ArbitrageOpportunity, BookmakerFilter, RankingStrategy, ScanRequest,
    Timeframe,
};
use crate::config::{split_list, Config};
use crate::error::{ProviderError, SnapshotError};
use crate::odds::regions::{BookmakerRegion, RegionAlias};
use crate::odds::{BookmakerDirectory, Match, OddsProvider, RegionTable, SnapshotStore, Sport};

/// Handler error: status and plain-text message.
pub type ApiError = (StatusCode, String);

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Source of match records.
    pub provider: Arc<dyn OddsProvider>,
    /// Region label resolver.
    pub regions: Arc<RegionTable>,
    /// Bookmaker reference table.
    pub bookmakers: Arc<BookmakerDirectory>,
    /// Stored match batches.
    pub snapshots: Arc<SnapshotStore>,
    /// Prometheus handle, when the recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state with the default region and bookmaker tables.
    pub fn new(config: Config, provider: Arc<dyn OddsProvider>) -> Self {
        let snapshots = SnapshotStore::new(&config.snapshot_dir);
        Self {
            config: Arc::new(config),
            provider,
            regions: Arc::new(RegionTable::default()),
            bookmakers: Arc::new(BookmakerDirectory::default()),
            snapshots: Arc::new(snapshots),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Resolve comma-separated region labels, falling back to the configured defaults.
    fn resolve_regions(&self, raw: Option<&str>) -> Result<Vec<String>, ApiError> {
        let labels = match raw.map(split_list) {
            Some(labels) if !labels.is_empty() => labels,
            _ => self.config.default_region_labels(),
        };

        let codes = self.regions.resolve(&labels);
        if codes.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("no eligible region in {:?}", labels),
            ));
        }
        Ok(codes)
    }
}

/// Query parameters shared by the odds endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OddsQuery {
    /// Provider sport key.
    pub sport: Option<String>,
    /// Comma-separated region labels.
    pub regions: Option<String>,
    /// Comma-separated bookmaker titles.
    pub bookmakers: Option<String>,
    /// `today`, `week`, `month`; anything else means all.
    pub timeframe: Option<String>,
    /// Minimum profit percent.
    pub min_profit: Option<String>,
    /// Replay a stored batch instead of calling the provider.
    pub snapshot: Option<String>,
}

impl OddsQuery {
    /// Build the scan parameters for this query.
    pub fn scan_request(
        &self,
        ranking: RankingStrategy,
        include_started: bool,
    ) -> Result<ScanRequest, ApiError> {
        Ok(ScanRequest {
            allowed_bookmakers: BookmakerFilter::new(
                self.bookmakers.as_deref().map(split_list).unwrap_or_default(),
            ),
            timeframe: Timeframe::from_query(self.timeframe.as_deref()),
            min_profit: parse_min_profit(self.min_profit.as_deref())?,
            include_started,
            ranking,
        })
    }
}

/// Parse a non-negative profit cutoff. Blank means zero.
pub fn parse_min_profit(raw: Option<&str>) -> Result<Decimal, ApiError> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(Decimal::ZERO),
    };

    let value = Decimal::from_str(raw)
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid min_profit: {raw}")))?;
    if value.is_sign_negative() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("min_profit must not be negative: {raw}"),
        ));
    }
    Ok(value)
}

/// Status for a provider failure.
pub fn provider_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn provider_error(err: ProviderError) -> ApiError {
    warn!(kind = err.kind(), error = %err, "Odds provider request failed");
    (provider_status(&err), err.to_string())
}

fn snapshot_error(err: SnapshotError) -> ApiError {
    let status = match err {
        SnapshotError::InvalidName(_) => StatusCode::BAD_REQUEST,
        SnapshotError::NotFound(_) => StatusCode::NOT_FOUND,
        SnapshotError::Io(_) | SnapshotError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/odds - opportunities for one sport, most profitable first.
pub async fn get_odds(
    State(state): State<AppState>,
    Query(query): Query<OddsQuery>,
) -> Result<Json<Vec<ArbitrageOpportunity>>, ApiError> {
    let request = query.scan_request(RankingStrategy::ProfitDescending, true)?;

    let matches: Vec<Match> = match query.snapshot.as_deref() {
        Some(name) => state.snapshots.load(name).await.map_err(snapshot_error)?,
        None => {
            let sport = query
                .sport
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(state.config.default_sport.as_str());
            let regions = state.resolve_regions(query.regions.as_deref())?;
            state
                .provider
                .fetch_odds(sport, &regions)
                .await
                .map_err(provider_error)?
        }
    };

    let report = scan(&matches, &request, &Local::now());
    Ok(Json(report.opportunities))
}

/// GET /api/live - upcoming opportunities across active sports, earliest first.
pub async fn get_live(
    State(state): State<AppState>,
    Query(query): Query<OddsQuery>,
) -> Result<Json<Vec<ArbitrageOpportunity>>, ApiError> {
    let request = query.scan_request(RankingStrategy::DateAscending, false)?;
    let regions = state.resolve_regions(query.regions.as_deref())?;

    let sports: Vec<Sport> = state
        .provider
        .list_sports()
        .await
        .map_err(provider_error)?
        .into_iter()
        .filter(|s| s.active && !s.has_outrights)
        .take(state.config.live_sport_limit)
        .collect();

    if sports.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let results = join_all(
        sports
            .iter()
            .map(|sport| state.provider.fetch_odds(&sport.key, &regions)),
    )
    .await;

    let mut batches = Vec::with_capacity(results.len());
    let mut last_error = None;
    for (sport, result) in sports.iter().zip(results) {
        match result {
            Ok(matches) => batches.push(matches),
            Err(e) => {
                warn!(sport = %sport.key, kind = e.kind(), error = %e, "Skipping sport");
                last_error = Some(e);
            }
        }
    }

    if batches.is_empty() {
        if let Some(e) = last_error {
            return Err(provider_error(e));
        }
    }

    let report = scan_sports(batches.iter().map(Vec::as_slice), &request, &Local::now());
    info!(
        sports = batches.len(),
        found = report.opportunities.len(),
        "Live scan complete"
    );
    Ok(Json(report.opportunities))
}

/// GET /api/sports - active sports.
pub async fn get_sports(State(state): State<AppState>) -> Result<Json<Vec<Sport>>, ApiError> {
    let sports = state.provider.list_sports().await.map_err(provider_error)?;
    Ok(Json(sports.into_iter().filter(|s| s.active).collect()))
}

/// GET /api/regions - accepted region labels.
pub async fn get_regions(State(state): State<AppState>) -> Json<Vec<RegionAlias>> {
    Json(state.regions.entries())
}

/// GET /api/bookmakers - bookmaker-to-region reference table.
pub async fn get_bookmakers(State(state): State<AppState>) -> Json<Vec<BookmakerRegion>> {
    Json(state.bookmakers.all().to_vec())
}

/// GET /api/snapshots - stored snapshot names.
pub async fn get_snapshots(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    state.snapshots.list().await.map(Json).map_err(snapshot_error)
}

/// GET /metrics - Prometheus text format.
pub async fn get_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match &state.metrics {
        Some(handle) => Ok((
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )),
        None => Err((
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn min_profit_parsing() {
        assert_eq!(parse_min_profit(None).unwrap(), Decimal::ZERO);
        assert_eq!(parse_min_profit(Some(" ")).unwrap(), Decimal::ZERO);
        assert_eq!(parse_min_profit(Some("2.5")).unwrap(), dec!(2.5));
        assert_eq!(parse_min_profit(Some("-1")).unwrap_err().0, StatusCode::BAD_REQUEST);
        assert_eq!(parse_min_profit(Some("lots")).unwrap_err().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_errors_map_to_status() {
        assert_eq!(
            provider_status(&ProviderError::RateLimited { remaining: None }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            provider_status(&ProviderError::MissingApiKey),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            provider_status(&ProviderError::Authentication("bad key".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn query_builds_scan_request() {
        let query = OddsQuery {
            bookmakers: Some("TAB, Sportsbet".into()),
            timeframe: Some("week".into()),
            min_profit: Some("1.5".into()),
            ..OddsQuery::default()
        };

        let request = query.scan_request(RankingStrategy::DateAscending, false).unwrap();
        assert!(request.allowed_bookmakers.allows("sportsbet"));
        assert!(!request.allowed_bookmakers.allows("Neds"));
        assert_eq!(request.timeframe, Timeframe::Week);
        assert_eq!(request.min_profit, dec!(1.5));
        assert!(!request.include_started);
    }
}
