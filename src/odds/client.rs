//! Odds provider client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{Match, Sport, H2H_MARKET};
use crate::config::Config;
use crate::error::ProviderError;
use crate::metrics;

/// Longest error body kept in [`ProviderError::UnexpectedStatus`].
const MAX_ERROR_BODY: usize = 512;

/// Source of raw match records.
///
/// Callers resolve regions first and never call `fetch_odds` with an empty
/// region list.
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Fetch head-to-head odds for one sport across the given region codes.
    async fn fetch_odds(&self, sport: &str, regions: &[String]) -> Result<Vec<Match>, ProviderError>;

    /// List sports known to the provider.
    async fn list_sports(&self) -> Result<Vec<Sport>, ProviderError>;
}

/// HTTP client for The Odds API (v4).
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Provider base URL.
    base_url: Url,
    /// API key passed on every request.
    api_key: String,
}

impl OddsApiClient {
    /// Create a client from config.
    ///
    /// The key may be empty; requests then fail with [`ProviderError::MissingApiKey`].
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.odds_api_url)?,
            api_key: config.odds_api_key.trim().to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        if self.api_key.is_empty() {
            Err(ProviderError::MissingApiKey)
        } else {
            Ok(&self.api_key)
        }
    }

    /// Build `{base}/v4/sports[/{segments}]`, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["v4", "sports"])
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        endpoint: &'static str,
    ) -> Result<T, ProviderError> {
        let start = Instant::now();
        let result = self.send(url, query).await;
        metrics::record_provider_latency(start, endpoint);

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                metrics::inc_provider_errors(e.kind());
                return Err(e);
            }
        };

        serde_json::from_str(&body).map_err(|e| {
            metrics::inc_provider_errors("malformed_response");
            ProviderError::MalformedResponse(e.to_string())
        })
    }

    async fn send(&self, url: Url, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        let status = response.status();
        let remaining = header_u64(response.headers(), "x-requests-remaining");
        log_quota(response.headers());

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_status(status, remaining, body))
        }
    }
}

#[async_trait]
impl OddsProvider for OddsApiClient {
    #[instrument(skip_all, fields(sport = %sport))]
    async fn fetch_odds(&self, sport: &str, regions: &[String]) -> Result<Vec<Match>, ProviderError> {
        if regions.is_empty() {
            warn!("No eligible regions, skipping provider request");
            return Ok(Vec::new());
        }

        let api_key = self.api_key()?;
        let url = self.endpoint(&[sport, "odds"])?;
        let regions = regions.join(",");

        let matches: Vec<Match> = self
            .get_json(
                url,
                &[
                    ("apiKey", api_key),
                    ("regions", regions.as_str()),
                    ("markets", H2H_MARKET),
                    ("oddsFormat", "decimal"),
                    ("dateFormat", "unix"),
                ],
                "odds",
            )
            .await?;

        debug!(count = matches.len(), "Fetched match records");
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn list_sports(&self) -> Result<Vec<Sport>, ProviderError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(&[])?;

        let sports: Vec<Sport> = self.get_json(url, &[("apiKey", api_key)], "sports").await?;

        debug!(count = sports.len(), "Fetched sports");
        Ok(sports)
    }
}

/// Map a non-success status to a provider error.
pub fn classify_status(status: StatusCode, remaining: Option<u64>, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { remaining },
        _ => {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|v| v as u64)
}

fn log_quota(headers: &HeaderMap) {
    let remaining = header_u64(headers, "x-requests-remaining");
    let used = header_u64(headers, "x-requests-used");
    if remaining.is_some() || used.is_some() {
        debug!(?remaining, ?used, "Provider request quota");
    }
}
