//! Unified error types for the arbitrage finder.

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the arbitrage finder.
#[derive(Error, Debug)]
pub enum ArbyError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Odds provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Snapshot persistence error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures at the odds provider boundary.
///
/// The arbitrage core never sees these: a failed fetch means the core is
/// simply not invoked for that batch.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No API key configured.
    #[error("odds provider API key is not configured")]
    MissingApiKey,

    /// The provider rejected the API key.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Request quota exhausted.
    #[error("rate limited by odds provider (remaining requests: {remaining:?})")]
    RateLimited {
        /// Value of the remaining-requests header, if sent.
        remaining: Option<u64>,
    },

    /// Body could not be decoded into match records.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Any other non-success status.
    #[error("unexpected provider status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Transport failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL or sport key does not form a valid endpoint.
    #[error("invalid provider url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ProviderError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::MissingApiKey => "missing_api_key",
            ProviderError::Authentication(_) => "authentication",
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::MalformedResponse(_) => "malformed_response",
            ProviderError::UnexpectedStatus { .. } => "unexpected_status",
            ProviderError::Http(_) => "http",
            ProviderError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Snapshot store errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Name contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid snapshot name: {0:?}")]
    InvalidName(String),

    /// No snapshot stored under this name.
    #[error("snapshot {0} not found")]
    NotFound(String),

    /// Filesystem failure.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored file is not a valid match list.
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single match was excluded from evaluation.
///
/// These are per-match data defects, recovered locally by skipping the match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    /// Home or away team name is blank.
    #[error("missing team names")]
    MissingTeams,

    /// Fewer than two bookmaker quotes.
    #[error("insufficient bookmakers: {count}")]
    InsufficientBookmakers {
        /// Number of quotes found.
        count: usize,
    },

    /// Fewer than two distinct head-to-head outcomes.
    #[error("insufficient outcomes: {count}")]
    InsufficientOutcomes {
        /// Number of distinct outcome names found.
        count: usize,
    },

    /// A required outcome has no usable price among eligible bookmakers.
    #[error("missing required outcome in best odds: {outcome}")]
    MissingBestOdds {
        /// The uncovered outcome.
        outcome: String,
    },

    /// A best price could not be inverted.
    #[error("invalid price {price} for outcome {outcome}")]
    InvalidPrice {
        /// Outcome carrying the bad price.
        outcome: String,
        /// The offending price.
        price: Decimal,
    },
}

impl Ineligible {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Ineligible::MissingTeams => "missing_teams",
            Ineligible::InsufficientBookmakers { .. } => "insufficient_bookmakers",
            Ineligible::InsufficientOutcomes { .. } => "insufficient_outcomes",
            Ineligible::MissingBestOdds { .. } => "missing_best_odds",
            Ineligible::InvalidPrice { .. } => "invalid_price",
        }
    }

    /// Whether this reason is a data defect worth a warning rather than routine noise.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            Ineligible::MissingTeams | Ineligible::InvalidPrice { .. }
        )
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ArbyError>;
