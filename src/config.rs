//! Application configuration loaded from environment variables.

use serde::Deserialize;

use crate::error::ProviderError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Odds Provider ===
    /// API key for the odds provider.
    #[serde(default)]
    pub odds_api_key: String,

    /// Odds provider base URL.
    #[serde(default = "default_odds_api_url")]
    pub odds_api_url: String,

    /// HTTP timeout for provider requests.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Query Defaults ===
    /// Comma-separated region labels used when a request names none.
    #[serde(default = "default_regions")]
    pub default_regions: String,

    /// Sport key used when a request names none.
    #[serde(default = "default_sport")]
    pub default_sport: String,

    /// Maximum number of sports fanned out for the live query.
    #[serde(default = "default_live_sport_limit")]
    pub live_sport_limit: usize,

    // === Snapshots ===
    /// Directory holding stored match batches.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin; any origin when unset.
    #[serde(default)]
    pub cors_allow_origin: Option<String>,

    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_odds_api_url() -> String {
    "https://api.the-odds-api.com".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_regions() -> String {
    "au".to_string()
}

fn default_sport() -> String {
    "upcoming".to_string()
}

fn default_live_sport_limit() -> usize {
    8
}

fn default_snapshot_dir() -> String {
    "snapshots".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Filter used when verbose logging is on.
pub const VERBOSE_DIRECTIVES: &str = "arby=debug,info";

impl Default for Config {
    fn default() -> Self {
        Self {
            odds_api_key: String::new(),
            odds_api_url: default_odds_api_url(),
            http_timeout_ms: default_http_timeout_ms(),
            default_regions: default_regions(),
            default_sport: default_sport(),
            live_sport_limit: default_live_sport_limit(),
            snapshot_dir: default_snapshot_dir(),
            port: default_port(),
            cors_allow_origin: None,
            metrics_enabled: default_true(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if url::Url::parse(&self.odds_api_url).is_err() {
            return Err(format!("ODDS_API_URL is not a valid URL: {}", self.odds_api_url));
        }

        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.live_sport_limit == 0 {
            return Err("LIVE_SPORT_LIMIT must be at least 1".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be non-zero".to_string());
        }

        Ok(())
    }

    /// The provider credential, or an error when none is configured.
    pub fn require_api_key(&self) -> Result<&str, ProviderError> {
        let key = self.odds_api_key.trim();
        if key.is_empty() {
            Err(ProviderError::MissingApiKey)
        } else {
            Ok(key)
        }
    }

    /// Tracing filter directives. Verbose mode, from the CLI or `VERBOSE`,
    /// overrides `RUST_LOG`.
    pub fn log_directives(&self, cli_verbose: bool) -> String {
        if cli_verbose || self.verbose {
            VERBOSE_DIRECTIVES.to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Default region labels split on commas.
    pub fn default_region_labels(&self) -> Vec<String> {
        split_list(&self.default_regions)
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
