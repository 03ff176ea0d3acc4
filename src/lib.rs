//! Cross-bookmaker sports betting arbitrage detector.
//!
//! Given head-to-head prices from several bookmakers for the same match, picks
//! the best price per outcome and reports the match when backing every outcome
//! at those prices returns more than it costs:
//!
//! ```text
//! Team A @ 2.10 (bookmaker X)   1 / 2.10 = 0.4762
//! Team B @ 2.20 (bookmaker Y)   1 / 2.20 = 0.4545
//! ──────────────────────────────────────────────
//! Implied probability:                   0.9307 < 1.0
//! Profit:                                6.93%
//! Stakes:                                A 51.16%, B 48.84%
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`odds`]: Match records, odds provider client, regions, snapshots
//! - [`arbitrage`]: Outcome aggregation, evaluation, timeframes, ranking
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod metrics;
pub mod odds;
pub mod utils;

pub use config::Config;
pub use error::{ArbyError, Result};
