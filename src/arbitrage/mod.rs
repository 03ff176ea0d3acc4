//! Arbitrage module for detecting opportunities across bookmakers.
//!
//! This module handles:
//! - Outcome discovery and best-price selection
//! - Implied probability, profit and stake calculations
//! - Timeframe windows
//! - Ranking and the scan pipeline

pub mod aggregator;
pub mod calculator;
pub mod detector;
pub mod ranking;
pub mod timeframe;

pub use aggregator::{aggregate, betting_link, discover_outcomes, Aggregation, BestOdds, BookmakerFilter};
pub use calculator::{
    calculate_arbitrage, implied_probability, ArbitrageBook, ArbitrageLeg, ArbitrageOpportunity,
    ARBITRAGE_EPSILON,
};
pub use detector::{evaluate_match, scan, scan_sports, ScanReport, ScanRequest};
pub use ranking::{apply_min_profit, rank, RankingStrategy};
pub use timeframe::{format_match_date, Timeframe};
