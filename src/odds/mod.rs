//! Odds module for provider match records.
//!
//! This module handles:
//! - Match record types and lenient decoding
//! - Odds provider client and trait
//! - Region resolution and the bookmaker reference table
//! - Snapshot persistence of raw batches
//! - Mock provider for testing

pub mod client;
pub mod mock;
pub mod regions;
pub mod snapshot;
pub mod types;

pub use client::{OddsApiClient, OddsProvider};
pub use mock::{MockFailure, MockOddsProvider};
pub use regions::{BookmakerDirectory, RegionTable};
pub use snapshot::SnapshotStore;
pub use types::{BookmakerQuote, Market, Match, OutcomePrice, Sport};
