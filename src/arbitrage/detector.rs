//! Scan pipeline: filter matches, evaluate each one, and rank the results.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::aggregator::{aggregate, BookmakerFilter};
use super::calculator::{calculate_arbitrage, ArbitrageOpportunity};
use super::ranking::{apply_min_profit, rank, RankingStrategy};
use super::timeframe::Timeframe;
use crate::error::Ineligible;
use crate::metrics;
use crate::odds::Match;

/// Parameters for one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Bookmakers whose prices count. Empty allows all.
    pub allowed_bookmakers: BookmakerFilter,
    /// Date window applied before and after evaluation.
    pub timeframe: Timeframe,
    /// Inclusive profit cutoff in percent.
    pub min_profit: Decimal,
    /// Whether matches that already started are evaluated.
    pub include_started: bool,
    /// Order of the returned list.
    pub ranking: RankingStrategy,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            allowed_bookmakers: BookmakerFilter::any(),
            timeframe: Timeframe::All,
            min_profit: Decimal::ZERO,
            include_started: true,
            ranking: RankingStrategy::ProfitDescending,
        }
    }
}

/// Outcome of a scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Ranked opportunities.
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Matches that reached the evaluator.
    pub evaluated: usize,
    /// Matches dropped as ineligible.
    pub skipped: usize,
    /// Matches outside the window or already started.
    pub filtered: usize,
}

/// Evaluate one match. `Ok(None)` means the match is eligible but offers no arbitrage.
pub fn evaluate_match<Tz>(
    record: &Match,
    filter: &BookmakerFilter,
    now: &DateTime<Tz>,
) -> Result<Option<ArbitrageOpportunity>, Ineligible>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if !record.has_teams() {
        return Err(Ineligible::MissingTeams);
    }

    let aggregation = aggregate(record, filter)?;
    let book = calculate_arbitrage(&aggregation.required_outcomes, &aggregation.best_odds)?;

    Ok(book.map(|book| ArbitrageOpportunity::from_book(record, book, now)))
}

/// Run the full pipeline over one batch of matches.
#[instrument(skip_all, fields(matches = matches.len(), timeframe = %request.timeframe))]
pub fn scan<Tz>(matches: &[Match], request: &ScanRequest, now: &DateTime<Tz>) -> ScanReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let timer = metrics::timer_scan();
    let mut report = ScanReport::default();
    let now_ts = now.timestamp();

    for record in matches {
        if !request.timeframe.contains_timestamp(record.commence_time, now) {
            report.filtered += 1;
            continue;
        }
        if !request.include_started && record.has_started(now_ts) {
            report.filtered += 1;
            continue;
        }

        report.evaluated += 1;
        metrics::inc_matches_evaluated();

        match evaluate_match(record, &request.allowed_bookmakers, now) {
            Ok(Some(opp)) => {
                info!(
                    sport = %opp.sport,
                    event = %opp.event,
                    profit = %opp.profit,
                    legs = opp.odds.len(),
                    "Arbitrage opportunity detected"
                );
                report.opportunities.push(opp);
            }
            Ok(None) => {
                debug!(event = %record.event_label(), "No arbitrage opportunity");
            }
            Err(reason) => {
                report.skipped += 1;
                metrics::inc_matches_skipped(reason.reason());
                if reason.is_defect() {
                    warn!(event = %record.event_label(), reason = %reason, "Skipping match");
                } else {
                    debug!(event = %record.event_label(), reason = %reason, "Skipping match");
                }
            }
        }
    }

    report
        .opportunities
        .retain(|opp| request.timeframe.contains_date(&opp.date, now));

    rank(&mut report.opportunities, request.ranking);
    report.opportunities = apply_min_profit(std::mem::take(&mut report.opportunities), request.min_profit);

    metrics::inc_opportunities_detected(report.opportunities.len() as u64);
    debug!(
        evaluated = report.evaluated,
        skipped = report.skipped,
        filtered = report.filtered,
        found = report.opportunities.len(),
        elapsed_ms = timer.elapsed_ms(),
        "Scan complete"
    );

    report
}

/// Scan several per-sport batches and merge them, earliest match first.
pub fn scan_sports<'a, Tz, I>(batches: I, request: &ScanRequest, now: &DateTime<Tz>) -> ScanReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
    I: IntoIterator<Item = &'a [Match]>,
{
    let mut merged = ScanReport::default();

    for batch in batches {
        let report = scan(batch, request, now);
        merged.evaluated += report.evaluated;
        merged.skipped += report.skipped;
        merged.filtered += report.filtered;
        merged.opportunities.extend(report.opportunities);
    }

    rank(&mut merged.opportunities, RankingStrategy::DateAscending);
    merged
}
