//! Region label resolution and the bookmaker reference table.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

/// Human labels accepted for each provider region code.
const REGION_ALIASES: &[(&str, &str)] = &[
    ("au", "au"),
    ("australia", "au"),
    ("uk", "uk"),
    ("united kingdom", "uk"),
    ("great britain", "uk"),
    ("britain", "uk"),
    ("england", "uk"),
    ("us", "us"),
    ("usa", "us"),
    ("united states", "us"),
    ("america", "us"),
    ("us2", "us2"),
    ("eu", "eu"),
    ("europe", "eu"),
    ("fr", "fr"),
    ("france", "fr"),
    ("se", "se"),
    ("sweden", "se"),
    ("southamerica", "southamerica"),
    ("south america", "southamerica"),
];

/// Bookmakers by region as published by the provider.
const BOOKMAKERS: &[(&str, &str, &str)] = &[
    ("sportsbet", "SportsBet", "au"),
    ("tab", "TAB", "au"),
    ("neds", "Neds", "au"),
    ("ladbrokes_au", "Ladbrokes", "au"),
    ("pointsbetau", "PointsBet (AU)", "au"),
    ("unibet", "Unibet", "au"),
    ("betright", "Bet Right", "au"),
    ("betr_au", "Betr", "au"),
    ("playup", "PlayUp", "au"),
    ("topsport", "TopSport", "au"),
    ("bluebet", "BlueBet", "au"),
    ("williamhill", "William Hill", "uk"),
    ("betfair_ex_uk", "Betfair", "uk"),
    ("paddypower", "Paddy Power", "uk"),
    ("skybet", "Sky Bet", "uk"),
    ("coral", "Coral", "uk"),
    ("ladbrokes_uk", "Ladbrokes", "uk"),
    ("betfred", "Betfred", "uk"),
    ("betway", "Betway", "uk"),
    ("betvictor", "Bet Victor", "uk"),
    ("sport888", "888sport", "uk"),
    ("livescorebet", "LiveScore Bet", "uk"),
    ("matchbook", "Matchbook", "uk"),
    ("smarkets", "Smarkets", "uk"),
    ("draftkings", "DraftKings", "us"),
    ("fanduel", "FanDuel", "us"),
    ("betmgm", "BetMGM", "us"),
    ("williamhill_us", "Caesars", "us"),
    ("betrivers", "BetRivers", "us"),
    ("bovada", "Bovada", "us"),
    ("betonlineag", "BetOnline.ag", "us"),
    ("mybookieag", "MyBookie.ag", "us"),
    ("lowvig", "LowVig.ag", "us"),
    ("betus", "BetUS", "us"),
    ("espnbet", "ESPN BET", "us2"),
    ("fliff", "Fliff", "us2"),
    ("hardrockbet", "Hard Rock Bet", "us2"),
    ("pinnacle", "Pinnacle", "eu"),
    ("onexbet", "1xBet", "eu"),
    ("betsson", "Betsson", "eu"),
    ("marathonbet", "Marathon Bet", "eu"),
    ("nordicbet", "Nordic Bet", "eu"),
    ("coolbet", "Coolbet", "eu"),
    ("betclic", "Betclic", "eu"),
    ("everygame", "Everygame", "eu"),
    ("gtbets", "GTbets", "eu"),
    ("unibet_eu", "Unibet", "eu"),
    ("winamax_fr", "Winamax (FR)", "fr"),
    ("parionssport_fr", "Parions Sport (FR)", "fr"),
    ("leovegas_se", "LeoVegas (SE)", "se"),
    ("atg_se", "ATG (SE)", "se"),
];

/// Lowercase and collapse internal whitespace.
fn normalize(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Maps human-entered region labels to provider region codes.
#[derive(Debug, Clone)]
pub struct RegionTable {
    aliases: HashMap<String, &'static str>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new(REGION_ALIASES)
    }
}

impl RegionTable {
    /// Build a table from `(label, code)` pairs.
    pub fn new(aliases: &[(&str, &'static str)]) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(label, code)| (normalize(label), *code))
                .collect(),
        }
    }

    /// Canonical code for one label, case-insensitive.
    pub fn lookup(&self, label: &str) -> Option<&'static str> {
        self.aliases.get(&normalize(label)).copied()
    }

    /// Resolve labels to distinct canonical codes in first-seen order.
    ///
    /// Unknown labels are dropped with a warning. An empty result means no
    /// eligible region and the provider must not be called.
    pub fn resolve<S: AsRef<str>>(&self, labels: &[S]) -> Vec<String> {
        let mut codes: Vec<String> = Vec::with_capacity(labels.len());

        for label in labels {
            let label = label.as_ref();
            match self.lookup(label) {
                Some(code) => {
                    if !codes.iter().any(|c| c == code) {
                        codes.push(code.to_string());
                    }
                }
                None => warn!(label = %label, "Unrecognized region label dropped"),
            }
        }

        codes
    }

    /// All `(label, code)` entries sorted by label.
    pub fn entries(&self) -> Vec<RegionAlias> {
        let mut entries: Vec<RegionAlias> = self
            .aliases
            .iter()
            .map(|(label, code)| RegionAlias {
                label: label.clone(),
                code: *code,
            })
            .collect();
        entries.sort_by(|a, b| a.label.cmp(&b.label));
        entries
    }
}

/// One accepted region label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionAlias {
    /// Normalized human label.
    pub label: String,
    /// Provider region code.
    pub code: &'static str,
}

/// A bookmaker and the region it is listed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmakerRegion {
    /// Provider bookmaker key.
    pub key: &'static str,
    /// Display title as it appears in match records.
    pub title: &'static str,
    /// Provider region code.
    pub region: &'static str,
}

/// Static bookmaker-to-region reference table for display.
#[derive(Debug, Clone)]
pub struct BookmakerDirectory {
    entries: Vec<BookmakerRegion>,
}

impl Default for BookmakerDirectory {
    fn default() -> Self {
        Self {
            entries: BOOKMAKERS
                .iter()
                .map(|&(key, title, region)| BookmakerRegion { key, title, region })
                .collect(),
        }
    }
}

impl BookmakerDirectory {
    /// Every listed bookmaker.
    pub fn all(&self) -> &[BookmakerRegion] {
        &self.entries
    }

    /// Bookmakers listed under one region code.
    pub fn in_region<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a BookmakerRegion> {
        self.entries.iter().filter(move |b| b.region == code)
    }

    /// Regions carrying a bookmaker with this title.
    pub fn regions_for(&self, title: &str) -> Vec<&'static str> {
        let wanted = normalize(title);
        let mut regions: Vec<&'static str> = self
            .entries
            .iter()
            .filter(|b| normalize(b.title) == wanted)
            .map(|b| b.region)
            .collect();
        regions.dedup();
        regions
    }
}
