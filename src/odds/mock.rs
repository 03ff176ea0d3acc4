//! Mock odds provider for unit testing.
//!
//! This module provides a provider that serves canned match records
//! without making real network requests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::client::OddsProvider;
use super::types::{Match, Sport};
use crate::error::ProviderError;

/// Failure the mock should report instead of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Report an authentication failure.
    Authentication,
    /// Report rate limiting.
    RateLimited,
    /// Report an undecodable body.
    Malformed,
}

impl MockFailure {
    fn to_error(self) -> ProviderError {
        match self {
            MockFailure::Authentication => ProviderError::Authentication("invalid api key".into()),
            MockFailure::RateLimited => ProviderError::RateLimited { remaining: Some(0) },
            MockFailure::Malformed => ProviderError::MalformedResponse("expected array".into()),
        }
    }
}

/// A recorded `fetch_odds` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    /// Requested sport key.
    pub sport: String,
    /// Requested region codes.
    pub regions: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    matches: HashMap<String, Vec<Match>>,
    sports: Vec<Sport>,
    failures: HashMap<String, MockFailure>,
    sports_failure: Option<MockFailure>,
    requests: Vec<MockRequest>,
}

/// Mock odds provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockOddsProvider {
    state: Arc<RwLock<MockState>>,
}

impl MockOddsProvider {
    /// Create an empty mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve these matches for a sport and list the sport as active.
    pub fn set_matches(&self, sport: &str, matches: Vec<Match>) {
        let mut state = self.write();
        state.matches.insert(sport.to_string(), matches);
        if !state.sports.iter().any(|s| s.key == sport) {
            state.sports.push(Sport {
                key: sport.to_string(),
                group: String::new(),
                title: sport.to_string(),
                description: String::new(),
                active: true,
                has_outrights: false,
            });
        }
    }

    /// Replace the sports list.
    pub fn set_sports(&self, sports: Vec<Sport>) {
        self.write().sports = sports;
    }

    /// Fail odds requests for a sport.
    pub fn fail_sport(&self, sport: &str, failure: MockFailure) {
        self.write().failures.insert(sport.to_string(), failure);
    }

    /// Fail sports listing.
    pub fn fail_sports(&self, failure: MockFailure) {
        self.write().sports_failure = Some(failure);
    }

    /// All `fetch_odds` calls received so far.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.read().requests.clone()
    }

    /// Clear all mock data and recorded calls.
    pub fn clear(&self) {
        *self.write() = MockState::default();
    }
}

#[async_trait]
impl OddsProvider for MockOddsProvider {
    async fn fetch_odds(&self, sport: &str, regions: &[String]) -> Result<Vec<Match>, ProviderError> {
        let mut state = self.write();
        state.requests.push(MockRequest {
            sport: sport.to_string(),
            regions: regions.to_vec(),
        });

        if let Some(failure) = state.failures.get(sport) {
            return Err(failure.to_error());
        }

        Ok(state.matches.get(sport).cloned().unwrap_or_default())
    }

    async fn list_sports(&self) -> Result<Vec<Sport>, ProviderError> {
        let state = self.read();
        match state.sports_failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(state.sports.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(home: &str, away: &str) -> Match {
        Match {
            sport_key: "soccer_epl".into(),
            home_team: home.into(),
            away_team: away.into(),
            commence_time: None,
            bookmaker_quotes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn serves_configured_matches_and_records_calls() {
        let provider = MockOddsProvider::new();
        provider.set_matches("soccer_epl", vec![record("A", "B")]);

        let matches = provider
            .fetch_odds("soccer_epl", &["au".to_string()])
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);

        let unknown = provider.fetch_odds("cricket", &["au".to_string()]).await.unwrap();
        assert!(unknown.is_empty());

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].sport, "soccer_epl");
        assert_eq!(requests[0].regions, vec!["au"]);

        let sports = provider.list_sports().await.unwrap();
        assert_eq!(sports.len(), 1);
        assert!(sports[0].active);
    }

    #[tokio::test]
    async fn reports_configured_failures() {
        let provider = MockOddsProvider::new();
        provider.fail_sport("soccer_epl", MockFailure::RateLimited);
        provider.fail_sports(MockFailure::Authentication);

        let result = provider.fetch_odds("soccer_epl", &["au".to_string()]).await;
        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));

        let result = provider.list_sports().await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));

        provider.clear();
        assert!(provider.requests().is_empty());
        assert!(provider.list_sports().await.unwrap().is_empty());
    }
}
