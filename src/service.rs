//! Request orchestration: one gate per upstream resource, upstream fetches
//! outside the lock, history appended on successful odds fetches.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use common::{ClockMap, Error, HistoryPoint, NormalizedGame, OddsRow, ServerConfig};
use espn_client::EspnClient;
use feed::history::{local_day_bounds, HistoryRecorder};
use feed::{FetchDecision, ResourceGate};
use oddsapi_client::OddsApiClient;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

struct FeedState {
    odds: ResourceGate<Vec<OddsRow>>,
    scores: ResourceGate<Vec<NormalizedGame>>,
    clocks: ResourceGate<ClockMap>,
    history: HistoryRecorder,
}

/// Shared context for the HTTP handlers. All mutable state lives behind one
/// mutex; the gate decision and the window-token write happen under that
/// lock before any upstream call is awaited.
pub struct FeedService {
    cfg: ServerConfig,
    odds_client: OddsApiClient,
    espn_client: EspnClient,
    state: Mutex<FeedState>,
    started_at: Instant,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub odds_cache_age_secs: Option<u64>,
    pub scores_cache_age_secs: Option<u64>,
}

fn odds_fingerprint(live: bool, bookmaker: &str) -> String {
    format!("live={live}&bookmaker={bookmaker}")
}

impl FeedService {
    pub fn new(cfg: ServerConfig) -> Self {
        let throttle = &cfg.throttle;
        let state = FeedState {
            odds: ResourceGate::new(
                "odds",
                Duration::from_secs(throttle.odds_ttl_secs),
                Duration::from_secs(throttle.odds_window_secs),
            ),
            scores: ResourceGate::new(
                "scores",
                Duration::from_secs(throttle.scores_ttl_secs),
                Duration::from_secs(throttle.scores_window_secs),
            ),
            clocks: ResourceGate::new(
                "clock",
                Duration::from_secs(throttle.clock_ttl_secs),
                Duration::from_secs(throttle.clock_window_secs),
            ),
            history: HistoryRecorder::new(cfg.history.capacity),
        };

        Self {
            odds_client: OddsApiClient::new(cfg.odds_api_key.clone()),
            espn_client: EspnClient::new(),
            state: Mutex::new(state),
            started_at: Instant::now(),
            cfg,
        }
    }

    /// Odds rows for the requested view. A granted fetch also appends to the
    /// totals history; cache-served responses never touch it.
    pub async fn odds_rows(
        &self,
        live: bool,
        bookmaker: Option<&str>,
    ) -> Result<Vec<OddsRow>, Error> {
        let book = bookmaker.unwrap_or(&self.cfg.bookmaker).to_string();
        let fingerprint = odds_fingerprint(live, &book);

        let decision = {
            let mut state = self.state.lock().await;
            state.odds.acquire(&fingerprint, Instant::now())
        };

        match decision {
            FetchDecision::ServeCached | FetchDecision::ServeStaleOrEmpty => {
                let state = self.state.lock().await;
                Ok(state.odds.cached().cloned().unwrap_or_default())
            }
            FetchDecision::Fetch => {
                let events = self
                    .odds_client
                    .fetch_odds(&self.cfg.sport_key, &self.cfg.regions, Some(&book))
                    .await?;
                let now = Utc::now();
                let rows = feed::assemble_rows(&events, &book, live, now);

                let mut state = self.state.lock().await;
                for row in &rows {
                    if row.commence_time.is_some() {
                        if let Some(point) = row.total_point {
                            state.history.record(&row.id, now, point);
                        }
                    }
                }
                state.odds.store(rows.clone(), &fingerprint, Instant::now());
                Ok(rows)
            }
        }
    }

    /// Normalized scoreboard, clock-merged across providers.
    pub async fn scores(&self) -> Result<Vec<NormalizedGame>, Error> {
        const FINGERPRINT: &str = "scores";

        let decision = {
            let mut state = self.state.lock().await;
            state.scores.acquire(FINGERPRINT, Instant::now())
        };

        match decision {
            FetchDecision::ServeCached | FetchDecision::ServeStaleOrEmpty => {
                let state = self.state.lock().await;
                Ok(state.scores.cached().cloned().unwrap_or_default())
            }
            FetchDecision::Fetch => {
                let events = self
                    .odds_client
                    .fetch_scores(&self.cfg.sport_key, self.cfg.scores_days_from)
                    .await?;
                let clocks = self.clock_map().await?;
                let now = Utc::now();
                let games: Vec<NormalizedGame> = events
                    .iter()
                    .map(|event| feed::normalize_and_merge(event, &clocks, now))
                    .collect();

                let mut state = self.state.lock().await;
                state.scores.store(games.clone(), FINGERPRINT, Instant::now());
                Ok(games)
            }
        }
    }

    /// ESPN clock map behind its own gate, so scoreboard polling stays
    /// throttled independently of the scores TTL.
    async fn clock_map(&self) -> Result<ClockMap, Error> {
        const FINGERPRINT: &str = "clock";

        let decision = {
            let mut state = self.state.lock().await;
            state.clocks.acquire(FINGERPRINT, Instant::now())
        };

        match decision {
            FetchDecision::ServeCached | FetchDecision::ServeStaleOrEmpty => {
                let state = self.state.lock().await;
                Ok(state.clocks.cached().cloned().unwrap_or_default())
            }
            FetchDecision::Fetch => {
                let events = self.espn_client.fetch_scoreboard().await?;
                let clocks = feed::build_clock_map(&events);
                let mut state = self.state.lock().await;
                state.clocks.store(clocks.clone(), FINGERPRINT, Instant::now());
                Ok(clocks)
            }
        }
    }

    /// Totals series recorded so far today, local calendar day.
    pub async fn history_today(&self) -> HashMap<String, Vec<HistoryPoint>> {
        let (start, end) = local_day_bounds(Local::now());
        let state = self.state.lock().await;
        state.history.query(start, end)
    }

    pub async fn health(&self) -> HealthSnapshot {
        let now = Instant::now();
        let state = self.state.lock().await;
        HealthSnapshot {
            status: "ok",
            uptime_secs: now.saturating_duration_since(self.started_at).as_secs(),
            odds_cache_age_secs: state.odds.age(now).map(|d| d.as_secs()),
            scores_cache_age_secs: state.scores.age(now).map(|d| d.as_secs()),
        }
    }

    /// One-shot connectivity probe for `--check-upstream`.
    pub async fn check_upstream(&self) -> Result<(), Error> {
        let events = self
            .odds_client
            .fetch_odds(
                &self.cfg.sport_key,
                &self.cfg.regions,
                Some(&self.cfg.bookmaker),
            )
            .await?;
        info!(
            "upstream ok: {} events for {}",
            events.len(),
            self.cfg.sport_key
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_covers_both_parameters() {
        assert_eq!(
            odds_fingerprint(true, "draftkings"),
            "live=true&bookmaker=draftkings"
        );
        assert_ne!(
            odds_fingerprint(true, "draftkings"),
            odds_fingerprint(false, "draftkings")
        );
        assert_ne!(
            odds_fingerprint(true, "draftkings"),
            odds_fingerprint(true, "fanduel")
        );
    }

    #[tokio::test]
    async fn test_health_reports_no_ages_before_first_fetch() {
        let service = FeedService::new(ServerConfig::default());
        let health = service.health().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.odds_cache_age_secs, None);
        assert_eq!(health.scores_cache_age_secs, None);
    }

    #[tokio::test]
    async fn test_history_starts_empty() {
        let service = FeedService::new(ServerConfig::default());
        assert!(service.history_today().await.is_empty());
    }
}
