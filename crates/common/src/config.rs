//! Server configuration types.

use serde::{Deserialize, Serialize};

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The Odds API key.
    #[serde(default)]
    pub odds_api_key: String,

    /// Listen address for the HTTP server.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Sport key passed to the odds provider (e.g., "basketball_nba").
    #[serde(default = "default_sport_key")]
    pub sport_key: String,

    /// Regions parameter for odds queries.
    #[serde(default = "default_regions")]
    pub regions: String,

    /// Bookmaker key used when a query does not name one.
    #[serde(default = "default_bookmaker")]
    pub bookmaker: String,

    /// Days of recently completed games the scores feed should include.
    #[serde(default = "default_scores_days_from")]
    pub scores_days_from: u32,

    /// Per-resource throttle windows and TTLs.
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Intraday history buffer settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// TTL and window durations per throttled resource (all in seconds).
///
/// TTL bounds how old a cached value may be before a refetch is
/// considered; the window bounds how often a fetch may be attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_odds_ttl")]
    pub odds_ttl_secs: u64,

    #[serde(default = "default_odds_window")]
    pub odds_window_secs: u64,

    #[serde(default = "default_scores_ttl")]
    pub scores_ttl_secs: u64,

    #[serde(default = "default_scores_window")]
    pub scores_window_secs: u64,

    #[serde(default = "default_clock_ttl")]
    pub clock_ttl_secs: u64,

    #[serde(default = "default_clock_window")]
    pub clock_window_secs: u64,
}

/// History recorder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Max points retained per game; the oldest point is evicted beyond this.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_bind() -> String {
    "0.0.0.0:8080".into()
}

fn default_sport_key() -> String {
    "basketball_nba".into()
}

fn default_regions() -> String {
    "us".into()
}

fn default_bookmaker() -> String {
    "draftkings".into()
}

fn default_scores_days_from() -> u32 {
    1
}

fn default_odds_ttl() -> u64 {
    45
}
fn default_odds_window() -> u64 {
    60
}
fn default_scores_ttl() -> u64 {
    25
}
fn default_scores_window() -> u64 {
    30
}
fn default_clock_ttl() -> u64 {
    25
}
fn default_clock_window() -> u64 {
    30
}

fn default_history_capacity() -> usize {
    2000
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            odds_ttl_secs: default_odds_ttl(),
            odds_window_secs: default_odds_window(),
            scores_ttl_secs: default_scores_ttl(),
            scores_window_secs: default_scores_window(),
            clock_ttl_secs: default_clock_ttl(),
            clock_window_secs: default_clock_window(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            odds_api_key: String::new(),
            bind: default_bind(),
            sport_key: default_sport_key(),
            regions: default_regions(),
            bookmaker: default_bookmaker(),
            scores_days_from: default_scores_days_from(),
            throttle: ThrottleConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}
