//! The Odds API client.
//!
//! Fetches totals odds and game scores from api.the-odds-api.com and
//! decodes them into lenient typed payloads. Every request spends quota
//! on a metered plan, so callers are expected to sit behind a throttle.

use chrono::{DateTime, Utc};
use common::error::truncate_detail;
use common::Error;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.the-odds-api.com/v4";
const DETAIL_LIMIT: usize = 300;

/// The Odds API client.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    client: reqwest::Client,
    api_key: String,
}

// ── Payloads ──────────────────────────────────────────────────────────

/// One event from `/sports/{sport}/odds`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bookmaker {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Market {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}

/// One event from `/sports/{sport}/scores`.
///
/// Field coverage is wider than any single response shape: score feeds
/// variously surface explicit numeric fields, a combined "away-home"
/// string, or named per-team/per-quarter entries, and the status is
/// either plain text or a structured object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub home_score: Option<i64>,
    #[serde(default)]
    pub away_score: Option<i64>,
    #[serde(default)]
    pub scores: Option<Vec<ScoreEntry>>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

/// One sub-score entry: a team or quarter name with a score value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: Option<serde_json::Value>,
}

impl ScoreEntry {
    /// Score as an integer, accepting both numbers and numeric strings.
    pub fn score_as_i64(&self) -> Option<i64> {
        match self.score.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Score as raw text, when the provider sent a string.
    pub fn score_as_str(&self) -> Option<&str> {
        match self.score.as_ref()? {
            serde_json::Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────

impl OddsApiClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("oddsboard/0.1")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build The Odds API HTTP client");

        Self { client, api_key }
    }

    /// Fetch totals odds for a sport, optionally restricted to one bookmaker.
    pub async fn fetch_odds(
        &self,
        sport_key: &str,
        regions: &str,
        bookmaker: Option<&str>,
    ) -> Result<Vec<OddsEvent>, Error> {
        let url = format!("{}/sports/{}/odds", BASE_URL, sport_key);
        let mut query = vec![
            ("regions", regions.to_string()),
            ("markets", "totals".to_string()),
            ("oddsFormat", "american".to_string()),
            ("apiKey", self.api_key.clone()),
        ];
        if let Some(key) = bookmaker {
            query.push(("bookmakers", key.to_string()));
        }

        self.get_json(&url, &query).await
    }

    /// Fetch scores, including games completed up to `days_from` days back.
    pub async fn fetch_scores(
        &self,
        sport_key: &str,
        days_from: u32,
    ) -> Result<Vec<ScoreEvent>, Error> {
        let url = format!("{}/sports/{}/scores", BASE_URL, sport_key);
        let query = vec![
            ("daysFrom", days_from.to_string()),
            ("apiKey", self.api_key.clone()),
        ];

        self.get_json(&url, &query).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        // The API key travels in the query pairs; only the bare URL is logged.
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(format!("The Odds API request failed: {e}")))?;

        let status = resp.status().as_u16();
        log_quota(resp.headers());

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("The Odds API body read failed: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(Error::OddsApi {
                status,
                detail: truncate_detail(&body, DETAIL_LIMIT),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Log the metered-plan quota headers returned with every response.
fn log_quota(headers: &reqwest::header::HeaderMap) {
    let remaining = headers
        .get("x-requests-remaining")
        .and_then(|v| v.to_str().ok());
    let used = headers.get("x-requests-used").and_then(|v| v.to_str().ok());

    if remaining.is_some() || used.is_some() {
        debug!(
            "The Odds API quota: remaining={} used={}",
            remaining.unwrap_or("?"),
            used.unwrap_or("?")
        );
    }
}
