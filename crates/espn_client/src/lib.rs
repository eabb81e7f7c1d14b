//! ESPN scoreboard client.
//!
//! Secondary live-clock feed: fetches the public NBA scoreboard and
//! exposes its events with period/clock status. The endpoint needs no
//! API key. A malformed payload is not an error here; clock data is
//! strictly optional for the callers, so decode failures degrade to an
//! empty event list.

use common::error::truncate_detail;
use common::Error;
use serde::Deserialize;
use tracing::{debug, warn};

const SCOREBOARD_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/basketball/nba/scoreboard";
const DETAIL_LIMIT: usize = 300;

/// ESPN scoreboard client.
#[derive(Debug, Clone)]
pub struct EspnClient {
    client: reqwest::Client,
}

// ── Payloads ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EspnScoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnCompetition {
    #[serde(default)]
    pub competitors: Vec<EspnCompetitor>,
    #[serde(default)]
    pub status: Option<EspnStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnCompetitor {
    #[serde(default)]
    pub team: Option<EspnTeam>,
    #[serde(rename = "homeAway", default)]
    pub home_away: String,
    #[serde(default)]
    pub score: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnTeam {
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "shortDisplayName", default)]
    pub short_display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStatus {
    #[serde(rename = "displayClock", default)]
    pub display_clock: Option<String>,
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(rename = "type", default)]
    pub status_type: Option<EspnStatusType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspnStatusType {
    /// "pre", "in", or "post".
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl EspnEvent {
    pub fn home_team(&self) -> Option<&str> {
        self.competitor_name("home")
    }

    pub fn away_team(&self) -> Option<&str> {
        self.competitor_name("away")
    }

    /// Status of the first competition, where ESPN keeps the clock.
    pub fn status(&self) -> Option<&EspnStatus> {
        self.competitions.first()?.status.as_ref()
    }

    fn competitor_name(&self, side: &str) -> Option<&str> {
        self.competitions
            .first()?
            .competitors
            .iter()
            .find(|c| c.home_away == side)
            .and_then(|c| c.team.as_ref())
            .and_then(|t| t.display_name.as_deref())
    }
}

// ── Client ────────────────────────────────────────────────────────────

impl EspnClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("oddsboard/0.1")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build ESPN HTTP client");

        Self { client }
    }

    /// Fetch today's scoreboard events.
    pub async fn fetch_scoreboard(&self) -> Result<Vec<EspnEvent>, Error> {
        debug!("GET {}", SCOREBOARD_URL);

        let resp = self
            .client
            .get(SCOREBOARD_URL)
            .send()
            .await
            .map_err(|e| Error::Http(format!("ESPN scoreboard request failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("ESPN scoreboard body read failed: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(Error::Espn {
                status,
                detail: truncate_detail(&body, DETAIL_LIMIT),
            });
        }

        Ok(parse_scoreboard(&body))
    }
}

impl Default for EspnClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_scoreboard(body: &str) -> Vec<EspnEvent> {
    match serde_json::from_str::<EspnScoreboard>(body) {
        Ok(scoreboard) => scoreboard.events,
        Err(e) => {
            warn!("ESPN scoreboard decode failed; continuing without clock data: {e}");
            Vec::new()
        }
    }
}
