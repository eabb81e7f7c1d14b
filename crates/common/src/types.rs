//! Canonical shapes served to clients.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One game reconciled from the scores feed into a stable schema.
///
/// Scores and clock are `None` when no extraction strategy produced a
/// value; they are never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedGame {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    /// 1-4 for regulation quarters, 5+ for overtime periods.
    pub period: Option<u32>,
    /// Display clock, e.g. "05:30".
    pub clock: Option<String>,
    pub completed: bool,
}

/// Period/clock pair inferred from a status payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub period: Option<u32>,
    pub clock: Option<String>,
}

/// Clock states keyed by `normalized_away + "__" + normalized_home`.
pub type ClockMap = HashMap<String, ClockState>;

/// One row of the odds endpoint: a game with its totals line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRow {
    pub id: String,
    pub sport_key: String,
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    /// Key of the bookmaker the totals line was read from.
    pub bookmaker: Option<String>,
    pub bookmaker_last_update: Option<DateTime<Utc>>,
    /// Over/Under threshold of the totals market, when offered.
    pub total_point: Option<f64>,
}

/// One sampled totals value in an intraday series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub ts: DateTime<Utc>,
    pub y: f64,
}
