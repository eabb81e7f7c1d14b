//! Score and clock extraction from the odds provider's loosely-shaped
//! score events.
//!
//! The provider's `scores` and `status` payloads vary by sport and by game
//! phase, so extraction runs ordered strategy tables: the first strategy
//! that produces anything wins, and anything unextractable stays `None`
//! rather than being zero-filled.

use chrono::{DateTime, Utc};
use common::{ClockState, NormalizedGame};
use oddsapi_client::{ScoreEntry, ScoreEvent};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::names;

// ── Status text patterns ──────────────────────────────────────────────

static RE_Q_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bQ([1-4])\s+(\d{1,2}:\d{2})").unwrap());

static RE_QUARTER_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([1-4])(?:st|nd|rd|th)\s+Quarter\s*-\s*(\d{1,2}:\d{2})").unwrap()
});

static RE_END_OF_QUARTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEnd\s+of\s+(?:the\s+)?([1-4])(?:st|nd|rd|th)?\s+Quarter").unwrap()
});

static RE_OVERTIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)?OT\s*-\s*(\d{1,2}:\d{2})").unwrap());

static RE_DASH_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,3})\s*-\s*(\d{1,3})\s*$").unwrap());

/// Entry names the provider uses for per-period score lines.
const QUARTER_NAMES: [&str; 4] = ["1st quarter", "2nd quarter", "3rd quarter", "4th quarter"];

/// Halftime: the third quarter has not started yet.
pub fn halftime_state() -> ClockState {
    ClockState {
        period: Some(3),
        clock: Some("12:00".to_string()),
    }
}

/// Regulation over.
pub fn final_state() -> ClockState {
    ClockState {
        period: Some(4),
        clock: Some("0:00".to_string()),
    }
}

// ── Status context ────────────────────────────────────────────────────

/// Fields a clock rule may consult, pre-extracted from the raw status value.
struct StatusCtx<'a> {
    text: &'a str,
    state: Option<&'a str>,
    entries: &'a [ScoreEntry],
    completed: bool,
}

/// Human-readable status line. The provider sends either a bare string or
/// an object; objects nest the text under varying keys.
fn status_text(status: Option<&Value>) -> Option<&str> {
    let status = status?;
    status
        .as_str()
        .or_else(|| status.get("description").and_then(Value::as_str))
        .or_else(|| status.get("detail").and_then(Value::as_str))
        .or_else(|| {
            status
                .get("type")
                .and_then(|t| t.get("description"))
                .and_then(Value::as_str)
        })
}

/// Machine state ("pre", "in", "post"), when the status is an object.
fn status_state(status: Option<&Value>) -> Option<&str> {
    let status = status?;
    status
        .get("state")
        .and_then(Value::as_str)
        .or_else(|| {
            status
                .get("type")
                .and_then(|t| t.get("state"))
                .and_then(Value::as_str)
        })
}

// ── Clock rules, most specific first ──────────────────────────────────

type ClockRule = fn(&StatusCtx) -> Option<ClockState>;

const CLOCK_RULES: &[(&str, ClockRule)] = &[
    ("explicit-quarter", explicit_quarter),
    ("halftime", halftime),
    ("final", final_whistle),
    ("end-of-quarter", end_of_quarter),
    ("overtime", overtime),
    ("quarter-count", quarter_count),
];

fn explicit_quarter(ctx: &StatusCtx) -> Option<ClockState> {
    let caps = RE_Q_CLOCK
        .captures(ctx.text)
        .or_else(|| RE_QUARTER_CLOCK.captures(ctx.text))?;
    let period = caps[1].parse().ok()?;
    Some(ClockState {
        period: Some(period),
        clock: Some(caps[2].to_string()),
    })
}

fn halftime(ctx: &StatusCtx) -> Option<ClockState> {
    ctx.text
        .to_ascii_lowercase()
        .contains("halftime")
        .then(halftime_state)
}

fn final_whistle(ctx: &StatusCtx) -> Option<ClockState> {
    let lower = ctx.text.to_ascii_lowercase();
    let over = ctx.completed
        || ctx.state.is_some_and(|s| s.eq_ignore_ascii_case("post"))
        || lower.contains("final")
        || lower.contains("completed");
    over.then(final_state)
}

fn end_of_quarter(ctx: &StatusCtx) -> Option<ClockState> {
    let caps = RE_END_OF_QUARTER.captures(ctx.text)?;
    let finished: u32 = caps[1].parse().ok()?;
    Some(ClockState {
        period: Some((finished + 1).min(4)),
        clock: Some("12:00".to_string()),
    })
}

fn overtime(ctx: &StatusCtx) -> Option<ClockState> {
    let caps = RE_OVERTIME.captures(ctx.text)?;
    let n = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(1);
    Some(ClockState {
        period: Some(4u32.saturating_add(n)),
        clock: Some(caps[2].to_string()),
    })
}

/// No usable status text: infer the running quarter from how many
/// per-period score lines have landed. Applies only to games in progress.
fn quarter_count(ctx: &StatusCtx) -> Option<ClockState> {
    if ctx.completed {
        return None;
    }
    let finished = completed_quarters(ctx.entries);
    Some(ClockState {
        period: Some((finished + 1).min(4)),
        clock: None,
    })
}

fn completed_quarters(entries: &[ScoreEntry]) -> u32 {
    entries
        .iter()
        .filter(|entry| {
            let name = entry.name.trim().to_ascii_lowercase();
            QUARTER_NAMES.contains(&name.as_str()) && entry.score_as_i64().is_some()
        })
        .count() as u32
}

fn extract_clock(ctx: &StatusCtx) -> ClockState {
    for (name, rule) in CLOCK_RULES {
        if let Some(state) = rule(ctx) {
            tracing::debug!("clock via {} rule: {:?}", name, state);
            return state;
        }
    }
    ClockState::default()
}

// ── Score strategies, most trusted first ──────────────────────────────

type ScoreStrategy = fn(&ScoreEvent) -> Option<(Option<i64>, Option<i64>)>;

const SCORE_STRATEGIES: &[(&str, ScoreStrategy)] = &[
    ("explicit-fields", explicit_fields),
    ("combined-string", combined_string),
    ("named-entries", named_entries),
];

fn explicit_fields(event: &ScoreEvent) -> Option<(Option<i64>, Option<i64>)> {
    if event.home_score.is_none() && event.away_score.is_none() {
        return None;
    }
    Some((event.home_score, event.away_score))
}

/// A single "98-102" entry, away score first.
fn combined_string(event: &ScoreEvent) -> Option<(Option<i64>, Option<i64>)> {
    for entry in event.scores.as_deref()? {
        let Some(raw) = entry.score_as_str() else {
            continue;
        };
        if let Some(caps) = RE_DASH_SCORE.captures(raw) {
            let away = caps[1].parse().ok();
            let home = caps[2].parse().ok();
            return Some((home, away));
        }
    }
    None
}

/// Per-team entries whose names match the event's teams.
fn named_entries(event: &ScoreEvent) -> Option<(Option<i64>, Option<i64>)> {
    let mut home = None;
    let mut away = None;
    for entry in event.scores.as_deref()? {
        let Some(value) = entry.score_as_i64() else {
            continue;
        };
        if names::same_team(&entry.name, &event.home_team) {
            home.get_or_insert(value);
        } else if names::same_team(&entry.name, &event.away_team) {
            away.get_or_insert(value);
        }
    }
    if home.is_none() && away.is_none() {
        return None;
    }
    Some((home, away))
}

fn extract_scores(event: &ScoreEvent) -> (Option<i64>, Option<i64>) {
    for (name, strategy) in SCORE_STRATEGIES {
        if let Some((home, away)) = strategy(event) {
            tracing::debug!("scores for {} via {} strategy", event.id, name);
            return (home, away);
        }
    }
    (None, None)
}

// ── Entry point ───────────────────────────────────────────────────────

/// A game whose scheduled start still lies in the future.
pub fn pre_tip(event: &ScoreEvent, now: DateTime<Utc>) -> bool {
    event.commence_time.is_some_and(|tip| tip > now)
}

/// Reconcile one provider score event into the canonical game shape.
///
/// `now` gates pre-tip handling: a game whose start lies in the future is
/// served all-null and not completed no matter what the payload claims.
pub fn normalize_event(event: &ScoreEvent, now: DateTime<Utc>) -> NormalizedGame {
    if pre_tip(event, now) {
        return NormalizedGame {
            id: event.id.clone(),
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            home_score: None,
            away_score: None,
            period: None,
            clock: None,
            completed: false,
        };
    }

    let ctx = StatusCtx {
        text: status_text(event.status.as_ref()).unwrap_or(""),
        state: status_state(event.status.as_ref()),
        entries: event.scores.as_deref().unwrap_or(&[]),
        completed: event.completed,
    };
    let (home_score, away_score) = extract_scores(event);
    let clock = extract_clock(&ctx);
    let completed =
        event.completed || ctx.state.is_some_and(|s| s.eq_ignore_ascii_case("post"));

    NormalizedGame {
        id: event.id.clone(),
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        home_score,
        away_score,
        period: clock.period,
        clock: clock.clock,
        completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn base_event() -> ScoreEvent {
        ScoreEvent {
            id: "evt1".to_string(),
            sport_key: "basketball_nba".to_string(),
            commence_time: Some(Utc::now() - Duration::hours(1)),
            home_team: "Los Angeles Lakers".to_string(),
            away_team: "Boston Celtics".to_string(),
            ..Default::default()
        }
    }

    fn entry(name: &str, score: Value) -> ScoreEntry {
        ScoreEntry {
            name: name.to_string(),
            score: Some(score),
        }
    }

    #[test]
    fn test_quarter_dash_clock_parses() {
        let mut event = base_event();
        event.status = Some(json!("2nd Quarter - 05:30"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(2));
        assert_eq!(game.clock.as_deref(), Some("05:30"));
        assert!(!game.completed);
    }

    #[test]
    fn test_q_prefix_clock_parses() {
        let mut event = base_event();
        event.status = Some(json!({"description": "Q3 07:15"}));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(3));
        assert_eq!(game.clock.as_deref(), Some("07:15"));
    }

    #[test]
    fn test_halftime_maps_to_third_quarter_start() {
        let mut event = base_event();
        event.status = Some(json!("Halftime"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(3));
        assert_eq!(game.clock.as_deref(), Some("12:00"));
        assert!(!game.completed);
    }

    #[test]
    fn test_final_text_maps_to_end_of_regulation() {
        let mut event = base_event();
        event.status = Some(json!("Final"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(4));
        assert_eq!(game.clock.as_deref(), Some("0:00"));
    }

    #[test]
    fn test_post_state_completes_the_game() {
        let mut event = base_event();
        event.status = Some(json!({"type": {"state": "post", "description": "Game over"}}));
        let game = normalize_event(&event, Utc::now());
        assert!(game.completed);
        assert_eq!(game.period, Some(4));
        assert_eq!(game.clock.as_deref(), Some("0:00"));
    }

    #[test]
    fn test_end_of_quarter_advances_period() {
        let mut event = base_event();
        event.status = Some(json!("End of 3rd Quarter"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(4));
        assert_eq!(game.clock.as_deref(), Some("12:00"));
    }

    #[test]
    fn test_end_of_fourth_quarter_caps_at_four() {
        let mut event = base_event();
        event.status = Some(json!("End of the 4th Quarter"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(4));
    }

    #[test]
    fn test_overtime_periods_extend_past_four() {
        let mut event = base_event();
        event.status = Some(json!("2OT - 03:10"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(6));
        assert_eq!(game.clock.as_deref(), Some("03:10"));

        event.status = Some(json!("OT - 04:55"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(5));
        assert_eq!(game.clock.as_deref(), Some("04:55"));
    }

    #[test]
    fn test_absurd_overtime_count_saturates() {
        let mut event = base_event();
        event.status = Some(json!("4294967295OT - 01:00"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(u32::MAX));
        assert_eq!(game.clock.as_deref(), Some("01:00"));
    }

    #[test]
    fn test_quarter_entries_infer_running_period() {
        let mut event = base_event();
        event.scores = Some(vec![
            entry("1st Quarter", json!(28)),
            entry("2nd Quarter", json!("31")),
        ]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(3));
        assert_eq!(game.clock, None);
    }

    #[test]
    fn test_four_quarter_entries_cap_at_four() {
        let mut event = base_event();
        event.scores = Some(vec![
            entry("1st Quarter", json!(28)),
            entry("2nd Quarter", json!(31)),
            entry("3rd Quarter", json!(25)),
            entry("4th Quarter", json!(30)),
        ]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(4));
        assert_eq!(game.clock, None);
    }

    #[test]
    fn test_started_game_without_any_signal_is_first_period() {
        let event = base_event();
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.period, Some(1));
        assert_eq!(game.clock, None);
        assert_eq!(game.home_score, None);
        assert_eq!(game.away_score, None);
    }

    #[test]
    fn test_pre_tip_game_is_all_null_despite_payload() {
        let mut event = base_event();
        event.commence_time = Some(Utc::now() + Duration::hours(2));
        event.completed = true;
        event.home_score = Some(98);
        event.status = Some(json!("Final"));
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.home_score, None);
        assert_eq!(game.away_score, None);
        assert_eq!(game.period, None);
        assert_eq!(game.clock, None);
        assert!(!game.completed);
    }

    #[test]
    fn test_explicit_fields_beat_entry_strategies() {
        let mut event = base_event();
        event.home_score = Some(110);
        event.away_score = Some(104);
        event.scores = Some(vec![entry("score", json!("98-102"))]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.home_score, Some(110));
        assert_eq!(game.away_score, Some(104));
    }

    #[test]
    fn test_dash_entry_reads_away_score_first() {
        let mut event = base_event();
        event.scores = Some(vec![entry("score", json!("98-102"))]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.away_score, Some(98));
        assert_eq!(game.home_score, Some(102));
    }

    #[test]
    fn test_named_entries_match_through_team_aliases() {
        let mut event = base_event();
        event.scores = Some(vec![
            entry("LA Lakers", json!("102")),
            entry("Celtics", json!(98)),
        ]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.home_score, Some(102));
        assert_eq!(game.away_score, Some(98));
    }

    #[test]
    fn test_one_sided_entries_leave_other_side_null() {
        let mut event = base_event();
        event.scores = Some(vec![entry("Boston Celtics", json!(55))]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.away_score, Some(55));
        assert_eq!(game.home_score, None);
    }

    #[test]
    fn test_explicit_single_side_still_wins() {
        let mut event = base_event();
        event.away_score = Some(60);
        event.scores = Some(vec![entry("score", json!("98-102"))]);
        let game = normalize_event(&event, Utc::now());
        assert_eq!(game.away_score, Some(60));
        assert_eq!(game.home_score, None);
    }
}
