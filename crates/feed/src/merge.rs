//! Clock back-fill from the scoreboard feed.
//!
//! The odds provider's status text goes quiet for stretches of live games;
//! the scoreboard feed almost always has a period and display clock. This
//! module turns a scoreboard snapshot into a map keyed by matchup and fills
//! the holes it can, never overwriting what score normalization produced.
//! Games that have not tipped off are never filled: the all-null pre-tip
//! shape wins over any scoreboard entry for the same matchup.

use chrono::{DateTime, Utc};
use common::{ClockMap, ClockState, NormalizedGame};
use espn_client::EspnEvent;
use oddsapi_client::ScoreEvent;

use crate::names::{pair_key, same_team_normalized};
use crate::normalize::{final_state, halftime_state, normalize_event, pre_tip};

/// Build a matchup-keyed clock map from a scoreboard snapshot.
///
/// Events with no identifiable teams or no status are skipped. Halftime and
/// finished games map to the same canonical states score normalization
/// uses, so the two sources cannot disagree on those.
pub fn build_clock_map(events: &[EspnEvent]) -> ClockMap {
    let mut map = ClockMap::new();
    for event in events {
        let (Some(home), Some(away)) = (event.home_team(), event.away_team()) else {
            continue;
        };
        let Some(status) = event.status() else {
            continue;
        };
        let status_type = status.status_type.as_ref();
        let state = status_type.and_then(|t| t.state.as_deref());
        let completed = status_type.is_some_and(|t| t.completed);
        let description = status_type
            .and_then(|t| t.description.as_deref())
            .unwrap_or("");

        let clock_state = if description.to_ascii_lowercase().contains("halftime") {
            halftime_state()
        } else if completed || state.is_some_and(|s| s.eq_ignore_ascii_case("post")) {
            final_state()
        } else {
            // Pre-game scoreboards carry period 0 and clock "0:00"; only a
            // started period is worth merging.
            let Some(period) = status.period.filter(|p| *p >= 1) else {
                continue;
            };
            ClockState {
                period: Some(period),
                clock: status.display_clock.clone(),
            }
        };
        map.insert(pair_key(away, home), clock_state);
    }
    tracing::debug!("clock map holds {} matchups", map.len());
    map
}

/// Full scores pipeline for one provider event: normalize, then fill clock
/// holes from the scoreboard map. A pre-tip game skips the merge entirely,
/// since its nulls are deliberate, not holes.
pub fn normalize_and_merge(
    event: &ScoreEvent,
    clocks: &ClockMap,
    now: DateTime<Utc>,
) -> NormalizedGame {
    let game = normalize_event(event, now);
    if pre_tip(event, now) {
        return game;
    }
    merge_clock(game, clocks)
}

/// Fill a game's missing period and clock from the scoreboard map. Fields
/// the game already carries are left alone.
pub fn merge_clock(mut game: NormalizedGame, clocks: &ClockMap) -> NormalizedGame {
    if game.period.is_some() && game.clock.is_some() {
        return game;
    }
    let Some(found) = lookup(clocks, &game.away_team, &game.home_team) else {
        return game;
    };
    if game.period.is_none() {
        game.period = found.period;
    }
    if game.clock.is_none() {
        game.clock = found.clock.clone();
    }
    game
}

/// Exact key hit first, then a fuzzy scan for provider spelling drift.
fn lookup<'a>(clocks: &'a ClockMap, away_team: &str, home_team: &str) -> Option<&'a ClockState> {
    let key = pair_key(away_team, home_team);
    if let Some(state) = clocks.get(&key) {
        return Some(state);
    }
    let (away, home) = key.split_once("__")?;
    clocks.iter().find_map(|(candidate, state)| {
        let (cand_away, cand_home) = candidate.split_once("__")?;
        (same_team_normalized(away, cand_away) && same_team_normalized(home, cand_home))
            .then_some(state)
    })
}
