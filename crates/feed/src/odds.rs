//! Totals lines lifted out of the odds payload into flat rows.

use chrono::{DateTime, Utc};
use common::OddsRow;
use oddsapi_client::{Bookmaker, OddsEvent};

/// Flatten odds events into one row per game, reading the totals line from
/// the preferred bookmaker where it is offered.
///
/// With `live` set, games that have not tipped off by `now` are dropped.
pub fn assemble_rows(
    events: &[OddsEvent],
    preferred_bookmaker: &str,
    live: bool,
    now: DateTime<Utc>,
) -> Vec<OddsRow> {
    events
        .iter()
        .filter(|event| !live || tip_off_passed(event, now))
        .map(|event| row_for_event(event, preferred_bookmaker))
        .collect()
}

fn tip_off_passed(event: &OddsEvent, now: DateTime<Utc>) -> bool {
    event.commence_time.is_some_and(|tip| tip <= now)
}

fn row_for_event(event: &OddsEvent, preferred_bookmaker: &str) -> OddsRow {
    let bookmaker = event
        .bookmakers
        .iter()
        .find(|b| b.key == preferred_bookmaker)
        .or_else(|| event.bookmakers.first());

    OddsRow {
        id: event.id.clone(),
        sport_key: event.sport_key.clone(),
        commence_time: event.commence_time,
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        bookmaker: bookmaker.map(|b| b.key.clone()),
        bookmaker_last_update: bookmaker.and_then(|b| b.last_update),
        total_point: bookmaker.and_then(total_point),
    }
}

/// Over/Under threshold: the "Over" outcome's point, or the first outcome
/// carrying a point when sides are unlabeled.
fn total_point(bookmaker: &Bookmaker) -> Option<f64> {
    let market = bookmaker.markets.iter().find(|m| m.key == "totals")?;
    market
        .outcomes
        .iter()
        .find(|o| o.name.eq_ignore_ascii_case("over"))
        .and_then(|o| o.point)
        .or_else(|| market.outcomes.iter().find_map(|o| o.point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use oddsapi_client::{Market, Outcome};

    fn outcome(name: &str, point: Option<f64>) -> Outcome {
        Outcome {
            name: name.to_string(),
            price: Some(-110.0),
            point,
        }
    }

    fn totals_bookmaker(key: &str, total: f64) -> Bookmaker {
        Bookmaker {
            key: key.to_string(),
            title: key.to_string(),
            last_update: Some(Utc::now()),
            markets: vec![Market {
                key: "totals".to_string(),
                outcomes: vec![
                    outcome("Over", Some(total)),
                    outcome("Under", Some(total)),
                ],
            }],
        }
    }

    fn event(commence_offset_hours: i64, bookmakers: Vec<Bookmaker>) -> OddsEvent {
        OddsEvent {
            id: "evt1".to_string(),
            sport_key: "basketball_nba".to_string(),
            commence_time: Some(Utc::now() + Duration::hours(commence_offset_hours)),
            home_team: "Los Angeles Lakers".to_string(),
            away_team: "Boston Celtics".to_string(),
            bookmakers,
        }
    }

    #[test]
    fn test_preferred_bookmaker_wins() {
        let events = vec![event(
            -1,
            vec![
                totals_bookmaker("fanduel", 221.5),
                totals_bookmaker("draftkings", 224.5),
            ],
        )];
        let rows = assemble_rows(&events, "draftkings", false, Utc::now());
        assert_eq!(rows[0].bookmaker.as_deref(), Some("draftkings"));
        assert_eq!(rows[0].total_point, Some(224.5));
    }

    #[test]
    fn test_falls_back_to_first_bookmaker() {
        let events = vec![event(-1, vec![totals_bookmaker("fanduel", 221.5)])];
        let rows = assemble_rows(&events, "draftkings", false, Utc::now());
        assert_eq!(rows[0].bookmaker.as_deref(), Some("fanduel"));
        assert_eq!(rows[0].total_point, Some(221.5));
    }

    #[test]
    fn test_missing_totals_market_yields_null_point() {
        let mut bookmaker = totals_bookmaker("draftkings", 224.5);
        bookmaker.markets[0].key = "h2h".to_string();
        let events = vec![event(-1, vec![bookmaker])];
        let rows = assemble_rows(&events, "draftkings", false, Utc::now());
        assert_eq!(rows[0].bookmaker.as_deref(), Some("draftkings"));
        assert_eq!(rows[0].total_point, None);
    }

    #[test]
    fn test_unlabeled_outcomes_fall_back_to_first_point() {
        let mut bookmaker = totals_bookmaker("draftkings", 224.5);
        bookmaker.markets[0].outcomes = vec![outcome("O/U", None), outcome("line", Some(218.0))];
        let events = vec![event(-1, vec![bookmaker])];
        let rows = assemble_rows(&events, "draftkings", false, Utc::now());
        assert_eq!(rows[0].total_point, Some(218.0));
    }

    #[test]
    fn test_no_bookmakers_yields_null_row() {
        let events = vec![event(-1, vec![])];
        let rows = assemble_rows(&events, "draftkings", false, Utc::now());
        assert_eq!(rows[0].bookmaker, None);
        assert_eq!(rows[0].total_point, None);
    }

    #[test]
    fn test_live_filter_drops_future_games() {
        let events = vec![
            event(-1, vec![totals_bookmaker("draftkings", 224.5)]),
            event(3, vec![totals_bookmaker("draftkings", 230.0)]),
        ];
        let now = Utc::now();
        assert_eq!(assemble_rows(&events, "draftkings", true, now).len(), 1);
        assert_eq!(assemble_rows(&events, "draftkings", false, now).len(), 2);
    }
}
