//! Bounded in-memory history of totals lines, one series per game.

use std::collections::{HashMap, VecDeque};

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use common::HistoryPoint;

/// Append-only per-entity series with a hard length cap. Oldest points are
/// evicted one at a time as new ones arrive, so memory stays flat no matter
/// how long the process runs.
#[derive(Debug)]
pub struct HistoryRecorder {
    capacity: usize,
    series: HashMap<String, VecDeque<HistoryPoint>>,
}

impl HistoryRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            series: HashMap::new(),
        }
    }

    /// Append one point, creating the series on first sight of the entity.
    pub fn record(&mut self, entity_id: &str, ts: DateTime<Utc>, y: f64) {
        let series = self.series.entry(entity_id.to_string()).or_default();
        series.push_back(HistoryPoint { ts, y });
        if series.len() > self.capacity {
            series.pop_front();
        }
    }

    /// Points with `ts` in `[day_start, day_end)`, per entity. Entities with
    /// nothing in range are omitted entirely.
    pub fn query(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> HashMap<String, Vec<HistoryPoint>> {
        self.series
            .iter()
            .filter_map(|(id, points)| {
                let in_range: Vec<HistoryPoint> = points
                    .iter()
                    .filter(|p| p.ts >= day_start && p.ts < day_end)
                    .copied()
                    .collect();
                if in_range.is_empty() {
                    None
                } else {
                    Some((id.clone(), in_range))
                }
            })
            .collect()
    }
}

/// UTC bounds of the local calendar day containing `now`: local midnight to
/// the next local midnight, half-open.
pub fn local_day_bounds(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    (
        local_midnight_utc(today),
        local_midnight_utc(today + Duration::days(1)),
    )
}

fn local_midnight_utc(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    first_valid_local(midnight, |candidate| Local.from_local_datetime(candidate))
        // No valid local time within four hours of midnight: give up on the
        // zone and read the wall-clock time as UTC.
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Earliest resolvable instant at or after `start`, stepping forward in
/// half-hour increments across a possible DST gap. Ambiguous wall-clock
/// times take the earlier offset.
fn first_valid_local<F>(start: NaiveDateTime, resolve: F) -> Option<DateTime<Utc>>
where
    F: Fn(&NaiveDateTime) -> LocalResult<DateTime<Local>>,
{
    (0..=8).find_map(|half_hours| {
        let candidate = start + Duration::minutes(30 * half_hours);
        resolve(&candidate).earliest().map(|dt| dt.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, hour, min, 0).unwrap()
    }

    #[test]
    fn test_series_length_never_exceeds_capacity() {
        let mut recorder = HistoryRecorder::new(2000);
        let base = ts(0, 0);
        for i in 0..2001i64 {
            recorder.record("evt1", base + Duration::seconds(i), 220.0 + i as f64);
        }
        let day = recorder.query(base, base + Duration::days(1));
        let points = &day["evt1"];
        assert_eq!(points.len(), 2000);
        // The very first append was evicted.
        assert_eq!(points[0].ts, base + Duration::seconds(1));
        assert_eq!(points[0].y, 221.0);
    }

    #[test]
    fn test_query_is_half_open() {
        let mut recorder = HistoryRecorder::new(100);
        let start = ts(0, 0);
        let end = ts(12, 0);
        recorder.record("evt1", start - Duration::seconds(1), 1.0);
        recorder.record("evt1", start, 2.0);
        recorder.record("evt1", end - Duration::seconds(1), 3.0);
        recorder.record("evt1", end, 4.0);

        let result = recorder.query(start, end);
        let ys: Vec<f64> = result["evt1"].iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![2.0, 3.0]);
    }

    #[test]
    fn test_out_of_range_entities_are_omitted() {
        let mut recorder = HistoryRecorder::new(100);
        recorder.record("today", ts(10, 0), 224.5);
        recorder.record("yesterday", ts(10, 0) - Duration::days(1), 230.0);

        let result = recorder.query(ts(0, 0), ts(0, 0) + Duration::days(1));
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("today"));
    }

    #[test]
    fn test_query_never_leaks_out_of_bounds_points() {
        let mut recorder = HistoryRecorder::new(500);
        let base = ts(0, 0) - Duration::hours(30);
        for i in 0..120i64 {
            recorder.record("evt1", base + Duration::minutes(i * 37), 200.0 + i as f64);
        }
        let (start, end) = (ts(0, 0), ts(0, 0) + Duration::days(1));
        for points in recorder.query(start, end).values() {
            for p in points {
                assert!(p.ts >= start && p.ts < end);
            }
        }
    }

    #[test]
    fn test_local_day_bounds_bracket_now() {
        let now = Local::now();
        let (start, end) = local_day_bounds(now);
        let now_utc = now.with_timezone(&Utc);
        assert!(start <= now_utc && now_utc < end);
        // One calendar day, allowing for DST shifts.
        let span = end - start;
        assert!(span >= Duration::hours(23) && span <= Duration::hours(25));
    }

    #[test]
    fn test_day_start_skips_past_a_midnight_dst_gap() {
        use chrono::Timelike;

        // Zone where the clock jumps from 23:59 straight to 01:00.
        let midnight = NaiveDate::from_ymd_opt(2018, 11, 4)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let resolved = first_valid_local(midnight, |candidate| {
            if candidate.hour() < 1 {
                LocalResult::None
            } else {
                LocalResult::Single(Local.from_utc_datetime(candidate))
            }
        })
        .unwrap();
        assert_eq!(
            resolved,
            Utc.from_utc_datetime(&(midnight + Duration::hours(1)))
        );
    }

    #[test]
    fn test_ambiguous_local_time_takes_the_earlier_offset() {
        let naive = NaiveDate::from_ymd_opt(2018, 11, 4)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let first = Local.from_utc_datetime(&naive);
        let second = Local.from_utc_datetime(&(naive + Duration::hours(1)));
        let resolved =
            first_valid_local(naive, |_| LocalResult::Ambiguous(first, second)).unwrap();
        assert_eq!(resolved, first.with_timezone(&Utc));
    }
}
