//! Day bucketing for already-scheduled events.
//!
//! Splits the optimizer's events into a "today" and a "tomorrow" view relative
//! to an explicit `now`, and flags today's events that have already started.
//! Day boundaries are calendar days in the zone of `now` (local midnight to
//! local midnight), not rolling 24-hour windows, so a 23- or 25-hour DST day is
//! bucketed correctly. Anything outside those two days is dropped.

use chrono::{DateTime, Days, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotwiseError};
use crate::utils::{day_start, localize};

/// Offset-less formats accepted from the event store.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// An appliance run placed by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub appliance_name: String,
    pub start_time: DateTime<FixedOffset>,
}

/// Event as delivered by the event store, before timestamp parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(alias = "appliance")]
    pub appliance_name: String,
    pub start_time: String,
}

impl EventRecord {
    /// Parse the timestamp, reading offset-less values as wall-clock time in `tz`.
    pub fn into_event<Tz: TimeZone>(self, tz: &Tz) -> Result<ScheduledEvent> {
        let start_time = parse_timestamp(&self.start_time, tz)?;
        Ok(ScheduledEvent {
            appliance_name: self.appliance_name,
            start_time,
        })
    }
}

/// Parse an ISO-8601 timestamp with or without an offset.
pub fn parse_timestamp<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant);
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| localize(tz, naive).fixed_offset())
        .ok_or_else(|| SlotwiseError::InvalidTimestamp(text.to_string()))
}

/// Convert a batch of records, failing on the first bad timestamp.
pub fn events_from_records<Tz: TimeZone>(records: Vec<EventRecord>, tz: &Tz) -> Result<Vec<ScheduledEvent>> {
    records.into_iter().map(|record| record.into_event(tz)).collect()
}

/// An event annotated for the day view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketedEvent {
    #[serde(flatten)]
    pub event: ScheduledEvent,
    /// Started before `now` (only ever true in the today bucket)
    pub is_past: bool,
}

/// Today and tomorrow views, each sorted by start time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EventBuckets {
    pub today: Vec<BucketedEvent>,
    pub tomorrow: Vec<BucketedEvent>,
}

impl EventBuckets {
    pub fn len(&self) -> usize {
        self.today.len() + self.tomorrow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Today's events that have not started yet.
    pub fn upcoming_today(&self) -> impl Iterator<Item = &BucketedEvent> {
        self.today.iter().filter(|e| !e.is_past)
    }
}

fn sort_by_start(bucket: &mut [BucketedEvent]) {
    // Stable, so equal start times keep fetch order
    bucket.sort_by(|a, b| a.event.start_time.cmp(&b.event.start_time));
}

/// Partition `events` into today and tomorrow relative to `now`.
///
/// An event belongs to a day when its start lies in `[day_start, next_day_start)`.
/// Today's events strictly before `now` are marked past; an event starting
/// exactly at `now` is not.
pub fn bucket<Tz: TimeZone>(events: &[ScheduledEvent], now: &DateTime<Tz>) -> EventBuckets {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today + Days::new(1);

    let today_start = day_start(&tz, today).with_timezone(&Utc);
    let tomorrow_start = day_start(&tz, tomorrow).with_timezone(&Utc);
    let window_end = day_start(&tz, tomorrow + Days::new(1)).with_timezone(&Utc);
    let now = now.with_timezone(&Utc);

    let mut buckets = EventBuckets::default();
    for event in events {
        let start = event.start_time.with_timezone(&Utc);
        if start >= today_start && start < tomorrow_start {
            buckets.today.push(BucketedEvent {
                event: event.clone(),
                is_past: start < now,
            });
        } else if start >= tomorrow_start && start < window_end {
            buckets.tomorrow.push(BucketedEvent {
                event: event.clone(),
                is_past: false,
            });
        }
    }

    sort_by_start(&mut buckets.today);
    sort_by_start(&mut buckets.tomorrow);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::TEST_ZONE;

    fn event(name: &str, rfc3339: &str) -> ScheduledEvent {
        ScheduledEvent {
            appliance_name: name.to_string(),
            start_time: DateTime::parse_from_rfc3339(rfc3339).unwrap(),
        }
    }

    fn names(bucket: &[BucketedEvent]) -> Vec<&str> {
        bucket.iter().map(|e| e.event.appliance_name.as_str()).collect()
    }

    fn now_utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_basic_today_tomorrow_split() {
        let now = now_utc("2024-01-01T10:00:00Z");
        let events = vec![
            event("Dishwasher", "2024-01-01T09:00:00Z"),
            event("Dryer", "2024-01-01T11:00:00Z"),
            event("Washing Machine", "2024-01-02T08:00:00Z"),
        ];
        let buckets = bucket(&events, &now);

        assert_eq!(names(&buckets.today), vec!["Dishwasher", "Dryer"]);
        assert!(buckets.today[0].is_past);
        assert!(!buckets.today[1].is_past);
        assert_eq!(names(&buckets.tomorrow), vec!["Washing Machine"]);
        assert!(!buckets.tomorrow[0].is_past);
        assert_eq!(buckets.upcoming_today().count(), 1);
    }

    #[test]
    fn test_event_at_now_is_not_past() {
        let now = now_utc("2024-01-01T10:00:00Z");
        let buckets = bucket(&[event("Dryer", "2024-01-01T10:00:00Z")], &now);
        assert!(!buckets.today[0].is_past);
    }

    #[test]
    fn test_midnight_boundaries() {
        let now = now_utc("2024-01-01T10:00:00Z");
        let events = vec![
            event("start of today", "2024-01-01T00:00:00Z"),
            event("start of tomorrow", "2024-01-02T00:00:00Z"),
            event("day after", "2024-01-03T00:00:00Z"),
            event("yesterday", "2023-12-31T23:59:59Z"),
        ];
        let buckets = bucket(&events, &now);
        assert_eq!(names(&buckets.today), vec!["start of today"]);
        assert_eq!(names(&buckets.tomorrow), vec!["start of tomorrow"]);
        assert_eq!(buckets.len(), 2);
    }

    #[test]
    fn test_buckets_sorted_with_stable_ties() {
        let now = now_utc("2024-01-01T06:00:00Z");
        let events = vec![
            event("late", "2024-01-01T20:00:00Z"),
            event("first tie", "2024-01-01T08:00:00Z"),
            event("second tie", "2024-01-01T08:00:00Z"),
        ];
        let buckets = bucket(&events, &now);
        assert_eq!(names(&buckets.today), vec!["first tie", "second tie", "late"]);
    }

    #[test]
    fn test_bucketing_is_idempotent() {
        let now = now_utc("2024-01-01T10:00:00Z");
        let events = vec![
            event("a", "2024-01-01T09:00:00Z"),
            event("b", "2024-01-02T09:00:00Z"),
        ];
        assert_eq!(bucket(&events, &now), bucket(&events, &now));
    }

    #[test]
    fn test_offsets_are_compared_as_instants() {
        // 01:30+02:00 is 23:30Z on the previous day
        let now = now_utc("2024-01-01T10:00:00Z");
        let buckets = bucket(&[event("early", "2024-01-02T01:30:00+02:00")], &now);
        assert_eq!(names(&buckets.today), vec!["early"]);
    }

    #[test]
    fn test_short_dst_day_uses_calendar_boundary() {
        // 2024-03-31 is only 23 hours long in London
        let now = TEST_ZONE.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();
        let events = vec![
            event("late tomorrow", "2024-03-31T23:30:00+01:00"),
            event("day after", "2024-04-01T00:30:00+01:00"),
        ];
        let buckets = bucket(&events, &now);
        assert_eq!(names(&buckets.tomorrow), vec!["late tomorrow"]);
        assert!(buckets.today.is_empty());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let with_offset = parse_timestamp("2024-01-01T09:00:00+01:00", &Utc).unwrap();
        assert_eq!(with_offset.to_rfc3339(), "2024-01-01T09:00:00+01:00");

        let naive = parse_timestamp("2024-06-01T09:00:00", &TEST_ZONE).unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-06-01T09:00:00+01:00");

        assert_eq!(
            parse_timestamp("tomorrow-ish", &Utc),
            Err(SlotwiseError::InvalidTimestamp("tomorrow-ish".to_string()))
        );
    }

    #[test]
    fn test_event_record_accepts_appliance_alias() {
        let json = r#"[{"appliance": "Dryer", "start_time": "2024-01-01T09:00:00Z"}]"#;
        let records: Vec<EventRecord> = serde_json::from_str(json).unwrap();
        let events = events_from_records(records, &Utc).unwrap();
        assert_eq!(events[0].appliance_name, "Dryer");
    }

    #[test]
    fn test_bucketed_event_serializes_flat() {
        let now = now_utc("2024-01-01T10:00:00Z");
        let buckets = bucket(&[event("Dryer", "2024-01-01T09:00:00Z")], &now);
        let value = serde_json::to_value(&buckets).unwrap();
        assert_eq!(value["today"][0]["appliance_name"], "Dryer");
        assert_eq!(value["today"][0]["is_past"], true);
        assert_eq!(value["tomorrow"].as_array().unwrap().len(), 0);
    }
}
