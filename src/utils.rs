//! Utility functions shared across the codebase.
//!
//! Mostly local-time helpers: converting between clock times and minute offsets,
//! and building absolute instants from a calendar date and a wall-clock time
//! without tripping over daylight-saving transitions.

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike};
use std::path::Path;

/// Longest forward search when a wall-clock time falls into a DST gap.
const MAX_GAP_MINUTES: i64 = 180;

/// Minutes elapsed since midnight for a clock time, ignoring seconds.
///
/// # Examples
/// ```
/// use chrono::NaiveTime;
/// use slotwise::utils::minutes_since_midnight;
/// let t = NaiveTime::from_hms_opt(14, 10, 59).unwrap();
/// assert_eq!(minutes_since_midnight(t), 850);
/// ```
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Format a minute offset as a zero-padded `HH:MM` label.
///
/// # Examples
/// ```
/// use slotwise::utils::format_minutes;
/// assert_eq!(format_minutes(0), "00:00");
/// assert_eq!(format_minutes(1410), "23:30");
/// ```
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Attach a time zone to a local wall-clock value.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant.
/// Times inside a gap (clocks going forward) move forward to the first
/// wall-clock minute that exists.
pub fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    for offset in 0..=MAX_GAP_MINUTES {
        match tz.from_local_datetime(&(naive + TimeDelta::minutes(offset))) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => continue,
        }
    }
    // No zone has a gap this long; treat the wall clock as UTC rather than fail
    tz.from_utc_datetime(&naive)
}

/// First instant of a calendar date in the given zone.
pub fn day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    localize(tz, date.and_time(NaiveTime::MIN))
}

/// Absolute instant for `time` on the calendar day `day_offset` days after the
/// local date of `now`, in the zone of `now`.
///
/// Uses calendar-day arithmetic so the result keeps its wall-clock time across
/// daylight-saving changes.
pub fn instant_on_day<Tz: TimeZone>(now: &DateTime<Tz>, day_offset: u64, time: NaiveTime) -> DateTime<Tz> {
    let date = now.date_naive() + Days::new(day_offset);
    localize(&now.timezone(), date.and_time(time))
}

/// Like [`instant_on_day`], but a wall-clock time that occurs twice resolves to
/// the later instant when the earlier one is already behind `now`.
pub fn instant_on_day_not_before<Tz: TimeZone>(now: &DateTime<Tz>, day_offset: u64, time: NaiveTime) -> DateTime<Tz> {
    let date = now.date_naive() + Days::new(day_offset);
    match now.timezone().from_local_datetime(&date.and_time(time)) {
        LocalResult::Ambiguous(earliest, latest) if earliest < *now => latest,
        _ => instant_on_day(now, day_offset, time),
    }
}

/// Replace the home directory prefix with `~` for friendlier log output.
pub fn path_for_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, Utc};
    use chrono_tz::Europe::London;

    fn naive(date: (i32, u32, u32), time: (u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(time.0, time.1, 0)
            .unwrap()
    }

    #[test]
    fn test_format_minutes_pads() {
        assert_eq!(format_minutes(5), "00:05");
        assert_eq!(format_minutes(9 * 60), "09:00");
        assert_eq!(format_minutes(23 * 60 + 59), "23:59");
    }

    #[test]
    fn test_minutes_since_midnight_bounds() {
        assert_eq!(minutes_since_midnight(NaiveTime::MIN), 0);
        let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert_eq!(minutes_since_midnight(last), 1439);
    }

    #[test]
    fn test_localize_plain_time() {
        let dt = localize(&London, naive((2024, 6, 1), (9, 0)));
        assert_eq!(dt.naive_local(), naive((2024, 6, 1), (9, 0)));
        assert_eq!(dt.offset().fix().local_minus_utc(), 3600);
    }

    #[test]
    fn test_localize_spring_forward_gap_moves_forward() {
        // 2024-03-31 01:00-02:00 does not exist in London
        let dt = localize(&London, naive((2024, 3, 31), (1, 30)));
        assert_eq!(dt.naive_local(), naive((2024, 3, 31), (2, 0)));
    }

    #[test]
    fn test_localize_fall_back_takes_earlier() {
        // 2024-10-27 01:30 happens twice in London
        let dt = localize(&London, naive((2024, 10, 27), (1, 30)));
        assert_eq!(dt.offset().fix().local_minus_utc(), 3600);
    }

    #[test]
    fn test_instant_not_before_takes_second_pass_of_repeated_hour() {
        // 01:10 GMT is the second time 01:10 is shown on 2024-10-27
        let now = Utc.with_ymd_and_hms(2024, 10, 27, 1, 10, 0).unwrap().with_timezone(&London);
        let half_past = NaiveTime::from_hms_opt(1, 30, 0).unwrap();

        let plain = instant_on_day(&now, 0, half_past);
        assert!(plain < now);

        let next = instant_on_day_not_before(&now, 0, half_past);
        assert_eq!(next.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 10, 27, 1, 30, 0).unwrap());
        assert!(next >= now);
    }

    #[test]
    fn test_instant_not_before_keeps_first_pass_when_still_ahead() {
        // 00:10 UTC is 01:10 BST, the first pass through the repeated hour
        let now = Utc.with_ymd_and_hms(2024, 10, 27, 0, 10, 0).unwrap().with_timezone(&London);
        let half_past = NaiveTime::from_hms_opt(1, 30, 0).unwrap();
        let next = instant_on_day_not_before(&now, 0, half_past);
        assert_eq!(next.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_instant_on_day_keeps_wall_clock_across_dst() {
        let now = localize(&London, naive((2024, 3, 30), (12, 0)));
        let next = instant_on_day(&now, 1, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(next.naive_local(), naive((2024, 3, 31), (12, 0)));
        // Only 23 real hours pass over the spring-forward night
        assert_eq!((next - now).num_hours(), 23);
    }

    #[test]
    fn test_day_start_in_utc() {
        let start = day_start(&Utc, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(start.to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }
}
