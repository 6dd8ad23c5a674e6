//! Time-window rules for block meetings.
//!
//! Every rule is a pure function of an injected `now`; nothing here touches
//! the wall clock or the database. Each function returns the date bound the
//! meeting queries translate into a filter, so the branchy time-of-day logic
//! stays testable without storage.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

/// Earliest meeting date still accepting new issues.
///
/// After 21:00 the upcoming meeting is considered locked one day earlier, so
/// submissions shift to meetings three days out instead of two.
pub fn normal_from(now: NaiveDateTime) -> NaiveDate {
    let days = if now.time() >= at(21) { 3 } else { 2 };
    now.date() + Duration::days(days)
}

/// Exact dates eligible for late ("append") submissions.
///
/// The day splits into three intervals: until 12:00 only today's meeting is
/// open, until 22:00 today's and tomorrow's both are, after 22:00 only
/// tomorrow's.
pub fn append_dates(now: NaiveDateTime) -> Vec<NaiveDate> {
    let today = now.date();
    let time = now.time();

    if time <= at(12) {
        vec![today]
    } else if time <= at(22) {
        vec![today, today + Duration::days(1)]
    } else {
        vec![today + Duration::days(1)]
    }
}

/// Date of the meeting whose issues are open for minute-taking.
///
/// Note-taking for a meeting stays open until 18:00 the following day.
pub fn posting_note_date(now: NaiveDateTime) -> NaiveDate {
    if now.time() >= at(18) {
        now.date()
    } else {
        now.date() - Duration::days(1)
    }
}

/// Earliest meeting date whose issue ordering may still be edited.
pub fn rearrange_from(now: NaiveDateTime) -> NaiveDate {
    let days = if now.time() < at(12) { 1 } else { 2 };
    now.date() + Duration::days(days)
}

/// Latest meeting date whose notes are available for download.
pub fn download_until(now: NaiveDateTime) -> NaiveDate {
    now.date()
}

/// Returns `primary` unless it is empty, in which case `fallback`.
///
/// The posting-table target falls back from the normal window to the append
/// window; this is an explicit emptiness check, not a set union.
pub fn non_empty_or<T>(primary: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn now(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn normal_window_moves_out_at_nine_pm() {
        assert_eq!(normal_from(now(10, 20, 59, 59)), day(12));
        assert_eq!(normal_from(now(10, 21, 0, 0)), day(13));
        assert_eq!(normal_from(now(10, 23, 59, 59)), day(13));
        assert_eq!(normal_from(now(10, 0, 0, 0)), day(12));
    }

    #[test]
    fn append_window_morning_targets_today_only() {
        assert_eq!(append_dates(now(10, 0, 0, 0)), vec![day(10)]);
        assert_eq!(append_dates(now(10, 11, 59, 59)), vec![day(10)]);
        assert_eq!(append_dates(now(10, 12, 0, 0)), vec![day(10)]);
    }

    #[test]
    fn append_window_afternoon_targets_today_and_tomorrow() {
        assert_eq!(append_dates(now(10, 12, 0, 1)), vec![day(10), day(11)]);
        assert_eq!(append_dates(now(10, 22, 0, 0)), vec![day(10), day(11)]);
    }

    #[test]
    fn append_window_night_targets_tomorrow_only() {
        assert_eq!(append_dates(now(10, 22, 0, 1)), vec![day(11)]);
        assert_eq!(append_dates(now(10, 23, 59, 59)), vec![day(11)]);
    }

    #[test]
    fn append_window_covers_the_whole_day() {
        // Every instant maps to a non-empty date set.
        for hour in 0..24 {
            assert!(!append_dates(now(10, hour, 30, 0)).is_empty());
        }
    }

    #[test]
    fn posting_note_flips_to_today_at_six_pm() {
        assert_eq!(posting_note_date(now(10, 17, 59, 59)), day(9));
        assert_eq!(posting_note_date(now(10, 18, 0, 0)), day(10));
        assert_eq!(posting_note_date(now(10, 23, 59, 59)), day(10));
        assert_eq!(posting_note_date(now(10, 0, 0, 0)), day(9));
    }

    #[test]
    fn rearrange_window_shrinks_at_noon() {
        assert_eq!(rearrange_from(now(10, 11, 59, 59)), day(11));
        assert_eq!(rearrange_from(now(10, 12, 0, 0)), day(12));
        assert_eq!(rearrange_from(now(10, 0, 0, 0)), day(11));
    }

    #[test]
    fn download_window_is_anchored_at_today() {
        assert_eq!(download_until(now(10, 0, 0, 0)), day(10));
        assert_eq!(download_until(now(10, 23, 59, 59)), day(10));
    }

    #[test]
    fn fallback_prefers_non_empty_primary() {
        assert_eq!(non_empty_or(vec![1, 2], vec![3]), vec![1, 2]);
        assert_eq!(non_empty_or(Vec::new(), vec![3]), vec![3]);
        assert_eq!(non_empty_or::<i32>(Vec::new(), Vec::new()), Vec::<i32>::new());
    }
}
