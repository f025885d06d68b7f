//! Due-window computation
//!
//! A tick covers two minute buckets: the tick's own minute and the one
//! before it, both expressed in the configured storage offset. The external
//! cron source fires roughly once a minute but may skip or arrive late;
//! the previous-minute bucket absorbs a single missed or delayed tick while
//! the `sent` flag keeps the overlap from double-sending.

use chrono::{DateTime, Duration, FixedOffset, Utc};

/// One minute bucket in the storage time base
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DueSlot {
    /// "YYYY-MM-DD"
    pub date: String,
    /// "HH:MM"
    pub time: String,
}

impl DueSlot {
    fn from_instant(instant: DateTime<FixedOffset>) -> Self {
        Self {
            date: instant.format("%Y-%m-%d").to_string(),
            time: instant.format("%H:%M").to_string(),
        }
    }
}

/// The [current, previous] minute buckets for a tick instant.
///
/// Minute arithmetic is done on the offset-adjusted instant, so hour, day,
/// month, and year rollovers all fall out of the date math: a tick at 00:00
/// checks 23:59 of the previous day.
pub fn due_window(now: DateTime<Utc>, offset: FixedOffset) -> [DueSlot; 2] {
    let local = now.with_timezone(&offset);
    let previous = local - Duration::minutes(1);

    [DueSlot::from_instant(local), DueSlot::from_instant(previous)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn no_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn mid_hour_window() {
        let [current, previous] = due_window(utc(2025, 6, 1, 9, 30, 12), no_offset());
        assert_eq!(current, DueSlot { date: "2025-06-01".into(), time: "09:30".into() });
        assert_eq!(previous, DueSlot { date: "2025-06-01".into(), time: "09:29".into() });
    }

    #[test]
    fn minute_zero_rolls_back_to_previous_hour() {
        let [current, previous] = due_window(utc(2025, 6, 1, 9, 0, 0), no_offset());
        assert_eq!(current.time, "09:00");
        assert_eq!(previous.time, "08:59");
        assert_eq!(previous.date, "2025-06-01");
    }

    #[test]
    fn midnight_rolls_back_to_previous_day() {
        let [current, previous] = due_window(utc(2025, 6, 1, 0, 0, 5), no_offset());
        assert_eq!(current, DueSlot { date: "2025-06-01".into(), time: "00:00".into() });
        assert_eq!(previous, DueSlot { date: "2025-05-31".into(), time: "23:59".into() });
    }

    #[test]
    fn new_year_rolls_back_across_year_boundary() {
        let [_, previous] = due_window(utc(2026, 1, 1, 0, 0, 0), no_offset());
        assert_eq!(previous, DueSlot { date: "2025-12-31".into(), time: "23:59".into() });
    }

    #[test]
    fn positive_offset_shifts_the_bucket_date() {
        // 23:30 UTC is already 02:30 next day at UTC+3
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let [current, previous] = due_window(utc(2025, 6, 1, 23, 30, 0), offset);
        assert_eq!(current, DueSlot { date: "2025-06-02".into(), time: "02:30".into() });
        assert_eq!(previous.time, "02:29");
    }

    #[test]
    fn negative_offset_shifts_the_bucket_date_back() {
        // 01:00 UTC is 20:00 previous day at UTC-5
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let [current, _] = due_window(utc(2025, 6, 1, 1, 0, 0), offset);
        assert_eq!(current, DueSlot { date: "2025-05-31".into(), time: "20:00".into() });
    }

    #[test]
    fn seconds_are_truncated_to_the_minute_bucket() {
        let [a, _] = due_window(utc(2025, 6, 1, 9, 30, 0), no_offset());
        let [b, _] = due_window(utc(2025, 6, 1, 9, 30, 59), no_offset());
        assert_eq!(a, b);
    }
}
