//! Week identifiers: whole weeks since the first round (Monday 2022-08-15, UTC).

use chrono::{DateTime, Duration, Utc};

/// Unix time of Monday 2022-08-15 00:00:00 UTC, the start of week 0.
pub const START_TIMESTAMP: i64 = 1_660_521_600;

const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

pub fn start_date() -> DateTime<Utc> {
    DateTime::from_timestamp(START_TIMESTAMP, 0).unwrap_or_default()
}

/// Week containing `t`. Instants before the start date get negative ids.
pub fn week_id(t: DateTime<Utc>) -> i64 {
    // `timestamp()` floors, so sub-second instants before a boundary stay in
    // the earlier week.
    (t.timestamp() - START_TIMESTAMP).div_euclid(SECONDS_PER_WEEK)
}

/// Monday 00:00 UTC of week `id`, or `None` past chrono's representable range.
pub fn week_start(id: i64) -> Option<DateTime<Utc>> {
    start_date().checked_add_signed(Duration::try_weeks(id)?)
}

pub fn current_week_id() -> i64 {
    week_id(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Weekday};

    #[test]
    fn test_start_is_monday() {
        let start = start_date();
        assert_eq!(start, Utc.with_ymd_and_hms(2022, 8, 15, 0, 0, 0).unwrap());
        assert_eq!(start.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_week_boundaries() {
        let start = start_date();
        assert_eq!(week_id(start), 0);
        assert_eq!(week_id(start + Duration::days(6) + Duration::hours(23)), 0);
        assert_eq!(week_id(start + Duration::days(7)), 1);
        assert_eq!(week_id(start - Duration::milliseconds(1)), -1);
        assert_eq!(week_id(start - Duration::days(7)), -1);
        assert_eq!(week_id(start - Duration::days(8)), -2);
    }

    #[test]
    fn test_week_start_inverse() {
        for id in [-3, 0, 1, 52, 170] {
            let monday = week_start(id).unwrap();
            assert_eq!(week_id(monday), id);
            assert_eq!(monday.weekday(), Weekday::Mon);
        }
    }

    #[test]
    fn test_week_start_out_of_range() {
        assert!(week_start(i64::MAX / 2).is_none());
        assert!(week_start(i64::MIN).is_none());
        // Inside chrono's range but past its last representable instant.
        assert!(week_start(20_000_000).is_none());
    }

    #[test]
    fn test_known_date() {
        // 2022-09-01 is a Thursday in the third week.
        let t = Utc.with_ymd_and_hms(2022, 9, 1, 12, 0, 0).unwrap();
        assert_eq!(week_id(t), 2);
    }
}
