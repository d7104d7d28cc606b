//! NEXRAD date conventions.
//!
//! Dates are transmitted as "modified Julian" day counts where day 1 is
//! 1 January 1970, paired with milliseconds (Level II) or seconds (Level III)
//! past midnight UTC.

use chrono::{DateTime, Duration, NaiveDate, Utc};

fn epoch() -> DateTime<Utc> {
    // Day 0 of the modified Julian count.
    NaiveDate::from_ymd_opt(1969, 12, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Converts a modified Julian date and milliseconds past midnight to UTC.
pub fn modified_julian_to_datetime(julian_date: u32, milliseconds: u32) -> DateTime<Utc> {
    epoch() + Duration::days(julian_date as i64) + Duration::milliseconds(milliseconds as i64)
}

/// Converts a modified Julian date and seconds past midnight to UTC.
pub fn modified_julian_seconds_to_datetime(julian_date: u16, seconds: u32) -> DateTime<Utc> {
    modified_julian_to_datetime(julian_date as u32, 0) + Duration::seconds(seconds as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_one_is_unix_epoch() {
        assert_eq!(
            modified_julian_to_datetime(1, 0),
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_milliseconds_past_midnight() {
        // 2022-10-28 is day 19294
        let dt = modified_julian_to_datetime(19294, 44 * 60 * 1000 + 500);
        assert_eq!(
            dt,
            Utc.with_ymd_and_hms(2022, 10, 28, 0, 44, 0).unwrap() + Duration::milliseconds(500)
        );
    }

    #[test]
    fn test_seconds_past_midnight() {
        let dt = modified_julian_seconds_to_datetime(19294, 3600);
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 10, 28, 1, 0, 0).unwrap());
    }
}
