use crate::error::{AppResult, Error};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Half-open `[start, end)` range covering one calendar month in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// `timeMin` query value
    pub fn time_min(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// `timeMax` query value
    pub fn time_max(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

/// Window for the month containing `now`
pub fn month_window(now: DateTime<Utc>) -> AppResult<MonthWindow> {
    let start = first_of_month(now.year(), now.month())?;
    // 32 days past the 1st always lands in the following month
    let later = start + Duration::days(32);
    let end = first_of_month(later.year(), later.month())?;
    Ok(MonthWindow { start, end })
}

fn first_of_month(year: i32, month: u32) -> AppResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::Other(format!("Invalid month {}-{}", year, month)))
}

/// Parse an event start value into a UTC instant
///
/// Accepts RFC 3339 date-times, offset-less date-times (taken as UTC) and
/// plain `YYYY-MM-DD` dates for all-day events.
pub fn parse_event_start(value: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }

    Err(Error::ParseFailed(format!("Unrecognised start value '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn test_window_covers_whole_month() {
        let window = month_window(utc(2024, 3, 15, 12)).unwrap();
        assert_eq!(window.time_min(), "2024-03-01T00:00:00+00:00");
        assert_eq!(window.time_max(), "2024-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_window_for_every_month_length() {
        // (year, month, expected next year, expected next month)
        let cases = [
            (2023, 2, 2023, 3),  // 28 days
            (2024, 2, 2024, 3),  // 29 days
            (2024, 4, 2024, 5),  // 30 days
            (2024, 1, 2024, 2),  // 31 days
            (2024, 12, 2025, 1), // year rollover
        ];
        for (year, month, next_year, next_month) in cases {
            for day in [1, 15, 28] {
                let window = month_window(utc(year, month, day, 23)).unwrap();
                assert_eq!(window.start, Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap());
                assert_eq!(
                    window.end,
                    Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).unwrap()
                );
            }
        }
        let last_day = month_window(utc(2024, 1, 31, 23)).unwrap();
        assert_eq!(last_day.end.month(), 2);
    }

    #[test]
    fn test_parse_date_time_with_offset_normalises_to_utc() {
        let dt = parse_event_start("2024-03-20T01:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 19, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_all_day_and_naive_values() {
        assert_eq!(
            parse_event_start("2024-03-20").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_event_start("2024-03-20T08:15:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 20, 8, 15, 0).unwrap()
        );
        assert!(parse_event_start("2024-03-20T08:15:00Z").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_event_start("next tuesday"), Err(Error::ParseFailed(_))));
        assert!(parse_event_start("").is_err());
        assert!(parse_event_start("2024-02-30").is_err());
    }
}
