//! Shared utility functions for roadcast crates.

/// Date utility functions
///
/// Instants are carried through the tables as seconds since the Unix epoch
/// (UTC, `f64`). These helpers convert between that representation and
/// ISO 8601 strings or calendar components.
pub mod dates {
    use anyhow::anyhow;
    use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

    /// Format used to parse dates, truncated to the minute.
    pub const ISO8601_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M";

    /// Format used when writing dates.
    pub const ISO8601_WRITE_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

    /// Parse an ISO 8601 date ("YYYY-MM-DDTHH:MM", anything after the minute
    /// is ignored) into seconds since the epoch.
    pub fn parse_iso8601(s: &str) -> anyhow::Result<f64> {
        let trimmed = s.trim();
        let head = trimmed
            .get(0..16)
            .ok_or_else(|| anyhow!("Date string '{}' is too short for ISO 8601", trimmed))?;
        let naive = NaiveDateTime::parse_from_str(head, ISO8601_PARSE_FORMAT)
            .map_err(|e| anyhow!("Error parsing the ISO 8601 date '{}': {}", trimmed, e))?;
        Ok(naive.and_utc().timestamp() as f64)
    }

    /// Convert epoch seconds to a UTC datetime.
    pub fn to_datetime(seconds: f64) -> anyhow::Result<DateTime<Utc>> {
        if !seconds.is_finite() {
            return Err(anyhow!("Cannot convert non-finite time {} to a date", seconds));
        }
        DateTime::from_timestamp(seconds.round() as i64, 0)
            .ok_or_else(|| anyhow!("Time {} is out of the representable range", seconds))
    }

    /// Format epoch seconds as "YYYY-MM-DDTHH:MMZ"
    pub fn format_iso8601(seconds: f64) -> anyhow::Result<String> {
        Ok(to_datetime(seconds)?.format(ISO8601_WRITE_FORMAT).to_string())
    }

    /// Hour of day (UTC) of an instant
    pub fn hour_of(seconds: f64) -> anyhow::Result<u32> {
        Ok(to_datetime(seconds)?.hour())
    }

    /// Minute of hour (UTC) of an instant
    pub fn minute_of(seconds: f64) -> anyhow::Result<u32> {
        Ok(to_datetime(seconds)?.minute())
    }

    /// Day of year, 1-based (Jan 1 = 1).
    pub fn day_of_year(seconds: f64) -> anyhow::Result<u32> {
        Ok(to_datetime(seconds)?.ordinal())
    }

    /// Whether the year of the instant is a leap year.
    pub fn is_leap_year(seconds: f64) -> anyhow::Result<bool> {
        let year = to_datetime(seconds)?.year();
        Ok((year % 4 == 0 && year % 100 != 0) || year % 400 == 0)
    }

    /// Seconds elapsed since midnight, truncated to the minute.
    pub fn seconds_of_day(seconds: f64) -> anyhow::Result<f64> {
        let dt = to_datetime(seconds)?;
        Ok((dt.hour() * 3600 + dt.minute() * 60) as f64)
    }

    /// Elapsed time `end - start` in hours, both instants truncated to the minute.
    pub fn elapsed_hours(end: f64, start: f64) -> anyhow::Result<f64> {
        let end = truncate_to_minute(to_datetime(end)?);
        let start = truncate_to_minute(to_datetime(start)?);
        Ok((end - start).num_seconds() as f64 / 3600.0)
    }

    /// Split decimal hours into (hour, minute, second).
    pub fn decimal_hour_to_hms(hours: f64) -> (u32, u32, u32) {
        let total = (hours.rem_euclid(24.0) * 3600.0).round() as u32;
        (total / 3600 % 24, total / 60 % 60, total % 60)
    }

    /// Julian date of an instant, fractional days since noon 4713 BC.
    pub fn julian_date(seconds: f64) -> f64 {
        seconds / 86_400.0 + 2_440_587.5
    }

    fn truncate_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
        dt.with_second(0).and_then(|d| d.with_nanosecond(0)).unwrap_or(dt)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        fn epoch(y: i32, m: u32, d: u32, h: u32, min: u32) -> f64 {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap()
                .and_utc()
                .timestamp() as f64
        }

        #[test]
        fn test_parse_and_format() {
            let t = parse_iso8601("2004-01-30T20:00Z").unwrap();
            assert_eq!(t, epoch(2004, 1, 30, 20, 0));
            assert_eq!(format_iso8601(t).unwrap(), "2004-01-30T20:00Z");
        }

        #[test]
        fn test_parse_ignores_seconds_and_zone() {
            let t = parse_iso8601("2004-01-30T20:15:42-05:00").unwrap();
            assert_eq!(t, epoch(2004, 1, 30, 20, 15));
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!(parse_iso8601("30/01/2004").is_err());
            assert!(parse_iso8601("2004-13-30T20:00Z").is_err());
        }

        #[test]
        fn test_elapsed_hours() {
            let start = epoch(2004, 1, 30, 14, 0);
            let end = epoch(2004, 1, 31, 0, 30);
            assert!((elapsed_hours(end, start).unwrap() - 10.5).abs() < 1e-12);
            assert!((elapsed_hours(start, end).unwrap() + 10.5).abs() < 1e-12);
        }

        #[test]
        fn test_calendar_components() {
            let t = epoch(2004, 2, 1, 13, 45);
            assert_eq!(hour_of(t).unwrap(), 13);
            assert_eq!(minute_of(t).unwrap(), 45);
            assert_eq!(day_of_year(t).unwrap(), 32);
            assert!(is_leap_year(t).unwrap());
            assert_eq!(seconds_of_day(t).unwrap(), 13.0 * 3600.0 + 45.0 * 60.0);
        }

        #[test]
        fn test_julian_date() {
            assert_eq!(julian_date(epoch(2000, 1, 1, 12, 0)), 2_451_545.0);
            assert_eq!(julian_date(epoch(1970, 1, 1, 0, 0)), 2_440_587.5);
        }

        #[test]
        fn test_decimal_hour_to_hms() {
            assert_eq!(decimal_hour_to_hms(6.5), (6, 30, 0));
            assert_eq!(decimal_hour_to_hms(25.25), (1, 15, 0));
        }
    }
}

/// Array helpers shared by the processing stages
pub mod arrays {
    /// Drop the first element and append `fill` at the end.
    pub fn shift_left(values: &[f64], fill: f64) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let mut out = values[1..].to_vec();
        out.push(fill);
        out
    }

    /// Insert `fill` at the front and drop the last element.
    pub fn shift_right(values: &[f64], fill: f64) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(values.len());
        out.push(fill);
        out.extend_from_slice(&values[..values.len() - 1]);
        out
    }

    /// Difference with the following element: `out[i] = v[i+1] - v[i]`.
    ///
    /// The last entry wraps around and holds `v[0] - v[n-1]`.
    pub fn forward_difference(values: &[f64]) -> Vec<f64> {
        let n = values.len();
        (0..n).map(|i| values[(i + 1) % n] - values[i]).collect()
    }

    /// Difference with the preceding element, the first entry keeps its value:
    /// `out[0] = v[0]`, `out[i] = v[i] - v[i-1]`.
    pub fn backward_difference(values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(shift_right(values, 0.0))
            .map(|(v, prev)| v - prev)
            .collect()
    }

    /// Exclusive prefix sum: `out[i] = v[0] + .. + v[i-1]`.
    pub fn exclusive_cumulative_sum(values: &[f64]) -> Vec<f64> {
        let mut total = 0.0;
        values
            .iter()
            .map(|v| {
                let current = total;
                total += v;
                current
            })
            .collect()
    }

    /// Arithmetic mean, NaN for an empty slice.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Largest value, ignoring NaN.
    pub fn max(values: &[f64]) -> Option<f64> {
        values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Evenly spaced values in `[start, stop)` with the given step.
    pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
        if step <= 0.0 || stop <= start {
            return Vec::new();
        }
        let count = ((stop - start) / step).ceil() as usize;
        (0..count).map(|i| start + i as f64 * step).collect()
    }

    /// Whether the values are evenly spaced from first to last.
    pub fn is_uniform(values: &[f64]) -> bool {
        let n = values.len();
        if n < 3 {
            return true;
        }
        let step = (values[n - 1] - values[0]) / (n - 1) as f64;
        values
            .iter()
            .enumerate()
            .all(|(i, v)| (values[0] + step * i as f64 - v).abs() < 1e-9)
    }

    /// Round half away from zero to `precision` decimal digits.
    pub fn round_to(value: f64, precision: u32) -> f64 {
        let factor = 10f64.powi(precision as i32);
        (value * factor).round() / factor
    }

}

/// File format version checks
pub mod version {
    use crate::error::VersionError;
    use std::cmp::Ordering;

    /// Compare dotted version strings component by component ("1.10" > "1.9").
    pub fn compare_versions(a: &str, b: &str) -> Ordering {
        let parse = |s: &str| -> Vec<u64> {
            s.trim()
                .split('.')
                .map(|part| {
                    part.chars()
                        .take_while(|c| c.is_ascii_digit())
                        .collect::<String>()
                        .parse::<u64>()
                        .unwrap_or(0)
                })
                .collect()
        };
        let (pa, pb) = (parse(a), parse(b));
        let len = pa.len().max(pb.len());
        for i in 0..len {
            let x = pa.get(i).copied().unwrap_or(0);
            let y = pb.get(i).copied().unwrap_or(0);
            match x.cmp(&y) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Check that `version` lies in `[min, max]` inclusively.
    pub fn validate_version(version: Option<&str>, min: &str, max: &str) -> Result<(), VersionError> {
        let version = version.ok_or_else(|| {
            VersionError(format!(
                "Can't find version number. Version from '{}' to '{}' inclusively are supported",
                min, max
            ))
        })?;
        if compare_versions(version, min) == Ordering::Less {
            return Err(VersionError(format!(
                "Version number:'{}' is too old. Version from '{}' to '{}' inclusively are supported",
                version, min, max
            )));
        }
        if compare_versions(version, max) == Ordering::Greater {
            return Err(VersionError(format!(
                "Version number:'{}' is not yet supported. Version from '{}' to '{}' inclusively are supported",
                version, min, max
            )));
        }
        Ok(())
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct VersionError(pub String);

    impl fmt::Display for VersionError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Version error: {}", self.0)
        }
    }

    impl std::error::Error for VersionError {}
}
