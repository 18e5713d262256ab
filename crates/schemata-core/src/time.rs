//! UTC time strings with fractional seconds
//!
//! Formats use strftime/strptime directives plus a trailing fractional
//! seconds marker:
//! - `.FRAC`: fraction required, any number of digits
//! - `.1FRAC` .. `.3FRAC`: fraction required with exactly that many digits
//! - `.OPTFRAC`: fraction optional (the string must not contain other dots)
//!
//! When formatting, `.xFRAC` with x in 1..9 renders x fractional digits.

use std::fmt::Write;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use thiserror::Error;

/// Default format used when reading timestamps
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S.OPTFRAC";

const FIXED_ENDINGS: [&str; 4] = [".FRAC", ".1FRAC", ".2FRAC", ".3FRAC"];

/// Formats tried, in order, when a timestamp field is regularized from text
const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S.OPTFRAC",
    "%Y-%m-%dT%H:%M:%S.OPTFRAC",
    "%Y-%m-%d",
];

/// Time parsing and formatting errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeError {
    #[error("fractional seconds missing (string={string}, format={format})")]
    FractionalSecondsMissing { string: String, format: String },

    #[error("wrong number of digits in fractional seconds (string={string}, format={format})")]
    FractionalSecondsWrongNumberOfDigits { string: String, format: String },

    #[error("cannot parse \"{string}\" with format \"{format}\": {reason}")]
    Parse {
        string: String,
        format: String,
        reason: String,
    },

    #[error("invalid time format \"{0}\"")]
    Format(String),

    #[error("time {0} is outside the representable range")]
    OutOfRange(f64),
}

fn frac_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([1-9])FRAC").expect("static regex"))
}

/// Parse a UTC time string into epoch seconds
pub fn str_to_time(s: &str, format: &str) -> Result<f64, TimeError> {
    let (base, base_format, fracsec) =
        if let Some(iend) = FIXED_ENDINGS.iter().position(|e| format.ends_with(e)) {
            let dotpos = s
                .rfind('.')
                .ok_or_else(|| TimeError::FractionalSecondsMissing {
                    string: s.to_string(),
                    format: format.to_string(),
                })?;

            let digits = &s[dotpos + 1..];
            if iend > 0 && iend != digits.len() {
                return Err(TimeError::FractionalSecondsWrongNumberOfDigits {
                    string: s.to_string(),
                    format: format.to_string(),
                });
            }

            let fracsec = parse_fraction(s, format, digits)?;
            (
                &s[..dotpos],
                &format[..format.len() - FIXED_ENDINGS[iend].len()],
                fracsec,
            )
        } else if let Some(base_format) = format.strip_suffix(".OPTFRAC") {
            match s.rfind('.') {
                Some(dotpos) => {
                    let digits = &s[dotpos + 1..];
                    let fracsec = if digits.is_empty() {
                        0.0
                    } else {
                        parse_fraction(s, format, digits)?
                    };
                    (&s[..dotpos], base_format, fracsec)
                }
                None => (s, base_format, 0.0),
            }
        } else {
            (s, format, 0.0)
        };

    let seconds = parse_utc_seconds(base, base_format)?;
    Ok(seconds as f64 + fracsec)
}

fn parse_fraction(s: &str, format: &str, digits: &str) -> Result<f64, TimeError> {
    let parse_err = |reason: String| TimeError::Parse {
        string: s.to_string(),
        format: format.to_string(),
        reason,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_err(format!("invalid fractional seconds \"{}\"", digits)));
    }

    format!("0.{}", digits)
        .parse::<f64>()
        .map_err(|e| parse_err(e.to_string()))
}

fn parse_utc_seconds(s: &str, format: &str) -> Result<i64, TimeError> {
    match NaiveDateTime::parse_from_str(s, format) {
        Ok(dt) => Ok(dt.and_utc().timestamp()),
        Err(err) => {
            // Date-only formats do not produce a NaiveDateTime
            let midnight = NaiveDate::parse_from_str(s, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0));

            midnight
                .map(|dt| dt.and_utc().timestamp())
                .ok_or_else(|| TimeError::Parse {
                    string: s.to_string(),
                    format: format.to_string(),
                    reason: err.to_string(),
                })
        }
    }
}

/// Format epoch seconds as a UTC time string
pub fn time_to_str(t: f64, format: &str) -> Result<String, TimeError> {
    if !t.is_finite() {
        return Err(TimeError::OutOfRange(t));
    }

    let mut ts = t.floor();
    let tfrac = t - ts;

    let format = match frac_regex().captures(format) {
        Some(caps) => {
            let digits: usize = caps[1].parse().map_err(|_| TimeError::Format(format.to_string()))?;
            let sfrac = format!("{:.*}", digits, tfrac);
            if sfrac.starts_with('1') {
                ts += 1.0;
            }
            frac_regex().replace(format, &sfrac[1..]).into_owned()
        }
        None => format.to_string(),
    };

    let dt = DateTime::from_timestamp(ts as i64, 0).ok_or(TimeError::OutOfRange(t))?;

    let mut out = String::new();
    write!(out, "{}", dt.format(&format)).map_err(|_| TimeError::Format(format.clone()))?;
    Ok(out)
}

/// Format epoch seconds as `YYYY-MM-DD HH:MM:SS.f` with `digits` fractional digits (1..=9)
pub fn format_time(t: f64, digits: u8) -> Result<String, TimeError> {
    let dt = time_to_datetime(t).ok_or(TimeError::OutOfRange(t))?;
    Ok(format_datetime(&dt, digits))
}

/// Render a date-time with `digits` fractional digits, rounding half up
///
/// `digits` is clamped to 1..=9.
pub fn format_datetime(dt: &NaiveDateTime, digits: u8) -> String {
    let digits = u32::from(digits.clamp(1, 9));
    let scale = 10u64.pow(9 - digits);
    let limit = 10u64.pow(digits);

    let mut secs = dt.and_utc().timestamp();
    let mut units = (u64::from(dt.nanosecond()) + scale / 2) / scale;
    if units >= limit {
        units -= limit;
        secs += 1;
    }
    let whole = DateTime::from_timestamp(secs, 0)
        .map(|d| d.naive_utc())
        .unwrap_or(*dt);

    format!(
        "{}.{:0width$}",
        whole.format("%Y-%m-%d %H:%M:%S"),
        units,
        width = digits as usize
    )
}

/// Epoch seconds to a UTC date-time, `None` if out of range
pub fn time_to_datetime(t: f64) -> Option<NaiveDateTime> {
    if !t.is_finite() {
        return None;
    }

    let floor = t.floor();
    let mut secs = floor as i64;
    let mut nanos = ((t - floor) * 1e9).round() as i64;
    if nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }

    DateTime::from_timestamp(secs, nanos as u32).map(|dt| dt.naive_utc())
}

/// UTC date-time to epoch seconds with fractional sub-second remainder
pub fn datetime_to_time(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 + f64::from(dt.nanosecond()) / 1e9
}

/// Parse a timestamp given as text in any of the accepted layouts
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.frac]`, `YYYY-MM-DDTHH:MM:SS[.frac][Z]`
/// and `YYYY-MM-DD`.
pub fn parse_timestamp(s: &str) -> Result<f64, TimeError> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    let mut last_err = None;
    for format in TIMESTAMP_FORMATS {
        match str_to_time(trimmed, format) {
            Ok(t) => return Ok(t),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| TimeError::Format(s.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fraction() {
        assert_eq!(str_to_time("2009-02-13 23:31:30", DEFAULT_FORMAT).unwrap(), 1234567890.0);
        assert_eq!(str_to_time("2009-02-13 23:31:30.5", DEFAULT_FORMAT).unwrap(), 1234567890.5);
    }

    #[test]
    fn required_fraction_missing() {
        let err = str_to_time("2009-02-13 23:31:30", "%Y-%m-%d %H:%M:%S.FRAC").unwrap_err();
        assert!(matches!(err, TimeError::FractionalSecondsMissing { .. }));
    }

    #[test]
    fn fraction_digit_count_enforced() {
        assert_eq!(
            str_to_time("2009-02-13 23:31:30.250", "%Y-%m-%d %H:%M:%S.3FRAC").unwrap(),
            1234567890.25
        );
        let err = str_to_time("2009-02-13 23:31:30.25", "%Y-%m-%d %H:%M:%S.3FRAC").unwrap_err();
        assert!(matches!(err, TimeError::FractionalSecondsWrongNumberOfDigits { .. }));
    }

    #[test]
    fn date_only() {
        assert_eq!(str_to_time("2009-02-13", "%Y-%m-%d").unwrap(), 1234483200.0);
    }

    #[test]
    fn format_with_fraction() {
        assert_eq!(
            time_to_str(1234567890.5, "%Y-%m-%d %H:%M:%S.3FRAC").unwrap(),
            "2009-02-13 23:31:30.500"
        );
        // Rounding carries into the seconds
        assert_eq!(
            time_to_str(1234567890.9999, "%Y-%m-%d %H:%M:%S.2FRAC").unwrap(),
            "2009-02-13 23:31:31.00"
        );
        assert_eq!(time_to_str(0.0, "%Y-%m-%d").unwrap(), "1970-01-01");
    }

    #[test]
    fn datetime_round_trip() {
        let dt = time_to_datetime(1234567890.5).unwrap();
        assert_eq!(dt.to_string(), "2009-02-13 23:31:30.500");
        assert_eq!(datetime_to_time(&dt), 1234567890.5);
    }

    #[test]
    fn format_datetime_rounds() {
        let dt = time_to_datetime(1234567890.5).unwrap();
        assert_eq!(format_datetime(&dt, 6), "2009-02-13 23:31:30.500000");

        let dt = NaiveDate::from_ymd_opt(2009, 2, 13)
            .unwrap()
            .and_hms_nano_opt(23, 31, 30, 999_999_900)
            .unwrap();
        assert_eq!(format_datetime(&dt, 6), "2009-02-13 23:31:31.000000");
    }

    #[test]
    fn timestamp_layouts() {
        assert_eq!(parse_timestamp("2009-02-13T23:31:30.5Z").unwrap(), 1234567890.5);
        assert_eq!(parse_timestamp("2009-02-13 23:31:30.5").unwrap(), 1234567890.5);
        assert_eq!(parse_timestamp("2009-02-13").unwrap(), 1234483200.0);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
