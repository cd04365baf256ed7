//! Date formatting and relative moves.
//!
//! # Responsibility
//! - Format dates in the configured timezone (IANA name or fixed offset).
//! - Resolve language-dependent formats through the translator.
//! - Move dates by signed ISO-8601 intervals (`-P7D`, `+PT5H`).
//!
//! # Invariants
//! - Formats use `time` format descriptions (`[day]/[month]/[year]`).
//! - The first character of an interval is its sign; the rest is parsed as
//!   an ISO-8601 duration even when that character is not a sign.
//! - Month moves overflow extra days into the next month (Jan 31 + 1 month
//!   lands in early March).

use crate::text::Translator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};
use time_tz::{timezones, OffsetDateTimeExt, Tz};

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$",
    )
    .expect("ISO-8601 duration pattern is valid")
});

pub type DateResult<T> = Result<T, DateError>;

#[derive(Debug)]
pub enum DateError {
    InvalidDate { input: String, message: String },
    InvalidFormat { format: String, message: String },
    InvalidInterval(String),
    InvalidTimezone(String),
    OutOfRange(String),
    Format(time::error::Format),
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate { input, message } => {
                write!(f, "invalid date `{input}`: {message}")
            }
            Self::InvalidFormat { format, message } => {
                write!(f, "invalid date format `{format}`: {message}")
            }
            Self::InvalidInterval(value) => write!(f, "invalid date interval: {value}"),
            Self::InvalidTimezone(value) => {
                write!(f, "invalid timezone `{value}` (expected a zone name or +HH:MM)")
            }
            Self::OutOfRange(message) => write!(f, "date out of range: {message}"),
            Self::Format(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            _ => None,
        }
    }
}

impl From<time::error::Format> for DateError {
    fn from(value: time::error::Format) -> Self {
        Self::Format(value)
    }
}

/// Parses a timezone setting: `UTC`, `Z` or a `+HH:MM` offset.
pub fn parse_offset(value: &str) -> DateResult<UtcOffset> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        trimmed,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| DateError::InvalidTimezone(trimmed.to_string()))
}

/// Display timezone of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Same offset all year round.
    Fixed(UtcOffset),
    /// tz database zone; the offset follows its daylight-saving rules.
    Named(&'static Tz),
}

impl Zone {
    /// Expresses `date` as wall-clock time in this zone.
    pub fn convert(self, date: OffsetDateTime) -> OffsetDateTime {
        match self {
            Self::Fixed(offset) => date.to_offset(offset),
            Self::Named(tz) => date.to_timezone(tz),
        }
    }
}

/// Parses a timezone setting: an IANA name (`Europe/Paris`), `UTC`, `Z` or
/// a `+HH:MM` offset.
pub fn parse_zone(value: &str) -> DateResult<Zone> {
    let trimmed = value.trim();
    if let Ok(offset) = parse_offset(trimmed) {
        return Ok(Zone::Fixed(offset));
    }
    timezones::get_by_name(trimmed)
        .map(Zone::Named)
        .ok_or_else(|| DateError::InvalidTimezone(trimmed.to_string()))
}

/// Formats dates for the current user.
pub struct DateFormatter<'a> {
    zone: Option<Zone>,
    translator: &'a dyn Translator,
}

impl<'a> DateFormatter<'a> {
    /// `zone` of `None` keeps each date in its own offset.
    pub fn new(zone: Option<Zone>, translator: &'a dyn Translator) -> Self {
        Self { zone, translator }
    }

    /// Formats `date`, translating `format` first when it is a catalog key.
    pub fn format(&self, date: OffsetDateTime, format: &str) -> DateResult<String> {
        let date = match self.zone {
            Some(zone) => zone.convert(date),
            None => date,
        };

        let format = if self.translator.has_key(format) {
            self.translator.text(format)
        } else {
            format.to_string()
        };

        let items = time::format_description::parse(&format).map_err(|err| {
            DateError::InvalidFormat {
                format: format.clone(),
                message: err.to_string(),
            }
        })?;
        Ok(date.format(items.as_slice())?)
    }

    /// Same as [`Self::format`] for an RFC 3339 string (or `now`).
    pub fn format_str(&self, date: &str, format: &str) -> DateResult<String> {
        self.format(parse_date(date)?, format)
    }
}

/// Parses an RFC 3339 timestamp; `now` yields the current UTC time.
pub fn parse_date(value: &str) -> DateResult<OffsetDateTime> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("now") {
        return Ok(OffsetDateTime::now_utc());
    }
    OffsetDateTime::parse(trimmed, &Rfc3339).map_err(|err| DateError::InvalidDate {
        input: trimmed.to_string(),
        message: err.to_string(),
    })
}

/// Moves `date` by a signed interval such as `-P7D`, `+PT5H` or `-P1DT1H`.
///
/// A leading character other than `+` or `-` leaves the date unchanged once
/// the remaining duration has been validated.
pub fn move_date(date: OffsetDateTime, interval: &str) -> DateResult<OffsetDateTime> {
    let mut chars = interval.chars();
    let sign = chars.next();
    let iso = chars.as_str().to_uppercase();
    let parts = parse_iso_duration(&iso)
        .ok_or_else(|| DateError::InvalidInterval(interval.to_string()))?;

    match sign {
        Some('+') => apply(date, &parts, 1),
        Some('-') => apply(date, &parts, -1),
        _ => Ok(date),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DurationParts {
    years: i64,
    months: i64,
    weeks: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

fn parse_iso_duration(iso: &str) -> Option<DurationParts> {
    if iso == "P" || iso.ends_with('T') {
        return None;
    }
    let caps = ISO_DURATION.captures(iso)?;
    let field = |index: usize| -> Option<i64> {
        match caps.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(DurationParts {
        years: field(1)?,
        months: field(2)?,
        weeks: field(3)?,
        days: field(4)?,
        hours: field(5)?,
        minutes: field(6)?,
        seconds: field(7)?,
    })
}

fn apply(date: OffsetDateTime, parts: &DurationParts, sign: i64) -> DateResult<OffsetDateTime> {
    let out_of_range = || DateError::OutOfRange(format!("{date} moved by {parts:?}"));

    let months = parts
        .years
        .checked_mul(12)
        .and_then(|m| m.checked_add(parts.months))
        .and_then(|m| m.checked_mul(sign))
        .ok_or_else(out_of_range)?;
    let moved = add_months(date, months).ok_or_else(out_of_range)?;

    let seconds = parts
        .weeks
        .checked_mul(7)
        .and_then(|d| d.checked_add(parts.days))
        .and_then(|d| d.checked_mul(86_400))
        .and_then(|s| s.checked_add(parts.hours.checked_mul(3_600)?))
        .and_then(|s| s.checked_add(parts.minutes.checked_mul(60)?))
        .and_then(|s| s.checked_add(parts.seconds))
        .and_then(|s| s.checked_mul(sign))
        .ok_or_else(out_of_range)?;

    moved
        .checked_add(Duration::seconds(seconds))
        .ok_or_else(out_of_range)
}

fn add_months(date: OffsetDateTime, months: i64) -> Option<OffsetDateTime> {
    if months == 0 {
        return Some(date);
    }
    let index = (i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1)
        .checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let target = first.checked_add(Duration::days(i64::from(date.day()) - 1))?;
    Some(date.replace_date(target))
}
