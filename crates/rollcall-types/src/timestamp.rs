use crate::error::DomainError;
use chrono::{DateTime, NaiveDateTime, TimeDelta};
use std::fmt;

/// Full-precision rendering used for every computed timestamp.
const MICRO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// An event timestamp holding both the verbatim input text and its parsed
/// microsecond-precision value.
///
/// The split matters: timestamps copied unchanged onto a synthesized event
/// (a validation's `created`, a bracketing real event) must survive in their
/// original text form, while any timestamp produced by arithmetic is always
/// rendered with six fractional digits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTimestamp {
    text: String,
    value: NaiveDateTime,
}

impl EventTimestamp {
    /// Parse an ISO-8601 date-time with optional fractional seconds,
    /// keeping the input text verbatim.
    ///
    /// Timestamps carrying an explicit UTC offset are accepted but
    /// normalized: their text becomes the six-digit naive-UTC rendering.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self {
                text: trimmed.to_owned(),
                value,
            });
        }
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::from_datetime(with_offset.naive_utc()));
        }
        Err(DomainError::InvalidTimestamp {
            raw: raw.to_owned(),
        })
    }

    /// Build a timestamp from an already-parsed value, rendered with six
    /// fractional digits.
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self {
            text: value.format(MICRO_FORMAT).to_string(),
            value,
        }
    }

    /// Shift by a signed number of microseconds, borrowing across seconds
    /// in both directions (`…:01.000000 - 1µs` is `…:00.999999`).
    pub fn plus_micros(&self, delta: i64) -> Self {
        Self::from_datetime(self.value + TimeDelta::microseconds(delta))
    }

    /// The text form: verbatim input, or the six-digit rendering for
    /// computed timestamps.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> NaiveDateTime {
        self.value
    }

    /// The `YYYY-MM-DD` date this timestamp falls on. Used as the
    /// partition key for emitted events.
    pub fn date_stamp(&self) -> String {
        self.value.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
