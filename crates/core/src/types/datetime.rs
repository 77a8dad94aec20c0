//! Date/time values stored on table entities.
//!
//! A value bound from a form or a file often carries no timezone at all. The
//! table backend must never store such an ambiguous value, so entities hold
//! a [`TableDateTime`] and normalize it before every write: an
//! `Unspecified` wall-clock value is tagged as UTC without shifting it.
//! Values that already carry an offset are converted to their UTC instant
//! when constructed, so normalization never moves an absolute instant.
//!
//! The table service keeps date/times at 100 ns precision (seven fractional
//! digits). Normalization truncates to that precision, so a value reads back
//! exactly as it was written.

use core::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format used for values without a timezone designator.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Fractional second digits the table service stores.
const STORED_SUBSEC_DIGITS: u16 = 7;

/// A date/time that is either tagged UTC or has no timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableDateTime {
    /// An absolute instant in UTC.
    Utc(DateTime<Utc>),
    /// A wall-clock value with no timezone information.
    Unspecified(NaiveDateTime),
}

impl TableDateTime {
    /// The current instant, tagged UTC.
    #[must_use]
    pub fn now() -> Self {
        Self::Utc(Utc::now())
    }

    /// Whether the value is already tagged UTC.
    #[must_use]
    pub const fn is_utc(&self) -> bool {
        matches!(self, Self::Utc(_))
    }

    /// Tag an unspecified value as UTC, keeping its wall-clock value, and
    /// truncate it to the stored precision.
    pub fn normalize(&mut self) {
        *self = Self::Utc(self.to_utc().trunc_subsecs(STORED_SUBSEC_DIGITS));
    }

    /// Return the normalized form of this value.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// The UTC instant this value denotes once normalized.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match *self {
            Self::Utc(dt) => dt,
            Self::Unspecified(naive) => naive.and_utc(),
        }
    }
}

impl Default for TableDateTime {
    fn default() -> Self {
        Self::now()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TableDateTime {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Utc(dt.with_timezone(&Utc))
    }
}

impl From<NaiveDateTime> for TableDateTime {
    fn from(naive: NaiveDateTime) -> Self {
        Self::Unspecified(naive)
    }
}

impl fmt::Display for TableDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc(dt) => {
                write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))?;
                // 100 ns ticks, trailing zeros dropped
                let ticks = format!("{:07}", dt.nanosecond() % 1_000_000_000 / 100);
                let ticks = ticks.trim_end_matches('0');
                if !ticks.is_empty() {
                    write!(f, ".{ticks}")?;
                }
                f.write_str("Z")
            }
            Self::Unspecified(naive) => write!(f, "{}", naive.format(NAIVE_FORMAT)),
        }
    }
}

impl std::str::FromStr for TableDateTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Ok(Self::from(dt)),
            Err(rfc_err) => NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
                .map(Self::Unspecified)
                .map_err(|_| rfc_err),
        }
    }
}

impl Serialize for TableDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TableDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};

    use super::*;

    fn naive(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_normalize_keeps_wall_clock() {
        let mut value = TableDateTime::from(naive(9, 30));
        assert!(!value.is_utc());
        value.normalize();
        assert!(value.is_utc());
        assert_eq!(value.to_utc(), naive(9, 30).and_utc());
    }

    #[test]
    fn test_offset_value_keeps_instant() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.from_local_datetime(&naive(12, 0)).unwrap();
        let value = TableDateTime::from(local);
        assert!(value.is_utc());
        assert_eq!(value.to_utc(), local.with_timezone(&Utc));
        assert_eq!(value.to_utc(), naive(10, 0).and_utc());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = TableDateTime::from(naive(1, 2)).normalized();
        assert_eq!(once.normalized(), once);
    }

    #[test]
    fn test_utc_serializes_with_z_suffix() {
        let value = TableDateTime::from(naive(8, 15)).normalized();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"2025-03-14T08:15:00Z\"");
        let back: TableDateTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_normalize_truncates_to_stored_precision() {
        let precise = naive(8, 15).with_nanosecond(398_287_730).unwrap().and_utc();
        let value = TableDateTime::from(precise).normalized();

        assert_eq!(value.to_string(), "2025-03-14T08:15:00.3982877Z");
        let back: TableDateTime = value.to_string().parse().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_display_drops_trailing_zero_ticks() {
        let value = TableDateTime::from(naive(8, 15).with_nanosecond(500_000_000).unwrap())
            .normalized();
        assert_eq!(value.to_string(), "2025-03-14T08:15:00.5Z");
    }

    #[test]
    fn test_parse_without_designator_is_unspecified() {
        let value: TableDateTime = "2025-03-14T08:15:00".parse().unwrap();
        assert_eq!(value, TableDateTime::Unspecified(naive(8, 15)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("yesterday".parse::<TableDateTime>().is_err());
    }
}
