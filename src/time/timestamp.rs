use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{MS_PER_SEC, NS_PER_MS, NS_PER_SEC};
use crate::core::{Error, Result};

/// Baseline instant when bit 31 of the seconds field is clear:
/// 2036-02-07T06:28:16Z, in milliseconds since the Unix epoch.
const BASE_2036_MS: i64 = 2_085_978_496_000;
const BASE_2036_NS: i64 = BASE_2036_MS * NS_PER_MS;

/// Baseline instant when bit 31 of the seconds field is set:
/// 1900-01-01T00:00:00Z, in milliseconds since the Unix epoch.
const BASE_1900_MS: i64 = -2_208_988_800_000;
const BASE_1900_NS: i64 = BASE_1900_MS * NS_PER_MS;

/// Base-selecting bit within the 32-bit seconds field.
const BASE_BIT: u64 = 0x8000_0000;

/// Calendar rendering, e.g. "Tue, Dec 10 2002 15:41:49.987".
const DATE_FORMAT: &str = "%a, %b %d %Y %H:%M:%S%.3f";

/// A 64-bit unsigned fixed-point NTP timestamp as defined in RFC-1305: the
/// high-order 32 bits count whole seconds and the low-order 32 bits count
/// fractional seconds in units of 1/2^32 s (about 232 ps resolution).
///
/// The seconds count is relative to one of two base instants, selected by
/// bit 31 of the seconds field per RFC-2030: when the bit is set the count
/// runs from 1900-01-01T00:00:00Z (valid through early 2036), when clear it
/// runs from 2036-02-07T06:28:16Z (valid through 2104). A raw value of 0 is
/// the protocol's "field not set" sentinel, never a real instant.
///
/// Ordering, equality and hashing are defined over the raw unsigned value.
/// That ordering reflects chronology only between values sharing the same
/// base bit; comparing across the 2036 rollover is well-defined bitwise but
/// not calendar-meaningful.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Wraps a raw 64-bit NTP value. Total; performs no validation.
    pub const fn new(raw: u64) -> Self {
        Timestamp(raw)
    }

    /// Captures the current system clock.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_epoch_nanos(since_epoch.as_nanos() as i64)
    }

    /// Parses the hexadecimal `seconds.fraction` form, e.g.
    /// `"c1a089bd.fc904f6d"`.
    ///
    /// Each side of the first `.` is parsed as an unsigned 32-bit base-16
    /// value; non-hex digits, 32-bit overflow, and an empty fraction after
    /// the dot are format errors rather than silent truncation. Without a
    /// `.` the fraction defaults to 0. An empty string, or a string whose
    /// seconds side is empty, decodes to raw value 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use ntp_sync::time::Timestamp;
    ///
    /// let ts = Timestamp::from_hex("c1a089bd.fc904f6d").unwrap();
    /// assert_eq!(ts.to_string(), "c1a089bd.fc904f6d");
    /// assert!(Timestamp::from_hex("c1a089bd.xyz").is_err());
    /// ```
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Timestamp(0));
        }
        match s.split_once('.') {
            None => Ok(Timestamp(u64::from(parse_half(s)?) << 32)),
            Some((seconds, _)) if seconds.is_empty() => Ok(Timestamp(0)),
            Some((seconds, fraction)) => {
                let seconds = parse_half(seconds)?;
                let fraction = parse_half(fraction)?;
                Ok(Timestamp((u64::from(seconds) << 32) | u64::from(fraction)))
            }
        }
    }

    /// Converts milliseconds since the Unix epoch to an NTP timestamp.
    ///
    /// Instants before 2036-02-07T06:28:16Z count from the 1900 base with
    /// bit 31 forced on; instants at or after it count from the 2036 base.
    /// The sub-second remainder is rescaled from 1/1000 s to 1/2^32 s units
    /// rounding half-up, so millisecond granularity survives a round-trip
    /// through [`to_epoch_millis`] exactly.
    ///
    /// Forcing bit 31 on means the 1900 base only represents instants whose
    /// seconds count already has that bit set, i.e. from 1968 onward.
    ///
    /// [`to_epoch_millis`]: Timestamp::to_epoch_millis
    pub fn from_epoch_millis(millis: i64) -> Self {
        let use_base_1900 = millis < BASE_2036_MS;
        let base = if use_base_1900 { BASE_1900_MS } else { BASE_2036_MS };
        let since_base = millis - base;

        let mut seconds = since_base.div_euclid(MS_PER_SEC) as u64;
        let rem = since_base.rem_euclid(MS_PER_SEC) as u64;
        let fraction = ((rem << 32) + 500) / 1_000;

        if use_base_1900 {
            seconds |= BASE_BIT;
        }
        Timestamp(((seconds & 0xffff_ffff) << 32) | fraction)
    }

    /// Converts nanoseconds since the Unix epoch to an NTP timestamp.
    ///
    /// Base selection and rounding as in [`from_epoch_millis`]. The 1/2^32 s
    /// fraction outresolves nanoseconds, so every nanosecond value round-trips
    /// through [`to_epoch_nanos`] exactly.
    ///
    /// [`from_epoch_millis`]: Timestamp::from_epoch_millis
    /// [`to_epoch_nanos`]: Timestamp::to_epoch_nanos
    pub fn from_epoch_nanos(nanos: i64) -> Self {
        let use_base_1900 = nanos < BASE_2036_NS;
        let base = if use_base_1900 { BASE_1900_NS } else { BASE_2036_NS };
        let since_base = nanos - base;

        let mut seconds = since_base.div_euclid(NS_PER_SEC) as u64;
        let rem = since_base.rem_euclid(NS_PER_SEC) as u64;
        let fraction = ((rem << 32) + 500_000_000) / 1_000_000_000;

        if use_base_1900 {
            seconds |= BASE_BIT;
        }
        Timestamp(((seconds & 0xffff_ffff) << 32) | fraction)
    }

    /// Converts to milliseconds since the Unix epoch.
    ///
    /// Reads bit 31 to select the base, rescales the fraction from 1/2^32 s
    /// units rounding half-up, and discards sub-millisecond precision: NTP
    /// resolution exceeds millisecond resolution, so distinct timestamps can
    /// map to the same millisecond.
    pub fn to_epoch_millis(&self) -> i64 {
        let seconds = self.0 >> 32;
        let fraction = self.0 & 0xffff_ffff;
        let frac_ms = ((fraction * 1_000) + (1u64 << 31)) >> 32;

        let base = if seconds & BASE_BIT == 0 { BASE_2036_MS } else { BASE_1900_MS };
        base + (seconds as i64) * MS_PER_SEC + frac_ms as i64
    }

    /// Converts to nanoseconds since the Unix epoch.
    ///
    /// Same shape as [`to_epoch_millis`]; the residual error from rounding
    /// the 1/2^32 s fraction to nanoseconds is below 0.12 ns.
    ///
    /// [`to_epoch_millis`]: Timestamp::to_epoch_millis
    pub fn to_epoch_nanos(&self) -> i64 {
        let seconds = self.0 >> 32;
        let fraction = self.0 & 0xffff_ffff;
        let frac_ns = ((fraction * 1_000_000_000) + (1u64 << 31)) >> 32;

        let base = if seconds & BASE_BIT == 0 { BASE_2036_NS } else { BASE_1900_NS };
        base + (seconds as i64) * NS_PER_SEC + frac_ns as i64
    }

    /// Converts to a UTC calendar time at millisecond granularity.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.to_epoch_millis()).single()
    }

    /// Renders as e.g. `"Tue, Dec 10 2002 15:41:49.987 UTC"`.
    pub fn to_utc_string(&self) -> String {
        match self.to_datetime() {
            Some(dt) => format!("{} UTC", dt.format(DATE_FORMAT)),
            None => self.to_string(),
        }
    }

    /// Renders in the local timezone, e.g. `"Tue, Dec 10 2002 10:41:49.987"`.
    pub fn to_date_string(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.with_timezone(&chrono::Local).format(DATE_FORMAT).to_string(),
            None => self.to_string(),
        }
    }

    /// Returns the raw 64-bit NTP value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// High-order 32 bits: whole seconds relative to the selected base.
    pub const fn seconds(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Low-order 32 bits: fractional seconds in 1/2^32 s units.
    pub const fn fraction(&self) -> u32 {
        self.0 as u32
    }

    /// True when this is the protocol's "field not set" sentinel.
    pub const fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

/// Parses one 8-digit-or-fewer hex half of the text form.
fn parse_half(s: &str) -> Result<u32> {
    u32::from_str_radix(s, 16)
        .map_err(|e| Error::format(format!("invalid hex field {:?}: {}", s, e)))
}

impl From<u64> for Timestamp {
    fn from(raw: u64) -> Self {
        Timestamp(raw)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Timestamp::from_epoch_millis(dt.timestamp_millis())
    }
}

/// Formats both 32-bit halves as zero-padded lowercase hex joined by `.`,
/// e.g. `c1a089bd.fc904f6d`. Pure bit formatting, independent of the
/// calendar base; always round-trips exactly through [`Timestamp::from_hex`].
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}.{:08x}", self.seconds(), self.fraction())
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Timestamp::from_hex(s)
    }
}
