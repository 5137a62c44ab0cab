/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Core types for bus operations.
//!
//! This module provides fundamental types used throughout IronBus:
//! - [`DomainId`]: Isolation scope for topics
//! - [`Timestamp`]: Wall-clock timestamp with nanosecond precision
//! - [`LostMessageStatus`]: Loss report delivered to subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Isolation scope for publishers and subscribers.
///
/// Messages published in one domain are never seen by subscribers in another.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct DomainId(u32);

impl DomainId {
    /// Creates a new domain identifier.
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw domain value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for DomainId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<DomainId> for u32 {
    fn from(domain: DomainId) -> Self {
        domain.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock timestamp with nanosecond precision.
///
/// Carried on the wire as a signed 64-bit tick count of nanoseconds since the
/// Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds since Unix epoch.
    ///
    /// # Arguments
    /// * `nanos` - Nanoseconds since 1970-01-01 00:00:00 UTC
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            nanos_since_epoch: nanos,
        }
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Creates a timestamp from a wire tick count; negative ticks clamp to the epoch.
    #[inline]
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self {
            nanos_since_epoch: if ticks < 0 { 0 } else { ticks as u64 },
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Returns nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos_since_epoch
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Returns the wire tick count.
    #[inline]
    #[must_use]
    pub const fn as_ticks(self) -> i64 {
        if self.nanos_since_epoch > i64::MAX as u64 {
            i64::MAX
        } else {
            self.nanos_since_epoch as i64
        }
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.as_ticks())
    }

    /// Formats the timestamp with millisecond precision.
    ///
    /// Format: `YYYYMMDD-HH:MM:SS.sss`
    #[must_use]
    pub fn format_millis(self) -> String {
        self.to_datetime().format("%Y%m%d-%H:%M:%S%.3f").to_string()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_ticks(dt.timestamp_nanos_opt().unwrap_or(0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_millis())
    }
}

/// Loss report handed to a subscriber's listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostMessageStatus {
    /// Cumulative number of messages lost on the subscriber.
    pub total_lost: u64,
    /// Messages lost since the previous report.
    pub new_lost: u64,
    /// Transport-specific reason.
    pub reason: String,
}

impl LostMessageStatus {
    /// Creates a new loss report.
    #[must_use]
    pub fn new(total_lost: u64, new_lost: u64, reason: impl Into<String>) -> Self {
        Self {
            total_lost,
            new_lost,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LostMessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lost {} (total {}): {}",
            self.new_lost, self.total_lost, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_id() {
        let domain = DomainId::new(7);
        assert_eq!(domain.value(), 7);
        assert_eq!(u32::from(domain), 7);
        assert_eq!(DomainId::default().value(), 0);
        assert_eq!(domain.to_string(), "7");
    }

    #[test]
    fn test_timestamp_from_millis() {
        let ts = Timestamp::from_millis(1_000);
        assert_eq!(ts.as_nanos(), 1_000_000_000);
        assert_eq!(ts.as_millis(), 1_000);
    }

    #[test]
    fn test_timestamp_ticks() {
        let ts = Timestamp::from_ticks(1_700_000_000_123_456_789);
        assert_eq!(ts.as_ticks(), 1_700_000_000_123_456_789);
        assert_eq!(Timestamp::from_ticks(-5).as_nanos(), 0);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Timestamp::from_millis(1_706_356_800_123);
        assert_eq!(ts.format_millis(), "20240127-12:00:00.123");
    }

    #[test]
    fn test_timestamp_now_is_recent() {
        let ts = Timestamp::now();
        assert!(ts.as_millis() > 1_700_000_000_000);
    }

    #[test]
    fn test_lost_message_status_display() {
        let status = LostMessageStatus::new(10, 3, "sample rejected");
        assert_eq!(status.to_string(), "lost 3 (total 10): sample rejected");
    }
}
