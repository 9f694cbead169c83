use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// UTC wall-clock instant used for object metadata and change records.
///
/// Serialized as RFC 3339 with full sub-second precision, so values survive
/// a JSON round-trip exactly. Ordering is plain chronological ordering; merge
/// decisions compare these values directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The largest representable instant.
    pub const MAX: Self = Self(DateTime::<Utc>::MAX_UTC);

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// A timestamp strictly after `previous`: the current time, or
    /// `previous + 1µs` when the clock has not moved past it.
    ///
    /// Saturates at the largest representable instant, so a `previous` at
    /// that bound is returned unchanged.
    pub fn after(previous: &Self) -> Self {
        let floor = previous
            .0
            .checked_add_signed(Duration::microseconds(1))
            .unwrap_or(Self::MAX.0);
        Self(Utc::now().max(floor))
    }

    /// Wrap an existing `DateTime`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Build from milliseconds since the UNIX epoch.
    pub fn from_millis(ms: i64) -> Result<Self, TypeError> {
        DateTime::from_timestamp_millis(ms)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidTimestamp(format!("{ms}ms out of range")))
    }

    /// Parse an RFC 3339 string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| TypeError::InvalidTimestamp(format!("{s:?}: {e}")))
    }

    /// The underlying `DateTime`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Milliseconds since the UNIX epoch.
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns `true` if this instant is strictly later than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn after_is_strictly_later() {
        let base = Timestamp::now();
        let next = Timestamp::after(&base);
        assert!(next.is_after(&base));
    }

    #[test]
    fn after_future_timestamp_still_advances() {
        // A remote clock far ahead of ours must not stall local updates.
        let future = Timestamp::from_millis(Timestamp::now().as_millis() + 60_000).unwrap();
        let next = Timestamp::after(&future);
        assert!(next > future);
        assert_eq!(
            *next.as_datetime() - *future.as_datetime(),
            Duration::microseconds(1)
        );
    }

    #[test]
    fn after_saturates_at_the_last_instant() {
        assert_eq!(Timestamp::after(&Timestamp::MAX), Timestamp::MAX);

        let almost = Timestamp::from_datetime(*Timestamp::MAX.as_datetime() - Duration::microseconds(1));
        assert_eq!(Timestamp::after(&almost), Timestamp::MAX);
    }

    #[test]
    fn ordering_is_chronological() {
        let a = Timestamp::from_millis(1_000).unwrap();
        let b = Timestamp::from_millis(2_000).unwrap();
        assert!(a < b);
        assert!(b.is_after(&a));
        assert!(!a.is_after(&a));
    }

    #[test]
    fn parse_rfc3339() {
        let ts = Timestamp::parse("2024-05-01T12:00:00.123Z").unwrap();
        assert_eq!(ts.as_millis(), 1_714_564_800_123);
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn serde_roundtrip_keeps_precision() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
