//! Half-open time range over feed timestamps
//!
//! Bounds are optional: a missing start means "from the beginning of the
//! log" and a missing end means "up to now and beyond". The start bound is
//! inclusive, the end bound exclusive.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp window `[start, end)` for range queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
}

impl TimeRange {
    /// The range covering every possible timestamp
    pub const UNBOUNDED: TimeRange = TimeRange {
        start: None,
        end: None,
    };

    /// Create a bounded range
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `start` is after `end`.
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> FeedResult<Self> {
        Self::from_bounds(Some(start), Some(end))
    }

    /// Create a range from optional bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if both bounds are present and `start > end`.
    pub fn from_bounds(
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> FeedResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(FeedError::invalid_input(format!(
                    "time range start {} is after end {}",
                    s.to_rfc3339(),
                    e.to_rfc3339()
                )));
            }
        }
        Ok(TimeRange { start, end })
    }

    /// Everything at or after `start`
    pub fn since(start: DateTime<FixedOffset>) -> Self {
        TimeRange {
            start: Some(start),
            end: None,
        }
    }

    /// Everything strictly before `end`
    pub fn until(end: DateTime<FixedOffset>) -> Self {
        TimeRange {
            start: None,
            end: Some(end),
        }
    }

    /// Inclusive lower bound
    #[inline]
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.start
    }

    /// Exclusive upper bound
    #[inline]
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end
    }

    /// True when neither bound is set
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `timestamp` falls inside `[start, end)`
    pub fn contains(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        self.start.map_or(true, |s| *timestamp >= s) && self.end.map_or(true, |e| *timestamp < e)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::UNBOUNDED
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(s) => write!(f, "[{}", s.to_rfc3339())?,
            None => f.write_str("[-inf")?,
        }
        match self.end {
            Some(e) => write!(f, ", {})", e.to_rfc3339()),
            None => f.write_str(", +inf)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<FixedOffset> {
        DateTime::from_timestamp(secs, 0)
            .expect("valid timestamp")
            .fixed_offset()
    }

    #[test]
    fn test_unbounded_contains_everything() {
        let range = TimeRange::UNBOUNDED;
        assert!(range.is_unbounded());
        assert!(range.contains(&ts(0)));
        assert!(range.contains(&ts(4_000_000_000)));
    }

    #[test]
    fn test_start_inclusive_end_exclusive() {
        let range = TimeRange::new(ts(100), ts(200)).unwrap();
        assert!(!range.contains(&ts(99)));
        assert!(range.contains(&ts(100)));
        assert!(range.contains(&ts(199)));
        assert!(!range.contains(&ts(200)));
    }

    #[test]
    fn test_empty_range_is_allowed() {
        let range = TimeRange::new(ts(100), ts(100)).unwrap();
        assert!(!range.contains(&ts(100)));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = TimeRange::new(ts(200), ts(100)).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput(_)));
    }

    #[test]
    fn test_half_open_constructors() {
        let since = TimeRange::since(ts(100));
        assert!(since.contains(&ts(100)));
        assert!(!since.contains(&ts(99)));
        assert!(!since.is_unbounded());

        let until = TimeRange::until(ts(100));
        assert!(until.contains(&ts(99)));
        assert!(!until.contains(&ts(100)));
    }

    #[test]
    fn test_comparison_ignores_offset() {
        let utc = ts(3_600);
        let plus_one = utc.with_timezone(&FixedOffset::east_opt(3_600).unwrap());
        let range = TimeRange::since(plus_one);
        assert!(range.contains(&utc));
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeRange::UNBOUNDED.to_string(), "[-inf, +inf)");
    }
}
