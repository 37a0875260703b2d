//! Watermark state resolution
//!
//! A watermark identifies one written content version of an instance. Each
//! feed entry carries two of them:
//!
//! - the *original* watermark, assigned when the event's write happened
//! - the *current* watermark, whatever content the instance has right now
//!   (`None` once the instance is gone)
//!
//! [`resolve_state`] is the only place that turns that pair into a
//! lifecycle state. Nothing else in the workspace compares watermarks.
//!
//! ## Limitation
//!
//! Watermarks are assigned monotonically by the write path. A pair where
//! `current < original` cannot happen under that rule and is not validated
//! here: it resolves to [`ChangeFeedState::Replaced`] like any other
//! mismatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-time lifecycle state of the instance a feed entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeFeedState {
    /// The content written by this event is still the live content
    Current,
    /// Content was overwritten by a later write; the instance may still exist
    Replaced,
    /// No live content is associated with the instance any more
    Deleted,
}

impl ChangeFeedState {
    /// Name as it appears in logs and API payloads
    pub const fn as_str(self) -> &'static str {
        match self {
            ChangeFeedState::Current => "current",
            ChangeFeedState::Replaced => "replaced",
            ChangeFeedState::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeFeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the lifecycle state from an entry's watermark pair
///
/// Pure and total.
#[inline]
pub const fn resolve_state(original: i64, current: Option<i64>) -> ChangeFeedState {
    match current {
        None => ChangeFeedState::Deleted,
        Some(current) if current == original => ChangeFeedState::Current,
        Some(_) => ChangeFeedState::Replaced,
    }
}
