//! Schema version identifiers
//!
//! The physical shape of the change feed rows changes over deployments.
//! Every shape gets a [`SchemaVersion`]; versions are small integers and
//! totally ordered, so "newer than" is a plain comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a change feed row shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// Original feed shape, single partition
    pub const V4: SchemaVersion = SchemaVersion(4);

    /// Partition name added to feed rows
    pub const V6: SchemaVersion = SchemaVersion(6);

    /// Time-range filtering and indexed file metrics
    pub const V35: SchemaVersion = SchemaVersion(35);

    /// Every version this build ships a read strategy for, oldest first
    pub const KNOWN: [SchemaVersion; 3] = [Self::V4, Self::V6, Self::V35];

    /// Wrap a raw version number
    #[inline]
    pub const fn new(version: u32) -> Self {
        SchemaVersion(version)
    }

    /// Raw version number
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Whether this build ships a strategy for this version
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }

    /// Newest version this build knows about
    pub const fn latest() -> Self {
        Self::V35
    }
}

impl From<u32> for SchemaVersion {
    fn from(version: u32) -> Self {
        SchemaVersion(version)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}
