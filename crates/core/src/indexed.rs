//! Totals over indexed instance files

use serde::{Deserialize, Serialize};

/// Aggregate over the file properties recorded for indexed instances
///
/// A plain value: structural equality and hashing, nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedFileProperties {
    /// Number of indexed files
    pub total_indexed: i32,
    /// Sum of all recorded content lengths, in bytes
    pub total_sum: i64,
}

impl IndexedFileProperties {
    /// Create a totals value
    pub const fn new(total_indexed: i32, total_sum: i64) -> Self {
        IndexedFileProperties {
            total_indexed,
            total_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_covers_both_fields() {
        let a = IndexedFileProperties::new(3, 1_024);
        assert_eq!(a, IndexedFileProperties::new(3, 1_024));
        assert_ne!(a, IndexedFileProperties::new(3, 1_025));
        assert_ne!(a, IndexedFileProperties::new(4, 1_024));
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(IndexedFileProperties::default(), IndexedFileProperties::new(0, 0));
    }
}
