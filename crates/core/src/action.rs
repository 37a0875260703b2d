//! Lifecycle actions recorded in the change feed

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of lifecycle event a feed entry records
///
/// Stored as a small integer. The codes are part of the persisted row
/// format and must never be renumbered: `Update` was added after `Delete`,
/// which is why it carries the highest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeFeedAction {
    /// Instance was created
    Create,
    /// Instance was deleted
    Delete,
    /// Instance content or metadata was replaced
    Update,
}

impl ChangeFeedAction {
    /// Stored code for this action
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            ChangeFeedAction::Create => 0,
            ChangeFeedAction::Delete => 1,
            ChangeFeedAction::Update => 2,
        }
    }

    /// Decode a stored action code
    ///
    /// Returns `None` for codes this build does not know.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ChangeFeedAction::Create),
            1 => Some(ChangeFeedAction::Delete),
            2 => Some(ChangeFeedAction::Update),
            _ => None,
        }
    }

    /// Name as it appears in logs and API payloads
    pub const fn as_str(self) -> &'static str {
        match self {
            ChangeFeedAction::Create => "create",
            ChangeFeedAction::Delete => "delete",
            ChangeFeedAction::Update => "update",
        }
    }
}

impl fmt::Display for ChangeFeedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
