//! Change feed configuration via `changefeed.toml`
//!
//! All fields are optional. An empty file registers every shipped schema
//! version and reads the active version from the store.

use dicomfeed_core::{FeedError, FeedResult, SchemaVersion};
use dicomfeed_storage::DEFAULT_PARTITION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed next to the service's other settings.
pub const CONFIG_FILE_NAME: &str = "changefeed.toml";

/// Change feed configuration loaded from `changefeed.toml`.
///
/// # Example
///
/// ```toml
/// # Pin the active schema version instead of reading it from the store.
/// # schema_version = 35
///
/// # Schema versions to register read strategies for (default: all).
/// versions = [4, 6, 35]
///
/// # Partition reported for rows written before partitions existed.
/// default_partition = "Microsoft.Default"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Pinned active schema version. `None` reads it from the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    /// Schema versions to register.
    #[serde(default = "default_versions")]
    pub versions: Vec<u32>,
    /// Partition name for pre-partition rows.
    #[serde(default = "default_partition")]
    pub default_partition: String,
}

fn default_versions() -> Vec<u32> {
    SchemaVersion::KNOWN.iter().map(SchemaVersion::as_u32).collect()
}

fn default_partition() -> String {
    DEFAULT_PARTITION.to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            schema_version: None,
            versions: default_versions(),
            default_partition: default_partition(),
        }
    }
}

impl FeedConfig {
    /// Versions to register, validated.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the list is empty, repeats a version, or
    /// names a version this build has no strategy for.
    pub fn schema_versions(&self) -> FeedResult<Vec<SchemaVersion>> {
        if self.versions.is_empty() {
            return Err(FeedError::configuration(
                "'versions' in changefeed.toml must list at least one schema version",
            ));
        }
        let mut versions = Vec::with_capacity(self.versions.len());
        for &raw in &self.versions {
            let version = SchemaVersion::new(raw);
            if !version.is_known() {
                return Err(FeedError::configuration(format!(
                    "unknown schema version {raw} in changefeed.toml, expected one of {:?}",
                    default_versions()
                )));
            }
            if versions.contains(&version) {
                return Err(FeedError::configuration(format!(
                    "schema version {raw} listed twice in changefeed.toml"
                )));
            }
            versions.push(version);
        }
        Ok(versions)
    }

    /// Pinned version, if any.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the pinned version is not in `versions`:
    /// every read would fail, so it is rejected at startup instead.
    pub fn pinned_version(&self) -> FeedResult<Option<SchemaVersion>> {
        let Some(raw) = self.schema_version else {
            return Ok(None);
        };
        if !self.versions.contains(&raw) {
            return Err(FeedError::configuration(format!(
                "pinned schema_version {raw} is not in 'versions' {:?}",
                self.versions
            )));
        }
        Ok(Some(SchemaVersion::new(raw)))
    }

    /// Check every field.
    pub fn validate(&self) -> FeedResult<()> {
        self.schema_versions()?;
        self.pinned_version()?;
        if self.default_partition.trim().is_empty() {
            return Err(FeedError::configuration(
                "'default_partition' in changefeed.toml must not be empty",
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Change feed configuration
#
# Active schema version. When unset, the version recorded by the last
# applied migration is read from the store on every request.
# schema_version = 35

# Schema versions to register read strategies for (default: all shipped).
versions = [4, 6, 35]

# Partition reported for rows written before partitions existed.
default_partition = "Microsoft.Default"
"#
    }

    /// Load `path`, rejecting values the service cannot run with
    pub fn from_file(path: &Path) -> FeedResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| file_error("read", path, &e))?;
        let config: FeedConfig =
            toml::from_str(&content).map_err(|e| file_error("parse", path, &e))?;
        config.validate()?;
        Ok(config)
    }

    /// Create `path` with [`default_toml`](Self::default_toml) unless it exists
    ///
    /// Returns `true` if the file was created. An existing file is left
    /// untouched, valid or not.
    pub fn write_default_if_missing(path: &Path) -> FeedResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| file_error("write", path, &e))?;
        Ok(true)
    }
}

fn file_error(action: &str, path: &Path, err: &dyn std::fmt::Display) -> FeedError {
    FeedError::configuration(format!("cannot {action} {}: {err}", path.display()))
}
