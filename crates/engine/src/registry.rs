//! Schema version registry
//!
//! Maps each schema version to the store that reads it. The registry is
//! assembled once at startup through [`SchemaRegistryBuilder`] and is
//! read-only afterwards, so it can be shared between any number of
//! concurrent requests without locking.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = SchemaRegistry::with_versions(
//!     &SchemaVersion::KNOWN,
//!     factory,
//!     DEFAULT_PARTITION,
//! )?;
//!
//! let store = registry.store_for(SchemaVersion::V35)?;
//! let page = store.list_range(&TimeRange::UNBOUNDED, 0, 100, &cancel).await?;
//! ```

use dicomfeed_core::{FeedError, FeedResult, SchemaVersion};
use dicomfeed_storage::ConnectionFactory;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::store::{ChangeFeedStore, VersionedChangeFeedStore};

/// Collects stores before the registry is frozen
#[derive(Default)]
pub struct SchemaRegistryBuilder {
    stores: BTreeMap<SchemaVersion, Arc<dyn ChangeFeedStore>>,
}

impl SchemaRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under its own version
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the version is already registered. Two
    /// strategies for one version is a deployment defect, not a preference.
    pub fn register(&mut self, store: Arc<dyn ChangeFeedStore>) -> FeedResult<&mut Self> {
        let version = store.version();
        if self.stores.contains_key(&version) {
            return Err(FeedError::configuration(format!(
                "schema version {version} registered twice"
            )));
        }
        self.stores.insert(version, store);
        Ok(self)
    }

    /// Freeze into a registry
    pub fn build(self) -> SchemaRegistry {
        let versions: Vec<String> = self.stores.keys().map(ToString::to_string).collect();
        info!(versions = ?versions, "change feed schema registry built");
        SchemaRegistry {
            stores: self.stores,
        }
    }
}

/// Read-only mapping from schema version to store
pub struct SchemaRegistry {
    stores: BTreeMap<SchemaVersion, Arc<dyn ChangeFeedStore>>,
}

impl SchemaRegistry {
    /// Start a registry
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Registry with the shipped store for each of `versions`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for a version without a shipped shape or a
    /// version listed twice.
    pub fn with_versions(
        versions: &[SchemaVersion],
        factory: Arc<dyn ConnectionFactory>,
        default_partition: &str,
    ) -> FeedResult<Self> {
        let mut builder = SchemaRegistryBuilder::new();
        for &version in versions {
            let store = VersionedChangeFeedStore::for_version(
                version,
                Arc::clone(&factory),
                default_partition,
            )?;
            builder.register(Arc::new(store))?;
        }
        Ok(builder.build())
    }

    /// Store for `version`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if nothing is registered for `version`. There
    /// is no fallback to an older store.
    pub fn store_for(&self, version: SchemaVersion) -> FeedResult<Arc<dyn ChangeFeedStore>> {
        self.stores.get(&version).cloned().ok_or_else(|| {
            FeedError::configuration(format!(
                "no change feed store registered for schema version {version}"
            ))
        })
    }

    /// Check if a version is registered
    pub fn contains(&self, version: SchemaVersion) -> bool {
        self.stores.contains_key(&version)
    }

    /// Registered versions, oldest first
    pub fn versions(&self) -> Vec<SchemaVersion> {
        self.stores.keys().copied().collect()
    }

    /// Newest registered version
    pub fn latest_version(&self) -> Option<SchemaVersion> {
        self.stores.keys().next_back().copied()
    }

    /// Get the number of registered versions
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("versions", &self.versions())
            .finish()
    }
}
