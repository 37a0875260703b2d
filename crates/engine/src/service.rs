//! Change feed query service
//!
//! The entry point callers use. Every call resolves the active schema
//! version, picks the registered store for it, and delegates. Nothing is
//! cached between calls, so a version switch takes effect on the next call.

use dicomfeed_core::{
    ChangeFeedEntry, FeedError, FeedResult, IndexedFileProperties, SchemaVersion, TimeRange,
};
use dicomfeed_storage::ConnectionFactory;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::provider::{FixedSchemaVersion, SchemaVersionProvider, StoredSchemaVersion};
use crate::registry::SchemaRegistry;
use crate::store::ChangeFeedStore;

/// Version-dispatching change feed reader
#[derive(Clone)]
pub struct ChangeFeedService {
    registry: Arc<SchemaRegistry>,
    provider: Arc<dyn SchemaVersionProvider>,
}

impl ChangeFeedService {
    /// Create a service over an assembled registry
    pub fn new(registry: Arc<SchemaRegistry>, provider: Arc<dyn SchemaVersionProvider>) -> Self {
        ChangeFeedService { registry, provider }
    }

    /// Assemble registry and provider from configuration
    ///
    /// A pinned `schema_version` gives a [`FixedSchemaVersion`]; otherwise
    /// the active version is read from the store on every call.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `config` fails validation.
    pub fn from_config(
        config: &FeedConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> FeedResult<Self> {
        config.validate()?;
        let registry = SchemaRegistry::with_versions(
            &config.schema_versions()?,
            Arc::clone(&factory),
            &config.default_partition,
        )?;
        let provider: Arc<dyn SchemaVersionProvider> = match config.pinned_version()? {
            Some(version) => {
                info!(%version, "change feed schema version pinned by configuration");
                Arc::new(FixedSchemaVersion::new(version))
            }
            None => Arc::new(StoredSchemaVersion::new(factory)),
        };
        Ok(Self::new(Arc::new(registry), provider))
    }

    /// Registered stores
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Version the next call would use
    pub async fn active_version(&self, cancel: &CancellationToken) -> FeedResult<SchemaVersion> {
        self.provider.current_version(cancel).await
    }

    async fn active_store(
        &self,
        cancel: &CancellationToken,
    ) -> FeedResult<Arc<dyn ChangeFeedStore>> {
        let version = self.provider.current_version(cancel).await?;
        self.registry.store_for(version).map_err(|e| {
            if let FeedError::Configuration(message) = &e {
                warn!(%version, %message, "change feed request rejected");
            }
            e
        })
    }

    /// Entries inside `range`, see [`ChangeFeedStore::list_range`]
    ///
    /// `limit == 0` returns before the active version is resolved.
    pub async fn list_range(
        &self,
        range: &TimeRange,
        offset: u64,
        limit: u32,
        cancel: &CancellationToken,
    ) -> FeedResult<Vec<ChangeFeedEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.active_store(cancel)
            .await?
            .list_range(range, offset, limit, cancel)
            .await
    }

    /// Most recent entry, see [`ChangeFeedStore::latest`]
    pub async fn latest(&self, cancel: &CancellationToken) -> FeedResult<Option<ChangeFeedEntry>> {
        self.active_store(cancel).await?.latest(cancel).await
    }

    /// Indexed file totals, see [`ChangeFeedStore::indexed_file_properties`]
    pub async fn indexed_file_properties(
        &self,
        cancel: &CancellationToken,
    ) -> FeedResult<IndexedFileProperties> {
        self.active_store(cancel)
            .await?
            .indexed_file_properties(cancel)
            .await
    }
}

impl std::fmt::Debug for ChangeFeedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeedService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
