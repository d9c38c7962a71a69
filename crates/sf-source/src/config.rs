//! Engine configuration.

use busbar_sf_metadata::MAX_CRUD_MEMBERS;

/// Configuration for [`CrudClient`](crate::CrudClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudConfig {
    /// Batch size override. Capped at 10 members per call for every type.
    pub chunk_size: Option<usize>,
    /// Number of metadata types read concurrently.
    ///
    /// Batches of one type are always issued in order.
    pub type_concurrency: usize,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            type_concurrency: 1,
        }
    }
}

impl CrudConfig {
    /// Create a new config builder.
    pub fn builder() -> CrudConfigBuilder {
        CrudConfigBuilder::default()
    }
}

/// Builder for CrudConfig.
#[derive(Debug, Default)]
pub struct CrudConfigBuilder {
    config: CrudConfig,
}

impl CrudConfigBuilder {
    /// Set the batch size override, clamped to `1..=10`.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = Some(size.clamp(1, MAX_CRUD_MEMBERS));
        self
    }

    /// Use the per-type CRUD limits.
    pub fn without_chunk_size(mut self) -> Self {
        self.config.chunk_size = None;
        self
    }

    /// Set how many types may be in flight at once (at least 1).
    pub fn with_type_concurrency(mut self, concurrency: usize) -> Self {
        self.config.type_concurrency = concurrency.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CrudConfig {
        self.config
    }
}
