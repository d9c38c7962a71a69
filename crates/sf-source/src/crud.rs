//! Read and upsert orchestration.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::chunk::{batch_size, chunk, group_by, plan};
use crate::component_set::{ComponentNode, ComponentSet};
use crate::config::CrudConfig;
use crate::connection::MetadataConnection;
use crate::error::{Error, ErrorKind, Result};
use crate::fetch::BatchFetcher;
use crate::identifier::ComponentIdentifier;
use crate::materialize::{with_full_name, Materializer};
use crate::parent::synthesize;
use crate::registry::TypeRegistry;
use crate::source::{load_source_record, resolve_source_path};

/// Outcome of upserting one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertedComponent {
    pub type_name: String,
    pub full_name: String,
    /// `true` when the component did not exist before.
    pub created: bool,
}

/// Reads components into a [`ComponentSet`] and upserts records, batching
/// calls per type within the CRUD member limits.
#[derive(Debug, Clone)]
pub struct CrudClient<C> {
    connection: C,
    registry: TypeRegistry,
    config: CrudConfig,
}

impl<C: MetadataConnection> CrudClient<C> {
    /// Create a client with the standard registry and default config.
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            registry: TypeRegistry::standard(),
            config: CrudConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: CrudConfig) -> Self {
        self.config = config;
        self
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// Read components from the org.
    ///
    /// Types are read in first-seen order, each type's batches strictly in
    /// sequence. Any failure aborts the whole read; no partial set is
    /// returned. With `type_concurrency > 1`, calls already issued for other
    /// types run to completion, but no further batch is started.
    #[instrument(skip_all, fields(components = identifiers.len()))]
    pub async fn read(&self, identifiers: &[ComponentIdentifier]) -> Result<ComponentSet> {
        for identifier in identifiers {
            self.registry.get_type_by_name(&identifier.type_name)?;
        }

        let groups = group_by(identifiers.iter().cloned(), |id| id.type_name.clone());
        let planned = plan(identifiers, self.config.chunk_size);
        let aborted = AtomicBool::new(false);

        let per_type: Vec<Result<Vec<ComponentNode>>> = stream::iter(groups.into_iter().zip(planned).map(
            |((type_name, ids), planned)| {
                let aborted = &aborted;
                async move {
                    let result = self.read_type(type_name, ids, planned.batches, aborted).await;
                    if result.is_err() {
                        aborted.store(true, Ordering::SeqCst);
                    }
                    result
                }
            },
        ))
        .buffered(self.config.type_concurrency.max(1))
        .collect()
        .await;

        let per_type = per_type.into_iter().collect::<Result<Vec<_>>>()?;
        let components: ComponentSet = per_type.into_iter().flatten().collect();
        info!(components = components.len(), "read complete");
        Ok(components)
    }

    async fn read_type(
        &self,
        type_name: String,
        identifiers: Vec<ComponentIdentifier>,
        batches: Vec<Vec<String>>,
        aborted: &AtomicBool,
    ) -> Result<Vec<ComponentNode>> {
        let identifiers = synthesize(&self.registry, &type_name, identifiers);
        let fetcher = BatchFetcher::new(&self.connection);
        let materializer = Materializer::new(&self.registry);

        let mut remaining = identifiers.into_iter();
        let mut nodes = Vec::new();
        for names in batches {
            if aborted.load(Ordering::SeqCst) {
                debug!(type_name = %type_name, "read aborted, skipping remaining batches");
                return Ok(Vec::new());
            }
            let records = fetcher.read(&type_name, &names).await?;
            let batch: Vec<ComponentIdentifier> = remaining.by_ref().take(names.len()).collect();
            let materialized = batch
                .iter()
                .zip(records)
                .map(|(identifier, record)| materializer.materialize(identifier, record))
                .collect::<Result<Vec<_>>>()?;
            nodes.extend(materialized);
        }
        Ok(nodes)
    }

    /// Upsert records, one type at a time.
    ///
    /// Each record's `fullName` is set to its identifier's qualified name.
    /// Every type and record is checked before the first call, and a batch
    /// with any member error fails the whole upsert.
    #[instrument(skip_all, fields(components = components.len()))]
    pub async fn upsert(
        &self,
        components: Vec<(ComponentIdentifier, Value)>,
    ) -> Result<Vec<UpsertedComponent>> {
        let prepared = group_by(components, |(id, _)| id.type_name.clone())
            .into_iter()
            .map(|(type_name, members)| {
                self.registry.get_type_by_name(&type_name)?;
                let records = members
                    .into_iter()
                    .map(|(id, record)| match record {
                        Value::Object(fields) => {
                            Ok(Value::Object(with_full_name(&id.qualified_name, fields)))
                        }
                        _ => Err(Error::new(ErrorKind::InvalidComponent(format!(
                            "{}: expected a record object",
                            id
                        )))),
                    })
                    .collect::<Result<Vec<Value>>>()?;
                Ok((type_name, records))
            })
            .collect::<Result<Vec<(String, Vec<Value>)>>>()?;

        let fetcher = BatchFetcher::new(&self.connection);
        let mut upserted = Vec::new();
        for (type_name, records) in prepared {
            let size = batch_size(&type_name, self.config.chunk_size);
            for batch in chunk(&records, size) {
                let results = fetcher.upsert(&type_name, &batch).await?;
                upserted.extend(results.into_iter().map(|result| UpsertedComponent {
                    type_name: type_name.clone(),
                    full_name: result.full_name,
                    created: result.created,
                }));
            }
        }
        Ok(upserted)
    }

    /// Upsert the components stored in source-format files.
    #[instrument(skip_all, fields(files = paths.len()))]
    pub async fn upsert_sources<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<Vec<UpsertedComponent>> {
        let identifiers = paths
            .iter()
            .map(|path| resolve_source_path(&self.registry, path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.upsert_components(&identifiers).await
    }

    /// Upsert components from the source files their identifiers point at.
    ///
    /// Every identifier needs a `source_path`, see
    /// [`PackageDirectories::resolve`](crate::PackageDirectories::resolve).
    #[instrument(skip_all, fields(components = identifiers.len()))]
    pub async fn upsert_components(
        &self,
        identifiers: &[ComponentIdentifier],
    ) -> Result<Vec<UpsertedComponent>> {
        let components = identifiers
            .iter()
            .map(|identifier| {
                let record = load_source_record(&self.registry, identifier)?;
                Ok((identifier.clone(), record))
            })
            .collect::<Result<Vec<_>>>()?;
        self.upsert(components).await
    }
}
