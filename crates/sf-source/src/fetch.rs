//! Batch fetcher: one remote call per batch, with response correlation.

use busbar_sf_metadata::UpsertResult;
use serde_json::Value;
use tracing::{error, info};

use crate::connection::MetadataConnection;
use crate::error::{Error, ErrorKind, Result};

/// Issues read and upsert calls for single batches.
pub struct BatchFetcher<'a, C> {
    connection: &'a C,
}

impl<'a, C: MetadataConnection> BatchFetcher<'a, C> {
    pub fn new(connection: &'a C) -> Self {
        Self { connection }
    }

    /// Read one batch.
    ///
    /// Returns exactly one record per requested name, in request order. A
    /// position that is missing or has no `fullName` fails the whole batch
    /// with a retrieval miss naming that member.
    pub async fn read(&self, type_name: &str, names: &[String]) -> Result<Vec<Value>> {
        info!("reading {}", qualified_members(type_name, names.iter().map(String::as_str)));

        let mut records = self.connection.read(type_name, names).await?;
        for (position, name) in names.iter().enumerate() {
            let retrieved = records
                .get(position)
                .and_then(|record| record.get("fullName"))
                .and_then(Value::as_str)
                .is_some_and(|full_name| !full_name.is_empty());
            if !retrieved {
                return Err(Error::retrieval_miss(type_name, name));
            }
        }
        records.truncate(names.len());
        Ok(records)
    }

    /// Upsert one batch.
    ///
    /// Any member error fails the whole batch with one aggregate error that
    /// lists every message. A submitted member without a result counts as
    /// rejected.
    pub async fn upsert(&self, type_name: &str, records: &[Value]) -> Result<Vec<UpsertResult>> {
        let names: Vec<&str> = records.iter().map(full_name_of).collect();
        info!("upserting {}", qualified_members(type_name, names.iter().copied()));

        let results = self.connection.upsert(type_name, records).await?;

        let mut messages = Vec::new();
        for result in &results {
            for err in &result.errors {
                error!(
                    "{}:{}: {} ({})",
                    type_name, result.full_name, err.message, err.status_code
                );
                messages.push(format!("{}:{}: {}", type_name, result.full_name, err.message));
            }
            if !result.success && result.errors.is_empty() {
                messages.push(format!(
                    "{}:{}: upsert was not successful",
                    type_name, result.full_name
                ));
            }
        }
        for name in &names {
            if !results.iter().any(|r| r.full_name == *name) {
                error!("{}:{}: no upsert result returned", type_name, name);
                messages.push(format!("{}:{}: no upsert result returned", type_name, name));
            }
        }

        if messages.is_empty() {
            Ok(results)
        } else {
            Err(Error::new(ErrorKind::UpsertRejected { messages }))
        }
    }
}

fn full_name_of(record: &Value) -> &str {
    record
        .get("fullName")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn qualified_members<'n>(type_name: &str, names: impl Iterator<Item = &'n str>) -> String {
    names
        .map(|name| format!("{}:{}", type_name, name))
        .collect::<Vec<_>>()
        .join(", ")
}
