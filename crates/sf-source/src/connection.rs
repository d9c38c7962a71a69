//! The remote connection seam.
//!
//! The engine talks to the org only through [`MetadataConnection`], so it can
//! run against [`MetadataClient`] in production and an in-memory fake in
//! tests.

use async_trait::async_trait;
use busbar_sf_metadata::{MetadataClient, UpsertResult};
use serde_json::Value;

use crate::error::Result;

/// Read and upsert primitives of the CRUD Metadata API.
#[async_trait]
pub trait MetadataConnection: Send + Sync {
    /// Read members of one type. Returns one record per name, in order;
    /// members that could not be read are `Value::Null`.
    async fn read(&self, type_name: &str, names: &[String]) -> Result<Vec<Value>>;

    /// Create or update records of one type. Returns one result per record.
    async fn upsert(&self, type_name: &str, records: &[Value]) -> Result<Vec<UpsertResult>>;
}

#[async_trait]
impl MetadataConnection for MetadataClient {
    async fn read(&self, type_name: &str, names: &[String]) -> Result<Vec<Value>> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let result = self.read_metadata(type_name, &names).await?;
        Ok(result.records)
    }

    async fn upsert(&self, type_name: &str, records: &[Value]) -> Result<Vec<UpsertResult>> {
        Ok(self.upsert_metadata(type_name, records).await?)
    }
}
