//! In-memory [`MetadataConnection`] for tests.
//!
//! Records are stored per `(type, name)`. Reads return the stored record or
//! `null`; upserts store what they receive, so a later read sees it. Every
//! call is recorded for verification.
//!
//! ```
//! use busbar_sf_source::mock::MockConnection;
//! use busbar_sf_source::MetadataConnection;
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let connection = MockConnection::new()
//!     .with_record("Profile", json!({ "fullName": "Admin", "custom": "false" }));
//!
//! let records = connection
//!     .read("Profile", &["Admin".to_string(), "Missing".to_string()])
//!     .await
//!     .unwrap();
//! assert_eq!(records[0]["custom"], "false");
//! assert!(records[1].is_null());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use busbar_sf_metadata::{MetadataError, UpsertResult};
use serde_json::Value;

use crate::connection::MetadataConnection;
use crate::error::{Error, ErrorKind, Result};

/// Mock connection for testing.
///
/// Thread-safe; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    inner: Arc<Mutex<MockConnectionInner>>,
}

#[derive(Debug, Default)]
struct MockConnectionInner {
    records: HashMap<(String, String), Value>,
    upsert_errors: HashMap<(String, String), Vec<String>>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which call should fail, by metadata type.
#[derive(Debug, Clone)]
pub enum FailOn {
    Read { type_name: String, message: String },
    Upsert { type_name: String, message: String },
}

/// Recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    Read { type_name: String, names: Vec<String> },
    Upsert { type_name: String, records: Vec<Value> },
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under its own `fullName`.
    pub fn with_record(self, type_name: &str, record: Value) -> Self {
        let name = record
            .get("fullName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.with_record_named(type_name, &name, record)
    }

    /// Store a record returned when `name` is read, whatever it contains.
    pub fn with_record_named(self, type_name: &str, name: &str, record: Value) -> Self {
        self.state()
            .records
            .insert((type_name.to_string(), name.to_string()), record);
        self
    }

    /// Make upserts of `full_name` fail with the given messages.
    pub fn with_upsert_errors(self, type_name: &str, full_name: &str, messages: &[&str]) -> Self {
        self.state().upsert_errors.insert(
            (type_name.to_string(), full_name.to_string()),
            messages.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    /// Fail every call matching `fail_on`.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// All recorded calls, in call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Stored record for `(type_name, name)`.
    pub fn record(&self, type_name: &str, name: &str) -> Option<Value> {
        self.state()
            .records
            .get(&(type_name.to_string(), name.to_string()))
            .cloned()
    }

    fn state(&self) -> MutexGuard<'_, MockConnectionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MetadataConnection for MockConnection {
    async fn read(&self, type_name: &str, names: &[String]) -> Result<Vec<Value>> {
        let mut state = self.state();
        state.operations.push(MockOperation::Read {
            type_name: type_name.to_string(),
            names: names.to_vec(),
        });
        if let Some(FailOn::Read { type_name: t, message }) = &state.fail_on {
            if t == type_name {
                return Err(Error::new(ErrorKind::Remote(message.clone())));
            }
        }

        Ok(names
            .iter()
            .map(|name| {
                state
                    .records
                    .get(&(type_name.to_string(), name.clone()))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect())
    }

    async fn upsert(&self, type_name: &str, records: &[Value]) -> Result<Vec<UpsertResult>> {
        let mut state = self.state();
        state.operations.push(MockOperation::Upsert {
            type_name: type_name.to_string(),
            records: records.to_vec(),
        });
        if let Some(FailOn::Upsert { type_name: t, message }) = &state.fail_on {
            if t == type_name {
                return Err(Error::new(ErrorKind::Remote(message.clone())));
            }
        }

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let full_name = record
                .get("fullName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let key = (type_name.to_string(), full_name.clone());

            let errors: Vec<MetadataError> = state
                .upsert_errors
                .get(&key)
                .map(|messages| {
                    messages
                        .iter()
                        .map(|message| MetadataError {
                            status_code: "FIELD_INTEGRITY_EXCEPTION".to_string(),
                            message: message.clone(),
                            fields: Vec::new(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            let success = errors.is_empty();
            let created = success && !state.records.contains_key(&key);
            if success {
                state.records.insert(key, record.clone());
            }
            results.push(UpsertResult {
                full_name,
                success,
                created,
                errors,
            });
        }
        Ok(results)
    }
}
