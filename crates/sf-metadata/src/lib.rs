//! # busbar-sf-metadata
//!
//! Salesforce CRUD Metadata API client and the metadata XML codec.
//!
//! ## Features
//!
//! - **Read Metadata** - `readMetadata` by type and full names, positional results
//! - **Upsert Metadata** - `upsertMetadata` with per-member errors
//! - **Member limits** - 10 per call, 200 for CustomApplication and CustomMetadata
//! - **XML codec** - element tree, pretty writer and parser for metadata documents
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_metadata::MetadataClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_metadata::Error> {
//!     let client = MetadataClient::from_env()?;
//!
//!     let result = client.read_metadata("Profile", &["Admin"]).await?;
//!     for record in &result.records {
//!         println!("{}", record["fullName"]);
//!     }
//!
//!     let results = client
//!         .upsert_metadata("Profile", &[serde_json::json!({ "fullName": "Admin", "custom": false })])
//!         .await?;
//!     println!("created: {}", results[0].created);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;
pub mod xml;

pub use client::MetadataClient;
pub use error::{Error, ErrorKind, Result};
pub use types::{
    crud_member_limit, MetadataError, ReadResult, SoapFault, UpsertResult, DEFAULT_API_VERSION,
    HIGH_LIMIT_TYPES, MAX_CRUD_MEMBERS, MAX_CRUD_MEMBERS_HIGH_LIMIT,
};
