//! # busbar-sf-source
//!
//! Reconciles the flat records of the CRUD Metadata API with the
//! hierarchical source-format layout.
//!
//! ## Features
//!
//! - **Chunk planning** - members grouped per type, batched within the per-call limits
//! - **Batch fetching** - positional correlation of responses, fail-fast on misses
//! - **Parent synthesis** - parent components derived from `<parent>.<child>` names
//! - **Materialization** - one metadata document per component, children nested
//! - **Merge writing** - source-format files, merged with what is already on disk
//! - **Upsert** - records or source files pushed back type by type
//! - **Project lookup** - `Type:Name` and `package.xml` entries found in the package directories
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_metadata::MetadataClient;
//! use busbar_sf_source::{parse_component_name, CrudClient, DirectoryWriter, MergeWriter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_source::Error> {
//!     let client = CrudClient::new(MetadataClient::from_env()?);
//!
//!     let requested = vec![
//!         parse_component_name("Profile:Admin")?,
//!         parse_component_name("CustomField:Account.Industry")?,
//!     ];
//!     let components = client.read(&requested).await?;
//!
//!     let written = DirectoryWriter::default()
//!         .write(&components, "force-app/main/default".as_ref())?;
//!     for file in written {
//!         println!("{} {} {}", file.full_name, file.type_name, file.file_path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod chunk;
mod component_set;
mod config;
mod connection;
mod crud;
mod error;
mod fetch;
mod identifier;
mod manifest;
pub mod materialize;
pub mod mock;
pub mod parent;
mod project;
mod registry;
mod source;
mod writer;

pub use chunk::{plan, TypeBatches};
pub use component_set::{ComponentKey, ComponentNode, ComponentSet, NestedChild};
pub use config::{CrudConfig, CrudConfigBuilder};
pub use connection::MetadataConnection;
pub use crud::{CrudClient, UpsertedComponent};
pub use error::{Error, ErrorKind, Result};
pub use fetch::BatchFetcher;
pub use identifier::{parse_component_name, ComponentIdentifier, ParentRef};
pub use manifest::{Manifest, ManifestType, WILDCARD};
pub use materialize::{Materializer, NestingPolicy};
pub use project::{PackageDirectories, PROJECT_FILE};
pub use registry::{ChildLayout, TypeDescriptor, TypeRegistry};
pub use source::{load_source_record, relative_source_path, resolve_source_path};
pub use writer::{DirectoryWriter, MergeWriter, WrittenFile};
