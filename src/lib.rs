//! # busbar-sf-crud
//!
//! Read and upsert Salesforce metadata through the CRUD Metadata API, and
//! reconcile the flat API records with the source-format file tree.
//!
//! ## Crates
//!
//! - **busbar-sf-metadata** - CRUD Metadata API client (`readMetadata`, `upsertMetadata`) and metadata XML codec
//! - **busbar-sf-source** - Chunk planning, batch fetching, parent synthesis, materialization and merge writing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_sf_crud::{CrudClient, DirectoryWriter, MergeWriter, MetadataClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CrudClient::new(MetadataClient::from_env()?);
//!
//!     let requested = vec!["Profile:Admin".parse()?, "RecordType:Account.Business".parse()?];
//!     let components = client.read(&requested).await?;
//!
//!     for file in DirectoryWriter::default().write(&components, "force-app/main/default".as_ref())? {
//!         println!("{} -> {}", file.full_name, file.file_path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "metadata")]
pub use busbar_sf_metadata as metadata;
#[cfg(feature = "source")]
pub use busbar_sf_source as source;

#[cfg(feature = "metadata")]
pub use busbar_sf_metadata::MetadataClient;
#[cfg(feature = "source")]
pub use busbar_sf_source::{
    ComponentIdentifier, ComponentSet, CrudClient, CrudConfig, DirectoryWriter, Manifest,
    MergeWriter, MetadataConnection, PackageDirectories, TypeRegistry,
};
