//! Common types for the CRUD Metadata API.

use serde::{Deserialize, Serialize};

/// Default Metadata API version.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// Members allowed per readMetadata/upsertMetadata call for most types.
pub const MAX_CRUD_MEMBERS: usize = 10;

/// Members allowed per call for the types listed in [`HIGH_LIMIT_TYPES`].
pub const MAX_CRUD_MEMBERS_HIGH_LIMIT: usize = 200;

/// Types for which the CRUD calls accept [`MAX_CRUD_MEMBERS_HIGH_LIMIT`] members.
///
/// > Limit: 10. (For CustomMetadata and CustomApplication only, the limit is 200.)
///
/// See <https://developer.salesforce.com/docs/atlas.en-us.api_meta.meta/api_meta/meta_readMetadata.htm>
pub const HIGH_LIMIT_TYPES: [&str; 2] = ["CustomApplication", "CustomMetadata"];

/// Maximum number of members a single CRUD call may carry for `metadata_type`.
pub fn crud_member_limit(metadata_type: &str) -> usize {
    if HIGH_LIMIT_TYPES.contains(&metadata_type) {
        MAX_CRUD_MEMBERS_HIGH_LIMIT
    } else {
        MAX_CRUD_MEMBERS
    }
}

/// SOAP Fault from the Metadata API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoapFault {
    pub fault_code: String,
    pub fault_string: String,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SOAP Fault: {} - {}", self.fault_code, self.fault_string)
    }
}

impl std::error::Error for SoapFault {}

/// Error information returned from Metadata API CRUD operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataError {
    /// Status code identifying the error type.
    pub status_code: String,
    /// Descriptive error message.
    pub message: String,
    /// Field names associated with the error.
    pub fields: Vec<String>,
}

/// Result of an upsert operation, one per submitted member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertResult {
    /// Full name of the metadata component.
    pub full_name: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Whether the component was created (true) or updated (false).
    pub created: bool,
    /// Errors that occurred during the operation.
    pub errors: Vec<MetadataError>,
}

/// Result of a read operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResult {
    /// One entry per requested full name, in request order.
    ///
    /// Members the org could not return are `Value::Null`.
    pub records: Vec<serde_json::Value>,
}
