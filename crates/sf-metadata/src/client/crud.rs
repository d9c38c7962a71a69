use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};
use crate::types::{crud_member_limit, ReadResult, UpsertResult};
use crate::xml;

impl super::MetadataClient {
    /// Read metadata components by type and full names.
    ///
    /// Synchronous CRUD operation. The result holds one record per requested
    /// name, in request order; names the org could not return are `null`.
    /// Does NOT support ApexClass or ApexTrigger.
    ///
    /// Available since API version 30.0.
    #[instrument(skip(self, full_names), fields(members = full_names.len()))]
    pub async fn read_metadata(
        &self,
        metadata_type: &str,
        full_names: &[&str],
    ) -> Result<ReadResult> {
        if full_names.is_empty() {
            return Ok(ReadResult {
                records: Vec::new(),
            });
        }
        check_member_limit(metadata_type, full_names.len())?;

        let full_name_elements: String = full_names
            .iter()
            .map(|name| format!("      <met:fullNames>{}</met:fullNames>", xml::escape(name)))
            .collect::<Vec<_>>()
            .join("\n");

        let envelope = self.envelope(&format!(
            "    <met:readMetadata>\n      <met:type>{}</met:type>\n{}\n    </met:readMetadata>",
            xml::escape(metadata_type),
            full_name_elements
        ));

        let response_text = self.send_envelope("readMetadata", envelope).await?;
        self.parse_read_result(&response_text)
    }

    /// Create or update metadata components (upsert operation).
    ///
    /// Synchronous CRUD operation; one result is returned per submitted
    /// object. Does NOT support ApexClass or ApexTrigger.
    ///
    /// Available since API version 31.0.
    #[instrument(skip(self, metadata_objects), fields(members = metadata_objects.len()))]
    pub async fn upsert_metadata(
        &self,
        metadata_type: &str,
        metadata_objects: &[serde_json::Value],
    ) -> Result<Vec<UpsertResult>> {
        if metadata_objects.is_empty() {
            return Ok(Vec::new());
        }
        check_member_limit(metadata_type, metadata_objects.len())?;

        let metadata_elements: Vec<String> = metadata_objects
            .iter()
            .map(|obj| self.build_metadata_element(metadata_type, obj))
            .collect();

        let envelope = self.envelope(&format!(
            "    <met:upsertMetadata>\n{}\n    </met:upsertMetadata>",
            metadata_elements.join("\n")
        ));

        let response_text = self.send_envelope("upsertMetadata", envelope).await?;
        self.parse_upsert_results(&response_text)
    }
}

fn check_member_limit(metadata_type: &str, actual: usize) -> Result<()> {
    let limit = crud_member_limit(metadata_type);
    if actual > limit {
        return Err(Error::new(ErrorKind::TooManyMembers {
            metadata_type: metadata_type.to_string(),
            limit,
            actual,
        }));
    }
    Ok(())
}
