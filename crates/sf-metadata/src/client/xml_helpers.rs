use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::types::{MetadataError, ReadResult, SoapFault, UpsertResult};
use crate::xml::{self, Element};

impl super::MetadataClient {
    /// Parse a SOAP fault from the response.
    pub(crate) fn parse_soap_fault(&self, xml: &str) -> Option<SoapFault> {
        if !xml.contains("faultcode") {
            return None;
        }

        let fault_code = self.extract_element(xml, "faultcode")?;
        let fault_string = self
            .extract_element(xml, "faultstring")
            .unwrap_or_else(|| "Unknown error".to_string());

        Some(SoapFault {
            fault_code,
            fault_string,
        })
    }

    /// Extract a simple element value from XML.
    pub(crate) fn extract_element(&self, xml: &str, tag: &str) -> Option<String> {
        const PREFIXES: [&str; 4] = ["", "sf:", "soapenv:", "met:"];

        for prefix in PREFIXES {
            let start = format!("<{}{}>", prefix, tag);
            if let Some(start_idx) = xml.find(&start) {
                let search_from = &xml[start_idx + start.len()..];
                let end_idx = PREFIXES
                    .iter()
                    .filter_map(|p| search_from.find(&format!("</{}{}>", p, tag)))
                    .min()?;
                return Some(search_from[..end_idx].to_string());
            }
        }
        None
    }

    /// Serialize one metadata object as a `<met:metadata>` element.
    pub(crate) fn build_metadata_element(&self, metadata_type: &str, object: &Value) -> String {
        let mut fields = String::new();
        if let Value::Object(map) = object {
            for (name, value) in map {
                fields.push_str(&Self::build_xml_field(name, value, 8));
            }
        }
        format!(
            "      <met:metadata xsi:type=\"met:{}\">\n{}      </met:metadata>",
            xml::escape(metadata_type),
            fields
        )
    }

    /// Serialize one field with the `met:` prefix at the given indentation.
    pub(crate) fn build_xml_field(name: &str, value: &Value, indent: usize) -> String {
        let pad = " ".repeat(indent);
        match value {
            Value::Null => format!("{}<met:{} xsi:nil=\"true\"/>\n", pad, name),
            Value::Array(items) => items
                .iter()
                .map(|item| Self::build_xml_field(name, item, indent))
                .collect(),
            Value::Object(map) => {
                let mut out = format!("{}<met:{}>\n", pad, name);
                for (key, nested) in map {
                    out.push_str(&Self::build_xml_field(key, nested, indent + 2));
                }
                out.push_str(&format!("{}</met:{}>\n", pad, name));
                out
            }
            scalar => format!(
                "{}<met:{}>{}</met:{}>\n",
                pad,
                name,
                xml::escape(&xml::scalar_text(scalar).unwrap_or_default()),
                name
            ),
        }
    }

    /// Parse a readMetadata response into positional records.
    pub(crate) fn parse_read_result(&self, response: &str) -> Result<ReadResult> {
        let root = xml::parse(response)?;
        let result = root.find("result").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "readMetadata response has no result element".to_string(),
            ))
        })?;

        let records = result
            .children_named("records")
            .map(|record| {
                if record.is_nil() || record.children().is_empty() {
                    Value::Null
                } else {
                    record.to_value()
                }
            })
            .collect();

        Ok(ReadResult { records })
    }

    /// Parse an upsertMetadata response, one result per submitted member.
    pub(crate) fn parse_upsert_results(&self, response: &str) -> Result<Vec<UpsertResult>> {
        let root = xml::parse(response)?;
        let body = root.find("upsertMetadataResponse").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "response has no upsertMetadataResponse element".to_string(),
            ))
        })?;

        Ok(body.children_named("result").map(parse_upsert_result).collect())
    }
}

fn parse_upsert_result(result: &Element) -> UpsertResult {
    UpsertResult {
        full_name: result.child_text("fullName").unwrap_or_default().to_string(),
        success: result.child_text("success") == Some("true"),
        created: result.child_text("created") == Some("true"),
        errors: result
            .children_named("errors")
            .map(|error| MetadataError {
                status_code: error.child_text("statusCode").unwrap_or_default().to_string(),
                message: error.child_text("message").unwrap_or_default().to_string(),
                fields: error
                    .children_named("fields")
                    .filter_map(Element::text)
                    .map(str::to_string)
                    .collect(),
            })
            .collect(),
    }
}
