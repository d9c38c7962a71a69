//! CRUD Metadata API client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Error, ErrorKind, Result};
use crate::types::DEFAULT_API_VERSION;
use crate::xml;

mod crud;
mod xml_helpers;

/// SOAP Action header name.
static SOAP_ACTION_HEADER: HeaderName = HeaderName::from_static("soapaction");

/// Salesforce CRUD Metadata API client.
///
/// The access token is redacted in Debug output.
#[derive(Clone)]
pub struct MetadataClient {
    instance_url: String,
    access_token: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl MetadataClient {
    /// Create a new Metadata API client from instance URL and access token.
    pub fn from_parts(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client from environment variables.
    ///
    /// Reads `SF_INSTANCE_URL` and `SF_ACCESS_TOKEN` (falling back to the
    /// `SALESFORCE_` prefixed names) and the optional `SF_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        let instance_url = std::env::var("SF_INSTANCE_URL")
            .or_else(|_| std::env::var("SALESFORCE_INSTANCE_URL"))
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;

        let access_token = std::env::var("SF_ACCESS_TOKEN")
            .or_else(|_| std::env::var("SALESFORCE_ACCESS_TOKEN"))
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;

        let api_version = std::env::var("SF_API_VERSION")
            .or_else(|_| std::env::var("SALESFORCE_API_VERSION"))
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        Ok(Self::from_parts(instance_url, access_token).with_api_version(api_version))
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the Metadata API SOAP endpoint URL.
    pub(crate) fn metadata_url(&self) -> String {
        format!("{}/services/Soap/m/{}", self.instance_url, self.api_version)
    }

    /// Build common headers for SOAP requests.
    pub(crate) fn build_headers(&self, soap_action: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/xml;charset=UTF-8"),
        );
        headers.insert(SOAP_ACTION_HEADER.clone(), header_value(soap_action)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", self.access_token))?,
        );
        Ok(headers)
    }

    /// Wrap an operation body in a SOAP envelope carrying the session header.
    pub(crate) fn envelope(&self, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:met="http://soap.sforce.com/2006/04/metadata" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soapenv:Header>
    <met:SessionHeader>
      <met:sessionId>{session_id}</met:sessionId>
    </met:SessionHeader>
  </soapenv:Header>
  <soapenv:Body>
{body}
  </soapenv:Body>
</soapenv:Envelope>"#,
            session_id = xml::escape(&self.access_token),
        )
    }

    /// POST an envelope and return the response body, mapping SOAP faults.
    pub(crate) async fn send_envelope(&self, soap_action: &str, envelope: String) -> Result<String> {
        let response = self
            .http_client
            .post(self.metadata_url())
            .headers(self.build_headers(soap_action)?)
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if let Some(fault) = self.parse_soap_fault(&response_text) {
            return Err(Error::with_source(
                ErrorKind::SoapFault(fault.to_string()),
                fault,
            ));
        }
        if !status.is_success() {
            return Err(Error::new(ErrorKind::Http(format!(
                "{} returned {}",
                soap_action, status
            ))));
        }

        Ok(response_text)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        Error::with_source(
            ErrorKind::Other(format!("invalid header value: {}", e)),
            e,
        )
    })
}
