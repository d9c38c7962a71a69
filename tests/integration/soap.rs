//! The engine over the real SOAP client, against a mock endpoint.

use busbar_sf_metadata::MetadataClient;
use busbar_sf_source::{
    ComponentIdentifier, CrudClient, DirectoryWriter, ErrorKind, MergeWriter,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::read;

fn read_response(records: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="http://soap.sforce.com/2006/04/metadata" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soapenv:Body>
    <readMetadataResponse>
      <result>
{records}
      </result>
    </readMetadataResponse>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

fn profile_record(name: &str) -> String {
    format!(
        r#"        <records xsi:type="Profile">
          <fullName>{name}</fullName>
          <custom>false</custom>
          <userLicense>Salesforce</userLicense>
          <userPermissions>
            <enabled>true</enabled>
            <name>ViewSetup</name>
          </userPermissions>
        </records>"#
    )
}

#[tokio::test]
async fn test_read_profile_over_soap_and_write() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/m/62.0"))
        .and(header("soapaction", "readMetadata"))
        .and(body_string_contains("<met:fullNames>Admin</met:fullNames>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_response(&profile_record("Admin"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CrudClient::new(MetadataClient::from_parts(mock_server.uri(), "token"));
    let components = client
        .read(&[ComponentIdentifier::new("Profile", "Admin")])
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = DirectoryWriter::default().write(&components, dir.path()).unwrap();
    assert_eq!(written.len(), 1);

    assert_eq!(
        read(&written[0].file_path),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Profile xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n    \
         <custom>false</custom>\n    \
         <userLicense>Salesforce</userLicense>\n    \
         <userPermissions>\n        \
         <enabled>true</enabled>\n        \
         <name>ViewSetup</name>\n    \
         </userPermissions>\n\
         </Profile>\n"
    );
}

#[tokio::test]
async fn test_read_splits_into_batches_of_ten() {
    let mock_server = MockServer::start().await;
    let records: Vec<String> = (0..10).map(|i| profile_record(&format!("P{}", i))).collect();
    Mock::given(method("POST"))
        .and(header("soapaction", "readMetadata"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_response(&records.join("\n"))))
        .expect(2)
        .mount(&mock_server)
        .await;

    let requested: Vec<ComponentIdentifier> = (0..12)
        .map(|i| ComponentIdentifier::new("Profile", format!("P{}", i)))
        .collect();
    let client = CrudClient::new(MetadataClient::from_parts(mock_server.uri(), "token"));
    let components = client.read(&requested).await.unwrap();

    assert_eq!(components.len(), 12);
}

#[tokio::test]
async fn test_nil_record_is_a_retrieval_miss() {
    let mock_server = MockServer::start().await;
    let records = format!(
        "{}\n        <records xsi:nil=\"true\"/>",
        profile_record("Admin")
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_response(&records)))
        .mount(&mock_server)
        .await;

    let client = CrudClient::new(MetadataClient::from_parts(mock_server.uri(), "token"));
    let err = client
        .read(&[
            ComponentIdentifier::new("Profile", "Admin"),
            ComponentIdentifier::new("Profile", "Ghost"),
        ])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to retrieve Profile:Ghost");
}

#[tokio::test]
async fn test_soap_fault_surfaces_as_remote_error() {
    let mock_server = MockServer::start().await;
    let fault = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault><faultcode>sf:INVALID_TYPE</faultcode><faultstring>INVALID_TYPE: Unknown type</faultstring></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(fault))
        .mount(&mock_server)
        .await;

    let client = CrudClient::new(MetadataClient::from_parts(mock_server.uri(), "token"));
    let err = client
        .read(&[ComponentIdentifier::new("Layout", "Account-Layout")])
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Remote(ref msg) if msg.contains("INVALID_TYPE")));
}

#[tokio::test]
async fn test_upsert_errors_over_soap() {
    let mock_server = MockServer::start().await;
    let response = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="http://soap.sforce.com/2006/04/metadata"><soapenv:Body><upsertMetadataResponse>
<result><created>false</created><fullName>Admin</fullName><success>true</success></result>
<result><created>false</created><errors><message>Cannot change the user license</message><statusCode>FIELD_INTEGRITY_EXCEPTION</statusCode></errors><fullName>Standard</fullName><success>false</success></result>
<result><created>true</created><fullName>Sales</fullName><success>true</success></result>
</upsertMetadataResponse></soapenv:Body></soapenv:Envelope>"#;
    Mock::given(method("POST"))
        .and(header("soapaction", "upsertMetadata"))
        .and(body_string_contains("<met:fullName>Standard</met:fullName>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CrudClient::new(MetadataClient::from_parts(mock_server.uri(), "token"));
    let err = client
        .upsert(
            ["Admin", "Standard", "Sales"]
                .iter()
                .map(|name| (ComponentIdentifier::new("Profile", *name), json!({ "custom": false })))
                .collect(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Upserting failed:\nProfile:Standard: Cannot change the user license"
    );
}
