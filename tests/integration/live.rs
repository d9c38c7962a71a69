//! Live-org tests. Ignored unless run with `--ignored`.

use super::common::live_client;
use busbar_sf_source::{parse_component_name, CrudClient, DirectoryWriter, MergeWriter};

#[tokio::test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
async fn test_live_read_admin_profile() {
    let client = CrudClient::new(live_client());
    let components = client
        .read(&[parse_component_name("Profile:Admin").unwrap()])
        .await
        .expect("reading Profile:Admin should succeed");

    assert_eq!(components.len(), 1);
    let xml = components.iter().next().unwrap().to_xml();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Profile xmlns="));
}

#[tokio::test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
async fn test_live_read_standard_field_into_source() {
    let client = CrudClient::new(live_client());
    let components = client
        .read(&[parse_component_name("CustomField:Account.Industry").unwrap()])
        .await
        .expect("reading CustomField:Account.Industry should succeed");

    let dir = tempfile::tempdir().unwrap();
    let written = DirectoryWriter::default()
        .write(&components, dir.path())
        .expect("writing should succeed");
    assert_eq!(
        written[0].file_path,
        dir.path().join("objects/Account/fields/Industry.field-meta.xml")
    );
}

#[tokio::test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
async fn test_live_missing_component_fails() {
    let client = CrudClient::new(live_client());
    let err = client
        .read(&[parse_component_name("Profile:DoesNotExist_BusbarCrud").unwrap()])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to retrieve Profile:DoesNotExist_BusbarCrud"
    );
}
