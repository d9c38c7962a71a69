//! Offline read -> write -> upsert flows over the in-memory connection.

use super::common::{read, write};
use busbar_sf_metadata::xml;
use busbar_sf_source::mock::MockConnection;
use busbar_sf_source::{
    parse_component_name, ComponentIdentifier, CrudClient, DirectoryWriter, ErrorKind, Manifest,
    MergeWriter, PackageDirectories, PROJECT_FILE,
};
use serde_json::json;

fn org() -> MockConnection {
    MockConnection::new()
        .with_record(
            "Profile",
            json!({
                "fullName": "Admin",
                "custom": "false",
                "userLicense": "Salesforce",
                "userPermissions": [
                    { "enabled": "true", "name": "ViewSetup" },
                    { "enabled": "true", "name": "ApiEnabled" }
                ]
            }),
        )
        .with_record(
            "CustomField",
            json!({ "fullName": "Account.Industry", "trackFeedHistory": "false", "type": "Picklist" }),
        )
        .with_record(
            "RecordType",
            json!({ "fullName": "DummyWithRT__c.DummyRecordType", "active": "true", "label": "Dummy" }),
        )
        .with_record(
            "WorkflowRule",
            json!({ "fullName": "Case.Escalate", "active": "true", "triggerType": "onCreateOnly" }),
        )
}

fn requested(entries: &[&str]) -> Vec<ComponentIdentifier> {
    entries
        .iter()
        .map(|e| parse_component_name(e).unwrap())
        .collect()
}

#[tokio::test]
async fn test_read_and_write_source_layout() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("objects/Account/fields/Rating.field-meta.xml"),
        "<CustomField/>\n",
    );
    write(
        &root.join("workflows/Case.workflow-meta.xml"),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Workflow xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n    <alerts>\n        <fullName>Notify</fullName>\n    </alerts>\n</Workflow>\n",
    );

    let client = CrudClient::new(org());
    let components = client
        .read(&requested(&[
            "Profile:Admin",
            "CustomField:Account.Industry",
            "RecordType:DummyWithRT__c.DummyRecordType",
            "WorkflowRule:Case.Escalate",
        ]))
        .await
        .unwrap();
    assert_eq!(components.len(), 4);

    let written = DirectoryWriter::default().write(&components, root).unwrap();
    let summary: Vec<(String, String)> = written
        .iter()
        .map(|w| (w.type_name.clone(), w.full_name.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Profile".to_string(), "Admin".to_string()),
            ("CustomField".to_string(), "Account.Industry".to_string()),
            ("RecordType".to_string(), "DummyWithRT__c.DummyRecordType".to_string()),
            ("WorkflowRule".to_string(), "Case.Escalate".to_string()),
        ]
    );

    let profile = read(&root.join("profiles/Admin.profile-meta.xml"));
    let mut lines = profile.lines();
    assert_eq!(lines.next(), Some(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert_eq!(
        lines.next(),
        Some(r#"<Profile xmlns="http://soap.sforce.com/2006/04/metadata">"#)
    );
    assert!(!profile.contains("<fullName>"));

    let record_type = read(&root.join(
        "objects/DummyWithRT__c/recordTypes/DummyRecordType.recordType-meta.xml",
    ));
    assert!(record_type.contains("<RecordType xmlns=\"http://soap.sforce.com/2006/04/metadata\">"));
    assert!(record_type.contains("    <fullName>DummyRecordType</fullName>\n"));

    assert!(root.join("objects/Account/fields/Industry.field-meta.xml").exists());
    assert_eq!(
        read(&root.join("objects/Account/fields/Rating.field-meta.xml")),
        "<CustomField/>\n"
    );
    assert!(!root.join("objects/Account/Account.object-meta.xml").exists());

    let workflow = xml::parse(&read(&root.join("workflows/Case.workflow-meta.xml"))).unwrap();
    let entries: Vec<&str> = workflow.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(entries, vec!["alerts", "rules"]);

    for file in &written {
        assert!(!file.file_path.to_string_lossy().ends_with("-meta.xml-meta.xml"));
    }
}

#[tokio::test]
async fn test_failed_read_returns_no_components() {
    let client = CrudClient::new(org());
    let err = client
        .read(&requested(&["Profile:Admin", "Profile:Missing"]))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::RetrievalMiss { .. }));
    assert_eq!(err.to_string(), "Failed to retrieve Profile:Missing");
}

#[tokio::test]
async fn test_written_files_upsert_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let source = org();
    let components = CrudClient::new(source.clone())
        .read(&requested(&["Profile:Admin", "CustomField:Account.Industry"]))
        .await
        .unwrap();
    let written = DirectoryWriter::default().write(&components, dir.path()).unwrap();

    let target = MockConnection::new();
    let paths: Vec<_> = written.iter().map(|w| w.file_path.clone()).collect();
    let upserted = CrudClient::new(target.clone()).upsert_sources(&paths).await.unwrap();

    let names: Vec<&str> = upserted.iter().map(|u| u.full_name.as_str()).collect();
    assert_eq!(names, vec!["Admin", "Account.Industry"]);
    assert!(upserted.iter().all(|u| u.created));

    assert_eq!(
        target.record("Profile", "Admin"),
        source.record("Profile", "Admin")
    );
    assert_eq!(
        target.record("CustomField", "Account.Industry"),
        source.record("CustomField", "Account.Industry")
    );
}

#[tokio::test]
async fn test_upsert_rejection_is_reported() {
    let connection = MockConnection::new().with_upsert_errors(
        "Profile",
        "Standard",
        &["Cannot change the user license"],
    );
    let err = CrudClient::new(connection)
        .upsert(vec![
            (ComponentIdentifier::new("Profile", "Admin"), json!({ "custom": "false" })),
            (ComponentIdentifier::new("Profile", "Standard"), json!({ "custom": "false" })),
            (ComponentIdentifier::new("Profile", "Sales"), json!({ "custom": "false" })),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Upserting failed:\nProfile:Standard: Cannot change the user license"
    );
}

#[tokio::test]
async fn test_named_components_resolve_in_package_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join(PROJECT_FILE),
        r#"{ "packageDirectories": [{ "path": "force-app", "default": true }, { "path": "shared" }] }"#,
    );
    let existing = dir
        .path()
        .join("shared/main/default/objects/Account/fields/Industry.field-meta.xml");
    write(&existing, "<CustomField/>\n");

    let packages = PackageDirectories::from_project(dir.path()).unwrap();
    let client = CrudClient::new(org());
    let identifiers: Vec<ComponentIdentifier> = requested(&["Profile:Admin", "CustomField:Account.Industry"])
        .into_iter()
        .map(|id| match packages.find(client.registry(), &id).unwrap() {
            Some(path) => id.with_source_path(path),
            None => id,
        })
        .collect();

    let components = client.read(&identifiers).await.unwrap();
    let output = dir.path().join("force-app/main/default");
    let written = DirectoryWriter::default().write(&components, &output).unwrap();

    assert_eq!(written[0].file_path, output.join("profiles/Admin.profile-meta.xml"));
    assert_eq!(written[1].file_path, existing);
    assert!(read(&existing).contains("<type>Picklist</type>"));

    let manifest = Manifest::parse(
        "<Package><types><members>*</members><name>Profile</name></types><types><members>Account.Industry</members><name>CustomField</name></types></Package>",
    )
    .unwrap();
    let target = MockConnection::new();
    let upsert_client = CrudClient::new(target.clone());
    let resolved = manifest
        .components(upsert_client.registry(), &packages)
        .unwrap()
        .into_iter()
        .map(|id| match id.source_path {
            Some(_) => id,
            None => packages.resolve(upsert_client.registry(), &id).unwrap(),
        })
        .collect::<Vec<_>>();
    let upserted = upsert_client.upsert_components(&resolved).await.unwrap();

    let names: Vec<&str> = upserted.iter().map(|u| u.full_name.as_str()).collect();
    assert_eq!(names, vec!["Admin", "Account.Industry"]);
    assert_eq!(
        target.record("CustomField", "Account.Industry"),
        org().record("CustomField", "Account.Industry")
    );
}

#[tokio::test]
async fn test_nested_child_upserts_from_parent_file() {
    let dir = tempfile::tempdir().unwrap();
    let components = CrudClient::new(org())
        .read(&requested(&["WorkflowRule:Case.Escalate"]))
        .await
        .unwrap();
    DirectoryWriter::default().write(&components, dir.path()).unwrap();

    let packages = PackageDirectories::new([dir.path()]);
    let target = MockConnection::new();
    let client = CrudClient::new(target.clone());
    let resolved = packages
        .resolve(client.registry(), &parse_component_name("WorkflowRule:Case.Escalate").unwrap())
        .unwrap();
    assert_eq!(
        resolved.source_path.as_deref(),
        Some(dir.path().join("workflows/Case.workflow-meta.xml").as_path())
    );

    client.upsert_components(&[resolved]).await.unwrap();
    assert_eq!(
        target.record("WorkflowRule", "Case.Escalate"),
        org().record("WorkflowRule", "Case.Escalate")
    );
}
