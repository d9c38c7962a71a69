use std::path::Path;

use busbar_sf_metadata::MetadataClient;

/// Client for the org named by `SF_INSTANCE_URL` and `SF_ACCESS_TOKEN`.
///
/// Live tests must not silently pass without an org, so a missing
/// variable panics with instructions.
pub fn live_client() -> MetadataClient {
    MetadataClient::from_env().unwrap_or_else(|e| {
        panic!(
            "\n\nLive tests need a Salesforce org: {e}\n\n\
             To fix:\n  \
             1. Authenticate: sf org login web -d\n  \
             2. Get a session: sf org display --verbose\n  \
             3. Export SF_INSTANCE_URL and SF_ACCESS_TOKEN\n\n"
        )
    })
}

/// Read a file written by a test.
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Write a fixture file, creating parent directories.
pub fn write(path: &Path, content: &str) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
