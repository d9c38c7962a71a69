//! Error types for sf-source.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn structural(type_name: &str, qualified_name: &str) -> Self {
        Self::new(ErrorKind::Structural {
            type_name: type_name.to_string(),
            qualified_name: qualified_name.to_string(),
        })
    }

    pub(crate) fn retrieval_miss(type_name: &str, qualified_name: &str) -> Self {
        Self::new(ErrorKind::RetrievalMiss {
            type_name: type_name.to_string(),
            qualified_name: qualified_name.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Invalid child component name {type_name}:{qualified_name}: expected <parent>.<child>")]
    Structural {
        type_name: String,
        qualified_name: String,
    },
    #[error("Failed to retrieve {type_name}:{qualified_name}")]
    RetrievalMiss {
        type_name: String,
        qualified_name: String,
    },
    #[error("Upserting failed:\n{}", messages.join("\n"))]
    UpsertRejected { messages: Vec<String> },
    #[error("Unknown metadata type: {0}")]
    UnknownType(String),
    #[error("Invalid component: {0}")]
    InvalidComponent(String),
    #[error("Cannot resolve source path: {0}")]
    UnresolvedSourcePath(String),
    #[error("Remote error: {0}")]
    Remote(String),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<busbar_sf_metadata::Error> for Error {
    fn from(err: busbar_sf_metadata::Error) -> Self {
        let kind = match &err.kind {
            busbar_sf_metadata::ErrorKind::Parse(msg) => ErrorKind::Xml(msg.clone()),
            busbar_sf_metadata::ErrorKind::EnvVar(_) => ErrorKind::Config(err.kind.to_string()),
            other => ErrorKind::Remote(other.to_string()),
        };
        Error {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_rejected_lists_each_message_on_its_own_line() {
        let err = Error::new(ErrorKind::UpsertRejected {
            messages: vec!["first".to_string(), "second".to_string()],
        });
        assert_eq!(err.to_string(), "Upserting failed:\nfirst\nsecond");
    }

    #[test]
    fn test_retrieval_miss_names_member() {
        let err = Error::retrieval_miss("Profile", "Admin");
        assert_eq!(err.to_string(), "Failed to retrieve Profile:Admin");
    }

    #[test]
    fn test_metadata_parse_error_maps_to_xml() {
        let err: Error = busbar_sf_metadata::Error::new(busbar_sf_metadata::ErrorKind::Parse(
            "bad".to_string(),
        ))
        .into();
        assert!(matches!(err.kind, ErrorKind::Xml(_)));
    }

    #[test]
    fn test_missing_env_var_maps_to_config() {
        let err: Error = busbar_sf_metadata::Error::new(busbar_sf_metadata::ErrorKind::EnvVar(
            "SF_ACCESS_TOKEN".to_string(),
        ))
        .into();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
        assert!(err.to_string().contains("SF_ACCESS_TOKEN"));
    }
}
