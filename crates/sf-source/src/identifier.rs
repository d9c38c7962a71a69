//! Component identifiers as supplied by callers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Reference to the owning parent component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRef {
    pub type_name: String,
    pub qualified_name: String,
}

/// A requested component, e.g. `Profile:Admin` or `CustomField:Account.Industry`.
///
/// Child components use the dotted `<parent>.<child>` qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentIdentifier {
    pub type_name: String,
    pub qualified_name: String,
    pub parent: Option<ParentRef>,
    /// Source file this identifier was resolved from, if any.
    pub source_path: Option<PathBuf>,
}

impl ComponentIdentifier {
    pub fn new(type_name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            qualified_name: qualified_name.into(),
            parent: None,
            source_path: None,
        }
    }

    pub fn with_parent(
        mut self,
        type_name: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        self.parent = Some(ParentRef {
            type_name: type_name.into(),
            qualified_name: qualified_name.into(),
        });
        self
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.qualified_name)
    }
}

impl FromStr for ComponentIdentifier {
    type Err = Error;

    /// Parse a `Type:Name` entry.
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::new(ErrorKind::InvalidComponent(format!(
                "expected <Type>:<Name>, got '{}'",
                entry
            )))
        };
        let (type_name, qualified_name) = entry.split_once(':').ok_or_else(invalid)?;
        let (type_name, qualified_name) = (type_name.trim(), qualified_name.trim());
        if type_name.is_empty() || qualified_name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(type_name, qualified_name))
    }
}

/// Parse a `Type:Name` entry.
pub fn parse_component_name(entry: &str) -> crate::Result<ComponentIdentifier> {
    entry.parse()
}
