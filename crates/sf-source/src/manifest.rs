//! `package.xml` manifests.

use std::fs;
use std::path::Path;

use busbar_sf_metadata::xml;

use crate::error::{Error, ErrorKind, Result};
use crate::identifier::ComponentIdentifier;
use crate::project::PackageDirectories;
use crate::registry::TypeRegistry;

/// Member that stands for every component of its type.
pub const WILDCARD: &str = "*";

/// One `<types>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestType {
    pub name: String,
    pub members: Vec<String>,
}

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    pub types: Vec<ManifestType>,
    pub version: Option<String>,
}

impl Manifest {
    /// Parse manifest XML. The root element must be `<Package>`.
    pub fn parse(content: &str) -> Result<Self> {
        let root = xml::parse(content)?;
        if root.name != "Package" {
            return Err(Error::new(ErrorKind::InvalidComponent(format!(
                "manifest root element is <{}>, expected <Package>",
                root.name
            ))));
        }

        let types = root
            .children_named("types")
            .map(|block| {
                let name = block
                    .child_text("name")
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        Error::new(ErrorKind::InvalidComponent(
                            "manifest <types> block without <name>".to_string(),
                        ))
                    })?;
                Ok(ManifestType {
                    name: name.to_string(),
                    members: block
                        .children_named("members")
                        .filter_map(xml::Element::text)
                        .map(str::trim)
                        .filter(|member| !member.is_empty())
                        .map(str::to_string)
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            types,
            version: root.child_text("version").map(|v| v.trim().to_string()),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// The components the manifest names, in manifest order.
    ///
    /// A `*` member expands to every component of that type found in the
    /// package directories.
    pub fn components(
        &self,
        registry: &TypeRegistry,
        packages: &PackageDirectories,
    ) -> Result<Vec<ComponentIdentifier>> {
        let mut components = Vec::new();
        for entry in &self.types {
            registry.get_type_by_name(&entry.name)?;
            for member in &entry.members {
                if member == WILDCARD {
                    components.extend(packages.list(registry, &entry.name)?);
                } else {
                    components.push(ComponentIdentifier::new(&entry.name, member));
                }
            }
        }
        Ok(components)
    }
}
