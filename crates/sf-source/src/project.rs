//! Package directories of a source-format project.
//!
//! Components named as `Type:Name` are looked up in every package
//! directory, the way `sfdx-project.json` declares them. Walking honours
//! `.gitignore` and `.forceignore`.

use std::fs;
use std::path::{Path, PathBuf};

use busbar_sf_metadata::xml;
use ignore::WalkBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::identifier::ComponentIdentifier;
use crate::registry::{ChildLayout, TypeRegistry};
use crate::source::{entry_name, relative_source_path, resolve_source_path};

/// Project descriptor file name.
pub const PROJECT_FILE: &str = "sfdx-project.json";

const FORCE_IGNORE_FILE: &str = ".forceignore";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    #[serde(default)]
    package_directories: Vec<PackageDirectory>,
}

#[derive(Debug, Deserialize)]
struct PackageDirectory {
    path: String,
    #[serde(default)]
    default: bool,
}

/// The directories searched for source files, default first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDirectories {
    roots: Vec<PathBuf>,
}

impl PackageDirectories {
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the package directories declared in `<project_dir>/sfdx-project.json`.
    pub fn from_project(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(PROJECT_FILE);
        let content = fs::read_to_string(&path)?;
        let project: ProjectFile = serde_json::from_str(&content).map_err(|e| {
            Error::with_source(
                ErrorKind::Config(format!("{}: {}", path.display(), e)),
                e,
            )
        })?;
        if project.package_directories.is_empty() {
            return Err(Error::new(ErrorKind::Config(format!(
                "{}: no packageDirectories",
                path.display()
            ))));
        }

        let (defaults, others): (Vec<_>, Vec<_>) = project
            .package_directories
            .into_iter()
            .partition(|dir| dir.default);
        Ok(Self::new(
            defaults
                .into_iter()
                .chain(others)
                .map(|dir| project_dir.join(dir.path)),
        ))
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find the existing source file of `identifier`.
    pub fn find(
        &self,
        registry: &TypeRegistry,
        identifier: &ComponentIdentifier,
    ) -> Result<Option<PathBuf>> {
        let relative = relative_source_path(registry, identifier)?;
        for root in &self.roots {
            let direct = root.join(&relative);
            if direct.is_file() {
                return Ok(Some(direct));
            }
            if let Some(found) = source_files(root).find(|path| path.ends_with(&relative)) {
                return Ok(Some(found));
            }
        }
        debug!(component = %identifier, "no source file in package directories");
        Ok(None)
    }

    /// Attach the source file of `identifier`; it must exist.
    pub fn resolve(
        &self,
        registry: &TypeRegistry,
        identifier: &ComponentIdentifier,
    ) -> Result<ComponentIdentifier> {
        match self.find(registry, identifier)? {
            Some(path) => Ok(identifier.clone().with_source_path(path)),
            None => Err(Error::new(ErrorKind::UnresolvedSourcePath(format!(
                "{}: not found in {}",
                identifier,
                self.describe()
            )))),
        }
    }

    /// Every component of `type_name` present in the package directories.
    pub fn list(&self, registry: &TypeRegistry, type_name: &str) -> Result<Vec<ComponentIdentifier>> {
        let descriptor = registry.get_type_by_name(type_name)?;
        let nested_parent = registry
            .get_parent_type(type_name)
            .filter(|parent| parent.child_layout == ChildLayout::Nested);

        let mut found: Vec<ComponentIdentifier> = Vec::new();
        for path in self.roots.iter().flat_map(|root| source_files(root)) {
            let Ok(identifier) = resolve_source_path(registry, &path) else {
                continue;
            };
            match nested_parent {
                Some(parent) if identifier.type_name == parent.name => {
                    let document = xml::parse(&fs::read_to_string(&path)?)?;
                    for name in document
                        .children_named(&descriptor.directory_name)
                        .filter_map(entry_name)
                    {
                        found.push(
                            ComponentIdentifier::new(
                                type_name,
                                format!("{}.{}", identifier.qualified_name, name),
                            )
                            .with_source_path(&path),
                        );
                    }
                }
                None if identifier.type_name == type_name => found.push(identifier),
                _ => {}
            }
        }

        let mut seen = std::collections::HashSet::new();
        found.retain(|id| seen.insert(id.qualified_name.clone()));
        Ok(found)
    }

    fn describe(&self) -> String {
        self.roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Files under `root`, in file-name order, skipping ignored entries.
fn source_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkBuilder::new(root)
        .standard_filters(true)
        .hidden(false)
        .add_custom_ignore_filename(FORCE_IGNORE_FILE)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable source entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(ignore::DirEntry::into_path)
}
