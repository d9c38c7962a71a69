//! Resolution of source-format files to component identifiers.

use std::fs;
use std::path::{Path, PathBuf};

use busbar_sf_metadata::xml::{self, Element};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::identifier::ComponentIdentifier;
use crate::materialize::{strip_meta_suffix, with_full_name, META_SUFFIX};
use crate::parent::split_qualified_name;
use crate::registry::{ChildLayout, TypeDescriptor, TypeRegistry};

/// Resolve a metadata file path to the component it holds.
///
/// Accepts both `<name>.<suffix>-meta.xml` and `<name>.<suffix>`. A child
/// type takes its parent from the enclosing folders, so
/// `objects/Account/recordTypes/Business.recordType-meta.xml` resolves to
/// `RecordType:Account.Business`.
pub fn resolve_source_path(registry: &TypeRegistry, path: &Path) -> Result<ComponentIdentifier> {
    let unresolved = |reason: &str| {
        Error::new(ErrorKind::UnresolvedSourcePath(format!(
            "{}: {}",
            path.display(),
            reason
        )))
    };

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| unresolved("no file name"))?;
    let (name, suffix) = strip_meta_suffix(file_name)
        .rsplit_once('.')
        .ok_or_else(|| unresolved("no metadata suffix"))?;
    if name.is_empty() {
        return Err(unresolved("empty component name"));
    }
    let descriptor = registry
        .get_type_by_suffix(suffix)
        .ok_or_else(|| unresolved(&format!("unknown suffix '{}'", suffix)))?;

    let identifier = match &descriptor.parent {
        None => ComponentIdentifier::new(&descriptor.name, name),
        Some(parent_type) => {
            let parent_name = path
                .parent()
                .and_then(Path::parent)
                .and_then(Path::file_name)
                .and_then(|name| name.to_str())
                .filter(|name| !name.is_empty())
                .ok_or_else(|| unresolved("child component outside its parent folder"))?;
            ComponentIdentifier::new(&descriptor.name, format!("{}.{}", parent_name, name))
                .with_parent(parent_type, parent_name)
        }
    };
    Ok(identifier.with_source_path(path))
}

/// Path of a component's source file relative to a package directory.
///
/// Child components live under their parent's folder, or inside the
/// parent's file when the parent nests its children. Parents that decompose
/// their children keep their own file inside a folder of the same name.
pub fn relative_source_path(
    registry: &TypeRegistry,
    identifier: &ComponentIdentifier,
) -> Result<PathBuf> {
    let descriptor = registry.get_type_by_name(&identifier.type_name)?;
    let Some(parent) = registry.get_parent_type(&descriptor.name) else {
        let folder = PathBuf::from(&descriptor.directory_name);
        let folder = match descriptor.child_layout {
            ChildLayout::Decomposed => folder.join(&identifier.qualified_name),
            ChildLayout::None | ChildLayout::Nested => folder,
        };
        return Ok(folder.join(file_name(&identifier.qualified_name, &descriptor.suffix)));
    };

    let (parent_name, child_name) = split_qualified_name(&identifier.qualified_name)
        .ok_or_else(|| Error::structural(&identifier.type_name, &identifier.qualified_name))?;
    let parent_folder = PathBuf::from(&parent.directory_name);
    Ok(match parent.child_layout {
        ChildLayout::Nested => parent_folder.join(file_name(parent_name, &parent.suffix)),
        ChildLayout::None | ChildLayout::Decomposed => parent_folder
            .join(parent_name)
            .join(&descriptor.directory_name)
            .join(file_name(child_name, &descriptor.suffix)),
    })
}

/// Load the record of a source file for upserting.
///
/// The returned record carries the qualified name as its first field.
///
/// - a standalone or decomposed child file is read as is; its root element
///   must match the identifier's type
/// - a decomposed parent is recomposed from its own file and every child
///   file in its folder
/// - a nested child is the matching entry of its parent's file
pub fn load_source_record(registry: &TypeRegistry, identifier: &ComponentIdentifier) -> Result<Value> {
    let path = identifier.source_path.as_deref().ok_or_else(|| {
        Error::new(ErrorKind::UnresolvedSourcePath(format!(
            "{} has no source file",
            identifier
        )))
    })?;
    let descriptor = registry.get_type_by_name(&identifier.type_name)?;

    let record = match registry.get_parent_type(&descriptor.name) {
        Some(parent) if parent.child_layout == ChildLayout::Nested => {
            let root = parse_file(path, &parent.name)?;
            nested_entry(&root, descriptor, identifier, path)?
        }
        _ => {
            let mut root = parse_file(path, &descriptor.name)?;
            if descriptor.child_layout == ChildLayout::Decomposed {
                recompose_children(registry, descriptor, path, &mut root)?;
            }
            root
        }
    };

    let fields = match record.to_value() {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    Ok(Value::Object(with_full_name(&identifier.qualified_name, fields)))
}

/// Name carried by a nested entry: its `fullName`, else its `name`.
pub(crate) fn entry_name(entry: &Element) -> Option<&str> {
    entry
        .child_text("fullName")
        .or_else(|| entry.child_text("name"))
        .filter(|name| !name.is_empty())
}

fn file_name(name: &str, suffix: &str) -> String {
    format!("{}.{}{}", name, suffix, META_SUFFIX)
}

fn parse_file(path: &Path, expected_root: &str) -> Result<Element> {
    let root = xml::parse(&fs::read_to_string(path)?)?;
    if root.name != expected_root {
        return Err(Error::new(ErrorKind::InvalidComponent(format!(
            "{}: root element <{}> does not match type {}",
            path.display(),
            root.name,
            expected_root
        ))));
    }
    Ok(root)
}

fn nested_entry(
    root: &Element,
    descriptor: &TypeDescriptor,
    identifier: &ComponentIdentifier,
    path: &Path,
) -> Result<Element> {
    let (_, child_name) = split_qualified_name(&identifier.qualified_name)
        .ok_or_else(|| Error::structural(&identifier.type_name, &identifier.qualified_name))?;
    root.children_named(&descriptor.directory_name)
        .find(|entry| entry_name(entry) == Some(child_name))
        .cloned()
        .ok_or_else(|| {
            Error::new(ErrorKind::UnresolvedSourcePath(format!(
                "{}: no <{}> entry named {}",
                path.display(),
                descriptor.directory_name,
                child_name
            )))
        })
}

/// Fold the child files of a decomposed parent back into its document.
///
/// Entries are placed among the parent's fields in element-name order, the
/// order the Metadata API uses for these types.
fn recompose_children(
    registry: &TypeRegistry,
    descriptor: &TypeDescriptor,
    path: &Path,
    root: &mut Element,
) -> Result<()> {
    let Some(folder) = path.parent() else {
        return Ok(());
    };
    for child_type in registry.children_of(&descriptor.name) {
        let child_folder = folder.join(&child_type.directory_name);
        if !child_folder.is_dir() {
            continue;
        }
        let suffix = format!(".{}{}", child_type.suffix, META_SUFFIX);
        let mut files: Vec<PathBuf> = fs::read_dir(&child_folder)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        files.retain(|file| file.to_string_lossy().ends_with(&suffix));
        files.sort();

        for file in files {
            let child = parse_file(&file, &child_type.name)?;
            let mut entry = Element::new(&child_type.directory_name);
            entry.content = child.content;
            insert_in_name_order(root, entry);
        }
    }
    Ok(())
}

fn insert_in_name_order(root: &mut Element, entry: Element) {
    let mut children = root.drain_children();
    let position = children
        .iter()
        .position(|c| c.name > entry.name)
        .unwrap_or(children.len());
    children.insert(position, entry);
    root.set_children(children);
}
