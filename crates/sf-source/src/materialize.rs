//! Component materializer.
//!
//! Turns one flat record from the CRUD API into a [`ComponentNode`]: a
//! metadata document rooted at the owning component's type, with child
//! records nested under their directory element.

use std::path::{Path, PathBuf};

use busbar_sf_metadata::xml::{Element, METADATA_NAMESPACE};
use serde_json::{Map, Value};

use crate::component_set::{ComponentNode, NestedChild};
use crate::error::{Error, ErrorKind, Result};
use crate::identifier::ComponentIdentifier;
use crate::parent::split_qualified_name;
use crate::registry::{TypeDescriptor, TypeRegistry};

/// Source-format file suffix.
pub const META_SUFFIX: &str = "-meta.xml";

/// Top-level types whose document keeps its own `fullName`.
pub const KEEP_FULL_NAME_TYPES: [&str; 2] = ["CustomObjectTranslation", "Translations"];

/// What happens to a child record's `fullName` when it is nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingPolicy {
    /// Replace it with the child-local name, as the first field.
    RewriteFullName,
    /// Drop it; the parent schema carries no name on these children.
    StripFullName,
}

/// `(child type, parent type)` pairs that do not use [`NestingPolicy::RewriteFullName`].
///
/// Other decomposed pairs have not been checked against the full type catalog.
const NESTING_POLICIES: &[(&str, &str, NestingPolicy)] = &[
    (
        "CustomFieldTranslation",
        "CustomObjectTranslation",
        NestingPolicy::StripFullName,
    ),
    ("Territory2Rule", "Territory2Model", NestingPolicy::StripFullName),
];

/// Nesting policy for a child type under a parent type.
pub fn nesting_policy(child_type: &str, parent_type: &str) -> NestingPolicy {
    NESTING_POLICIES
        .iter()
        .find(|(child, parent, _)| *child == child_type && *parent == parent_type)
        .map(|(_, _, policy)| *policy)
        .unwrap_or(NestingPolicy::RewriteFullName)
}

/// Metadata-format path of a component: `<directory>/<name>.<suffix>`.
pub fn virtual_path(descriptor: &TypeDescriptor, local_name: &str) -> PathBuf {
    Path::new(&descriptor.directory_name).join(format!("{}.{}", local_name, descriptor.suffix))
}

/// Remove every trailing `-meta.xml`.
pub fn strip_meta_suffix(path: &str) -> &str {
    let mut stripped = path;
    while let Some(rest) = stripped.strip_suffix(META_SUFFIX) {
        stripped = rest;
    }
    stripped
}

/// Source-format form of `path`, with exactly one `-meta.xml` suffix.
pub fn meta_file_path(path: &Path) -> PathBuf {
    let path = path.to_string_lossy();
    PathBuf::from(format!("{}{}", strip_meta_suffix(&path), META_SUFFIX))
}

/// Builds [`ComponentNode`]s from identifiers and their records.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> Materializer<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Materialize one record.
    ///
    /// A parented identifier yields a node owned by the parent, with the
    /// record nested under the child type's directory element. Fails with a
    /// structural error when a child name has no `<parent>.<child>` form.
    pub fn materialize(
        &self,
        identifier: &ComponentIdentifier,
        record: Value,
    ) -> Result<ComponentNode> {
        let descriptor = self.registry.get_type_by_name(&identifier.type_name)?;
        let fields = into_fields(identifier, record)?;
        let source_file = identifier.source_path.as_deref().map(meta_file_path);

        let Some(parent) = &identifier.parent else {
            let mut fields = fields;
            if !KEEP_FULL_NAME_TYPES.contains(&descriptor.name.as_str()) {
                fields.remove("fullName");
            }
            return Ok(ComponentNode {
                descriptor: descriptor.clone(),
                local_name: identifier.qualified_name.clone(),
                virtual_path: virtual_path(descriptor, &identifier.qualified_name),
                child: None,
                document: document_root(&descriptor.name, &fields),
                source_file,
            });
        };

        let (_, child_local) = split_qualified_name(&identifier.qualified_name)
            .ok_or_else(|| Error::structural(&identifier.type_name, &identifier.qualified_name))?;
        let parent_descriptor = self.registry.get_type_by_name(&parent.type_name)?;

        let fields = match nesting_policy(&descriptor.name, &parent_descriptor.name) {
            NestingPolicy::StripFullName => {
                let mut fields = fields;
                fields.remove("fullName");
                fields
            }
            NestingPolicy::RewriteFullName => with_full_name(child_local, fields),
        };

        let nested = Element::from_value(&descriptor.directory_name, &Value::Object(fields));
        let document = Element::new(&parent_descriptor.name)
            .with_attribute("xmlns", METADATA_NAMESPACE)
            .with_child(nested);

        Ok(ComponentNode {
            descriptor: parent_descriptor.clone(),
            local_name: parent.qualified_name.clone(),
            virtual_path: virtual_path(parent_descriptor, &parent.qualified_name),
            child: Some(NestedChild {
                descriptor: descriptor.clone(),
                local_name: child_local.to_string(),
            }),
            document,
            source_file,
        })
    }
}

fn into_fields(identifier: &ComponentIdentifier, record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::new(ErrorKind::InvalidComponent(format!(
            "{}: expected a record object, got {}",
            identifier, other
        )))),
    }
}

/// `fields` with `fullName` set to `full_name` and moved to the front.
pub(crate) fn with_full_name(full_name: &str, fields: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(fields.len() + 1);
    out.insert("fullName".to_string(), Value::String(full_name.to_string()));
    out.extend(fields.into_iter().filter(|(key, _)| key != "fullName"));
    out
}

fn document_root(type_name: &str, fields: &Map<String, Value>) -> Element {
    let mut root = Element::from_value(type_name, &Value::Object(fields.clone()));
    root.attributes.insert(0, ("xmlns".to_string(), METADATA_NAMESPACE.to_string()));
    root
}
