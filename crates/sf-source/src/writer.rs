//! Merge writer: commits a [`ComponentSet`] to a source-format directory.

use std::fs;
use std::path::{Path, PathBuf};

use busbar_sf_metadata::xml::{self, Element, METADATA_NAMESPACE};
use tracing::debug;

use crate::component_set::{ComponentNode, ComponentSet, NestedChild};
use crate::error::Result;
use crate::materialize::{meta_file_path, META_SUFFIX};
use crate::registry::{ChildLayout, TypeDescriptor, TypeRegistry};
use crate::source::entry_name;

/// A file written for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub full_name: String,
    pub type_name: String,
    pub file_path: PathBuf,
}

/// Commits component sets to disk.
pub trait MergeWriter {
    /// Write every node under `root`, merging with what is already there.
    fn write(&self, components: &ComponentSet, root: &Path) -> Result<Vec<WrittenFile>>;
}

/// Writes the source-format layout.
///
/// Decomposed children get their own files, nested children are merged into
/// the parent file, and existing entries that are not being written are left
/// untouched.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    registry: TypeRegistry,
}

impl Default for DirectoryWriter {
    fn default() -> Self {
        Self::new(TypeRegistry::standard())
    }
}

impl MergeWriter for DirectoryWriter {
    fn write(&self, components: &ComponentSet, root: &Path) -> Result<Vec<WrittenFile>> {
        let mut written = Vec::new();
        for node in components {
            match (&node.child, node.descriptor.child_layout) {
                (Some(child), ChildLayout::Nested) => {
                    written.push(self.merge_nested_child(node, child, root)?)
                }
                (Some(child), _) => written.push(self.write_decomposed_child(node, child, root)?),
                (None, ChildLayout::Decomposed) => {
                    written.extend(self.write_decomposed_parent(node, root)?)
                }
                (None, _) => {
                    let path = node
                        .source_file
                        .clone()
                        .unwrap_or_else(|| standalone_path(root, &node.descriptor, &node.local_name));
                    write_file(&path, &node.document)?;
                    written.push(WrittenFile {
                        full_name: node.local_name.clone(),
                        type_name: node.descriptor.name.clone(),
                        file_path: path,
                    });
                }
            }
        }
        Ok(written)
    }
}

impl DirectoryWriter {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    /// `objects/Account/fields/Industry.field-meta.xml`, rooted at the child type.
    fn write_decomposed_child(
        &self,
        node: &ComponentNode,
        child: &NestedChild,
        root: &Path,
    ) -> Result<WrittenFile> {
        let path = node.source_file.clone().unwrap_or_else(|| {
            child_path(
                &parent_folder(root, &node.descriptor, &node.local_name),
                &child.descriptor,
                &child.local_name,
            )
        });

        let mut document = Element::new(&child.descriptor.name).with_attribute("xmlns", METADATA_NAMESPACE);
        if let Some(nested) = node.document.child(&child.descriptor.directory_name) {
            document.content = nested.content.clone();
        }
        write_file(&path, &document)?;

        Ok(WrittenFile {
            full_name: node.full_name(),
            type_name: child.descriptor.name.clone(),
            file_path: path,
        })
    }

    /// Split a full parent read into its own file plus one file per child.
    fn write_decomposed_parent(&self, node: &ComponentNode, root: &Path) -> Result<Vec<WrittenFile>> {
        let (folder, parent_path) = match &node.source_file {
            Some(path) => (
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
                path.clone(),
            ),
            None => {
                let folder = parent_folder(root, &node.descriptor, &node.local_name);
                let path = folder.join(file_name(&node.local_name, &node.descriptor.suffix));
                (folder, path)
            }
        };

        let mut document = node.document.clone();
        let mut written = Vec::new();
        for child_type in self.registry.children_of(&node.descriptor.name) {
            for entry in document.take_children(&child_type.directory_name) {
                let Some(child_name) = entry_name(&entry).map(str::to_string) else {
                    document.push_child(entry);
                    continue;
                };
                let path = child_path(&folder, child_type, &child_name);
                let mut child_document =
                    Element::new(&child_type.name).with_attribute("xmlns", METADATA_NAMESPACE);
                child_document.content = entry.content;
                write_file(&path, &child_document)?;
                written.push(WrittenFile {
                    full_name: format!("{}.{}", node.local_name, child_name),
                    type_name: child_type.name.clone(),
                    file_path: path,
                });
            }
        }

        write_file(&parent_path, &document)?;
        written.insert(
            0,
            WrittenFile {
                full_name: node.local_name.clone(),
                type_name: node.descriptor.name.clone(),
                file_path: parent_path,
            },
        );
        Ok(written)
    }

    /// Merge one child entry into the parent's single file.
    fn merge_nested_child(
        &self,
        node: &ComponentNode,
        child: &NestedChild,
        root: &Path,
    ) -> Result<WrittenFile> {
        let path = node
            .source_file
            .clone()
            .unwrap_or_else(|| standalone_path(root, &node.descriptor, &node.local_name));

        let mut document = if path.exists() {
            xml::parse(&fs::read_to_string(&path)?)?
        } else {
            Element::new(&node.descriptor.name).with_attribute("xmlns", METADATA_NAMESPACE)
        };

        for entry in node.document.children() {
            merge_entry(&mut document, entry.clone());
        }
        write_file(&path, &document)?;

        Ok(WrittenFile {
            full_name: node.full_name(),
            type_name: child.descriptor.name.clone(),
            file_path: path,
        })
    }
}

/// Replace the sibling with the same element and entry name, or insert
/// after the last sibling with the same element name.
fn merge_entry(document: &mut Element, entry: Element) {
    let name = entry_name(&entry).map(str::to_string);
    let mut children = document.drain_children();
    let existing = children
        .iter()
        .position(|c| c.name == entry.name && name.is_some() && entry_name(c) == name.as_deref());
    match existing {
        Some(position) => children[position] = entry,
        None => match children.iter().rposition(|c| c.name == entry.name) {
            Some(last) => children.insert(last + 1, entry),
            None => children.push(entry),
        },
    }
    document.set_children(children);
}

fn file_name(name: &str, suffix: &str) -> String {
    format!("{}.{}{}", name, suffix, META_SUFFIX)
}

fn standalone_path(root: &Path, descriptor: &TypeDescriptor, name: &str) -> PathBuf {
    meta_file_path(&root.join(&descriptor.directory_name).join(format!("{}.{}", name, descriptor.suffix)))
}

fn parent_folder(root: &Path, descriptor: &TypeDescriptor, name: &str) -> PathBuf {
    root.join(&descriptor.directory_name).join(name)
}

fn child_path(folder: &Path, descriptor: &TypeDescriptor, name: &str) -> PathBuf {
    folder
        .join(&descriptor.directory_name)
        .join(file_name(name, &descriptor.suffix))
}

fn write_file(path: &Path, document: &Element) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    debug!(path = %path.display(), "writing component file");
    fs::write(path, xml::write_document(document))?;
    Ok(())
}
