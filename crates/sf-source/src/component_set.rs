//! Materialized components and the ordered set that collects them.

use std::collections::HashMap;
use std::path::PathBuf;

use busbar_sf_metadata::xml::{self, Element};

use crate::chunk::group_by;
use crate::registry::TypeDescriptor;

/// Child identity of a node built from a child record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedChild {
    pub descriptor: TypeDescriptor,
    pub local_name: String,
}

/// One virtual metadata document.
///
/// For a child record the node belongs to the parent component: its
/// descriptor and local name are the parent's and `child` names the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentNode {
    pub descriptor: TypeDescriptor,
    pub local_name: String,
    /// `<directory>/<name>.<suffix>`, relative to the output root.
    pub virtual_path: PathBuf,
    pub child: Option<NestedChild>,
    /// Document rooted at the descriptor's type, with the metadata namespace.
    pub document: Element,
    /// Existing source file the component was resolved from.
    pub source_file: Option<PathBuf>,
}

impl ComponentNode {
    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    /// Qualified name of what this node carries, e.g. `Account.Industry`.
    pub fn full_name(&self) -> String {
        match &self.child {
            Some(child) => format!("{}.{}", self.local_name, child.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn key(&self) -> ComponentKey {
        ComponentKey {
            type_name: self.descriptor.name.clone(),
            local_name: self.local_name.clone(),
            child: self
                .child
                .as_ref()
                .map(|c| (c.descriptor.name.clone(), c.local_name.clone())),
        }
    }

    /// The document as written to disk.
    pub fn to_xml(&self) -> String {
        xml::write_document(&self.document)
    }
}

/// Identity of a node in a [`ComponentSet`].
///
/// Child nodes are also keyed by their child type and name, so several
/// fields of one object are kept side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub type_name: String,
    pub local_name: String,
    pub child: Option<(String, String)>,
}

/// Insertion-ordered, de-duplicated collection of nodes.
///
/// Adding a node whose key is already present replaces the earlier node in
/// place. Documents are never merged.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    nodes: Vec<ComponentNode>,
    index: HashMap<ComponentKey, usize>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; last write wins.
    pub fn add(&mut self, node: ComponentNode) {
        let key = node.key();
        match self.index.get(&key) {
            Some(&position) => self.nodes[position] = node,
            None => {
                self.index.insert(key, self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&ComponentNode> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComponentNode> {
        self.nodes.iter()
    }

    pub fn to_vec(&self) -> Vec<ComponentNode> {
        self.nodes.clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes grouped by type, in first-seen order.
    pub fn group_by_type(&self) -> Vec<(String, Vec<&ComponentNode>)> {
        group_by(self.nodes.iter(), |node| node.descriptor.name.clone())
    }
}

impl Extend<ComponentNode> for ComponentSet {
    fn extend<I: IntoIterator<Item = ComponentNode>>(&mut self, iter: I) {
        for node in iter {
            self.add(node);
        }
    }
}

impl FromIterator<ComponentNode> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentNode>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a ComponentNode;
    type IntoIter = std::slice::Iter<'a, ComponentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ComponentSet {
    type Item = ComponentNode;
    type IntoIter = std::vec::IntoIter<ComponentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
