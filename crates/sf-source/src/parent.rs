//! Parent synthesis for child metadata types.
//!
//! The CRUD API returns child members (fields, record types, workflow rules)
//! without any explicit link to their parent. The link is recovered from the
//! naming convention `<parent>.<child>`, which holds for the parent/child
//! type pairs in the registry. It is a convention of those types, not a
//! general property of metadata names.

use crate::identifier::{ComponentIdentifier, ParentRef};
use crate::registry::TypeRegistry;

/// Split a qualified child name at the first `.` into `(parent, child)`.
///
/// Returns `None` when there is no dot or either side is empty.
pub fn split_qualified_name(qualified_name: &str) -> Option<(&str, &str)> {
    let (parent, child) = qualified_name.split_once('.')?;
    if parent.is_empty() || child.is_empty() {
        return None;
    }
    Some((parent, child))
}

/// Ensure every identifier of a child type carries its parent.
///
/// Identifiers that already have a parent are left alone, as are all
/// identifiers of types without a declared parent. A name without a dot gets
/// the whole name as parent; materialization rejects it later.
pub fn synthesize(
    registry: &TypeRegistry,
    type_name: &str,
    identifiers: Vec<ComponentIdentifier>,
) -> Vec<ComponentIdentifier> {
    let Some(parent_type) = registry.get_parent_type(type_name) else {
        return identifiers;
    };

    identifiers
        .into_iter()
        .map(|mut id| {
            if id.parent.is_none() {
                let parent_name = id
                    .qualified_name
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                id.parent = Some(ParentRef {
                    type_name: parent_type.name.clone(),
                    qualified_name: parent_name,
                });
            }
            id
        })
        .collect()
}
