//! Chunk planning: group requested components by type and split each type's
//! members into batches that respect the CRUD per-call limit.

use std::collections::HashMap;

use busbar_sf_metadata::{crud_member_limit, MAX_CRUD_MEMBERS};

use crate::identifier::ComponentIdentifier;

/// Ordered member batches for one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBatches {
    pub type_name: String,
    pub batches: Vec<Vec<String>>,
}

/// Batch size for `type_name`.
///
/// An override is capped at the general per-call limit of 10 and floored at 1;
/// without one, the type's own CRUD limit applies (200 for CustomApplication
/// and CustomMetadata, 10 otherwise).
pub fn batch_size(type_name: &str, override_chunk_size: Option<usize>) -> usize {
    match override_chunk_size {
        Some(size) => size.clamp(1, MAX_CRUD_MEMBERS),
        None => crud_member_limit(type_name),
    }
}

/// Split `items` into consecutive chunks of at most `size` elements.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

/// Group items by key, keeping first-seen key order and item order within a group.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + std::hash::Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

/// Plan the read batches for a list of identifiers.
///
/// Types appear in first-seen order; concatenating a type's batches yields
/// its qualified names in input order.
pub fn plan(
    identifiers: &[ComponentIdentifier],
    override_chunk_size: Option<usize>,
) -> Vec<TypeBatches> {
    group_by(identifiers, |id| id.type_name.clone())
        .into_iter()
        .map(|(type_name, members)| {
            let names: Vec<String> = members.iter().map(|id| id.qualified_name.clone()).collect();
            let size = batch_size(&type_name, override_chunk_size);
            TypeBatches {
                batches: chunk(&names, size),
                type_name,
            }
        })
        .collect()
}
