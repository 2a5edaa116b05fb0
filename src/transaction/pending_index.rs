//! Colon-delimited pending-transaction index manipulation.
//!
//! The index is a single store record listing the ids of every transaction
//! currently believed pending, in submission order. These helpers keep the
//! delimiter placement canonical: no leading, trailing or doubled colons.

/// True iff `id` is an element of the index.
pub fn contains_id(index: &str, id: &str) -> bool {
    index.split(':').any(|entry| entry == id)
}

/// Appends `id` to the index. Idempotent: an id already listed is not
/// duplicated.
pub fn append_id(index: &str, id: &str) -> String {
    if contains_id(index, id) {
        return index.to_string();
    }
    if index.is_empty() {
        id.to_string()
    } else {
        format!("{index}:{id}")
    }
}

/// Removes `id` from the index, repairing delimiter placement.
pub fn remove_id(index: &str, id: &str) -> String {
    index
        .split(':')
        .filter(|entry| !entry.is_empty() && *entry != id)
        .collect::<Vec<_>>()
        .join(":")
}

/// Iterates the listed ids in index order.
pub fn ids(index: &str) -> impl Iterator<Item = &str> {
    index.split(':').filter(|entry| !entry.is_empty())
}
