//! Objects skipped for the rest of an execution.

use std::collections::HashSet;

use sweep_store::ObjectId;

/// Identifiers of objects that failed permanently during one execution.
///
/// Grows only; every later page is filtered through it.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    ids: HashSet<ObjectId>,
}

impl IgnoreSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id`, returning `false` if it was already ignored.
    pub fn insert(&mut self, id: ObjectId) -> bool {
        self.ids.insert(id)
    }

    #[inline]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.ids.contains(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
