//! # Herald Catalog
//! The pool of broadcast payloads: an ordered list plus a monotonic id
//! counter. Persistence is a flat JSON file (see [`store`]).

pub mod store;

use serde::{Deserialize, Serialize};

use herald_core::types::{Payload, PayloadId};

pub use store::CatalogStore;

/// Ordered payload collection. Insertion order equals id order; ids are
/// assigned from a counter that never goes backwards, so a deleted id is
/// never handed out again — not even after a restart, since the counter is
/// persisted alongside the payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    next_id: PayloadId,
    payloads: Vec<Payload>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new payload and return its assigned id.
    pub fn add(&mut self, content: impl Into<String>) -> PayloadId {
        self.next_id += 1;
        let id = self.next_id;
        self.payloads.push(Payload::new(id, content));
        id
    }

    /// Remove a payload by id. Returns false if the id is unknown.
    pub fn remove(&mut self, id: PayloadId) -> bool {
        let len = self.payloads.len();
        self.payloads.retain(|p| p.id != id);
        self.payloads.len() < len
    }

    /// All payloads, in insertion order.
    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.add("first"), 1);
        assert_eq!(catalog.add("second"), 2);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.payloads()[0].content, "first");
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut catalog = Catalog::new();
        catalog.add("only");
        assert!(!catalog.remove(99));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut catalog = Catalog::new();
        catalog.add("a");
        catalog.add("b");
        let last = catalog.add("c");
        assert!(catalog.remove(last));
        // A fresh add must not collide with the deleted id.
        let next = catalog.add("d");
        assert_eq!(next, last + 1);
        let ids: Vec<_> = catalog.payloads().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }
}
