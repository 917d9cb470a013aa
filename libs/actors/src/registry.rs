//! Actor Registry
//!
//! Single source of truth for which actors exist and who their parents are.
//! Children are never stored: they are computed by reverse lookup over the
//! parent links, so a terminated child cannot linger in a stale child list.

use crate::actor_ref::{ActorRef, ActorStatus};
use crate::error::{ActorError, Result};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Unique actor identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(String);

impl ActorId {
    /// Use a caller-chosen identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identity for anonymous actors
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ActorId> for ActorId {
    fn from(id: &ActorId) -> Self {
        id.clone()
    }
}

/// Registry entry: the handle plus its parent link
#[derive(Debug, Clone)]
struct RegistryEntry {
    actor_ref: ActorRef,
    parent: Option<ActorId>,
}

/// Process-wide address table of one actor system
#[derive(Debug, Default)]
pub struct ActorRegistry {
    entries: RwLock<HashMap<ActorId, RegistryEntry>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new actor under its identity
    ///
    /// Fails with `DuplicateIdentity` when the identity is taken, leaving the
    /// existing entry untouched. A parent must be registered and not yet
    /// stopping.
    pub fn register(&self, actor_ref: ActorRef) -> Result<()> {
        let mut entries = self.entries.write();
        let id = actor_ref.id().clone();

        if entries.contains_key(&id) {
            return Err(ActorError::duplicate(&id));
        }

        let parent = actor_ref.parent().cloned();
        if let Some(parent_id) = &parent {
            let parent_entry = entries
                .get(parent_id)
                .ok_or_else(|| ActorError::not_found(parent_id))?;
            let status = parent_entry.actor_ref.status();
            if matches!(status, ActorStatus::Stopping | ActorStatus::Terminated) {
                return Err(ActorError::ParentUnavailable {
                    parent: parent_id.to_string(),
                    child: id.to_string(),
                    status: status.to_string(),
                });
            }
        }

        debug!(actor_id = %id, parent = ?parent.as_ref().map(|p| p.as_str()), "Registering actor");
        entries.insert(id, RegistryEntry { actor_ref, parent });
        Ok(())
    }

    /// Atomically replace the handle registered for an existing identity
    ///
    /// The parent link is preserved.
    pub fn update(&self, actor_ref: ActorRef) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(actor_ref.id()) {
            Some(entry) => {
                debug!(actor_id = %actor_ref.id(), "Updating registry entry");
                entry.actor_ref = actor_ref;
                Ok(())
            }
            None => Err(ActorError::not_found(actor_ref.id())),
        }
    }

    /// Remove an entry, returning its handle
    pub fn unregister(&self, id: &ActorId) -> Option<ActorRef> {
        let removed = self.entries.write().remove(id).map(|e| e.actor_ref);
        if removed.is_some() {
            debug!(actor_id = %id, "Unregistered actor");
        }
        removed
    }

    /// Remove the entry only if it still belongs to this actor instance
    pub(crate) fn unregister_instance(&self, actor_ref: &ActorRef) -> bool {
        let mut entries = self.entries.write();
        let owned = entries
            .get(actor_ref.id())
            .is_some_and(|e| e.actor_ref.same_actor(actor_ref));
        if owned {
            entries.remove(actor_ref.id());
            debug!(actor_id = %actor_ref.id(), "Unregistered actor");
        }
        owned
    }

    /// Non-blocking lookup
    pub fn get(&self, id: &ActorId) -> Option<ActorRef> {
        self.entries.read().get(id).map(|e| e.actor_ref.clone())
    }

    pub fn contains(&self, id: &ActorId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Parent identity of a registered actor; `Ok(None)` for roots
    pub fn parent_of(&self, id: &ActorId) -> Result<Option<ActorId>> {
        self.entries
            .read()
            .get(id)
            .map(|e| e.parent.clone())
            .ok_or_else(|| ActorError::not_found(id))
    }

    /// Currently registered children, computed from parent links
    pub fn children_of(&self, id: &ActorId) -> Vec<ActorRef> {
        self.entries
            .read()
            .values()
            .filter(|e| e.parent.as_ref() == Some(id))
            .map(|e| e.actor_ref.clone())
            .collect()
    }

    /// All registered descendants, breadth-first, excluding `id` itself
    pub fn descendants_of(&self, id: &ActorId) -> Vec<ActorRef> {
        let entries = self.entries.read();
        let mut found = Vec::new();
        let mut queue = VecDeque::from([id.clone()]);

        while let Some(current) = queue.pop_front() {
            for entry in entries.values() {
                if entry.parent.as_ref() == Some(&current) {
                    queue.push_back(entry.actor_ref.id().clone());
                    found.push(entry.actor_ref.clone());
                }
            }
        }
        found
    }

    /// Number of generations below `id`; 0 for a leaf
    pub fn height_of(&self, id: &ActorId) -> usize {
        let entries = self.entries.read();
        let mut level = vec![id.clone()];
        let mut height = 0;

        loop {
            let next: Vec<ActorId> = entries
                .values()
                .filter(|e| e.parent.as_ref().is_some_and(|p| level.contains(p)))
                .map(|e| e.actor_ref.id().clone())
                .collect();
            if next.is_empty() {
                return height;
            }
            height += 1;
            level = next;
        }
    }

    /// Actors without a parent
    pub fn roots(&self) -> Vec<ActorRef> {
        self.entries
            .read()
            .values()
            .filter(|e| e.parent.is_none())
            .map(|e| e.actor_ref.clone())
            .collect()
    }

    /// Identities of every registered actor
    pub fn list(&self) -> Vec<ActorId> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_ref::ActorRef;
    use std::collections::HashSet;

    fn detached(id: &str, parent: Option<&str>) -> ActorRef {
        ActorRef::detached(ActorId::from(id), parent.map(ActorId::from))
    }

    #[test]
    fn test_actor_id_generation() {
        let id1 = ActorId::generate("worker");
        let id2 = ActorId::generate("worker");

        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("worker-"));
        assert_eq!(ActorId::from("a").to_string(), "a");
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ActorRegistry::new();
        registry.register(detached("a", None)).unwrap();

        assert!(registry.contains(&ActorId::from("a")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.parent_of(&ActorId::from("a")).unwrap(), None);
        assert!(registry.get(&ActorId::from("missing")).is_none());
        assert!(matches!(
            registry.parent_of(&ActorId::from("missing")),
            Err(ActorError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_leaves_existing_entry() {
        let registry = ActorRegistry::new();
        let original = detached("a", None);
        registry.register(original.clone()).unwrap();

        let err = registry.register(detached("a", None)).unwrap_err();
        assert!(matches!(err, ActorError::DuplicateIdentity { .. }));
        assert!(registry
            .get(&ActorId::from("a"))
            .unwrap()
            .same_actor(&original));
    }

    #[test]
    fn test_parent_must_exist() {
        let registry = ActorRegistry::new();
        let err = registry.register(detached("child", Some("ghost"))).unwrap_err();
        assert!(matches!(err, ActorError::NotFound { ref id } if id == "ghost"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_children_are_computed() {
        let registry = ActorRegistry::new();
        registry.register(detached("a", None)).unwrap();
        registry.register(detached("b", Some("a"))).unwrap();
        registry.register(detached("c", Some("a"))).unwrap();
        registry.register(detached("d", Some("b"))).unwrap();

        let children: HashSet<_> = registry
            .children_of(&ActorId::from("a"))
            .iter()
            .map(|r| r.id().clone())
            .collect();
        assert_eq!(children, HashSet::from([ActorId::from("b"), ActorId::from("c")]));

        registry.unregister(&ActorId::from("c"));
        assert_eq!(registry.children_of(&ActorId::from("a")).len(), 1);

        let descendants: Vec<_> = registry
            .descendants_of(&ActorId::from("a"))
            .iter()
            .map(|r| r.id().clone())
            .collect();
        assert_eq!(descendants, vec![ActorId::from("b"), ActorId::from("d")]);
        assert_eq!(registry.roots().len(), 1);
        assert_eq!(registry.height_of(&ActorId::from("a")), 2);
        assert_eq!(registry.height_of(&ActorId::from("d")), 0);
    }

    #[test]
    fn test_update_replaces_handle() {
        let registry = ActorRegistry::new();
        registry.register(detached("a", None)).unwrap();
        registry.register(detached("b", Some("a"))).unwrap();

        let replacement = detached("b", Some("a"));
        registry.update(replacement.clone()).unwrap();
        assert!(registry.get(&ActorId::from("b")).unwrap().same_actor(&replacement));
        assert_eq!(
            registry.parent_of(&ActorId::from("b")).unwrap(),
            Some(ActorId::from("a"))
        );

        assert!(registry.update(detached("zzz", None)).is_err());
    }
}
