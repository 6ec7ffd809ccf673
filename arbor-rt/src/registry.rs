//! Bidirectional name registry.
//!
//! Maps unique actor names to ids and back, plus group names to group
//! ids. Lookup tables are DashMaps so the send path resolves names
//! without taking the system lock.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::{ActorId, GroupId};

/// Registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is already registered to another actor.
    #[error("name already registered: {0}")]
    NameTaken(String),

    /// The group name is already registered.
    #[error("group name already registered: {0}")]
    GroupNameTaken(String),
}

/// Name→id and id→name maps with registration counters.
#[derive(Debug, Default)]
pub struct Registry {
    by_name: DashMap<String, ActorId>,
    by_id: DashMap<ActorId, String>,
    groups: DashMap<String, GroupId>,
    registered_total: AtomicU64,
    unregistered_total: AtomicU64,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for `id`. Names are unique; re-registering an
    /// existing name fails without modifying state.
    pub fn register(&self, name: impl Into<String>, id: ActorId) -> Result<(), RegistryError> {
        let name = name.into();
        // Entry-based insert so two racing registrations of the same
        // name cannot both win.
        match self.by_name.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::NameTaken(name)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
                self.by_id.insert(id, name);
                self.registered_total.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Resolve a name to an actor id.
    pub fn lookup(&self, name: &str) -> Option<ActorId> {
        self.by_name.get(name).map(|entry| *entry)
    }

    /// Resolve an actor id back to its registered name.
    pub fn name_of(&self, id: ActorId) -> Option<String> {
        self.by_id.get(&id).map(|entry| entry.clone())
    }

    /// Remove the registration for `id`, if any.
    pub fn unregister(&self, id: ActorId) {
        if let Some((_, name)) = self.by_id.remove(&id) {
            self.by_name.remove(&name);
            self.unregistered_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Register a group name.
    pub fn register_group(
        &self,
        name: impl Into<String>,
        id: GroupId,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        match self.groups.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RegistryError::GroupNameTaken(name))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    /// Resolve a group name.
    pub fn lookup_group(&self, name: &str) -> Option<GroupId> {
        self.groups.get(name).map(|entry| *entry)
    }

    /// Number of currently registered names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no names are registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Lifetime count of registrations.
    pub fn registered_total(&self) -> u64 {
        self.registered_total.load(Ordering::Relaxed)
    }

    /// Lifetime count of unregistrations.
    pub fn unregistered_total(&self) -> u64 {
        self.unregistered_total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup_roundtrip() {
        let registry = Registry::new();
        let id = ActorId::from_raw(7);

        registry.register("worker", id).unwrap();
        assert_eq!(registry.lookup("worker"), Some(id));
        assert_eq!(registry.name_of(id).as_deref(), Some("worker"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = Registry::new();
        registry.register("a", ActorId::from_raw(1)).unwrap();

        let err = registry.register("a", ActorId::from_raw(2)).unwrap_err();
        assert_eq!(err, RegistryError::NameTaken("a".into()));

        // Original mapping is untouched.
        assert_eq!(registry.lookup("a"), Some(ActorId::from_raw(1)));
    }

    #[test]
    fn test_unregister_frees_name() {
        let registry = Registry::new();
        let id = ActorId::from_raw(3);
        registry.register("tmp", id).unwrap();
        registry.unregister(id);

        assert_eq!(registry.lookup("tmp"), None);
        assert!(registry.name_of(id).is_none());

        // Name can be reused after unregistration.
        registry.register("tmp", ActorId::from_raw(4)).unwrap();
    }

    #[test]
    fn test_counters() {
        let registry = Registry::new();
        registry.register("a", ActorId::from_raw(1)).unwrap();
        registry.register("b", ActorId::from_raw(2)).unwrap();
        registry.unregister(ActorId::from_raw(1));

        assert_eq!(registry.registered_total(), 2);
        assert_eq!(registry.unregistered_total(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = Registry::new();
        registry.unregister(ActorId::from_raw(99));
        assert_eq!(registry.unregistered_total(), 0);
    }

    #[test]
    fn test_groups() {
        let registry = Registry::new();
        let gid = GroupId::from_raw(1);
        registry.register_group("pool", gid).unwrap();

        assert_eq!(registry.lookup_group("pool"), Some(gid));
        assert!(registry.register_group("pool", GroupId::from_raw(2)).is_err());
        assert_eq!(registry.lookup_group("missing"), None);
    }
}
