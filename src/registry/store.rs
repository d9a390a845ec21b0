//! Identifier store and registry snapshots.
//!
//! # Responsibilities
//! - Map GUID keys to entity references
//! - Resolve entity references against the entity table at lookup time
//! - Publish whole snapshots atomically on reload
//!
//! # Design Decisions
//! - Snapshots are immutable; a reload builds a new one and swaps the `Arc`
//! - A GUID whose entity is missing still yields a record, with no referent

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::entities::{
    Entity, EntityKind, EntityRef, Node, NodeLog, StoredFile, UserProfile,
};
use crate::registry::referent::Referent;

/// A GUID record as seen by the resolver.
#[derive(Debug, Clone)]
pub struct IdentifierRecord {
    pub key: String,
    pub target: EntityRef,
    referent: Option<Arc<dyn Referent>>,
}

impl IdentifierRecord {
    pub fn new(
        key: impl Into<String>,
        target: EntityRef,
        referent: Option<Arc<dyn Referent>>,
    ) -> Self {
        Self {
            key: key.into(),
            target,
            referent,
        }
    }

    /// The designated entity, if it still exists.
    pub fn referent(&self) -> Option<&dyn Referent> {
        self.referent.as_deref()
    }
}

/// Read-only, case-sensitive GUID lookup.
pub trait IdentifierStore: Send + Sync {
    fn lookup(&self, key: &str) -> Option<IdentifierRecord>;
}

impl<T: IdentifierStore + ?Sized> IdentifierStore for Arc<T> {
    fn lookup(&self, key: &str) -> Option<IdentifierRecord> {
        (**self).lookup(key)
    }
}

/// Immutable view of every entity and GUID.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    guids: HashMap<String, EntityRef>,
    entities: HashMap<EntityRef, Arc<Entity>>,
    logs: HashMap<String, NodeLog>,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.entity_ref(), Arc::new(entity));
    }

    pub fn insert_guid(&mut self, key: impl Into<String>, target: EntityRef) {
        self.guids.insert(key.into(), target);
    }

    pub fn insert_log(&mut self, log: NodeLog) {
        self.logs.insert(log.id.clone(), log);
    }

    pub fn entity(&self, target: &EntityRef) -> Option<&Arc<Entity>> {
        self.entities.get(target)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        match self.entity(&EntityRef::new(EntityKind::Node, id))?.as_ref() {
            Entity::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn user(&self, id: &str) -> Option<&UserProfile> {
        match self.entity(&EntityRef::new(EntityKind::User, id))?.as_ref() {
            Entity::User(u) => Some(u),
            _ => None,
        }
    }

    /// The file called `name` stored on node `node_id`.
    pub fn file_on(&self, node_id: &str, name: &str) -> Option<&StoredFile> {
        self.entities.values().find_map(|e| match e.as_ref() {
            Entity::File(f) if f.node_id == node_id && f.name == name => Some(f),
            _ => None,
        })
    }

    pub fn log(&self, id: &str) -> Option<&NodeLog> {
        self.logs.get(id)
    }

    /// Logs of a node, oldest first. Unknown log ids are skipped.
    pub fn node_logs<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a NodeLog> + 'a {
        node.logs.iter().filter_map(|id| self.logs.get(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.entities.values().filter_map(|e| match e.as_ref() {
            Entity::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn guid_count(&self) -> usize {
        self.guids.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// GUID keys whose target is missing from the entity table.
    pub fn dangling_guids(&self) -> Vec<&str> {
        self.guids
            .iter()
            .filter(|(_, target)| !self.entities.contains_key(target))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

impl IdentifierStore for RegistrySnapshot {
    fn lookup(&self, key: &str) -> Option<IdentifierRecord> {
        let target = self.guids.get(key)?;
        Some(IdentifierRecord::new(
            key,
            target.clone(),
            self.entities
                .get(target)
                .map(|e| Arc::clone(e) as Arc<dyn Referent>),
        ))
    }
}

/// Shared, hot-swappable registry handle.
#[derive(Clone, Default)]
pub struct Registry {
    current: Arc<ArcSwap<RegistrySnapshot>>,
}

impl Registry {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Publish a new snapshot. Readers holding the old one are unaffected.
    pub fn replace(&self, snapshot: RegistrySnapshot) {
        tracing::info!(
            guids = snapshot.guid_count(),
            entities = snapshot.entity_count(),
            "Registry snapshot replaced"
        );
        self.current.store(Arc::new(snapshot));
    }
}

impl IdentifierStore for Registry {
    fn lookup(&self, key: &str) -> Option<IdentifierRecord> {
        self.current.load().lookup(key)
    }
}
