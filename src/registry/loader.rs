//! Registry seed loading from disk.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

use crate::registry::comments::{Comment, CommentStore};
use crate::registry::entities::{Entity, EntityRef, Node, NodeLog, StoredFile, UserProfile};
use crate::registry::store::RegistrySnapshot;

/// Error type for seed loading.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An explicit GUID alias, e.g. `{"key": "EZcUj", "kind": "node", "id": "p1"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuidSeed {
    pub key: String,
    #[serde(flatten)]
    pub target: EntityRef,
}

/// On-disk registry contents (JSON).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub users: Vec<UserProfile>,
    pub nodes: Vec<Node>,
    pub files: Vec<StoredFile>,
    pub logs: Vec<NodeLog>,
    pub guids: Vec<GuidSeed>,
    pub comments: Vec<Comment>,
}

impl SeedData {
    /// Build a snapshot. Every entity is addressable by its own id; explicit
    /// GUIDs are added on top and may point at missing entities.
    pub fn into_snapshot(self) -> (RegistrySnapshot, Vec<Comment>) {
        let mut snapshot = RegistrySnapshot::new();

        let entities = self
            .users
            .into_iter()
            .map(Entity::User)
            .chain(self.nodes.into_iter().map(Entity::Node))
            .chain(self.files.into_iter().map(Entity::File));
        for entity in entities {
            let target = entity.entity_ref();
            snapshot.insert_guid(target.id.clone(), target);
            snapshot.insert_entity(entity);
        }

        for guid in self.guids {
            snapshot.insert_guid(guid.key, guid.target);
        }
        for log in self.logs {
            snapshot.insert_log(log);
        }

        for key in snapshot.dangling_guids() {
            tracing::warn!(guid = %key, "GUID points at a missing entity");
        }

        (snapshot, self.comments)
    }
}

/// Read and parse a seed file.
pub fn load_seed(path: &Path) -> Result<SeedData, RegistryError> {
    let file = File::open(path)?;
    let seed = serde_json::from_reader(BufReader::new(file))?;
    Ok(seed)
}

/// Load a seed file straight into a snapshot, discarding seeded comments.
pub fn load_snapshot(path: &Path) -> Result<RegistrySnapshot, RegistryError> {
    let (snapshot, _) = load_seed(path)?.into_snapshot();
    Ok(snapshot)
}

/// Load a seed file into a snapshot and a populated comment store.
pub fn load_registry(path: &Path) -> Result<(RegistrySnapshot, CommentStore), RegistryError> {
    let (snapshot, comments) = load_seed(path)?.into_snapshot();
    let store = CommentStore::new();
    for comment in comments {
        store.insert(comment);
    }
    tracing::info!(
        path = ?path,
        guids = snapshot.guid_count(),
        comments = store.count(),
        "Registry seed loaded"
    );
    Ok((snapshot, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entities::EntityKind;
    use crate::registry::store::IdentifierStore;
    use std::io::Write;

    const SEED: &str = r#"{
        "users": [{"id": "u1", "fullname": "Ada Lovelace"}],
        "nodes": [{"id": "abc12", "title": "Replication", "contributors": ["u1"]}],
        "files": [{"id": "f1x9q", "node_id": "abc12", "name": "data.csv"}],
        "guids": [
            {"key": "EZcUj", "kind": "node", "id": "abc12"},
            {"key": "lost1", "kind": "node", "id": "nope"}
        ],
        "comments": [{
            "id": "c1",
            "target": {"kind": "node", "id": "abc12"},
            "user": "u1",
            "payload": {"comment": "hi"},
            "date": "2014-03-01T10:15:00Z"
        }]
    }"#;

    #[test]
    fn test_load_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let (snapshot, comments) = load_registry(file.path()).unwrap();

        assert!(snapshot.lookup("abc12").unwrap().referent().is_some());
        assert!(snapshot.lookup("u1").is_some());
        assert!(snapshot.lookup("f1x9q").is_some());
        assert_eq!(
            snapshot.lookup("EZcUj").unwrap().target,
            EntityRef::new(EntityKind::Node, "abc12")
        );
        assert!(snapshot.lookup("lost1").unwrap().referent().is_none());
        assert_eq!(comments.count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_snapshot(Path::new("/nonexistent/registry.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Io(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }
}
