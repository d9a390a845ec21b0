//! Entity kinds held by the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::referent::{RedirectMode, Referent};

/// Discriminant for the entity kinds a GUID can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    User,
    File,
}

/// Weak reference to an entity: kind plus primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.id)
    }
}

/// A project or component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_registration: bool,
    /// User ids allowed to edit and view the node.
    #[serde(default)]
    pub contributors: Vec<String>,
    /// Log ids, oldest first.
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default = "proxy_mode")]
    pub redirect_mode: RedirectMode,
}

fn default_category() -> String {
    "project".to_string()
}

fn proxy_mode() -> RedirectMode {
    RedirectMode::Proxy
}

impl Node {
    pub fn api_url(&self) -> String {
        format!("/api/v1/project/{}/", self.id)
    }

    pub fn is_contributor(&self, user_id: &str) -> bool {
        self.contributors.iter().any(|c| c == user_id)
    }

    /// Public nodes are visible to everyone, private ones to contributors.
    pub fn can_view(&self, user_id: Option<&str>) -> bool {
        self.is_public || user_id.is_some_and(|u| self.is_contributor(u))
    }
}

impl Referent for Node {
    fn redirect_mode(&self) -> RedirectMode {
        self.redirect_mode
    }

    fn url(&self) -> String {
        format!("/{}/", self.id)
    }

    fn deep_url(&self) -> String {
        format!("/project/{}/", self.id)
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub fullname: String,
    /// Log ids of the user's watch feed, most recent first.
    #[serde(default)]
    pub watched_logs: Vec<String>,
    #[serde(default)]
    pub redirect_mode: RedirectMode,
}

impl Referent for UserProfile {
    fn redirect_mode(&self) -> RedirectMode {
        self.redirect_mode
    }

    fn url(&self) -> String {
        format!("/profile/{}/", self.id)
    }

    fn deep_url(&self) -> String {
        format!("/profile/{}/", self.id)
    }
}

/// A file stored on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub node_id: String,
    pub name: String,
}

impl Referent for StoredFile {
    fn redirect_mode(&self) -> RedirectMode {
        RedirectMode::Redirect
    }

    fn url(&self) -> String {
        format!("/project/{}/files/{}/", self.node_id, self.name)
    }

    fn deep_url(&self) -> String {
        self.url()
    }
}

/// An entry in a node's activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLog {
    pub id: String,
    pub node_id: String,
    pub action: String,
    /// Id of the acting user.
    pub user: String,
    pub date: DateTime<Utc>,
}

/// Tagged union of every addressable entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Node(Node),
    User(UserProfile),
    File(StoredFile),
}

impl Entity {
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            Entity::Node(n) => EntityRef::new(EntityKind::Node, &n.id),
            Entity::User(u) => EntityRef::new(EntityKind::User, &u.id),
            Entity::File(f) => EntityRef::new(EntityKind::File, &f.id),
        }
    }

    fn as_referent(&self) -> &dyn Referent {
        match self {
            Entity::Node(n) => n,
            Entity::User(u) => u,
            Entity::File(f) => f,
        }
    }
}

impl Referent for Entity {
    fn redirect_mode(&self) -> RedirectMode {
        self.as_referent().redirect_mode()
    }

    fn url(&self) -> String {
        self.as_referent().url()
    }

    fn deep_url(&self) -> String {
        self.as_referent().deep_url()
    }
}
