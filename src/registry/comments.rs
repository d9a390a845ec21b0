//! Comment annotations attached to entities.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::registry::entities::EntityRef;

pub const COMMENT_CATEGORY: &str = "comment";

/// Free-form comment body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentPayload {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

/// An annotation on an entity. Only category `comment` is listed as a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub target: EntityRef,
    #[serde(default = "default_category")]
    pub category: String,
    /// Id of the author.
    pub user: String,
    pub payload: CommentPayload,
    pub date: DateTime<Utc>,
}

fn default_category() -> String {
    COMMENT_CATEGORY.to_string()
}

/// Thread-safe annotation store, keyed by target entity.
#[derive(Clone, Default)]
pub struct CommentStore {
    inner: Arc<DashMap<EntityRef, Vec<Comment>>>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, comment: Comment) {
        self.inner
            .entry(comment.target.clone())
            .or_default()
            .push(comment);
    }

    /// Record a new comment authored now.
    pub fn add(&self, target: EntityRef, user: &str, payload: CommentPayload) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4().simple().to_string(),
            target,
            category: default_category(),
            user: user.to_string(),
            payload,
            date: Utc::now(),
        };
        self.insert(comment.clone());
        comment
    }

    /// Comments (category `comment` only) on a target, in insertion order.
    pub fn comments_on(&self, target: &EntityRef) -> Vec<Comment> {
        self.inner
            .get(target)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|c| c.category == COMMENT_CATEGORY)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.inner.iter().map(|e| e.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entities::EntityKind;

    #[test]
    fn test_add_and_list() {
        let store = CommentStore::new();
        let target = EntityRef::new(EntityKind::Node, "abc12");
        let payload = CommentPayload {
            comment: Some("Nice dataset".to_string()),
            rating: Some("5".to_string()),
        };

        let added = store.add(target.clone(), "u1", payload.clone());
        let listed = store.comments_on(&target);

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, added.id);
        assert_eq!(listed[0].payload, payload);
        assert!(store
            .comments_on(&EntityRef::new(EntityKind::Node, "other"))
            .is_empty());
    }

    #[test]
    fn test_other_categories_hidden() {
        let store = CommentStore::new();
        let target = EntityRef::new(EntityKind::File, "f1");
        store.insert(Comment {
            id: "t1".to_string(),
            target: target.clone(),
            category: "tag".to_string(),
            user: "u1".to_string(),
            payload: CommentPayload::default(),
            date: Utc::now(),
        });
        store.add(target.clone(), "u1", CommentPayload::default());

        assert_eq!(store.count(), 2);
        assert_eq!(store.comments_on(&target).len(), 1);
    }
}
