//! Registry subsystem: entities, GUID records and annotations.
//!
//! # Data Flow
//! ```text
//! registry seed (JSON)
//!     → loader.rs (parse, register entity ids as GUIDs)
//!     → store.rs (immutable RegistrySnapshot)
//!     → Registry (ArcSwap handle shared with handlers and the resolver)
//!
//! On seed change:
//!     watcher.rs detects change
//!     → loader.rs builds a new snapshot
//!     → server swaps it into the Registry
//! ```
//!
//! # Design Decisions
//! - The resolver only sees `IdentifierStore` and `Referent`
//! - GUID records hold weak references; entities may be missing
//! - Comments are mutable and live outside the snapshot

pub mod comments;
pub mod entities;
pub mod loader;
pub mod referent;
pub mod store;
pub mod watcher;

pub use comments::{Comment, CommentPayload, CommentStore};
pub use entities::{Entity, EntityKind, EntityRef, Node, NodeLog, StoredFile, UserProfile};
pub use loader::{load_registry, load_snapshot, RegistryError, SeedData};
pub use referent::{RedirectMode, Referent};
pub use store::{IdentifierRecord, IdentifierStore, Registry, RegistrySnapshot};
pub use watcher::SeedWatcher;
