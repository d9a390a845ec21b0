//! Request handlers.
//!
//! - guid.rs: GUID resolution (friendly and API mounts)
//! - views.rs: entity views that GUIDs resolve to
//! - comments.rs: comment listing and posting
//! - dashboard.rs: dashboard data and fixed redirects
//! - forms.rs: form schemas

pub mod comments;
pub mod dashboard;
pub mod forms;
pub mod guid;
pub mod views;
