//! Security subsystem.
//!
//! # Responsibilities
//! - Attach the requesting user (if any) to each request
//! - Reject anonymous access to login-only handlers
//! - Add hardening headers to responses
//!
//! # Design Decisions
//! - Identity is taken from a trusted upstream header; session
//!   management happens elsewhere
//! - Unknown user ids are treated as anonymous, not as errors

pub mod access_control;
pub mod headers;

pub use access_control::{session_middleware, CurrentUser, MaybeUser, UserContext, X_USER_ID};
pub use headers::security_headers;
