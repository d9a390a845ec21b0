//! GUID resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Request path + identifier token (+ optional suffix)
//!     → url.rs (recover routing prefix)
//!     → resolver.rs (lookup, mode decision, case fallback)
//!     → url.rs (build target path)
//!     → Return: Redirect(path) | Proxy(path) | NotFound
//! ```
//!
//! # Design Decisions
//! - Store injected as `IdentifierStore`, never a global table
//! - Not-found is an explicit error value
//! - No I/O beyond the store lookup

pub mod resolver;
pub mod url;

pub use resolver::{GuidResolver, Resolution, ResolveError};
pub use url::{build_guid_url, path_tail};
