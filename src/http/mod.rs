//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (assign request ID, propagate it)
//!     → rewrite.rs (buffer body, follow internal rewrites)
//!     → server.rs (Axum router, middleware)
//!     → handlers/ (GUID resolution, entity views, API)
//!     → response.rs (redirects, rewrite markers)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod rewrite;
pub mod server;

pub use error::ApiError;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use rewrite::{InternalRewrite, InternalRewriteLayer};
pub use server::{AppState, GatewayService, HttpServer};
