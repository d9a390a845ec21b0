//! Collaboration platform gateway: GUID resolution and entity views.

pub mod config;
pub mod guid;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod security;

pub use config::GatewayConfig;
pub use guid::{GuidResolver, Resolution, ResolveError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::{CommentStore, Registry};
