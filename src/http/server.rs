//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, session)
//! - Wrap the router in the internal rewrite service
//! - Apply registry reloads while serving
//! - Bind server to listener with graceful shutdown

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestId, SetRequestId},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::guid::GuidResolver;
use crate::http::handlers::{comments, dashboard, forms, guid, views};
use crate::http::request::{
    propagate_request_id_layer, request_id, set_request_id_layer, MakeRequestUuid,
};
use crate::http::rewrite::{InternalRewriteLayer, InternalRewriteService};
use crate::registry::{CommentStore, Registry, RegistrySnapshot};
use crate::security::{security_headers, session_middleware};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub resolver: Arc<GuidResolver<Registry>>,
    pub comments: CommentStore,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(config: GatewayConfig, registry: Registry, comments: CommentStore) -> Self {
        Self {
            resolver: Arc::new(GuidResolver::new(registry.clone())),
            registry,
            comments,
            config: Arc::new(config),
        }
    }

    /// Status used for GUID and fixed redirects.
    pub fn redirect_status(&self) -> StatusCode {
        StatusCode::from_u16(self.config.guid.redirect_status)
            .ok()
            .filter(StatusCode::is_redirection)
            .unwrap_or(StatusCode::FOUND)
    }
}

/// The full request pipeline: request ID, internal rewrites, router.
pub type GatewayService =
    SetRequestId<PropagateRequestId<InternalRewriteService<Router>>, MakeRequestUuid>;

/// HTTP server for the gateway.
pub struct HttpServer {
    service: GatewayService,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server over the given registry and comment store.
    pub fn new(config: GatewayConfig, registry: Registry, comments: CommentStore) -> Self {
        let state = AppState::new(config, registry, comments);
        let router = Self::build_router(&state);

        let service = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(InternalRewriteLayer::new(
                state.config.guid.max_internal_rewrites,
                state.config.security.max_body_size,
            ))
            .service(router);

        Self { service, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: &AppState) -> Router {
        let config = &state.config;

        let router = Router::new()
            .route("/healthz", get(views::health))
            .route("/dashboard/", get(dashboard::dashboard))
            .route("/reproducibility/", get(dashboard::reproducibility))
            // Entity views (GUID targets)
            .route("/project/{pid}/", get(views::project))
            .route("/project/{pid}/files/{name}/", get(views::project_file))
            .route("/project/{pid}/{*page}", get(views::project_page))
            .route("/profile/{uid}/", get(views::profile))
            // API
            .route("/api/v1/dashboard/get_nodes/", get(dashboard::dashboard_nodes))
            .route("/api/v1/watched/logs/", get(dashboard::watched_logs))
            .route("/api/v1/forms/{name}/", get(forms::get_form))
            .route("/api/v1/comments/schema/", get(forms::comment_schema))
            .route("/api/v1/project/{pid}/", get(views::project))
            .route("/api/v1/project/{pid}/comments/", get(comments::project_comments))
            .route(
                "/api/v1/{guid}/comments/",
                get(comments::list_comments).post(comments::add_comment),
            )
            // GUIDs, API mount
            .route("/api/v1/{guid}", any(guid::resolve_guid))
            .route("/api/v1/{guid}/", any(guid::resolve_guid))
            .route("/api/v1/{guid}/{*suffix}", any(guid::resolve_guid_with_suffix))
            // GUIDs, friendly mount
            .route("/{guid}", any(guid::resolve_guid))
            .route("/{guid}/", any(guid::resolve_guid))
            .route("/{guid}/{*suffix}", any(guid::resolve_guid_with_suffix))
            .layer(middleware::from_fn_with_state(
                state.registry.clone(),
                session_middleware,
            ))
            .with_state(state.clone())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size));

        let router = if config.security.enable_headers {
            security_headers(router)
        } else {
            router
        };

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
    }

    /// The request pipeline, for serving or driving directly in tests.
    pub fn service(&self) -> GatewayService {
        self.service.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Snapshots received on `registry_updates` replace the live registry.
    pub async fn run(
        self,
        listener: TcpListener,
        mut registry_updates: mpsc::UnboundedReceiver<RegistrySnapshot>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let registry = self.state.registry.clone();
        let mut updates_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(snapshot) = registry_updates.recv() => registry.replace(snapshot),
                    _ = updates_shutdown.recv() => break,
                }
            }
        });

        let app = axum::ServiceExt::<Request>::into_make_service(self.service);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
