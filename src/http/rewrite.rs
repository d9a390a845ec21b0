//! Internal rewrites for proxied GUIDs.
//!
//! # Responsibilities
//! - Detect the rewrite marker on a response
//! - Re-dispatch the same request (method, headers, body) to the new path
//! - Bound chained rewrites
//! - Record per-request metrics once, after the final hop
//!
//! # Design Decisions
//! - Wraps the whole router, so a rewrite goes through normal routing
//! - The body is buffered once so it can be replayed on every hop
//! - The query string of the original request is kept

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service, ServiceExt};

use crate::observability::metrics;

/// Response extension asking for the request to be served from `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalRewrite {
    pub path: String,
}

impl InternalRewrite {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl IntoResponse for InternalRewrite {
    fn into_response(self) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Layer producing [`InternalRewriteService`].
#[derive(Debug, Clone)]
pub struct InternalRewriteLayer {
    max_rewrites: u32,
    max_body_size: usize,
}

impl InternalRewriteLayer {
    pub fn new(max_rewrites: u32, max_body_size: usize) -> Self {
        Self {
            max_rewrites,
            max_body_size,
        }
    }
}

impl<S> Layer<S> for InternalRewriteLayer {
    type Service = InternalRewriteService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InternalRewriteService {
            inner,
            max_rewrites: self.max_rewrites,
            max_body_size: self.max_body_size,
        }
    }
}

/// Re-dispatches requests whose response carries an [`InternalRewrite`].
#[derive(Debug, Clone)]
pub struct InternalRewriteService<S> {
    inner: S,
    max_rewrites: u32,
    max_body_size: usize,
}

/// The parts of a request replayed on each hop.
struct ReplayableRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl ReplayableRequest {
    fn build(&self) -> Request<Body> {
        let mut req = Request::new(Body::from(self.body.clone()));
        *req.method_mut() = self.method.clone();
        *req.uri_mut() = self.uri.clone();
        *req.version_mut() = self.version;
        *req.headers_mut() = self.headers.clone();
        req
    }

    /// Point the request at `path`, keeping the original query string.
    fn retarget(&mut self, path: &str) -> Result<(), axum::http::uri::InvalidUri> {
        let target = match self.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };
        self.uri = target.parse()?;
        Ok(())
    }
}

impl<S> Service<Request<Body>> for InternalRewriteService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let max_rewrites = self.max_rewrites;
        let max_body_size = self.max_body_size;

        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let response = dispatch(inner, request, max_rewrites, max_body_size).await;
            metrics::record_request(&method, response.status().as_u16(), start);
            Ok(response)
        })
    }
}

async fn dispatch<S>(
    mut inner: S,
    request: Request<Body>,
    max_rewrites: u32,
    max_body_size: usize,
) -> Response
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
{
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, max_body_size).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };
    let mut replay = ReplayableRequest {
        method: parts.method,
        uri: parts.uri,
        version: parts.version,
        headers: parts.headers,
        body,
    };

    let mut rewrites = 0;
    loop {
        let response = match inner.ready().await {
            Ok(svc) => match svc.call(replay.build()).await {
                Ok(response) => response,
                Err(never) => match never {},
            },
            Err(never) => match never {},
        };

        let Some(rewrite) = response.extensions().get::<InternalRewrite>().cloned() else {
            return response;
        };

        if rewrites == max_rewrites {
            tracing::warn!(
                path = %replay.uri.path(),
                target = %rewrite.path,
                limit = max_rewrites,
                "Internal rewrite limit exceeded"
            );
            return (StatusCode::LOOP_DETECTED, "Too many internal rewrites").into_response();
        }
        rewrites += 1;

        tracing::debug!(from = %replay.uri.path(), to = %rewrite.path, "Internal rewrite");
        if let Err(e) = replay.retarget(&rewrite.path) {
            tracing::error!(target = %rewrite.path, error = %e, "Invalid internal rewrite target");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        metrics::record_rewrite();
    }
}
