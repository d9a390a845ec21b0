//! GUID route handlers, shared by the friendly and API mounts.

use axum::{
    extract::{MatchedPath, Path, State},
    http::Uri,
    response::Response,
};

use crate::guid::path_tail;
use crate::http::error::ApiError;
use crate::http::response::resolution_response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `/{guid}/` and `/api/v1/{guid}/`.
pub async fn resolve_guid(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    uri: Uri,
) -> Result<Response, ApiError> {
    resolve(&state, uri.path(), &guid, None)
}

/// `/{guid}/{*suffix}` and `/api/v1/{guid}/{*suffix}`.
///
/// The suffix is taken from the raw path, not the decoded capture, so it
/// keeps its percent-encoding in the redirect or rewrite target.
pub async fn resolve_guid_with_suffix(
    State(state): State<AppState>,
    Path((guid, suffix)): Path<(String, String)>,
    matched: MatchedPath,
    uri: Uri,
) -> Result<Response, ApiError> {
    let leading = matched
        .as_str()
        .split('/')
        .filter(|s| !s.is_empty())
        .count()
        .saturating_sub(1);
    let raw_suffix = path_tail(uri.path(), leading).unwrap_or(&suffix);
    resolve(&state, uri.path(), &guid, Some(raw_suffix))
}

fn resolve(
    state: &AppState,
    path: &str,
    guid: &str,
    suffix: Option<&str>,
) -> Result<Response, ApiError> {
    let outcome = state.resolver.resolve(path, guid, suffix);
    metrics::record_resolution(&outcome);

    let resolution = outcome?;
    tracing::debug!(guid = %guid, outcome = ?resolution, "GUID resolved");
    Ok(resolution_response(resolution, state.redirect_status()))
}
