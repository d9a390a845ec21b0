//! Entity views. These are the targets GUIDs proxy and redirect to.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::registry::{Node, Referent, RegistrySnapshot};
use crate::security::{MaybeUser, UserContext};

/// Short node rendering used by listings.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub url: String,
    pub api_url: String,
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            url: node.url(),
            api_url: node.api_url(),
        }
    }
}

/// A node visible to the requester, or the matching error.
fn visible_node<'a>(
    snapshot: &'a RegistrySnapshot,
    pid: &str,
    user: Option<&UserContext>,
) -> Result<&'a Node, ApiError> {
    let node = snapshot
        .node(pid)
        .filter(|n| !n.is_deleted)
        .ok_or_else(|| ApiError::NotFound(format!("project '{}'", pid)))?;
    if !node.can_view(user.map(|u| u.user_id.as_str())) {
        return Err(ApiError::Forbidden);
    }
    Ok(node)
}

fn node_detail(snapshot: &RegistrySnapshot, node: &Node) -> Value {
    let contributors: Vec<Value> = node
        .contributors
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "fullname": snapshot.user(id).map(|u| u.fullname.as_str()),
            })
        })
        .collect();

    json!({
        "id": node.id,
        "title": node.title,
        "category": node.category,
        "url": node.url(),
        "api_url": node.api_url(),
        "is_public": node.is_public,
        "is_registration": node.is_registration,
        "contributors": contributors,
        "log_count": node.logs.len(),
    })
}

/// `/project/{pid}/` and `/api/v1/project/{pid}/`.
pub async fn project(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.registry.snapshot();
    let node = visible_node(&snapshot, &pid, user.as_ref())?;
    Ok(Json(node_detail(&snapshot, node)))
}

/// `/project/{pid}/{*page}`: a named page of a node.
pub async fn project_page(
    State(state): State<AppState>,
    Path((pid, page)): Path<(String, String)>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.registry.snapshot();
    let node = visible_node(&snapshot, &pid, user.as_ref())?;
    Ok(Json(json!({
        "node": NodeSummary::from(node),
        "page": page.trim_end_matches('/'),
    })))
}

/// `/project/{pid}/files/{name}/`.
pub async fn project_file(
    State(state): State<AppState>,
    Path((pid, name)): Path<(String, String)>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.registry.snapshot();
    let node = visible_node(&snapshot, &pid, user.as_ref())?;
    let file = snapshot
        .file_on(&node.id, &name)
        .ok_or_else(|| ApiError::NotFound(format!("file '{}'", name)))?;
    Ok(Json(json!({
        "id": file.id,
        "name": file.name,
        "node": NodeSummary::from(node),
        "url": file.url(),
    })))
}

/// `/profile/{uid}/`.
pub async fn profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.registry.snapshot();
    let user = snapshot
        .user(&uid)
        .ok_or_else(|| ApiError::NotFound(format!("user '{}'", uid)))?;
    let mut projects: Vec<NodeSummary> = snapshot
        .nodes()
        .filter(|n| n.is_public && !n.is_deleted && n.is_contributor(&user.id))
        .map(NodeSummary::from)
        .collect();
    projects.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(json!({
        "id": user.id,
        "fullname": user.fullname,
        "url": user.url(),
        "public_projects": projects,
    })))
}

/// `/healthz`.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.registry.snapshot();
    Json(json!({
        "status": "ok",
        "guids": snapshot.guid_count(),
    }))
}
