//! Comment handlers, addressed by GUID or by project id.

use axum::{
    extract::{FromRequest, Path, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::registry::{
    Comment, CommentPayload, EntityKind, EntityRef, IdentifierStore, RegistrySnapshot,
};
use crate::security::CurrentUser;

const DATE_FORMAT: &str = "%Y/%m/%d %I:%M %p";

#[derive(Debug, Serialize)]
pub struct RenderedComment {
    pub payload: CommentPayload,
    pub user_fullname: String,
    pub date: String,
    pub comment_id: String,
}

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<RenderedComment>,
}

fn render(snapshot: &RegistrySnapshot, comment: Comment) -> RenderedComment {
    let user_fullname = snapshot
        .user(&comment.user)
        .map(|u| u.fullname.clone())
        .unwrap_or(comment.user);
    RenderedComment {
        payload: comment.payload,
        user_fullname,
        date: comment.date.format(DATE_FORMAT).to_string(),
        comment_id: comment.id,
    }
}

/// Comment payload posted either as a form or as JSON.
#[derive(Debug)]
pub struct CommentBody(pub CommentPayload);

impl<S> FromRequest<S> for CommentBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let payload = if is_json {
            let Json(payload) = Json::<CommentPayload>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            payload
        } else {
            let Form(payload) = Form::<CommentPayload>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            payload
        };
        Ok(CommentBody(payload))
    }
}

/// The entity a GUID designates. Exact key only, no case fallback.
fn guid_target(state: &AppState, guid: &str) -> Result<EntityRef, ApiError> {
    let record = state
        .registry
        .lookup(guid)
        .ok_or_else(|| ApiError::NotFound(format!("GUID '{}' not found", guid)))?;
    if record.referent().is_none() {
        tracing::error!(guid = %guid, target = %record.target, "Referent of GUID not found");
        return Err(ApiError::NotFound(format!("GUID '{}' not found", guid)));
    }
    Ok(record.target)
}

fn list(state: &AppState, target: &EntityRef) -> CommentList {
    let snapshot = state.registry.snapshot();
    let comments = state
        .comments
        .comments_on(target)
        .into_iter()
        .map(|c| render(&snapshot, c))
        .collect();
    CommentList { comments }
}

/// `GET /api/v1/{guid}/comments/`.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<CommentList>, ApiError> {
    let target = guid_target(&state, &guid)?;
    Ok(Json(list(&state, &target)))
}

/// `POST /api/v1/{guid}/comments/` with `comment` and `rating`, as a form or JSON.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    CurrentUser(user): CurrentUser,
    CommentBody(payload): CommentBody,
) -> Result<(StatusCode, Json<RenderedComment>), ApiError> {
    if payload.comment.as_deref().map_or(true, |c| c.trim().is_empty()) {
        return Err(ApiError::BadRequest("comment is required".to_string()));
    }
    let target = guid_target(&state, &guid)?;

    let comment = state.comments.add(target, &user.user_id, payload);
    tracing::info!(guid = %guid, comment_id = %comment.id, user_id = %user.user_id, "Comment added");

    let snapshot = state.registry.snapshot();
    Ok((StatusCode::CREATED, Json(render(&snapshot, comment))))
}

/// `GET /api/v1/project/{pid}/comments/`.
pub async fn project_comments(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<Json<CommentList>, ApiError> {
    if state.registry.snapshot().node(&pid).is_none() {
        return Err(ApiError::NotFound(format!("project '{}'", pid)));
    }
    let target = EntityRef::new(EntityKind::Node, pid);
    Ok(Json(list(&state, &target)))
}
