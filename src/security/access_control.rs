//! Session middleware and login extractor.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::http::error::ApiError;
use crate::registry::Registry;

/// Header carrying the authenticated user id, set by the auth frontend.
pub const X_USER_ID: &str = "x-user-id";

/// Context attached to requests from known users.
#[derive(Clone, Debug)]
pub struct UserContext {
    pub user_id: String,
}

pub async fn session_middleware(
    State(registry): State<Registry>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = req
        .headers()
        .get(X_USER_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let Some(user_id) = user_id {
        let snapshot = registry.snapshot();
        match snapshot.user(&user_id) {
            Some(user) => {
                let ctx = UserContext {
                    user_id: user.id.clone(),
                };
                req.extensions_mut().insert(ctx);
            }
            None => {
                tracing::warn!(user_id = %user_id, "Unknown user id, treating as anonymous");
            }
        }
    }

    next.run(req).await
}

/// Extractor for handlers that require a logged-in user.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for handlers that behave differently for known users.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<UserContext>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<UserContext>().cloned()))
    }
}
