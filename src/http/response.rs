//! Response construction for GUID outcomes.
//!
//! # Responsibilities
//! - Turn a `Resolution` into a redirect or an internal rewrite marker
//! - Build plain redirects for fixed routes
//!
//! # Design Decisions
//! - Redirect status is configurable but always a 3xx
//! - Proxy outcomes never reach the client; `rewrite.rs` consumes the marker

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::guid::Resolution;
use crate::http::rewrite::InternalRewrite;

/// Redirect to `location` with the given status.
pub fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location = %location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Map a resolution to the response the HTTP layer sends (or re-dispatches).
pub fn resolution_response(resolution: Resolution, redirect_status: StatusCode) -> Response {
    match resolution {
        Resolution::Redirect(path) => redirect(redirect_status, &path),
        Resolution::Proxy(path) => InternalRewrite::new(path).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_response() {
        let res = resolution_response(
            Resolution::Redirect("/abc12/".to_string()),
            StatusCode::FOUND,
        );
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/abc12/");
        assert!(res.extensions().get::<InternalRewrite>().is_none());
    }

    #[test]
    fn test_proxy_response_carries_marker() {
        let res = resolution_response(
            Resolution::Proxy("/project/abc12/".to_string()),
            StatusCode::FOUND,
        );
        assert!(res.headers().get(header::LOCATION).is_none());
        let marker = res.extensions().get::<InternalRewrite>().unwrap();
        assert_eq!(marker.path, "/project/abc12/");
    }
}
