//! Error types for route registration and per-response negotiation.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while declaring routes or merging handlers into them.
///
/// These are configuration bugs: they surface synchronously to the caller
/// and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No route with id {0}")]
    RouteNotFound(String),

    #[error("Route {0} uses a computed negotiation mapping; handlers cannot be merged into it")]
    ComputedMapping(String),

    #[error("Invalid media type {media_type:?} for route {route}")]
    InvalidMediaType { route: String, media_type: String },

    #[error("Route {0} is already registered")]
    DuplicateRoute(String),

    #[error("Unsupported method {0}")]
    InvalidMethod(String),

    #[error("Invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Route path {path:?} conflicts with {existing:?}")]
    ConflictingPath { path: String, existing: String },
}

/// Errors raised while negotiating a single response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// No offered media type satisfied the request's `Accept` header.
    #[error("{message}: none of [{}] is acceptable", .offered.join(", "))]
    NotAcceptable {
        offered: Vec<String>,
        message: String,
    },
}

impl IntoResponse for NegotiationError {
    fn into_response(self) -> Response {
        let status = match &self {
            NegotiationError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
        };
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
