//! Route definitions.
//!
//! A [`Route`] pairs a method and path with a default axum handler and the
//! route's optional negotiation mapping.

use std::collections::HashSet;

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{on, MethodFilter, MethodRouter};

use crate::negotiation::error::RegistryError;
use crate::negotiation::handler::Handlers;
use crate::negotiation::registry::NegotiationMapping;

/// A route awaiting registration.
#[derive(Debug)]
pub struct Route {
    pub(crate) id: Option<String>,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: MethodRouter,
    pub(crate) negotiate: Option<NegotiationMapping>,
}

impl Route {
    /// Route for an arbitrary method.
    pub fn new<H, T>(method: Method, path: impl Into<String>, handler: H) -> Result<Self, RegistryError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RegistryError::InvalidMethod(method.to_string()))?;
        Ok(Self::with_filter(method, filter, path, handler))
    }

    /// `GET` route.
    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::with_filter(Method::GET, MethodFilter::GET, path, handler)
    }

    /// `POST` route.
    pub fn post<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::with_filter(Method::POST, MethodFilter::POST, path, handler)
    }

    /// `PUT` route.
    pub fn put<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::with_filter(Method::PUT, MethodFilter::PUT, path, handler)
    }

    /// `DELETE` route.
    pub fn delete<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::with_filter(Method::DELETE, MethodFilter::DELETE, path, handler)
    }

    fn with_filter<H, T>(method: Method, filter: MethodFilter, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            id: None,
            method,
            path: path.into(),
            handler: on(filter, handler),
            negotiate: None,
        }
    }

    /// Identifier used by [`App::negotiate`](crate::http::App::negotiate).
    /// Defaults to `"{METHOD} {path}"`.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Declare a static handler map for this route.
    pub fn negotiate(mut self, handlers: Handlers) -> Self {
        self.negotiate = Some(NegotiationMapping::Static(handlers));
        self
    }

    /// Declare a handler map computed from each request.
    pub fn negotiate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&axum::http::Request<()>) -> Handlers + Send + Sync + 'static,
    {
        self.negotiate = Some(NegotiationMapping::computed(f));
        self
    }

    /// The route's id, explicit or derived from method and path.
    pub fn route_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}

/// Validate `path` against axum's route syntax and return its shape.
///
/// The shape replaces `{name}` with `{}` and `{*name}` with `{*}`, so two
/// paths with the same shape match the same requests. Captures must span a
/// whole segment; a catch-all must be the last one.
pub(crate) fn path_shape(path: &str) -> Result<String, RegistryError> {
    let invalid = |reason| RegistryError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let Some(rest) = path.strip_prefix('/') else {
        return Err(invalid("paths must start with '/'"));
    };

    let segments: Vec<&str> = rest.split('/').collect();
    let mut names = HashSet::new();
    let mut shape = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let capture = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'));

        let Some(capture) = capture else {
            if segment.starts_with(':') {
                return Err(invalid("captures are written `{name}`, not `:name`"));
            }
            if segment.contains(['{', '}', '*']) {
                return Err(invalid("captures must span a whole segment"));
            }
            shape.push(*segment);
            continue;
        };

        let (name, catch_all) = match capture.strip_prefix('*') {
            Some(name) => (name, true),
            None => (capture, false),
        };
        if name.is_empty() || name.contains(['{', '}', '*']) {
            return Err(invalid("capture names must be non-empty identifiers"));
        }
        if catch_all && i + 1 != segments.len() {
            return Err(invalid("a catch-all capture must be the last segment"));
        }
        if !names.insert(name) {
            return Err(invalid("capture names must be unique"));
        }
        shape.push(if catch_all { "{*}" } else { "{}" });
    }

    Ok(format!("/{}", shape.join("/")))
}
