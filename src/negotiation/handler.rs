//! Media type handlers.
//!
//! # Responsibilities
//! - Define the handler abstraction invoked when a media type is selected
//! - Hold a per-route (or per-response) map from media type to handler
//!
//! # Design Decisions
//! - A handler owns the response end-to-end: whatever it returns is sent
//! - Keys are kept verbatim; lookups use the key the matcher returns
//! - Map order is sorted by key so candidate order is deterministic

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use futures_util::future::{BoxFuture, FutureExt};

use crate::negotiation::accept::MediaRange;
use crate::negotiation::error::RegistryError;
use crate::negotiation::matcher::MediaTypeMatcher;

/// Everything a handler gets to build its response.
#[derive(Debug)]
pub struct NegotiationContext {
    request: Request<()>,
    media_type: String,
    tentative: Option<Response>,
}

impl NegotiationContext {
    /// Context for the handler registered under `media_type`.
    pub fn new(request: Request<()>, media_type: impl Into<String>, tentative: Option<Response>) -> Self {
        Self {
            request,
            media_type: media_type.into(),
            tentative,
        }
    }

    /// Request head (method, uri, headers, extensions).
    pub fn request(&self) -> &Request<()> {
        &self.request
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// The media type key that was selected.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The default handler's response. Always `None` for per-response negotiation.
    pub fn tentative(&self) -> Option<&Response> {
        self.tentative.as_ref()
    }

    /// Take ownership of the default handler's response.
    pub fn take_tentative(&mut self) -> Option<Response> {
        self.tentative.take()
    }
}

/// Produces the response for one media type.
pub trait MediaHandler: Send + Sync + 'static {
    /// Build the response for the negotiated media type.
    fn handle(&self, ctx: NegotiationContext) -> BoxFuture<'static, Response>;
}

impl<F, Fut, R> MediaHandler for F
where
    F: Fn(NegotiationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn handle(&self, ctx: NegotiationContext) -> BoxFuture<'static, Response> {
        let fut = self(ctx);
        async move { fut.await.into_response() }.boxed()
    }
}

/// Map from media type to handler.
#[derive(Clone, Default)]
pub struct Handlers {
    entries: BTreeMap<String, Arc<dyn MediaHandler>>,
}

impl Handlers {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a closure handler for `media_type`, replacing any previous one.
    pub fn on<F, Fut, R>(self, media_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(NegotiationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        self.with(media_type, handler)
    }

    /// Add any [`MediaHandler`] for `media_type`, replacing any previous one.
    pub fn with<H: MediaHandler>(mut self, media_type: impl Into<String>, handler: H) -> Self {
        self.insert(media_type, Arc::new(handler));
        self
    }

    /// Insert a shared handler, returning the one it replaced.
    pub fn insert(
        &mut self,
        media_type: impl Into<String>,
        handler: Arc<dyn MediaHandler>,
    ) -> Option<Arc<dyn MediaHandler>> {
        self.entries.insert(media_type.into(), handler)
    }

    /// Handler registered for exactly `media_type`.
    pub fn get(&self, media_type: &str) -> Option<&Arc<dyn MediaHandler>> {
        self.entries.get(media_type)
    }

    /// Whether `media_type` has a handler.
    pub fn contains(&self, media_type: &str) -> bool {
        self.entries.contains_key(media_type)
    }

    /// Offered media types in sorted order.
    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of media types offered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no media type is offered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow merge: entries from `other` overwrite same-key entries here.
    pub fn extend(&mut self, other: Handlers) {
        self.entries.extend(other.entries);
    }

    /// Pick the handler whose media type best satisfies `headers`.
    pub fn select(&self, headers: &HeaderMap) -> Option<(&str, &Arc<dyn MediaHandler>)> {
        let media_type = MediaTypeMatcher::from_headers(headers).best(self.media_types())?;
        self.entries
            .get_key_value(media_type)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Reject keys that are not media types.
    pub(crate) fn validate(&self, route: &str) -> Result<(), RegistryError> {
        match self
            .media_types()
            .find(|media_type| MediaRange::parse(media_type, 0).is_none())
        {
            Some(media_type) => Err(RegistryError::InvalidMediaType {
                route: route.to_string(),
                media_type: media_type.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, HeaderValue};

    async fn body_of(handlers: &Handlers, media_type: &str) -> String {
        let handler = handlers.get(media_type).unwrap();
        let ctx = NegotiationContext::new(Request::new(()), media_type, None);
        let response = handler.handle(ctx).await;
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_extend_overwrites_same_key() {
        let mut handlers = Handlers::new()
            .on("text/plain", |_| async { "first" })
            .on("text/html", |_| async { "<p>html</p>" });
        handlers.extend(Handlers::new().on("text/plain", |_| async { "second" }));

        assert_eq!(handlers.len(), 2);
        assert_eq!(body_of(&handlers, "text/plain").await, "second");
        assert_eq!(body_of(&handlers, "text/html").await, "<p>html</p>");
    }

    #[tokio::test]
    async fn test_context_exposes_media_type() {
        let handlers = Handlers::new().on("text/csv", |ctx: NegotiationContext| async move {
            ctx.media_type().to_string()
        });
        assert_eq!(body_of(&handlers, "text/csv").await, "text/csv");
    }

    #[test]
    fn test_select() {
        let handlers = Handlers::new()
            .on("text/plain", |_| async { "plain" })
            .on("application/json", |_| async { "{}" });

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/*"));
        let (media_type, _) = handlers.select(&headers).unwrap();
        assert_eq!(media_type, "text/plain");

        headers.insert(header::ACCEPT, HeaderValue::from_static("image/png"));
        assert!(handlers.select(&headers).is_none());
    }

    #[test]
    fn test_validate() {
        let good = Handlers::new().on("text/plain", |_| async { "" });
        assert!(good.validate("r").is_ok());

        let bad = good.on("plain", |_| async { "" });
        assert_eq!(
            bad.validate("r"),
            Err(RegistryError::InvalidMediaType {
                route: "r".into(),
                media_type: "plain".into()
            })
        );
    }

    #[test]
    fn test_debug_lists_media_types() {
        let handlers = Handlers::new().on("text/plain", |_| async { "" });
        assert_eq!(format!("{:?}", handlers), "{\"text/plain\"}");
    }
}
