//! Route-level negotiation hook.
//!
//! # Data Flow
//! ```text
//! Request
//!     → negotiate_route (clone request head)
//!     → default handler (tentative response)
//!     → RouteDispatcher::dispatch
//!         → RouteTable::mapping (static or computed)
//!         → Handlers::select (matcher)
//!     → matched handler response, or tentative response unchanged
//! ```
//!
//! # Design Decisions
//! - The default handler always runs; negotiation only replaces its output
//! - No match is never an error at route level
//! - The mapping is read per request, so merges after startup are visible

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::RequestIdExt;
use crate::negotiation::handler::NegotiationContext;
use crate::observability::metrics;
use crate::routing::table::RouteTable;

/// Result of negotiating one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// The handler for this media type produced the response.
    Matched(String),
    /// The route offers no media types for this request.
    NoCandidates,
    /// Media types were offered but none is acceptable.
    NoMatch,
}

impl NegotiationOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            NegotiationOutcome::Matched(_) => "matched",
            NegotiationOutcome::NoCandidates => "no_candidates",
            NegotiationOutcome::NoMatch => "no_match",
        }
    }
}

impl fmt::Display for NegotiationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationOutcome::Matched(media_type) => write!(f, "matched {}", media_type),
            other => f.write_str(other.label()),
        }
    }
}

/// Dispatches one route's responses to its negotiation handlers.
#[derive(Clone)]
pub struct RouteDispatcher {
    route_id: Arc<str>,
    routes: Arc<dyn RouteTable>,
    vary_accept: bool,
}

impl RouteDispatcher {
    /// Dispatcher for the route named `route_id`.
    pub fn new(route_id: impl Into<Arc<str>>, routes: Arc<dyn RouteTable>, vary_accept: bool) -> Self {
        Self {
            route_id: route_id.into(),
            routes,
            vary_accept,
        }
    }

    /// Id of the route this dispatcher serves.
    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    /// Replace `tentative` with the best matching handler's response, if any.
    pub async fn dispatch(&self, request: Request<()>, tentative: Response) -> (Response, NegotiationOutcome) {
        let Some(mapping) = self.routes.mapping(&self.route_id) else {
            return (tentative, NegotiationOutcome::NoCandidates);
        };

        let handlers = mapping.resolve(&request);
        if handlers.is_empty() {
            return (tentative, NegotiationOutcome::NoCandidates);
        }

        let selected = handlers
            .select(request.headers())
            .map(|(media_type, handler)| (media_type.to_string(), handler.clone()));
        drop(handlers);

        let (mut response, outcome) = match selected {
            Some((media_type, handler)) => {
                let ctx = NegotiationContext::new(request, media_type.clone(), Some(tentative));
                (handler.handle(ctx).await, NegotiationOutcome::Matched(media_type))
            }
            None => (tentative, NegotiationOutcome::NoMatch),
        };

        if self.vary_accept && !varies_on_accept(response.headers()) {
            response
                .headers_mut()
                .append(header::VARY, HeaderValue::from_static("accept"));
        }
        (response, outcome)
    }
}

/// Whether the response already declares `Vary: accept` (or `Vary: *`).
fn varies_on_accept(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|name| name.eq_ignore_ascii_case("accept") || name == "*")
}

/// Middleware installed on every registered route.
pub async fn negotiate_route(
    State(dispatcher): State<RouteDispatcher>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let head = Request::from_parts(parts.clone(), ());
    let request_id = head.request_id().to_string();

    let tentative = next.run(Request::from_parts(parts, body)).await;
    let (response, outcome) = dispatcher.dispatch(head, tentative).await;

    tracing::debug!(
        request_id = %request_id,
        route = %dispatcher.route_id(),
        outcome = %outcome,
        "Route negotiation complete"
    );
    metrics::record_outcome(dispatcher.route_id(), &outcome);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::handler::Handlers;
    use crate::negotiation::registry::NegotiationMapping;
    use crate::routing::table::{InMemoryRouteTable, RouteEntry, RouteSettings};
    use axum::body::to_bytes;
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;

    fn table(negotiate: Option<NegotiationMapping>) -> Arc<dyn RouteTable> {
        let table = InMemoryRouteTable::new();
        table
            .insert(RouteEntry {
                id: "r".into(),
                method: Method::GET,
                path: "/".into(),
                settings: RouteSettings { negotiate },
            })
            .unwrap();
        Arc::new(table)
    }

    fn request(accept: &str) -> Request<()> {
        Request::builder().header("accept", accept).body(()).unwrap()
    }

    fn tentative() -> Response {
        (StatusCode::CREATED, "default").into_response()
    }

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn plain() -> Handlers {
        Handlers::new().on("text/plain", |_| async { "plain" })
    }

    #[tokio::test]
    async fn test_matched_replaces_response() {
        let dispatcher = RouteDispatcher::new("r", table(Some(plain().into())), false);
        let (response, outcome) = dispatcher.dispatch(request("text/plain"), tentative()).await;

        assert_eq!(outcome, NegotiationOutcome::Matched("text/plain".into()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "plain");
    }

    #[tokio::test]
    async fn test_no_match_keeps_tentative() {
        let dispatcher = RouteDispatcher::new("r", table(Some(plain().into())), false);
        let (response, outcome) = dispatcher.dispatch(request("application/xml"), tentative()).await;

        assert_eq!(outcome, NegotiationOutcome::NoMatch);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body(response).await, "default");
    }

    #[tokio::test]
    async fn test_no_mapping_keeps_tentative() {
        let dispatcher = RouteDispatcher::new("r", table(None), true);
        let (response, outcome) = dispatcher.dispatch(request("text/plain"), tentative()).await;

        assert_eq!(outcome, NegotiationOutcome::NoCandidates);
        assert!(response.headers().get(header::VARY).is_none());
        assert_eq!(body(response).await, "default");
    }

    #[tokio::test]
    async fn test_empty_computed_mapping_keeps_tentative() {
        let mapping = NegotiationMapping::computed(|_| Handlers::new());
        let dispatcher = RouteDispatcher::new("r", table(Some(mapping)), false);
        let (_, outcome) = dispatcher.dispatch(request("*/*"), tentative()).await;
        assert_eq!(outcome, NegotiationOutcome::NoCandidates);
    }

    #[tokio::test]
    async fn test_handler_sees_tentative_response() {
        let handlers = Handlers::new().on("text/plain", |mut ctx: NegotiationContext| async move {
            let status = ctx.take_tentative().map(|r| r.status()).unwrap_or_default();
            format!("default was {}", status.as_u16())
        });
        let dispatcher = RouteDispatcher::new("r", table(Some(handlers.into())), false);
        let (response, _) = dispatcher.dispatch(request("text/plain"), tentative()).await;
        assert_eq!(body(response).await, "default was 201");
    }

    #[tokio::test]
    async fn test_vary_header() {
        let dispatcher = RouteDispatcher::new("r", table(Some(plain().into())), true);

        let (response, _) = dispatcher.dispatch(request("text/plain"), tentative()).await;
        assert_eq!(response.headers()[header::VARY], "accept");

        let (response, _) = dispatcher.dispatch(request("image/png"), tentative()).await;
        assert_eq!(response.headers()[header::VARY], "accept");
    }

    #[tokio::test]
    async fn test_vary_header_is_not_duplicated() {
        let handlers = Handlers::new().on("text/plain", |_| async {
            ([(header::VARY, "Accept-Encoding, Accept")], "plain")
        });
        let dispatcher = RouteDispatcher::new("r", table(Some(handlers.into())), true);

        let (response, _) = dispatcher.dispatch(request("text/plain"), tentative()).await;
        let vary: Vec<_> = response.headers().get_all(header::VARY).iter().collect();
        assert_eq!(vary, vec!["Accept-Encoding, Accept"]);

        let tentative = ([(header::VARY, "*")], "default").into_response();
        let (response, outcome) = dispatcher.dispatch(request("image/png"), tentative).await;
        assert_eq!(outcome, NegotiationOutcome::NoMatch);
        assert_eq!(response.headers().get_all(header::VARY).iter().count(), 1);
    }

    #[tokio::test]
    async fn test_vary_header_appends_to_other_fields() {
        let dispatcher = RouteDispatcher::new("r", table(Some(plain().into())), true);
        let tentative = ([(header::VARY, "accept-encoding")], "default").into_response();

        let (response, _) = dispatcher.dispatch(request("image/png"), tentative).await;
        let vary: Vec<_> = response.headers().get_all(header::VARY).iter().collect();
        assert_eq!(vary, vec!["accept-encoding", "accept"]);
    }

    #[tokio::test]
    async fn test_unknown_route_keeps_tentative() {
        let dispatcher = RouteDispatcher::new("missing", table(Some(plain().into())), false);
        let (_, outcome) = dispatcher.dispatch(request("text/plain"), tentative()).await;
        assert_eq!(outcome, NegotiationOutcome::NoCandidates);
    }
}
