//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Collect routes and their negotiation mappings
//! - Wrap every route's default handler with the negotiation dispatcher
//! - Wire up shared middleware (tracing, timeout, request ID)
//! - Serve on a listener until shutdown

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::Method, middleware, Extension, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{request_id_header, MakeRequestUuidV4};
use crate::negotiation::dispatcher::{negotiate_route, RouteDispatcher};
use crate::negotiation::error::RegistryError;
use crate::negotiation::handler::Handlers;
use crate::negotiation::registry::NegotiationRegistry;
use crate::routing::route::{path_shape, Route};
use crate::routing::table::{InMemoryRouteTable, RouteEntry, RouteSettings, RouteTable};

/// Route collection with content negotiation.
///
/// Register routes and extra handlers during setup, then turn the app into
/// an axum [`Router`] or an [`HttpServer`].
pub struct App {
    config: ServerConfig,
    registry: NegotiationRegistry,
    router: Router,
    /// Registered path for each path shape.
    paths: HashMap<String, String>,
    /// (method, path shape) pairs already served.
    endpoints: HashSet<(Method, String)>,
}

impl App {
    /// Create an app backed by an in-memory route table.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_route_table(config, Arc::new(InMemoryRouteTable::new()))
    }

    /// Use a caller-provided route table.
    pub fn with_route_table(config: ServerConfig, routes: Arc<dyn RouteTable>) -> Self {
        Self {
            config,
            registry: NegotiationRegistry::new(routes),
            router: Router::new(),
            paths: HashMap::new(),
            endpoints: HashSet::new(),
        }
    }

    /// Register a route and its declared negotiation mapping.
    ///
    /// The path is checked before anything is recorded, so a rejected route
    /// leaves neither the router nor the route table changed.
    pub fn route(&mut self, route: Route) -> Result<&mut Self, RegistryError> {
        let id = route.route_id();
        let Route {
            method,
            path,
            handler,
            negotiate,
            ..
        } = route;

        let shape = path_shape(&path)?;
        if let Some(existing) = self.paths.get(&shape) {
            if *existing != path {
                return Err(RegistryError::ConflictingPath {
                    path,
                    existing: existing.clone(),
                });
            }
        }
        if self.endpoints.contains(&(method.clone(), shape.clone())) {
            return Err(RegistryError::DuplicateRoute(format!("{} {}", method, path)));
        }

        self.registry.declare(RouteEntry {
            id: id.clone(),
            method: method.clone(),
            path: path.clone(),
            settings: RouteSettings { negotiate },
        })?;

        let dispatcher = RouteDispatcher::new(
            id.as_str(),
            self.registry.routes().clone(),
            self.config.negotiation.vary_accept,
        );
        let handler = handler.route_layer(middleware::from_fn_with_state(dispatcher, negotiate_route));

        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.route(&path, handler);
        self.paths.insert(shape.clone(), path.clone());
        self.endpoints.insert((method.clone(), shape));

        tracing::debug!(route = %id, method = %method, path = %path, "Route registered");
        Ok(self)
    }

    /// Merge `handlers` into the negotiation map of the route named `id`.
    pub fn negotiate(&self, id: &str, handlers: Handlers) -> Result<(), RegistryError> {
        self.registry.merge(id, handlers)
    }

    /// The registry holding every declared route.
    pub fn registry(&self) -> &NegotiationRegistry {
        &self.registry
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let header = request_id_header();
        self.router
            .layer(Extension(self.config.negotiation.clone()))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(header, MakeRequestUuidV4))
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("routes", &self.registry.routes().ids())
            .finish()
    }
}

/// HTTP server serving an [`App`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server from a fully registered app.
    pub fn new(app: App) -> Self {
        let config = app.config.clone();
        Self {
            router: app.into_router(),
            config,
        }
    }

    /// Run the server until a shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    #[test]
    fn test_duplicate_endpoint_is_rejected() {
        let mut app = App::new(ServerConfig::default());
        app.route(Route::get("/a", ok).id("first")).unwrap();
        let err = app.route(Route::get("/a", ok).id("second")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRoute("GET /a".into()));
        assert!(app.registry().routes().find("second").is_none());
    }

    #[test]
    fn test_same_path_different_methods() {
        let mut app = App::new(ServerConfig::default());
        app.route(Route::get("/a", ok)).unwrap();
        app.route(Route::post("/a", ok)).unwrap();
        assert_eq!(
            app.registry().routes().ids(),
            vec!["GET /a".to_string(), "POST /a".to_string()]
        );
    }

    #[test]
    fn test_invalid_path() {
        let mut app = App::new(ServerConfig::default());
        assert_eq!(
            app.route(Route::get("a", ok)).unwrap_err(),
            RegistryError::InvalidPath {
                path: "a".into(),
                reason: "paths must start with '/'",
            }
        );
    }

    #[test]
    fn test_colon_capture_is_rejected_before_declaring() {
        let mut app = App::new(ServerConfig::default());
        let err = app
            .route(Route::get("/people/:id", ok).id("person"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath { .. }));
        assert!(app.registry().routes().find("person").is_none());
        assert!(app
            .negotiate("person", Handlers::new().on("text/plain", |_| async { "" }))
            .is_err());
    }

    #[test]
    fn test_stray_wildcard_is_rejected() {
        let mut app = App::new(ServerConfig::default());
        for path in ["/files/*rest", "/files/{*rest}/raw"] {
            let err = app.route(Route::get(path, ok)).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidPath { .. }), "{path}");
        }
        assert!(app.registry().routes().ids().is_empty());

        app.route(Route::get("/files/{*rest}", ok)).unwrap();
    }

    #[test]
    fn test_conflicting_capture_names_are_rejected() {
        let mut app = App::new(ServerConfig::default());
        app.route(Route::get("/people/{a}", ok).id("a")).unwrap();

        let err = app.route(Route::post("/people/{b}", ok).id("b")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::ConflictingPath {
                path: "/people/{b}".into(),
                existing: "/people/{a}".into(),
            }
        );
        assert!(app.registry().routes().find("b").is_none());

        let err = app.route(Route::get("/people/{a}", ok).id("again")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRoute("GET /people/{a}".into()));

        app.route(Route::post("/people/{a}", ok).id("create")).unwrap();
        app.route(Route::get("/people/{a}/card", ok).id("card")).unwrap();
    }

    #[tokio::test]
    async fn test_captured_route_serves_requests() {
        use tower::ServiceExt;

        let mut app = App::new(ServerConfig::default());
        app.route(Route::get("/people/{id}", ok).id("person")).unwrap();
        let response = app
            .into_router()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/people/hank")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[test]
    fn test_negotiate_unknown_route() {
        let app = App::new(ServerConfig::default());
        let err = app
            .negotiate("nonexistent", Handlers::new().on("text/plain", |_| async { "" }))
            .unwrap_err();
        assert_eq!(err, RegistryError::RouteNotFound("nonexistent".into()));
    }
}
