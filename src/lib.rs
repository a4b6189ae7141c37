//! Content negotiation for axum routes.
//!
//! Routes declare a map from media type to handler. After a route's default
//! handler runs, the handler whose media type best matches the request's
//! `Accept` header replaces the response; otherwise the default response is
//! sent unchanged. Handlers can also negotiate a single response with the
//! [`Negotiation`] extractor, which fails with 406 when nothing matches.
//!
//! ```no_run
//! use axum::http::header::CONTENT_TYPE;
//! use content_dispatch::{App, Handlers, Route, ServerConfig};
//!
//! # fn build() -> Result<(), content_dispatch::RegistryError> {
//! let mut app = App::new(ServerConfig::default());
//! app.route(
//!     Route::get("/people/hank", || async { "{\"first\":\"Hank\"}" })
//!         .id("hank")
//!         .negotiate(Handlers::new().on("text/plain", |_| async {
//!             ([(CONTENT_TYPE, "text/plain")], "Hank is the best")
//!         })),
//! )?;
//! let router = app.into_router();
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod negotiation;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use http::{App, HttpServer};
pub use lifecycle::Shutdown;
pub use negotiation::{
    best_media_type, Handlers, MediaHandler, Negotiation, NegotiationContext, NegotiationError,
    NegotiationMapping, NegotiationOutcome, RegistryError,
};
pub use routing::Route;
