//! Per-route negotiation mappings.
//!
//! # Responsibilities
//! - Attach a mapping to a route when it is declared
//! - Merge additional handlers into an existing route by id
//!
//! # Design Decisions
//! - Static and computed mappings are distinct variants, resolved at dispatch
//! - Merging is a shallow union; new entries win on key collision
//! - Merging into a computed mapping is rejected, never silently replaced
//! - Registration is expected to finish before traffic starts

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use axum::http::Request;

use crate::negotiation::error::RegistryError;
use crate::negotiation::handler::Handlers;
use crate::routing::table::{RouteEntry, RouteTable};

/// Builds a route's handler map from the current request.
pub type ComputeHandlers = dyn Fn(&Request<()>) -> Handlers + Send + Sync;

/// A route's negotiation mapping.
#[derive(Clone)]
pub enum NegotiationMapping {
    Static(Handlers),
    Computed(Arc<ComputeHandlers>),
}

impl NegotiationMapping {
    /// Wrap a function computing handlers from each request.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Request<()>) -> Handlers + Send + Sync + 'static,
    {
        NegotiationMapping::Computed(Arc::new(f))
    }

    /// Concrete handlers for this request.
    pub fn resolve(&self, request: &Request<()>) -> Cow<'_, Handlers> {
        match self {
            NegotiationMapping::Static(handlers) => Cow::Borrowed(handlers),
            NegotiationMapping::Computed(f) => Cow::Owned(f(request)),
        }
    }

    /// Whether handlers are computed per request.
    pub fn is_computed(&self) -> bool {
        matches!(self, NegotiationMapping::Computed(_))
    }
}

impl From<Handlers> for NegotiationMapping {
    fn from(handlers: Handlers) -> Self {
        NegotiationMapping::Static(handlers)
    }
}

impl fmt::Debug for NegotiationMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationMapping::Static(handlers) => f.debug_tuple("Static").field(handlers).finish(),
            NegotiationMapping::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Declares and merges negotiation mappings through a [`RouteTable`].
#[derive(Clone)]
pub struct NegotiationRegistry {
    routes: Arc<dyn RouteTable>,
}

impl NegotiationRegistry {
    /// Create a registry over `routes`.
    pub fn new(routes: Arc<dyn RouteTable>) -> Self {
        Self { routes }
    }

    /// The underlying route table.
    pub fn routes(&self) -> &Arc<dyn RouteTable> {
        &self.routes
    }

    /// Register a route together with its declared mapping.
    pub fn declare(&self, route: RouteEntry) -> Result<(), RegistryError> {
        if let Some(NegotiationMapping::Static(handlers)) = &route.settings.negotiate {
            handlers.validate(&route.id)?;
        }
        tracing::debug!(
            route = %route.id,
            mapping = ?route.settings.negotiate,
            "Declaring route"
        );
        self.routes.insert(route)
    }

    /// Merge `handlers` into the route named `id`.
    ///
    /// Fails with [`RegistryError::RouteNotFound`] for unknown ids and
    /// [`RegistryError::ComputedMapping`] when the route computes its map per request.
    pub fn merge(&self, id: &str, handlers: Handlers) -> Result<(), RegistryError> {
        let route = self
            .routes
            .find(id)
            .ok_or_else(|| RegistryError::RouteNotFound(id.to_string()))?;
        handlers.validate(id)?;

        let merged = match route.settings.negotiate {
            None => handlers,
            Some(NegotiationMapping::Static(mut existing)) => {
                existing.extend(handlers);
                existing
            }
            Some(NegotiationMapping::Computed(_)) => {
                return Err(RegistryError::ComputedMapping(id.to_string()));
            }
        };

        tracing::info!(route = %id, media_types = ?merged, "Negotiation handlers registered");
        self.routes.update(id, NegotiationMapping::Static(merged))
    }

    /// Current mapping of a route, if the route exists and declares one.
    pub fn mapping(&self, id: &str) -> Option<NegotiationMapping> {
        self.routes.find(id).and_then(|route| route.settings.negotiate)
    }

    /// Snapshot of a route's static handlers.
    pub fn handlers(&self, id: &str) -> Option<Handlers> {
        match self.mapping(id)? {
            NegotiationMapping::Static(handlers) => Some(handlers),
            NegotiationMapping::Computed(_) => None,
        }
    }
}
