//! Route table.
//!
//! # Responsibilities
//! - Store every declared route with its settings, keyed by route id
//! - Look routes up by id for merging and dispatch
//! - Replace a route's negotiation mapping
//!
//! # Design Decisions
//! - Injected as a trait object rather than reached through global state
//! - DashMap keeps lookups lock-free for readers on other routes

use axum::http::Method;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::negotiation::error::RegistryError;
use crate::negotiation::registry::NegotiationMapping;

/// Per-route plugin settings.
#[derive(Debug, Clone, Default)]
pub struct RouteSettings {
    pub negotiate: Option<NegotiationMapping>,
}

/// A declared route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub id: String,
    pub method: Method,
    pub path: String,
    pub settings: RouteSettings,
}

/// Lookup and update of declared routes.
pub trait RouteTable: Send + Sync {
    /// Add a route. Ids are unique.
    fn insert(&self, route: RouteEntry) -> Result<(), RegistryError>;

    fn find(&self, id: &str) -> Option<RouteEntry>;

    /// Replace the negotiation mapping of an existing route.
    fn update(&self, id: &str, mapping: NegotiationMapping) -> Result<(), RegistryError>;

    /// The negotiation mapping of a route, if any.
    fn mapping(&self, id: &str) -> Option<NegotiationMapping> {
        self.find(id).and_then(|route| route.settings.negotiate)
    }

    fn ids(&self) -> Vec<String>;
}

/// In-process route table.
#[derive(Debug, Default)]
pub struct InMemoryRouteTable {
    routes: DashMap<String, RouteEntry>,
}

impl InMemoryRouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route has been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteTable for InMemoryRouteTable {
    fn insert(&self, route: RouteEntry) -> Result<(), RegistryError> {
        match self.routes.entry(route.id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateRoute(route.id)),
            Entry::Vacant(slot) => {
                slot.insert(route);
                Ok(())
            }
        }
    }

    fn find(&self, id: &str) -> Option<RouteEntry> {
        self.routes.get(id).map(|route| route.value().clone())
    }

    fn update(&self, id: &str, mapping: NegotiationMapping) -> Result<(), RegistryError> {
        let mut route = self
            .routes
            .get_mut(id)
            .ok_or_else(|| RegistryError::RouteNotFound(id.to_string()))?;
        route.settings.negotiate = Some(mapping);
        Ok(())
    }

    fn mapping(&self, id: &str) -> Option<NegotiationMapping> {
        self.routes
            .get(id)
            .and_then(|route| route.settings.negotiate.clone())
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.routes.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }
}
