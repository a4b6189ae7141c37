//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route (method, path, default handler, optional negotiate mapping)
//!     → App::route
//!     → table.rs (RouteEntry stored under its id)
//!     → axum Router (default handler wrapped by the dispatcher layer)
//! ```
//!
//! # Design Decisions
//! - Route ids are unique; default id is "{METHOD} {path}"
//! - The route table is the only mutable route state

pub mod route;
pub mod table;

pub use route::Route;
pub use table::{InMemoryRouteTable, RouteEntry, RouteSettings, RouteTable};
