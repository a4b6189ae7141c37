//! Content negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Route declaration / App::negotiate
//!     → registry.rs (validate, declare, merge)
//!     → RouteTable (per-route mapping)
//!
//! Request on a route:
//!     → dispatcher.rs (after the default handler)
//!     → accept.rs + matcher.rs (best media type)
//!     → handler.rs (matched handler builds the response)
//!
//! Request handled with the Negotiation extractor:
//!     → adhoc.rs (same matching, 406 on no match)
//! ```
//!
//! # Design Decisions
//! - Only the `Accept` header is negotiated
//! - Route-level negotiation falls back to the default response
//! - Per-response negotiation never falls back

pub mod accept;
pub mod adhoc;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod registry;

pub use accept::{AcceptHeader, MediaRange};
pub use adhoc::Negotiation;
pub use dispatcher::{negotiate_route, NegotiationOutcome, RouteDispatcher};
pub use error::{NegotiationError, RegistryError};
pub use handler::{Handlers, MediaHandler, NegotiationContext};
pub use matcher::{best_media_type, MediaTypeMatcher};
pub use registry::{ComputeHandlers, NegotiationMapping, NegotiationRegistry};
