//! Per-response negotiation.
//!
//! A handler extracts [`Negotiation`] and hands it a one-off [`Handlers`]
//! map. Unlike route-level negotiation there is no default response to fall
//! back to, so an unacceptable request fails with 406.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::config::NegotiationConfig;
use crate::http::request::RequestIdExt;
use crate::negotiation::dispatcher::NegotiationOutcome;
use crate::negotiation::error::NegotiationError;
use crate::negotiation::handler::{Handlers, NegotiationContext};
use crate::observability::metrics;

const ADHOC_ROUTE: &str = "adhoc";

/// The in-flight request, ready to negotiate its own response.
#[derive(Debug)]
pub struct Negotiation {
    request: Request<()>,
    not_acceptable_message: String,
}

impl Negotiation {
    /// Negotiation for `request` with the default 406 message.
    pub fn new(request: Request<()>) -> Self {
        Self {
            request,
            not_acceptable_message: NegotiationConfig::default().not_acceptable_message,
        }
    }

    /// The request being answered.
    pub fn request(&self) -> &Request<()> {
        &self.request
    }

    /// Run the best matching handler, or fail with [`NegotiationError::NotAcceptable`].
    pub async fn try_respond(self, handlers: Handlers) -> Result<Response, NegotiationError> {
        let request_id = self.request.request_id().to_string();
        let selected = handlers
            .select(self.request.headers())
            .map(|(media_type, handler)| (media_type.to_string(), handler.clone()));

        let Some((media_type, handler)) = selected else {
            tracing::debug!(
                request_id = %request_id,
                offered = ?handlers,
                "No acceptable media type"
            );
            metrics::record_outcome(ADHOC_ROUTE, &NegotiationOutcome::NoMatch);
            return Err(NegotiationError::NotAcceptable {
                offered: handlers.media_types().map(str::to_string).collect(),
                message: self.not_acceptable_message,
            });
        };

        tracing::debug!(request_id = %request_id, media_type = %media_type, "Negotiated response");
        metrics::record_outcome(ADHOC_ROUTE, &NegotiationOutcome::Matched(media_type.clone()));

        let ctx = NegotiationContext::new(self.request, media_type, None);
        Ok(handler.handle(ctx).await)
    }

    /// Like [`try_respond`](Self::try_respond), rendering failure as a 406 response.
    pub async fn respond(self, handlers: Handlers) -> Response {
        match self.try_respond(handlers).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for Negotiation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let not_acceptable_message = parts
            .extensions
            .get::<NegotiationConfig>()
            .map(|config| config.not_acceptable_message.clone())
            .unwrap_or_else(|| NegotiationConfig::default().not_acceptable_message);

        Ok(Self {
            request: Request::from_parts(parts.clone(), ()),
            not_acceptable_message,
        })
    }
}
