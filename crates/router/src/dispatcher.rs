//! Request dispatch: wires the routing table into an axum [`Router`].
//!
//! Per-request pipeline:
//!
//! ```text
//! request
//!   ↓
//! 1. resolve AuthorizationContext (middleware; anonymous on bad credential)
//!   ↓
//! 2. policy chain            -> 403 { message: [reasons] } | 500 unknown policy
//!   ↓
//! 3. bind parameters         -> 400 { error: "<param> ..." }
//!   ↓
//! 4. invoke action
//!   ↓
//! 5. action's own response   | 500 on error (detail only logged)
//! ```
//!
//! Steps 1-5 run under one deadline and one panic guard: a stalled policy or
//! action, or a panic anywhere in the pipeline, ends in the generic 500.
//! Every step may suspend; no lock is held across any of them.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Query, Request};
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::routing::{MethodRouter, on};
use futures_util::FutureExt;
use serde_json::Value as JsonValue;
use tracing::Instrument;

use tollgate_auth::AuthorizationResult;

use crate::{ActionDescriptor, AuthMiddleware, Registration, RequestValues, bind, errors};

/// Default upper bound on a buffered JSON request body.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone)]
pub struct Dispatcher {
    registration: Arc<Registration>,
    middleware: Arc<dyn AuthMiddleware>,
    deadline: Option<Duration>,
    body_limit: usize,
}

impl Dispatcher {
    pub fn new(registration: Registration, middleware: Arc<dyn AuthMiddleware>) -> Self {
        Self {
            registration: Arc::new(registration),
            middleware,
            deadline: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Bound the whole request pipeline; expiry is reported as a 500.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cap buffered JSON bodies; larger ones get a 413.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// One route per action, keyed by `(verb, path)`.
    pub fn into_router(self) -> Router {
        let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();

        for action in self.registration.actions() {
            tracing::info!("[{}] {}", action.verb, action.path);

            let dispatcher = self.clone();
            let route_action = action.clone();
            let handler = move |req: Request| {
                let dispatcher = dispatcher.clone();
                let action = route_action.clone();
                async move { dispatcher.dispatch(&action, req).await }
            };

            let route = on(action.verb.method_filter(), handler);
            let merged = match by_path.remove(&action.path) {
                Some(existing) => existing.merge(route),
                None => route,
            };
            by_path.insert(action.path.clone(), merged);
        }

        by_path
            .into_iter()
            .fold(Router::new(), |router, (path, route)| router.route(&path, route))
            .layer(DefaultBodyLimit::max(self.body_limit))
    }

    /// Run the full pipeline for `action`.
    pub async fn dispatch(&self, action: &ActionDescriptor, req: Request) -> Response {
        let span = tracing::info_span!("dispatch", verb = %action.verb, path = %action.path);
        self.run(action, req).instrument(span).await
    }

    async fn run(&self, action: &ActionDescriptor, req: Request) -> Response {
        let pipeline = AssertUnwindSafe(self.pipeline(action, req)).catch_unwind();
        let outcome = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, pipeline).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(?deadline, "request exceeded its deadline");
                    return errors::internal_error();
                }
            },
            None => pipeline.await,
        };

        outcome.unwrap_or_else(|_panic| {
            tracing::error!("request pipeline panicked");
            errors::internal_error()
        })
    }

    async fn pipeline(&self, action: &ActionDescriptor, req: Request) -> Response {
        let (parts, body) = req.into_parts();

        let ctx = self.middleware.resolve(&parts.headers).await;

        match self
            .registration
            .evaluator()
            .evaluate(&ctx, &action.requirements)
            .await
        {
            Ok(AuthorizationResult::Ok) => {}
            Ok(AuthorizationResult::Error(reasons)) => {
                tracing::debug!(?reasons, "authorization denied");
                return errors::forbidden(&reasons);
            }
            Err(e) => {
                tracing::error!(error = %e, "authorization misconfigured");
                return errors::internal_error();
            }
        }

        let query = match parse_query(&parts.uri) {
            Ok(query) => query,
            Err(message) => return errors::bad_request(message),
        };

        let body = if action.body_param().is_some() {
            match read_json_body(Request::from_parts(parts, body), self.body_limit).await {
                Ok(body) => body,
                Err(response) => return response,
            }
        } else {
            None
        };

        let args = match bind(&RequestValues { query, body }, &action.params) {
            Ok(args) => args,
            Err(e) => {
                tracing::debug!(error = %e, "parameter binding failed");
                return errors::bad_request(e.to_string());
            }
        };

        match action.invoke(ctx, args).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = ?e, "action failed");
                errors::internal_error()
            }
        }
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registration", &self.registration)
            .field("deadline", &self.deadline)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

fn parse_query(uri: &Uri) -> Result<HashMap<String, String>, &'static str> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .map_err(|_| "malformed query string")
}

/// Buffer and parse the body. An empty body is `None`.
///
/// The size cap comes from the `DefaultBodyLimit` layer installed by
/// [`Dispatcher::into_router`].
async fn read_json_body(req: Request, limit: usize) -> Result<Option<JsonValue>, Response> {
    let bytes = match Bytes::from_request(req, &()).await {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(errors::payload_too_large(limit));
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "failed to read request body");
            return Err(errors::bad_request("request body is unreadable"));
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|_| errors::bad_request("request body must be valid JSON"))
}
