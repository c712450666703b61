//! The authenticated-transaction dispatch pipeline.
//!
//! Every API request goes through [`dispatch`]:
//!
//! 1. verify the bearer credential (any failure is a uniform 401),
//! 2. open a transaction and build a [`RequestContext`],
//! 3. run the handler, catching both errors and panics,
//! 4. commit on success, roll back otherwise,
//! 5. after a successful commit, flush queued notifications,
//! 6. respond exactly once, tagged with the context's trace id.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use crew_core::identity::VerifiedIdentity;
use crew_db::Access;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::Instrument;

use crate::context::{RequestContext, TraceId};
use crate::error::{ApiError, ErrorKind};
use crate::state::AppState;

/// Response header carrying the request's trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// What a handler produces on success.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(serde_json::Value),
    Empty,
}

impl Reply {
    /// # Errors
    ///
    /// Returns an internal error if `value` fails to serialize.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ApiError::internal(format!("serialize reply: {e}")))
    }

    /// Success with an empty 200 body.
    ///
    /// # Errors
    ///
    /// Never; returns `Result` to match [`Reply::json`] as a handler tail.
    #[allow(clippy::unnecessary_wraps)]
    pub const fn empty() -> Result<Self, ApiError> {
        Ok(Self::Empty)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Json(value) => Json(value).into_response(),
            Self::Empty => StatusCode::OK.into_response(),
        }
    }
}

/// Verify the `Authorization` header and run `handler` in a fresh context.
pub async fn dispatch<F>(
    state: &AppState,
    headers: &HeaderMap,
    access: Access,
    route: &'static str,
    handler: F,
) -> Response
where
    F: for<'c> FnOnce(&'c mut RequestContext) -> BoxFuture<'c, Result<Reply, ApiError>> + Send,
{
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    match crew_auth::authenticate_bearer(&state.verifier, header, Utc::now()) {
        Ok(identity) => run_authenticated(state, identity, access, route, handler).await,
        Err(_) => ApiError::unauthorized().into_response(),
    }
}

/// Steps 2 to 6 of the pipeline for an already verified identity.
pub async fn run_authenticated<F>(
    state: &AppState,
    identity: VerifiedIdentity,
    access: Access,
    route: &'static str,
    handler: F,
) -> Response
where
    F: for<'c> FnOnce(&'c mut RequestContext) -> BoxFuture<'c, Result<Reply, ApiError>> + Send,
{
    let trace_id = match TraceId::generate() {
        Ok(id) => id,
        Err(error) => {
            tracing::error!(%error, route, "failed to mint trace id");
            return ApiError::internal("trace id").into_response();
        }
    };
    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        user = %identity.user_id,
        route,
    );

    async {
        let mut ctx = match RequestContext::open(state, identity, access, trace_id).await {
            Ok(ctx) => ctx,
            Err(error) => return error_response(error),
        };

        let outcome = AssertUnwindSafe(async { handler(&mut ctx).await })
            .catch_unwind()
            .await;
        let result = outcome.unwrap_or_else(|panic| {
            tracing::error!(panic = panic_message(&*panic), "handler panicked");
            Err(ApiError::internal("handler panicked"))
        });

        let trace_id = ctx.trace_id().clone();
        let (store, outbox) = ctx.finish();
        let response = match result {
            Ok(reply) => match store.commit().await {
                Ok(()) => {
                    let queued = outbox.queued();
                    let report = outbox.flush();
                    tracing::debug!(
                        queued,
                        delivered = report.delivered,
                        dropped = report.dropped,
                        "request committed"
                    );
                    reply.into_response()
                }
                Err(error) => {
                    let discarded = outbox.discard();
                    tracing::error!(%error, discarded, "commit failed");
                    ApiError::internal("commit failed").into_response()
                }
            },
            Err(error) => {
                let discarded = outbox.discard();
                if let Err(rollback) = store.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                tracing::debug!(discarded, "request rolled back");
                error_response(error)
            }
        };
        with_trace_id(response, &trace_id)
    }
    .instrument(span)
    .await
}

fn error_response(error: ApiError) -> Response {
    if error.kind == ErrorKind::Internal {
        tracing::error!(detail = %error.message, "internal error");
    } else {
        tracing::debug!(%error, "request failed");
    }
    error.into_response()
}

fn with_trace_id(mut response: Response, trace_id: &TraceId) -> Response {
    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
