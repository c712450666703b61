//! # crew-server
//!
//! HTTP and websocket front end for Crew.
//!
//! Every API call runs through [`dispatch::dispatch`]: verify the bearer
//! token, open one database transaction, run the handler against a
//! [`context::RequestContext`], commit or roll back, and only after a commit
//! fan queued notifications out through the [`crew_notify::Broadcaster`].

pub mod context;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod state;

pub use context::{Outbox, RequestContext, TraceId};
pub use dispatch::{Reply, TRACE_ID_HEADER, dispatch, run_authenticated};
pub use error::{ApiError, ERROR_KIND_HEADER, ErrorKind};
pub use routes::router;
pub use state::AppState;
