//! The transactional context handed to request handlers.

use std::fmt;
use std::sync::Arc;

use crew_core::identity::VerifiedIdentity;
use crew_core::limits::Limits;
use crew_core::message::Message;
use crew_db::services::{CommentService, ProjectService, Scope, TaskService, UserService};
use crew_db::{Access, TxStore};
use crew_notify::{Broadcaster, SendReport};

use crate::error::ApiError;
use crate::state::AppState;

/// Per-request correlation id, 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    /// # Errors
    ///
    /// Returns the RNG error if the OS cannot supply randomness.
    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut bytes = [0u8; 8];
        getrandom::fill(&mut bytes)?;
        Ok(Self(hex::encode(bytes)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Pending {
    message: Message,
    recipients: Vec<String>,
}

/// Notifications queued by a handler, sent only once the transaction commits.
pub struct Outbox {
    broadcaster: Broadcaster,
    pending: Vec<Pending>,
}

impl Outbox {
    /// Number of messages waiting for the commit.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    /// Fan every queued message out, in queue order.
    pub fn flush(self) -> SendReport {
        let mut total = SendReport::default();
        for Pending {
            message,
            recipients,
        } in self.pending
        {
            let report = self.broadcaster.send(&message, &recipients);
            total.attempted += report.attempted;
            total.delivered += report.delivered;
            total.dropped += report.dropped;
        }
        total
    }

    /// Drop everything queued. Returns how many messages were discarded.
    pub fn discard(self) -> usize {
        self.pending.len()
    }
}

/// Everything one in-flight request works with.
///
/// Owns the request transaction. Services built from the context all borrow
/// that same transaction, so they observe each other's uncommitted writes.
/// Consumed by [`RequestContext::finish`], so the transaction cannot outlive it.
pub struct RequestContext {
    store: TxStore,
    identity: VerifiedIdentity,
    trace_id: TraceId,
    limits: Arc<Limits>,
    outbox: Outbox,
}

impl RequestContext {
    /// Open a transaction, make sure the user row exists, and assemble the context.
    ///
    /// A deferred read transaction never writes: if the user row is missing
    /// or stale it is refreshed in its own short write transaction first.
    /// If any step fails the transaction is dropped, which rolls it back.
    pub(crate) async fn open(
        state: &AppState,
        identity: VerifiedIdentity,
        access: Access,
        trace_id: TraceId,
    ) -> Result<Self, ApiError> {
        let mut store = state.db.begin(access).await?;
        if access == Access::Read
            && !UserService::new(Scope::new(&store, &identity, &state.limits))
                .is_current()
                .await?
        {
            store.rollback().await?;
            register_user(state, &identity).await?;
            store = state.db.begin(Access::Read).await?;
        }

        let ctx = Self {
            store,
            identity,
            trace_id,
            limits: Arc::clone(&state.limits),
            outbox: Outbox {
                broadcaster: state.broadcaster.clone(),
                pending: Vec::new(),
            },
        };
        if access == Access::Write {
            ctx.users().ensure().await?;
        }
        Ok(ctx)
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    #[must_use]
    pub const fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// The request transaction, for queries no service covers.
    #[must_use]
    pub const fn store(&self) -> &TxStore {
        &self.store
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(&self.store, &self.identity, &self.limits)
    }

    #[must_use]
    pub fn projects(&self) -> ProjectService<'_> {
        ProjectService::new(self.scope())
    }

    #[must_use]
    pub fn tasks(&self) -> TaskService<'_> {
        TaskService::new(self.scope())
    }

    #[must_use]
    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(self.scope())
    }

    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(self.scope())
    }

    /// Queue `message` for `recipients`. Nothing is sent unless the request commits.
    pub fn notify<I, S>(&mut self, message: Message, recipients: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outbox.pending.push(Pending {
            message,
            recipients: recipients.into_iter().map(Into::into).collect(),
        });
    }

    /// Tear the context down into its transaction and outbox.
    #[must_use]
    pub fn finish(self) -> (TxStore, Outbox) {
        (self.store, self.outbox)
    }
}

async fn register_user(state: &AppState, identity: &VerifiedIdentity) -> Result<(), ApiError> {
    let store = state.db.begin(Access::Write).await?;
    UserService::new(Scope::new(&store, identity, &state.limits))
        .ensure()
        .await?;
    store.commit().await?;
    Ok(())
}
