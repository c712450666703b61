//! Service layer: the operations handlers call.
//!
//! Each service is a thin borrow of a [`Scope`] (the request transaction, the
//! acting user, and the configured limits). Services consult the
//! [`Authorizer`](crate::authz::Authorizer) before every mutation and return
//! enough post-mutation state for the caller to address notifications.

pub mod comment;
pub mod project;
pub mod task;
pub mod user;

use crew_core::identity::VerifiedIdentity;
use crew_core::limits::Limits;

use crate::TxStore;
use crate::authz::Authorizer;

pub use comment::CommentService;
pub use project::ProjectService;
pub use task::TaskService;
pub use user::UserService;

/// Everything a service needs from the request.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub store: &'a TxStore,
    pub actor: &'a VerifiedIdentity,
    pub limits: &'a Limits,
}

impl<'a> Scope<'a> {
    #[must_use]
    pub const fn new(store: &'a TxStore, actor: &'a VerifiedIdentity, limits: &'a Limits) -> Self {
        Self {
            store,
            actor,
            limits,
        }
    }

    #[must_use]
    pub const fn authz(&self) -> Authorizer<'a> {
        Authorizer::new(self.store)
    }

    #[must_use]
    pub fn me(&self) -> &'a str {
        let actor: &'a VerifiedIdentity = self.actor;
        &actor.user_id
    }
}

/// A mutated item together with the project's members after the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub item: T,
    pub members: Vec<String>,
}
