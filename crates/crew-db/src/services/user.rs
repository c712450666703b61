//! User service.

use crew_core::entities::User;

use super::Scope;
use crate::error::ServiceError;

pub struct UserService<'a> {
    scope: Scope<'a>,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Make sure the acting user has a row with its current display name.
    ///
    /// Writes when something changed, so call it from a write transaction.
    pub async fn ensure(&self) -> Result<User, ServiceError> {
        let actor = self.scope.actor;
        if let Some(user) = self.scope.store.get_user(&actor.user_id).await? {
            if user.display_name == actor.display_name {
                return Ok(user);
            }
        }
        Ok(self
            .scope
            .store
            .upsert_user(&actor.user_id, &actor.display_name)
            .await?)
    }

    /// Whether the acting user's row exists with its current display name.
    /// Never writes.
    pub async fn is_current(&self) -> Result<bool, ServiceError> {
        let actor = self.scope.actor;
        Ok(self
            .scope
            .store
            .get_user(&actor.user_id)
            .await?
            .is_some_and(|user| user.display_name == actor.display_name))
    }

    pub async fn me(&self) -> Result<User, ServiceError> {
        self.get(self.scope.me()).await
    }

    pub async fn get(&self, user_id: &str) -> Result<User, ServiceError> {
        self.scope
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", user_id))
    }
}
