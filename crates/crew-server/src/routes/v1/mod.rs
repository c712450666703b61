//! Version 1 of the API.

mod comments;
mod notifications;
mod projects;
mod tasks;
mod users;

use axum::Router;
use axum::routing::{delete, get, post, put};
use serde::{Deserialize, Deserializer};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(users::me))
        .route("/users/{id}", get(users::get))
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/{id}",
            get(projects::get)
                .patch(projects::update)
                .delete(projects::delete),
        )
        .route("/projects/{id}/members", post(projects::add_member))
        .route(
            "/projects/{id}/members/{user}",
            delete(projects::remove_member),
        )
        .route("/projects/{id}/leave", post(projects::leave))
        .route(
            "/projects/{id}/tasks",
            get(tasks::list).post(tasks::create),
        )
        .route(
            "/tasks/{id}",
            get(tasks::get).patch(tasks::update).delete(tasks::delete),
        )
        .route("/tasks/{id}/points", put(tasks::set_points))
        .route("/tasks/{id}/assign", post(tasks::assign))
        .route("/tasks/{id}/unassign", post(tasks::unassign))
        .route(
            "/tasks/{id}/comments",
            get(comments::list).post(comments::add),
        )
        .route("/comments/{id}", delete(comments::delete))
        .route("/notifications", get(notifications::subscribe))
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
