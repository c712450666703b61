//! Project lifecycle and membership endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use crew_core::message::Message;
use crew_db::Access;
use crew_db::services::project::Removal;
use crew_db::updates::project::ProjectUpdate;
use serde::Deserialize;

use super::double_option;
use crate::context::RequestContext;
use crate::dispatch::{Reply, dispatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AddMember {
    user: String,
}

pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    dispatch(&state, &headers, Access::Read, "projects.list", |ctx| {
        Box::pin(async move { Reply::json(&ctx.projects().list_for_user().await?) })
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateProject>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "projects.create", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let project = ctx
                .projects()
                .create(&body.name, body.description.as_deref(), &body.members)
                .await?;
            ctx.notify(Message::added(&project.id), project.users.clone());
            Reply::json(&project)
        })
    })
    .await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Read, "projects.get", move |ctx| {
        Box::pin(async move { Reply::json(&ctx.projects().get(&id).await?) })
    })
    .await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<UpdateProject>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "projects.update", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let update = ProjectUpdate {
                name: body.name,
                description: body.description,
            };
            let project = ctx.projects().update(&id, &update).await?;
            ctx.notify(Message::updated(&project.id), project.users.clone());
            Reply::json(&project)
        })
    })
    .await
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Write, "projects.delete", move |ctx| {
        Box::pin(async move {
            let project = ctx.projects().delete(&id).await?;
            ctx.notify(Message::deleted(&project.id), project.users);
            Reply::empty()
        })
    })
    .await
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<AddMember>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "projects.add_member", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let project = ctx.projects().add_member(&id, &body.user).await?;
            ctx.notify(Message::updated(&project.id), project.users.clone());
            Reply::json(&project)
        })
    })
    .await
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, user)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Write, "projects.remove_member", move |ctx| {
        Box::pin(async move {
            let removal = ctx.projects().remove_member(&id, &user).await?;
            let reply = Reply::json(&removal.project);
            notify_removal(ctx, removal);
            reply
        })
    })
    .await
}

pub async fn leave(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Write, "projects.leave", move |ctx| {
        Box::pin(async move {
            let removal = ctx.projects().leave(&id).await?;
            notify_removal(ctx, removal);
            Reply::empty()
        })
    })
    .await
}

/// The removed user learns it was removed; everyone left sees the project change.
fn notify_removal(ctx: &mut RequestContext, removal: Removal) {
    ctx.notify(
        Message::user_removed(&removal.removed_user),
        [removal.removed_user],
    );
    ctx.notify(Message::updated(&removal.project.id), removal.project.users);
}

