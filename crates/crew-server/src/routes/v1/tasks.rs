//! Task endpoints. Every change notifies the project's members.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use crew_core::message::Message;
use crew_db::Access;
use crew_db::updates::task::TaskUpdate;
use serde::Deserialize;

use super::double_option;
use crate::dispatch::{Reply, dispatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    title: String,
    #[serde(default)]
    description: Option<String>,
    max_points: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(default)]
    max_points: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetPoints {
    points: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Read, "tasks.list", move |ctx| {
        Box::pin(async move { Reply::json(&ctx.tasks().list(&project_id).await?) })
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<CreateTask>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "tasks.create", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let change = ctx
                .tasks()
                .create(
                    &project_id,
                    &body.title,
                    body.description.as_deref(),
                    body.max_points,
                )
                .await?;
            ctx.notify(Message::added(&change.item.id), change.members);
            Reply::json(&change.item)
        })
    })
    .await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Read, "tasks.get", move |ctx| {
        Box::pin(async move { Reply::json(&ctx.tasks().get(&id).await?) })
    })
    .await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<UpdateTask>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "tasks.update", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let update = TaskUpdate {
                title: body.title,
                description: body.description,
                max_points: body.max_points,
            };
            let change = ctx.tasks().update(&id, &update).await?;
            ctx.notify(Message::updated(&change.item.id), change.members);
            Reply::json(&change.item)
        })
    })
    .await
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Write, "tasks.delete", move |ctx| {
        Box::pin(async move {
            let change = ctx.tasks().delete(&id).await?;
            ctx.notify(Message::deleted(&change.item.id), change.members);
            Reply::empty()
        })
    })
    .await
}

pub async fn set_points(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<SetPoints>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "tasks.set_points", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let change = ctx.tasks().set_points(&id, body.points).await?;
            ctx.notify(Message::updated(&change.item.id), change.members);
            Reply::json(&change.item)
        })
    })
    .await
}

pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Write, "tasks.assign", move |ctx| {
        Box::pin(async move {
            let change = ctx.tasks().assign_self(&id).await?;
            ctx.notify(Message::updated(&change.item.id), change.members);
            Reply::json(&change.item)
        })
    })
    .await
}

pub async fn unassign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Write, "tasks.unassign", move |ctx| {
        Box::pin(async move {
            let change = ctx.tasks().unassign(&id).await?;
            ctx.notify(Message::updated(&change.item.id), change.members);
            Reply::json(&change.item)
        })
    })
    .await
}
