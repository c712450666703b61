use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use crew_core::message::Message;
use crew_db::Access;
use serde::Deserialize;

use crate::dispatch::{Reply, dispatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddComment {
    body: String,
}

pub async fn list(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Read, "comments.list", move |ctx| {
        Box::pin(async move { Reply::json(&ctx.comments().list(&task_id).await?) })
    })
    .await
}

pub async fn add(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<AddComment>, JsonRejection>,
) -> Response {
    dispatch(&state, &headers, Access::Write, "comments.add", move |ctx| {
        Box::pin(async move {
            let Json(body) = body?;
            let change = ctx.comments().add(&task_id, &body.body).await?;
            ctx.notify(Message::added(&change.item.id), change.members);
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
    dispatch(&state, &headers, Access::Write, "comments.delete", move |ctx| {
        Box::pin(async move {
            let change = ctx.comments().delete(&id).await?;
            ctx.notify(Message::deleted(&change.item.id), change.members);
            Reply::empty()
        })
    })
    .await
}
