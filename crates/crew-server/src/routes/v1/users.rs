use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use crew_db::Access;

use crate::dispatch::{Reply, dispatch};
use crate::state::AppState;

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    dispatch(&state, &headers, Access::Read, "users.me", |ctx| {
        Box::pin(async move {
            let user = ctx.users().me().await?;
            Reply::json(&user)
        })
    })
    .await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    dispatch(&state, &headers, Access::Read, "users.get", move |ctx| {
        Box::pin(async move {
            let user = ctx.users().get(&id).await?;
            Reply::json(&user)
        })
    })
    .await
}
