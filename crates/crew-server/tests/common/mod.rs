//! Shared harness: a router over a temp database and a token issuer.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use chrono::{TimeDelta, Utc};
use crew_auth::{SecretKey, TokenIssuer, TokenVerifier};
use crew_core::limits::Limits;
use crew_core::message::Message;
use crew_db::CrewDb;
use crew_server::{AppState, router};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub fn key() -> SecretKey {
    SecretKey::from_hex(&"5a".repeat(32)).unwrap()
}

pub struct Harness {
    _dir: TempDir,
    pub state: AppState,
    pub issuer: TokenIssuer,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap()
    }

    pub fn error_kind(&self) -> Option<&str> {
        self.headers
            .get(crew_server::ERROR_KIND_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crew.db");
        let db = CrewDb::open(path.to_str().unwrap(), 5000).await.unwrap();
        let state = AppState::new(db, TokenVerifier::new(key()), Limits::default(), 8);
        Self {
            _dir: dir,
            state,
            issuer: TokenIssuer::new(key()),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// A wire token for `user`, valid for an hour.
    pub fn token(&self, user: &str) -> String {
        self.issuer
            .issue(user, &user.to_uppercase(), Utc::now() + TimeDelta::hours(1))
            .unwrap()
            .to_wire()
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            request = request.header("authorization", authorization);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        Reply {
            status,
            headers,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Call as `user` with a freshly issued token.
    pub async fn call(&self, user: &str, method: Method, uri: &str, body: Option<Value>) -> Reply {
        let header = format!("Bearer {}", self.token(user));
        self.send(method, uri, Some(&header), body).await
    }

    /// Make sure `users` have rows, the same way their first request would.
    pub async fn sign_in(&self, users: &[&str]) {
        for user in users {
            let reply = self.call(user, Method::GET, "/v1/users/me", None).await;
            assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
        }
    }

    /// Register a live connection for `user` and return its receiving end.
    pub fn subscribe(&self, user: &str) -> mpsc::Receiver<Message> {
        let (connection, receiver) = self.state.broadcaster.connect(16);
        self.state.broadcaster.register(user, connection);
        receiver
    }
}

/// Everything currently queued on `receiver`.
pub fn drain(receiver: &mut mpsc::Receiver<Message>) -> Vec<Message> {
    let mut out = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        out.push(message);
    }
    out
}
