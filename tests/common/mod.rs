//! Shared helpers for integration tests that need a live HTTP peer.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

/// Canned GraphQL endpoint that records every request body.
#[derive(Clone)]
pub struct MockLedger {
    reply: Value,
    status: StatusCode,
    seen: Arc<Mutex<Vec<Value>>>,
}

impl MockLedger {
    /// Answers every request with `reply` and HTTP 200.
    pub fn replying(reply: Value) -> Self {
        Self::with_status(StatusCode::OK, reply)
    }

    /// Answers every request with `reply` under the given status.
    ///
    /// A JSON string reply is sent as a raw text body.
    pub fn with_status(status: StatusCode, reply: Value) -> Self {
        Self {
            reply,
            status,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Request bodies received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.seen.lock().expect("Mock lock poisoned").clone()
    }

    /// Serves on an ephemeral port and returns the GraphQL URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/graphql", post(answer))
            .with_state(self.clone());
        format!("{}/graphql", spawn_router(app).await)
    }
}

async fn answer(State(mock): State<MockLedger>, Json(body): Json<Value>) -> Response {
    mock.seen.lock().expect("Mock lock poisoned").push(body);
    match &mock.reply {
        Value::String(raw) => (mock.status, raw.clone()).into_response(),
        reply => (mock.status, Json(reply.clone())).into_response(),
    }
}

/// Serves a router on an ephemeral port and returns its base URL.
pub async fn spawn_router(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    format!("http://{addr}")
}

/// Base URL of a port with nothing listening on it.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    drop(listener);
    format!("http://{addr}")
}
