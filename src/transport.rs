//! The transport adapter: a thin `axum` binding onto [`Node`]. This module
//! owns the wire DTOs and the translation from core status variants to HTTP
//! status codes; no causal logic lives here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{NodeId, Stamp};
use crate::dispatcher::Node;
use crate::error::MalformedMessage;
use crate::store::ApplyOutcome;

#[derive(Debug, Deserialize)]
struct WriteRequest {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct WriteResponse {
    status: &'static str,
    clock: Stamp,
}

#[derive(Debug, Deserialize)]
struct ReplicateRequest {
    key: String,
    value: String,
    clock: Stamp,
    sender: NodeId,
}

#[derive(Debug, Serialize)]
struct ReplicateResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ReadResponse {
    value: String,
    clock: Stamp,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

impl IntoResponse for MalformedMessage {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/write", post(write))
        .route("/replicate", post(replicate))
        .route("/read/:key", get(read))
        .route("/status", get(status))
        .route("/health", get(health))
        .with_state(node)
}

async fn write(State(node): State<Arc<Node>>, Json(req): Json<WriteRequest>) -> impl IntoResponse {
    let clock = node.local_write(req.key, req.value).await;
    Json(WriteResponse {
        status: "success",
        clock,
    })
}

async fn replicate(
    State(node): State<Arc<Node>>,
    Json(req): Json<ReplicateRequest>,
) -> Result<Json<ReplicateResponse>, MalformedMessage> {
    let outcome = node
        .apply_replication(req.key, req.value, req.clock, req.sender)
        .await?;
    let status = match outcome {
        ApplyOutcome::Applied => "processed",
        ApplyOutcome::Buffered => "buffered",
        ApplyOutcome::Duplicate => "duplicate",
    };
    info!(sender = req.sender, status, "replication received");
    Ok(Json(ReplicateResponse { status }))
}

async fn read(State(node): State<Arc<Node>>, Path(key): Path<String>) -> Response {
    match node.read(&key).await {
        Some(entry) => Json(ReadResponse {
            value: entry.value,
            clock: entry.stamp,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "key not found".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn status(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.snapshot().await)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}
