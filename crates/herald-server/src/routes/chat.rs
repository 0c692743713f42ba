use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use herald::{
    errors::ReplyError, models::lead::LeadRecord, remediation, session::TurnEvent,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    leads: Vec<LeadRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(status: StatusCode, error: String) -> ErrorReply {
    (status, Json(ErrorResponse { error }))
}

fn status_for(err: &ReplyError) -> StatusCode {
    match err {
        ReplyError::Provider(e) if e.is_connectivity() => StatusCode::SERVICE_UNAVAILABLE,
        ReplyError::Provider(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn validate(request: &ChatRequest) -> Result<(), ErrorReply> {
    if request.message.trim().is_empty() {
        return Err(error_reply(
            StatusCode::BAD_REQUEST,
            "message must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Event-stream body fed from a channel
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            body,
        )
            .into_response()
    }
}

struct EventFormatter;

impl EventFormatter {
    fn format_token(delta: &str) -> String {
        format!("data: {}\n\n", json!({"type": "token", "delta": delta}))
    }

    fn format_error(message: &str) -> String {
        format!("data: {}\n\n", json!({"type": "error", "message": message}))
    }

    fn format_done() -> String {
        format!("data: {}\n\n", json!({"type": "done"}))
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ErrorReply> {
    validate(&request)?;

    let agent = state.agent.get().await.map_err(|e| {
        tracing::error!("Failed to initialize agent: {:#}", e);
        error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Sorry, an error occurred: {}", e),
        )
    })?;

    let session = state.sessions.get(request.user_id.as_deref()).await;
    let mut session = session.lock().await;

    match session.respond(&agent, request.message.trim()).await {
        Ok(outcome) => Ok(Json(ChatResponse {
            response: outcome.reply,
            leads: outcome.leads,
        })),
        Err(e) => {
            tracing::error!("Error processing turn: {}", e);
            Err(error_reply(status_for(&e), remediation::describe(&e)))
        }
    }
}

async fn stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<SseResponse, ErrorReply> {
    validate(&request)?;

    // Create channel for streaming
    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    tokio::spawn(async move {
        let agent = match state.agent.get().await {
            Ok(agent) => agent,
            Err(e) => {
                tracing::error!("Failed to initialize agent: {:#}", e);
                let message = format!("Sorry, an error occurred: {}", e);
                let _ = tx.send(EventFormatter::format_error(&message)).await;
                let _ = tx.send(EventFormatter::format_done()).await;
                return;
            }
        };

        let session = state.sessions.get(request.user_id.as_deref()).await;
        let mut session = session.lock().await;
        let mut events = session.respond_streaming(&agent, request.message.trim());

        loop {
            match timeout(Duration::from_millis(500), events.next()).await {
                Ok(Some(Ok(TurnEvent::Delta(delta)))) => {
                    if let Err(e) = tx.send(EventFormatter::format_token(&delta)).await {
                        tracing::error!("Error sending token through channel: {}", e);
                        break;
                    }
                }
                Ok(Some(Ok(TurnEvent::Finished(_)))) => continue,
                Ok(Some(Err(e))) => {
                    tracing::error!("Error processing turn: {}", e);
                    let message = remediation::describe(&e);
                    let _ = tx.send(EventFormatter::format_error(&message)).await;
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    // Heartbeat, used to detect disconnected clients
                    if tx.is_closed() {
                        break;
                    }
                }
            }
        }

        let _ = tx.send(EventFormatter::format_done()).await;
    });

    Ok(SseResponse::new(stream))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(stream_handler))
        .with_state(state)
}
