use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

// Never touches the agent, so it answers even when the model is unreachable
async fn handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub fn routes() -> Router {
    Router::new().route("/healthz", get(handler))
}
