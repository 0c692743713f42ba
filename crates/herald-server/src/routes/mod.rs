pub mod chat;
pub mod health;

use axum::Router;

use crate::state::AppState;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(chat::routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AgentHandle;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz_without_agent() {
        let app = configure(AppState::new(AgentHandle::new(|| {
            anyhow::bail!("AZURE_OPENAI_ENDPOINT unreachable")
        })));

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }
}
