mod configuration;
mod routes;
mod state;

use std::process;
use std::sync::Arc;

use herald::config::{build_agent, AgentConfig};
use herald::notifier::{Notifier, SendGridNotifier};
use herald::remediation;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::{AgentHandle, AppState, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = configuration::Settings::new()?;

    // Missing Azure settings are fatal, the agent itself is only built on the first chat
    let agent_config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", remediation::describe_config(&e));
            process::exit(1);
        }
    };
    let notifier: Arc<dyn Notifier> = Arc::new(SendGridNotifier::new());
    let agent = AgentHandle::new(move || build_agent(&agent_config, notifier.clone()));

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let sessions = SessionStore::with_capacity(settings.server.max_sessions);
    let app = routes::configure(AppState::new(agent).with_sessions(sessions)).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
