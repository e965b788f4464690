//! folio-relay - resume-grounded portfolio chat API
//!
//! Serves a portfolio profile and relays visitor chat to a completion
//! provider as an AI persona grounded in a resume text. Session state lives
//! in process memory only; a restart drops every transcript.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod conversation;
mod core;
mod portfolio;
mod providers;
mod routes;

use crate::auth::{CredentialStore, StaticCredentials};
use crate::config::Config;
use crate::core::store::PUBLIC_SESSION;
use crate::core::{ChatRelay, SessionStore};
use crate::providers::deepseek::CompletionClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<SessionStore>,
    pub relay: Arc<ChatRelay>,
    pub client: CompletionClient,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(SessionStore::new());
        let client = CompletionClient::new(&config.api_url, config.api_key.clone());
        let relay = Arc::new(ChatRelay::new(
            Arc::clone(&store),
            client.clone(),
            &config,
        ));
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(StaticCredentials::new(config.secret_key.clone()));

        Self {
            config,
            store,
            relay,
            client,
            credentials,
        }
    }
}

/// Seed the public session from the configured resume file, if present.
fn load_public_resume(state: &AppState) {
    match std::fs::read_to_string(&state.config.resume_file) {
        Ok(text) if !text.trim().is_empty() => {
            let text = text.trim().to_string();
            tracing::info!(
                "Public resume loaded from {} ({} chars)",
                state.config.resume_file,
                text.len()
            );
            state.store.put(PUBLIC_SESSION, text, "system");
        }
        Ok(_) => tracing::warn!(
            "Resume file {} is empty; public chat is unavailable",
            state.config.resume_file
        ),
        Err(err) => tracing::warn!(
            "No resume loaded from {}: {err}",
            state.config.resume_file
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if !config.api_configured() {
        tracing::warn!("DEEPSEEK_API_KEY not configured; chat responses will be degraded");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config);
    load_public_resume(&state);

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("folio-relay running at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
