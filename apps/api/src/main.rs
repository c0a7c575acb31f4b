mod auth;
mod clock;
mod config;
mod db;
mod errors;
mod json;
mod models;
mod resumes;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::{CredentialService, TokenService};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::create_pool;
use crate::resumes::ResumeService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, ResumeRepository, UserRepository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Forest API v{}", env!("CARGO_PKG_VERSION"));

    // Storage: PostgreSQL when configured, otherwise in-process
    let (users, resumes): (Arc<dyn UserRepository>, Arc<dyn ResumeRepository>) =
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::new(create_pool(url).await?));
                (
                    store.clone() as Arc<dyn UserRepository>,
                    store as Arc<dyn ResumeRepository>,
                )
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory storage (data is lost on exit)");
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone() as Arc<dyn UserRepository>,
                    store as Arc<dyn ResumeRepository>,
                )
            }
        };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_ttl = chrono::Duration::try_hours(config.token_ttl_hours)
        .context("TOKEN_TTL_HOURS is out of range")?;

    let state = AppState {
        credentials: Arc::new(CredentialService::new(
            users,
            clock.clone(),
            config.bcrypt_cost,
        )),
        tokens: Arc::new(TokenService::new(
            &config.jwt_secret,
            token_ttl,
            clock.clone(),
        )),
        resumes: Arc::new(ResumeService::new(resumes, clock)),
    };
    info!(
        "Token TTL {}h, bcrypt cost {}",
        config.token_ttl_hours, config.bcrypt_cost
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins to the deployed frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
