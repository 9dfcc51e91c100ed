use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use anyhow::Result;

mod ai;
mod auth;
mod config;
mod context;
mod cycle_math;
mod db;
mod error;
mod models;
mod patterns;
mod prediction;
mod routes;
mod service;

/// Shared handler state: the pool plus the two outbound collaborators.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ai: ai::AiClient,
    pub verifier: auth::TokenVerifier,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    db::init_db(&pool).await?;

    let state = AppState {
        pool,
        ai: ai::AiClient::new(&config.openai_base_url, &config.openai_api_key, &config.openai_model),
        verifier: auth::TokenVerifier::new(&config.identity_base_url, &config.identity_secret_key),
    };

    let app = Router::new()
        .merge(routes::user::routes(state.clone()))
        .merge(routes::periods::routes(state.clone()))
        .merge(routes::symptoms::routes(state.clone()))
        .merge(routes::moods::routes(state.clone()))
        .merge(routes::notes::routes(state.clone()))
        .merge(routes::settings::routes(state.clone()))
        .merge(routes::predictions::routes(state.clone()))
        .merge(routes::chat::routes(state.clone()))
        .route("/health", get(|| async { "✅ Backend up" }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🧠 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
