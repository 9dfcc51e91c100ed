use std::env;

use anyhow::{Context, Result};

/// Process configuration, read once at startup. Every client built from it is
/// constructed in `main` and handed down through the router state.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub identity_base_url: String,
    pub identity_secret_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 3050,
        };
        let openai_api_key =
            env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let openai_model =
            env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let identity_base_url =
            env::var("IDENTITY_BASE_URL").context("IDENTITY_BASE_URL must be set")?;
        let identity_secret_key =
            env::var("IDENTITY_SECRET_KEY").context("IDENTITY_SECRET_KEY must be set")?;

        Ok(Self {
            database_url,
            port,
            openai_api_key,
            openai_base_url,
            openai_model,
            identity_base_url,
            identity_secret_key,
        })
    }
}
