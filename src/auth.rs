//! Identity collaborator. Tokens are opaque here: the bearer token is handed
//! to the identity provider over HTTP and the provider answers with the
//! subject claims or a refusal. This crate never decodes tokens itself.
//!
//! A provider refusal surfaces as `Unauthorized`; a provider outage surfaces
//! as `Upstream`, so callers can tell "bad token" from "cannot check tokens".

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use serde::Deserialize;
use sqlx::PgPool;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::User;

/// Claims for a verified token, as the provider reports them.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct TokenVerifier {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl TokenVerifier {
    pub fn new(base_url: &str, secret_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Ask the provider whether `token` is valid. `Ok(None)` means the
    /// provider rejected it; `Err` means the provider could not be reached.
    pub async fn verify(&self, token: &str) -> ApiResult<Option<Identity>> {
        let url = format!("{}/tokens/verify", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("❌ identity provider unreachable: {e}");
                ApiError::Upstream("identity provider")
            })?;

        let status = response.status();
        if status.is_server_error() {
            tracing::error!("❌ identity provider returned {status}");
            return Err(ApiError::Upstream("identity provider"));
        }
        if !status.is_success() {
            return Ok(None);
        }

        #[derive(Deserialize)]
        struct Claims {
            sub: String,
            #[serde(default)]
            email: Option<String>,
        }

        let claims: Claims = response.json().await.map_err(|e| {
            tracing::error!("❌ identity provider sent an unreadable reply: {e}");
            ApiError::Upstream("identity provider")
        })?;

        Ok(Some(Identity {
            subject: claims.sub,
            email: claims.email,
        }))
    }
}

/// Verify the request's bearer token and return the claims.
pub async fn identify(verifier: &TokenVerifier, headers: &HeaderMap) -> ApiResult<Identity> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    verifier.verify(token).await?.ok_or(ApiError::Unauthorized)
}

/// Verify the token and resolve it to a provisioned user row. Routes other
/// than the profile endpoint expect the row to exist already.
pub async fn authenticate(
    verifier: &TokenVerifier,
    pool: &PgPool,
    headers: &HeaderMap,
) -> ApiResult<User> {
    let identity = identify(verifier, headers).await?;
    db::find_user_by_auth_id(pool, &identity.subject)
        .await?
        .ok_or(ApiError::NotFound("user"))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(
            bearer_token(&headers_with("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers_with("bearer lowercase")), None);
    }

    #[test]
    fn rejects_empty_tokens() {
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer    ")), None);
    }
}
