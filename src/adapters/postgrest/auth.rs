//! PostgREST Authentication - API Key and Bearer Token Headers
//!
//! Every request carries the project's `apikey` header and an
//! `Authorization: Bearer` token. The token is the signed-in user's
//! access token when one is configured, otherwise the API key itself.
//! Credentials come from environment variables (TREEHOLE_API_KEY,
//! optional TREEHOLE_ACCESS_TOKEN), never from config.toml.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::RequestBuilder;

/// Credentials attached to every backend request.
pub struct PostgrestAuth {
    /// Project API key from TREEHOLE_API_KEY.
    api_key: String,
    /// Optional user access token from TREEHOLE_ACCESS_TOKEN.
    access_token: Option<String>,
}

impl PostgrestAuth {
    pub fn new(api_key: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Load credentials from environment variables.
    ///
    /// Required: TREEHOLE_API_KEY. Optional: TREEHOLE_ACCESS_TOKEN.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TREEHOLE_API_KEY").context("TREEHOLE_API_KEY not set")?;
        let access_token = std::env::var("TREEHOLE_ACCESS_TOKEN").ok();
        Ok(Self::new(api_key, access_token))
    }

    /// Token sent as the bearer credential.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    pub fn has_user_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Attach the auth headers to a request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }
}

impl fmt::Debug for PostgrestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestAuth")
            .field("api_key", &"<redacted>")
            .field("has_user_token", &self.has_user_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_falls_back_to_api_key() {
        let auth = PostgrestAuth::new("anon-key", None);
        assert_eq!(auth.bearer(), "anon-key");
        assert!(!auth.has_user_token());

        let blank = PostgrestAuth::new("anon-key", Some("  ".to_string()));
        assert_eq!(blank.bearer(), "anon-key");
    }

    #[test]
    fn test_apply_sets_both_headers() {
        let auth = PostgrestAuth::new("anon-key", Some("user-jwt".to_string()));
        let request = auth
            .apply(reqwest::Client::new().get("http://localhost/rest/v1/bottles"))
            .build()
            .unwrap();

        assert_eq!(request.headers()["apikey"], "anon-key");
        assert_eq!(request.headers()["authorization"], "Bearer user-jwt");
    }

    #[test]
    fn test_debug_redacts_key() {
        let auth = PostgrestAuth::new("secret-key", None);
        let printed = format!("{auth:?}");
        assert!(!printed.contains("secret-key"));
    }
}
