//! Google ID token verification.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{Error, Result};

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
}

/// Verifies a third-party identity token and returns the profile it asserts.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile>;
}

/// Checks ID tokens against Google's tokeninfo endpoint.
pub struct GoogleTokenVerifier {
    http: reqwest::Client,
    client_id: String,
}

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| Error::Internal {
                operation: format!("google tokeninfo request: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Unauthenticated {
                message: "Invalid Google ID token".to_string(),
            });
        }

        let info: TokenInfo = response.json().await.map_err(|e| Error::Internal {
            operation: format!("google tokeninfo decode: {e}"),
        })?;

        if info.aud != self.client_id {
            return Err(Error::Unauthenticated {
                message: "Google ID token was issued for a different application".to_string(),
            });
        }

        let name = info.name.unwrap_or_else(|| info.email.clone());
        Ok(GoogleProfile {
            email: info.email,
            name,
        })
    }
}
