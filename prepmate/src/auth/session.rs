//! JWT session token creation and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    errors::Error,
    store::models::{Account, Role},
    types::AccountId,
};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: AccountId, // Subject (account ID)
    pub email: String,
    pub name: String,
    pub role: Role, // Advisory only; handlers re-check the stored role
    pub exp: i64,   // Expiration time
    pub iat: i64,   // Issued at
}

impl SessionClaims {
    pub fn new(account: &Account, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.jwt_expiry;

        Self {
            sub: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Create a JWT token for an account session
pub fn create_session_token(account: &Account, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(account, config);
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })?;

    let key = EncodingKey::from_secret(secret_key.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })?;

    let key = DecodingKey::from_secret(secret_key.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: "Invalid or expired session token".to_string(),
        },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{AuthProvider, Plan};
    use std::time::Duration;
    use uuid::Uuid;

    fn test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            auth: crate::config::AuthConfig {
                jwt_expiry: Duration::from_secs(3600),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn test_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Test Account".to_string(),
            email: "test@example.com".to_string(),
            role: Role::User,
            auth_provider: AuthProvider::Email,
            otp: None,
            plan: Plan::free_default(),
            mock_used_today: 0,
            mock_last_used_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_verify_roundtrip() {
        let config = test_config();
        let account = test_account();

        let token = create_session_token(&account, &config).unwrap();
        assert!(!token.is_empty());

        let claims = verify_session_token(&token, &config).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, account.email);
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn wrong_secret_is_unauthenticated() {
        let mut config = test_config();
        let token = create_session_token(&test_account(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_session_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let config = test_config();
        let account = test_account();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        let key = EncodingKey::from_secret(config.secret_key.as_ref().unwrap().as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let result = verify_session_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn malformed_tokens_are_unauthenticated() {
        let config = test_config();
        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_session_token(token, &config);
            assert!(
                matches!(result.unwrap_err(), Error::Unauthenticated { .. }),
                "expected Unauthenticated for token: {token}"
            );
        }
    }
}
