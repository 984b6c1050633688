//! Request extractors for the authenticated account.
//!
//! [`CurrentAccount`] verifies the bearer token, then reloads the account
//! from the store and compares the presented token against the recorded
//! session. Role checks always use the stored role, never the claim, so an
//! old token cannot carry a role the account no longer holds.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::{
    auth::session,
    errors::Error,
    store::models::{Account, Role},
    types::abbrev_uuid,
    AppState,
};

pub struct CurrentAccount(pub Account);

/// Extractor that additionally requires the admin role.
pub struct AdminAccount(pub Account);

fn bearer_token(parts: &Parts) -> Result<&str, Error> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthenticated {
            message: "Missing Authorization header".to_string(),
        })?;
    let value = header.to_str().map_err(|_| Error::Unauthenticated {
        message: "Invalid Authorization header".to_string(),
    })?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthenticated {
            message: "Authorization header must be a bearer token".to_string(),
        })
}

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let token = bearer_token(parts)?;
        let claims = session::verify_session_token(token, &state.config)?;

        // Fresh lookup: the stored record decides whether this session is
        // still the active one and what the account may do.
        let account = match state.store.get_account(claims.sub).await {
            Ok(account) => account,
            Err(crate::store::StoreError::NotFound { .. }) => {
                return Err(Error::Unauthenticated {
                    message: "Account no longer exists".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if account.plan.current_session_token.as_deref() != Some(token) {
            return Err(Error::SessionRevoked(account.id));
        }

        debug!(account = %abbrev_uuid(&account.id), "authenticated request");
        Ok(CurrentAccount(account))
    }
}

impl FromRequestParts<AppState> for AdminAccount {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;
        if account.role != Role::Admin {
            return Err(Error::Forbidden {
                resource: "admin endpoints".to_string(),
            });
        }
        Ok(AdminAccount(account))
    }
}
