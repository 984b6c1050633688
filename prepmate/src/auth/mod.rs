//! Authentication: JWT sessions, the current-account extractor, and Google
//! sign-in verification.
//!
//! Sessions are single-active: issuing a token records it on the account and
//! every request compares the presented token against that record, so logging
//! in anywhere else revokes the old session on its next request.

pub mod current_account;
pub mod google;
pub mod session;

use rand::Rng;

use crate::config::Config;
use crate::errors::Result;
use crate::store::models::Account;
use crate::store::Store;

pub use current_account::{AdminAccount, CurrentAccount};
pub use google::{GoogleProfile, GoogleTokenVerifier, IdentityVerifier};

/// Mint a session token for the account and record it as the only valid one.
pub async fn issue_session(store: &dyn Store, account: &Account, config: &Config) -> Result<String> {
    let token = session::create_session_token(account, config)?;
    store.start_session(account.id, &token).await?;
    Ok(token)
}

/// Generate a numeric one-time password of `digits` digits.
pub fn generate_otp(digits: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..digits).map(|_| rng.gen_range(0..10).to_string()).collect()
}
