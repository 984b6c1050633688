//! Answer context assembly.
//!
//! Pulls the account's active resume and preferences together into the
//! context the prompt builder works from. Missing preference fields get
//! serviceable defaults; a missing resume is an error, because the whole
//! point of the product is resume-aware answers.

use crate::errors::{Error, Result};
use crate::store::Store;
use crate::types::AccountId;

pub const DEFAULT_JOB_ROLE: &str = "Software Developer";
pub const DEFAULT_TONE: &str = "Professional";
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone)]
pub struct ResumeContext {
    pub resume_text: String,
    pub job_role: String,
    pub tone: String,
    pub preferred_language: String,
    pub extra_info: String,
}

impl ResumeContext {
    /// Context for questions that answer from their own content when the
    /// account has no resume on file.
    pub fn fallback() -> Self {
        Self {
            resume_text: String::new(),
            job_role: DEFAULT_JOB_ROLE.to_string(),
            tone: DEFAULT_TONE.to_string(),
            preferred_language: DEFAULT_LANGUAGE.to_string(),
            extra_info: String::new(),
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Load the account's active resume into a [`ResumeContext`].
pub async fn load(store: &dyn Store, account_id: AccountId) -> Result<ResumeContext> {
    let resume = store
        .get_active_resume(account_id)
        .await?
        .ok_or(Error::NoActiveResume(account_id))?;

    Ok(ResumeContext {
        resume_text: resume.text,
        job_role: or_default(&resume.job_role, DEFAULT_JOB_ROLE),
        tone: or_default(&resume.tone, DEFAULT_TONE),
        preferred_language: or_default(&resume.preferred_language, DEFAULT_LANGUAGE),
        extra_info: resume.extra_info.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::models::{AccountCreate, AuthProvider, ResumeCreate, Role};

    async fn account(store: &MemoryStore) -> AccountId {
        store
            .create_account(AccountCreate {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                role: Role::User,
                auth_provider: AuthProvider::Email,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn missing_resume_is_an_error() {
        let store = MemoryStore::new();
        let id = account(&store).await;
        let result = load(&store, id).await;
        assert!(matches!(result, Err(Error::NoActiveResume(_))));
    }

    #[tokio::test]
    async fn empty_preferences_get_defaults() {
        let store = MemoryStore::new();
        let id = account(&store).await;
        store
            .create_resume(ResumeCreate {
                account_id: id,
                text: "Five years of Rust.".into(),
                preferred_language: "  ".into(),
                tone: String::new(),
                job_role: String::new(),
                extra_info: "  open to relocation  ".into(),
            })
            .await
            .unwrap();

        let ctx = load(&store, id).await.unwrap();
        assert_eq!(ctx.job_role, DEFAULT_JOB_ROLE);
        assert_eq!(ctx.tone, DEFAULT_TONE);
        assert_eq!(ctx.preferred_language, DEFAULT_LANGUAGE);
        assert_eq!(ctx.extra_info, "open to relocation");
        assert_eq!(ctx.resume_text, "Five years of Rust.");
    }

    #[tokio::test]
    async fn explicit_preferences_are_kept() {
        let store = MemoryStore::new();
        let id = account(&store).await;
        store
            .create_resume(ResumeCreate {
                account_id: id,
                text: "resume".into(),
                preferred_language: "Hindi".into(),
                tone: "Casual".into(),
                job_role: "Data Engineer".into(),
                extra_info: String::new(),
            })
            .await
            .unwrap();

        let ctx = load(&store, id).await.unwrap();
        assert_eq!(ctx.preferred_language, "Hindi");
        assert_eq!(ctx.tone, "Casual");
        assert_eq!(ctx.job_role, "Data Engineer");
    }
}
