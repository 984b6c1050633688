//! Test utilities: a scripted provider, a scripted Google verifier, and an
//! in-memory test app (available with the `test-utils` feature).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;

use crate::auth::{GoogleProfile, IdentityVerifier};
use crate::config::{Config, EmailTransportConfig};
use crate::email::EmailService;
use crate::errors::Error;
use crate::providers::{AnswerProvider, AudioClip, CompletionKind, ImageCapture, ProviderError};
use crate::store::memory::MemoryStore;
use crate::AppState;

/// A provider that replays scripted responses. Anything not scripted fails,
/// so tests state exactly what they rely on.
#[derive(Debug, Default, Clone)]
pub struct MockProvider {
    completion: Option<String>,
    completion_fails: bool,
    transcript: Option<String>,
    transcription_fails: bool,
    extracted_text: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(mut self, text: &str) -> Self {
        self.completion = Some(text.to_string());
        self
    }

    pub fn with_completion_failure(mut self) -> Self {
        self.completion_fails = true;
        self
    }

    pub fn with_transcript(mut self, text: &str) -> Self {
        self.transcript = Some(text.to_string());
        self
    }

    pub fn with_transcription_failure(mut self) -> Self {
        self.transcription_fails = true;
        self
    }

    pub fn with_extracted_text(mut self, text: &str) -> Self {
        self.extracted_text = Some(text.to_string());
        self
    }
}

#[async_trait]
impl AnswerProvider for MockProvider {
    async fn complete(
        &self,
        _kind: CompletionKind,
        _system: &str,
        _user: &str,
    ) -> Result<String, ProviderError> {
        if self.completion_fails {
            return Err(ProviderError::Request("scripted completion failure".to_string()));
        }
        self.completion
            .clone()
            .ok_or_else(|| ProviderError::Request("no scripted completion".to_string()))
    }

    async fn transcribe(&self, _clip: AudioClip) -> Result<String, ProviderError> {
        if self.transcription_fails {
            return Err(ProviderError::Request(
                "scripted transcription failure".to_string(),
            ));
        }
        self.transcript
            .clone()
            .ok_or_else(|| ProviderError::Request("no scripted transcript".to_string()))
    }

    async fn extract_text(&self, _capture: ImageCapture) -> Result<String, ProviderError> {
        self.extracted_text
            .clone()
            .ok_or_else(|| ProviderError::Request("no scripted extraction".to_string()))
    }
}

/// A verifier that accepts exactly one ID token and returns a fixed profile.
pub struct MockVerifier {
    pub expected_token: String,
    pub profile: GoogleProfile,
}

#[async_trait]
impl IdentityVerifier for MockVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile, Error> {
        if id_token == self.expected_token {
            Ok(self.profile.clone())
        } else {
            Err(Error::Unauthenticated {
                message: "Invalid Google ID token".to_string(),
            })
        }
    }
}

pub fn create_test_config() -> Config {
    let temp_dir = std::env::temp_dir().join(format!(
        "prepmate-test-emails-{}-{}",
        std::process::id(),
        uuid::Uuid::new_v4()
    ));
    std::fs::create_dir_all(&temp_dir).expect("Failed to create test email directory");

    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-for-testing-only".to_string());
    config.admin_email = Some("admin@test.com".to_string());
    config.auth.jwt_expiry = Duration::from_secs(3600);
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().to_string(),
    };
    config
}

/// An in-memory app plus handles into its state for assertions.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

pub fn create_test_app(provider: MockProvider) -> TestApp {
    create_test_app_with_verifier(provider, None)
}

pub fn create_test_app_with_verifier(
    provider: MockProvider,
    verifier: Option<Arc<dyn IdentityVerifier>>,
) -> TestApp {
    let config = create_test_config();
    let store = Arc::new(MemoryStore::new());
    let mailer = EmailService::new(&config).expect("Failed to create email service");

    let state = AppState::builder()
        .store(store.clone())
        .provider(Arc::new(provider))
        .maybe_verifier(verifier)
        .mailer(Arc::new(mailer))
        .config(config.clone())
        .build();

    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        store,
        config,
    }
}
