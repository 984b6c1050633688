//! # prepmate: Interview Answer Assistant
//!
//! `prepmate` is the backend for an interview preparation assistant. It answers
//! live and mock interview questions in the candidate's own voice, grounded in
//! their uploaded resume, over three capture channels: typed text, speech
//! recordings, and screenshots of on-screen questions.
//!
//! ## Overview
//!
//! Accounts sign in by email one-time code or a Google ID token. Each account
//! holds exactly one valid session at a time: logging in anywhere issues a new
//! token and revokes the previous one on its next request. Every account is on
//! a plan (Free, Basic, or Pro) with a daily answer limit; paid plans expire
//! and drop back to Free automatically.
//!
//! ### Request Flow
//!
//! An answer request is authenticated, normalized into a plain question (speech
//! is transcribed and cleaned up, screenshots are read by a vision model), then
//! run through one pipeline: load the active resume and preferences, spend one
//! quota slot, generate the answer as the candidate persona, and append the
//! exchange to the account's interview log. Provider failure after the quota
//! spend does not fail the request; the client gets a fixed fallback answer
//! marked as degraded.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the client API under `/api/*` with
//! OpenAPI documentation at `/api-docs/openapi.json`.
//!
//! The **authentication layer** ([`auth`]) mints and verifies JWT session
//! tokens and enforces the single-active-session rule in the request
//! extractor.
//!
//! The **store layer** ([`store`]) abstracts persistence behind the
//! [`Store`](store::Store) trait, with an in-memory backend for development
//! and tests and a PostgreSQL backend for production. Quota consumption is a
//! single conditional update so concurrent requests can never overshoot the
//! daily limit.
//!
//! A **background daemon** ([`jobs`]) sweeps usage counters and expired plans
//! daily; the quota guard already handles both lazily per account, so the
//! sweep only keeps dormant accounts tidy.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use prepmate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = prepmate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     prepmate::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod answer;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod email;
pub mod errors;
pub mod jobs;
pub mod mock;
mod openapi;
pub mod providers;
pub mod question;
pub mod quota;
pub mod store;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use bon::Builder;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, Level};
use utoipa::OpenApi;

use crate::auth::IdentityVerifier;
use crate::email::EmailService;
use crate::openapi::ApiDoc;
use crate::providers::{AnswerProvider, OpenAiProvider};
use crate::store::memory::MemoryStore;
use crate::store::postgres::PostgresStore;
use crate::store::Store;

pub use crate::config::Config;
pub use crate::errors::{Error, Result};

/// Shared application state handed to every handler.
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn AnswerProvider>,
    /// Google sign-in verifier; `None` when no client ID is configured.
    pub verifier: Option<Arc<dyn IdentityVerifier>>,
    pub mailer: Arc<EmailService>,
    pub config: Config,
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login/email", post(api::handlers::auth::login_email))
        .route("/auth/login/verify", post(api::handlers::auth::login_verify))
        .route(
            "/auth/login/google-token",
            post(api::handlers::auth::login_google),
        )
        .route("/auth/me", get(api::handlers::auth::me))
        .route("/live/ask", post(api::handlers::interview::live_ask))
        .route("/live/speech", post(api::handlers::interview::live_speech))
        .route("/mock/ask", post(api::handlers::interview::mock_ask))
        .route(
            "/mock/generate",
            post(api::handlers::interview::mock_generate),
        )
        .route(
            "/mock/feedback",
            post(api::handlers::interview::mock_feedback),
        )
        .route("/ocr/image", post(api::handlers::ocr::extract_image))
        .route("/ocr/solve", post(api::handlers::ocr::solve))
        .route("/resume", get(api::handlers::resume::list))
        .route("/resume/upload", post(api::handlers::resume::upload))
        .route(
            "/resume/active",
            get(api::handlers::resume::active).put(api::handlers::resume::activate),
        )
        .route("/history/my", get(api::handlers::history::my_history))
        .route("/payment/save-plan", post(api::handlers::payments::save_plan))
        .route("/admin/users", get(api::handlers::admin::list_accounts))
        .route("/admin/payments", get(api::handlers::admin::list_payments))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(api::handlers::healthz))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api", api_routes)
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Background tasks running alongside the HTTP server, with their shutdown
/// handle.
pub struct BackgroundServices {
    shutdown_token: CancellationToken,
    reset_daemon: Option<tokio::task::JoinHandle<()>>,
}

impl BackgroundServices {
    fn start(store: Arc<dyn Store>, config: &Config) -> Self {
        let shutdown_token = CancellationToken::new();

        let reset_daemon = if config.reset.enabled {
            let store = store.clone();
            let interval = config.reset.interval;
            let cancel = shutdown_token.clone();
            Some(tokio::spawn(jobs::run_reset_daemon(store, interval, cancel)))
        } else {
            None
        };

        Self {
            shutdown_token,
            reset_daemon,
        }
    }

    /// Signal all background tasks to stop and wait for them to finish.
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        if let Some(handle) = self.reset_daemon {
            if let Err(e) = handle.await {
                error!("Reset daemon task panicked: {e}");
            }
        }
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// [`Application::new`] connects the store (running migrations on PostgreSQL),
/// wires up the provider, email, and Google verifier, and starts background
/// services. [`Application::serve`] binds the listener and runs until the
/// shutdown future resolves, then stops background tasks.
pub struct Application {
    router: Router,
    config: Config,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting prepmate with configuration: {:#?}", config);

        let store: Arc<dyn Store> = match &config.database {
            config::DatabaseConfig::Memory => {
                info!("Using in-memory store; nothing will be persisted");
                Arc::new(MemoryStore::new())
            }
            config::DatabaseConfig::External { url } => {
                Arc::new(PostgresStore::connect(url).await?)
            }
        };

        let provider: Arc<dyn AnswerProvider> = Arc::new(OpenAiProvider::new(&config.providers));

        let verifier: Option<Arc<dyn IdentityVerifier>> =
            config.google.client_id.clone().map(|client_id| {
                Arc::new(auth::GoogleTokenVerifier::new(client_id)) as Arc<dyn IdentityVerifier>
            });
        if verifier.is_none() {
            info!("Google sign-in disabled (no google.client_id configured)");
        }

        let mailer = Arc::new(EmailService::new(&config)?);

        let bg_services = BackgroundServices::start(store.clone(), &config);

        let state = AppState::builder()
            .store(store)
            .provider(provider)
            .maybe_verifier(verifier)
            .mailer(mailer)
            .config(config.clone())
            .build();

        let router = build_router(&state)?;

        Ok(Self {
            router,
            config,
            bg_services,
        })
    }

    /// Start serving the application until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("prepmate listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.bg_services.shutdown().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use crate::store::Store;
    use crate::test_utils::{create_test_app, create_test_app_with_verifier, MockProvider, TestApp};

    /// Register an account and complete the email OTP login, returning the
    /// session token. The OTP is read back out of the store, the same code
    /// that went into the login email.
    async fn register_and_login(app: &TestApp, name: &str, email: &str) -> String {
        let response = app
            .server
            .post("/api/auth/register")
            .json(&json!({ "name": name, "email": email }))
            .await;
        response.assert_status_ok();

        login(app, email).await
    }

    async fn login(app: &TestApp, email: &str) -> String {
        let account = app
            .store
            .get_account_by_email(email)
            .await
            .unwrap()
            .expect("account should exist");
        let otp = account.otp.expect("an OTP should be pending");

        let response = app
            .server
            .post("/api/auth/login/verify")
            .json(&json!({ "email": email, "otp": otp }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["token"].as_str().expect("token in response").to_string()
    }

    async fn upload_resume(app: &TestApp, token: &str) {
        let response = app
            .server
            .post("/api/resume/upload")
            .authorization_bearer(token)
            .json(&json!({
                "text": "Five years of Rust backend work.",
                "job_role": "Backend Engineer",
            }))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn healthz_is_open() {
        let app = create_test_app(MockProvider::new());
        let response = app.server.get("/healthz").await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn openapi_spec_is_served() {
        let app = create_test_app(MockProvider::new());
        let response = app.server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/live/ask"].is_object());
    }

    #[tokio::test]
    async fn email_login_flow_issues_a_working_session() {
        let app = create_test_app(MockProvider::new());
        let token = register_and_login(&app, "Asha", "asha@test.com").await;

        let response = app
            .server
            .get("/api/auth/me")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["email"], "asha@test.com");
        assert_eq!(body["plan"]["name"], "Free");
    }

    #[tokio::test]
    async fn wrong_otp_is_rejected() {
        let app = create_test_app(MockProvider::new());
        app.server
            .post("/api/auth/register")
            .json(&json!({ "name": "Asha", "email": "asha@test.com" }))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post("/api/auth/login/verify")
            .json(&json!({ "email": "asha@test.com", "otp": "000000" }))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = create_test_app(MockProvider::new());
        app.server
            .post("/api/auth/register")
            .json(&json!({ "name": "Asha", "email": "asha@test.com" }))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post("/api/auth/register")
            .json(&json!({ "name": "Asha", "email": "Asha@Test.com" }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[test_log::test(tokio::test)]
    async fn second_login_revokes_the_first_session() {
        let app = create_test_app(MockProvider::new());
        let first = register_and_login(&app, "Asha", "asha@test.com").await;

        // The first token works until the account signs in again.
        app.server
            .get("/api/auth/me")
            .authorization_bearer(&first)
            .await
            .assert_status_ok();

        app.server
            .post("/api/auth/login/email")
            .json(&json!({ "email": "asha@test.com" }))
            .await
            .assert_status_ok();
        let second = login(&app, "asha@test.com").await;

        app.server
            .get("/api/auth/me")
            .authorization_bearer(&first)
            .await
            .assert_status_unauthorized();
        app.server
            .get("/api/auth/me")
            .authorization_bearer(&second)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn google_login_without_configuration_is_rejected() {
        let app = create_test_app(MockProvider::new());
        let response = app
            .server
            .post("/api/auth/login/google-token")
            .json(&json!({ "id_token": "anything" }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn google_login_creates_an_account_and_session() {
        use crate::auth::GoogleProfile;
        use crate::test_utils::MockVerifier;
        use std::sync::Arc;

        let verifier = MockVerifier {
            expected_token: "good-token".to_string(),
            profile: GoogleProfile {
                email: "ravi@test.com".to_string(),
                name: "Ravi".to_string(),
            },
        };
        let app = create_test_app_with_verifier(MockProvider::new(), Some(Arc::new(verifier)));

        let response = app
            .server
            .post("/api/auth/login/google-token")
            .json(&json!({ "id_token": "good-token" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["account"]["email"], "ravi@test.com");

        let response = app
            .server
            .post("/api/auth/login/google-token")
            .json(&json!({ "id_token": "bad-token" }))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn ask_without_a_resume_is_rejected_before_quota() {
        let app = create_test_app(MockProvider::new().with_completion("An answer."));
        let token = register_and_login(&app, "Asha", "asha@test.com").await;

        let response = app
            .server
            .post("/api/live/ask")
            .authorization_bearer(&token)
            .json(&json!({ "question": "Tell me about yourself" }))
            .await;
        response.assert_status_bad_request();

        // The rejection must not have cost a quota slot.
        let me: Value = app
            .server
            .get("/api/auth/me")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(me["plan"]["used_today"], 0);
    }

    #[test_log::test(tokio::test)]
    async fn free_plan_allows_three_answers_a_day() {
        let app = create_test_app(MockProvider::new().with_completion("I would use a HashMap."));
        let token = register_and_login(&app, "Asha", "asha@test.com").await;
        upload_resume(&app, &token).await;

        for _ in 0..3 {
            let response = app
                .server
                .post("/api/live/ask")
                .authorization_bearer(&token)
                .json(&json!({ "question": "How would you count word frequencies?" }))
                .await;
            response.assert_status_ok();
            let body: Value = response.json();
            assert_eq!(body["answer"], "I would use a HashMap.");
            assert_eq!(body["degraded"], false);
        }

        let response = app
            .server
            .post("/api/live/ask")
            .authorization_bearer(&token)
            .json(&json!({ "question": "One more?" }))
            .await;
        response.assert_status_forbidden();
    }

    #[test_log::test(tokio::test)]
    async fn provider_failure_degrades_but_still_answers_and_logs() {
        let app = create_test_app(MockProvider::new().with_completion_failure());
        let token = register_and_login(&app, "Asha", "asha@test.com").await;
        upload_resume(&app, &token).await;

        let response = app
            .server
            .post("/api/mock/ask")
            .authorization_bearer(&token)
            .json(&json!({ "question": "Tell me about yourself" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["degraded"], true);
        assert_eq!(body["answer"], crate::answer::FALLBACK_ANSWER);

        // The degraded exchange still lands in the history.
        let history: Value = app
            .server
            .get("/api/history/my")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(history["total_count"], 1);
        assert_eq!(history["data"][0]["degraded"], true);
    }

    #[tokio::test]
    async fn history_pages_newest_first_and_filters_by_source() {
        let app = create_test_app(MockProvider::new().with_completion("Answer."));
        let token = register_and_login(&app, "Asha", "asha@test.com").await;
        upload_resume(&app, &token).await;

        app.server
            .post("/api/live/ask")
            .authorization_bearer(&token)
            .json(&json!({ "question": "First" }))
            .await
            .assert_status_ok();
        app.server
            .post("/api/mock/ask")
            .authorization_bearer(&token)
            .json(&json!({ "question": "Second" }))
            .await
            .assert_status_ok();

        let all: Value = app
            .server
            .get("/api/history/my")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(all["total_count"], 2);
        assert_eq!(all["data"][0]["question"], "Second");

        let mock_only: Value = app
            .server
            .get("/api/history/my")
            .add_query_param("source", "mock")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(mock_only["total_count"], 1);
        assert_eq!(mock_only["data"][0]["question"], "Second");
    }

    #[tokio::test]
    async fn mock_generation_requires_a_resume() {
        let app = create_test_app(MockProvider::new().with_completion("Q1: ...\nA1: ..."));
        let token = register_and_login(&app, "Asha", "asha@test.com").await;

        app.server
            .post("/api/mock/generate")
            .authorization_bearer(&token)
            .await
            .assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn mock_generation_has_its_own_daily_limit() {
        let app = create_test_app(
            MockProvider::new().with_completion("Q1: Tell me about yourself.\nA1: ..."),
        );
        let token = register_and_login(&app, "Asha", "asha@test.com").await;
        upload_resume(&app, &token).await;

        for _ in 0..10 {
            let response = app
                .server
                .post("/api/mock/generate")
                .authorization_bearer(&token)
                .await;
            response.assert_status_ok();
            let body: Value = response.json();
            assert_eq!(body["interview"], "Q1: Tell me about yourself.\nA1: ...");
        }

        app.server
            .post("/api/mock/generate")
            .authorization_bearer(&token)
            .await
            .assert_status_forbidden();

        // Ten practice interviews cost zero answer quota.
        let me: Value = app
            .server
            .get("/api/auth/me")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(me["plan"]["used_today"], 0);
    }

    #[tokio::test]
    async fn mock_feedback_needs_both_question_and_answer() {
        let app = create_test_app(MockProvider::new().with_completion("Good answer, add detail."));
        let token = register_and_login(&app, "Asha", "asha@test.com").await;
        upload_resume(&app, &token).await;

        app.server
            .post("/api/mock/feedback")
            .authorization_bearer(&token)
            .json(&json!({ "question": "Why this role?", "answer": "  " }))
            .await
            .assert_status_bad_request();

        let response = app
            .server
            .post("/api/mock/feedback")
            .authorization_bearer(&token)
            .json(&json!({
                "question": "Why this role?",
                "answer": "Because I like distributed systems.",
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["feedback"], "Good answer, add detail.");
    }

    #[tokio::test]
    async fn buying_a_plan_raises_the_daily_limit() {
        let app = create_test_app(MockProvider::new().with_completion("Answer."));
        let token = register_and_login(&app, "Asha", "asha@test.com").await;

        let response = app
            .server
            .post("/api/payment/save-plan")
            .authorization_bearer(&token)
            .json(&json!({ "plan_name": "Basic", "amount_inr": 499 }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["account"]["plan"]["name"], "Basic");
        assert_eq!(
            body["account"]["plan"]["daily_limit"],
            app.config.quota.basic_daily_limit
        );
    }

    #[tokio::test]
    async fn free_plan_cannot_be_purchased() {
        let app = create_test_app(MockProvider::new());
        let token = register_and_login(&app, "Asha", "asha@test.com").await;

        let response = app
            .server
            .post("/api/payment/save-plan")
            .authorization_bearer(&token)
            .json(&json!({ "plan_name": "Free", "amount_inr": 0 }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn admin_endpoints_require_the_admin_role() {
        let app = create_test_app(MockProvider::new());
        // The test config grants admin to admin@test.com.
        let admin_token = register_and_login(&app, "Admin", "admin@test.com").await;
        let user_token = register_and_login(&app, "Asha", "asha@test.com").await;

        app.server
            .get("/api/admin/users")
            .authorization_bearer(&user_token)
            .await
            .assert_status_forbidden();

        let response = app
            .server
            .get("/api/admin/users")
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total_count"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let app = create_test_app(MockProvider::new());
        app.server
            .get("/api/auth/me")
            .await
            .assert_status_unauthorized();
        app.server
            .post("/api/live/ask")
            .json(&json!({ "question": "Hello" }))
            .await
            .assert_status_unauthorized();
    }
}
