//! OpenAPI documentation for the HTTP API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api;
use crate::store::models;

/// Security scheme: JWT session token as a bearer header.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from `/auth/login/verify` or \
                             `/auth/login/google-token`. Starting a new session anywhere else \
                             invalidates this one.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api", description = "PrepMate API server")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login_email,
        api::handlers::auth::login_verify,
        api::handlers::auth::login_google,
        api::handlers::auth::me,
        api::handlers::interview::live_ask,
        api::handlers::interview::live_speech,
        api::handlers::interview::mock_ask,
        api::handlers::interview::mock_generate,
        api::handlers::interview::mock_feedback,
        api::handlers::ocr::extract_image,
        api::handlers::ocr::solve,
        api::handlers::resume::upload,
        api::handlers::resume::active,
        api::handlers::resume::activate,
        api::handlers::resume::list,
        api::handlers::history::my_history,
        api::handlers::payments::save_plan,
        api::handlers::admin::list_accounts,
        api::handlers::admin::list_payments,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::EmailLoginRequest,
            api::models::auth::VerifyOtpRequest,
            api::models::auth::GoogleLoginRequest,
            api::models::auth::OtpSentResponse,
            api::models::auth::SessionResponse,
            api::models::auth::AccountResponse,
            api::models::auth::PlanResponse,
            api::models::ask::AskRequest,
            api::models::ask::AnswerResponse,
            api::models::ask::SpeechResponse,
            api::models::ask::ExtractedTextResponse,
            api::models::ask::SolveRequest,
            api::models::ask::MockInterviewResponse,
            api::models::ask::MockFeedbackRequest,
            api::models::ask::MockFeedbackResponse,
            api::models::resume::ResumeUploadRequest,
            api::models::resume::ActivateResumeRequest,
            api::models::resume::ResumeResponse,
            api::models::history::LogEntryResponse,
            api::models::payments::SavePlanRequest,
            api::models::payments::PaymentResponse,
            api::handlers::payments::SavePlanResponse,
            api::models::accounts::AdminAccountResponse,
            models::Role,
            models::AuthProvider,
            models::PlanName,
            models::LogSource,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, OTP email login, and Google sign-in"),
        (name = "interview", description = "Live and mock interview answer generation"),
        (name = "ocr", description = "Screenshot question extraction and solving"),
        (name = "resume", description = "Resume uploads and preferences"),
        (name = "history", description = "Question and answer history"),
        (name = "payments", description = "Plan purchases"),
        (name = "admin", description = "Admin-only account and payment listings"),
    ),
    info(
        title = "PrepMate API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Interview answer assistant: answers live and mock interview questions \
            in the candidate's own voice, from their resume."
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_serializes_and_carries_paths() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("openapi spec should serialize");
        assert!(json.contains("/live/ask"));
        assert!(json.contains("/auth/login/verify"));
        assert!(json.contains("BearerAuth"));
    }

    #[test]
    fn id_fields_document_as_uuid_strings() {
        let value =
            serde_json::to_value(ApiDoc::openapi()).expect("openapi spec should serialize");
        let id = &value["components"]["schemas"]["AccountResponse"]["properties"]["id"];
        assert_eq!(id["type"], "string");
        assert_eq!(id["format"], "uuid");
    }
}
