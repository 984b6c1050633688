//! Authentication handlers: registration, OTP email login, Google login.

use axum::{extract::State, Json};

use crate::{
    api::models::auth::{
        AccountResponse, EmailLoginRequest, GoogleLoginRequest, OtpSentResponse, RegisterRequest,
        SessionResponse, VerifyOtpRequest,
    },
    auth::{self, CurrentAccount},
    errors::Error,
    store::models::{Account, AccountCreate, AuthProvider, Role},
    store::StoreError,
    AppState,
};

fn role_for_email(state: &AppState, email: &str) -> Role {
    match &state.config.admin_email {
        Some(admin) if admin.eq_ignore_ascii_case(email) => Role::Admin,
        _ => Role::User,
    }
}

async fn send_login_otp(state: &AppState, account: &Account) -> Result<(), Error> {
    let otp = auth::generate_otp(state.config.auth.otp_digits);
    state.store.set_otp(account.id, &otp).await?;
    state
        .mailer
        .send_otp_email(&account.email, &account.name, &otp)
        .await
}

/// Register a new account and send a login code to its email
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login code sent", body = OtpSentResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Account already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<OtpSentResponse>, Error> {
    let name = request.name.trim();
    let email = request.email.trim().to_lowercase();
    if name.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "A name and a valid email address are required".to_string(),
        });
    }

    let role = role_for_email(&state, &email);
    let account = state
        .store
        .create_account(AccountCreate {
            name: name.to_string(),
            email,
            role,
            auth_provider: AuthProvider::Email,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate { .. } => Error::Conflict {
                message: "An account with this email already exists".to_string(),
            },
            other => other.into(),
        })?;

    send_login_otp(&state, &account).await?;
    Ok(Json(OtpSentResponse {
        message: "Login code sent to your email".to_string(),
    }))
}

/// Request a login code for an existing account
#[utoipa::path(
    post,
    path = "/auth/login/email",
    request_body = EmailLoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login code sent", body = OtpSentResponse),
        (status = 404, description = "No account with this email"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_email(
    State(state): State<AppState>,
    Json(request): Json<EmailLoginRequest>,
) -> Result<Json<OtpSentResponse>, Error> {
    let email = request.email.trim().to_lowercase();
    let account = state
        .store
        .get_account_by_email(&email)
        .await?
        .ok_or(Error::NotFound {
            resource: "account",
            id: email,
        })?;

    send_login_otp(&state, &account).await?;
    Ok(Json(OtpSentResponse {
        message: "Login code sent to your email".to_string(),
    }))
}

/// Exchange a login code for a session token
#[utoipa::path(
    post,
    path = "/auth/login/verify",
    request_body = VerifyOtpRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Session started", body = SessionResponse),
        (status = 401, description = "Wrong or expired code"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<SessionResponse>, Error> {
    let email = request.email.trim().to_lowercase();
    let account = state
        .store
        .get_account_by_email(&email)
        .await?
        .ok_or(Error::Unauthenticated {
            message: "Wrong email or code".to_string(),
        })?;

    let otp_matches = account
        .otp
        .as_deref()
        .is_some_and(|stored| stored == request.otp.trim());
    if !otp_matches {
        return Err(Error::Unauthenticated {
            message: "Wrong email or code".to_string(),
        });
    }

    // Issuing the session clears the OTP and revokes any earlier token.
    let token = auth::issue_session(state.store.as_ref(), &account, &state.config).await?;
    Ok(Json(SessionResponse {
        token,
        account: account.into(),
    }))
}

/// Sign in with a Google ID token
#[utoipa::path(
    post,
    path = "/auth/login/google-token",
    request_body = GoogleLoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Session started", body = SessionResponse),
        (status = 400, description = "Google login is not configured"),
        (status = 401, description = "Invalid ID token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_google(
    State(state): State<AppState>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<Json<SessionResponse>, Error> {
    let verifier = state.verifier.as_ref().ok_or(Error::BadRequest {
        message: "Google login is not configured on this server".to_string(),
    })?;

    let profile = verifier.verify(&request.id_token).await?;
    let email = profile.email.trim().to_lowercase();

    let account = match state.store.get_account_by_email(&email).await? {
        Some(account) => account,
        None => {
            let role = role_for_email(&state, &email);
            state
                .store
                .create_account(AccountCreate {
                    name: profile.name,
                    email,
                    role,
                    auth_provider: AuthProvider::Google,
                })
                .await?
        }
    };

    let token = auth::issue_session(state.store.as_ref(), &account, &state.config).await?;
    Ok(Json(SessionResponse {
        token,
        account: account.into(),
    }))
}

/// The authenticated account's own profile and plan state
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<AccountResponse> {
    Json(account.into())
}
