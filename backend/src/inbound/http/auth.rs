//! Session API handlers.
//!
//! ```text
//! POST /api/v1/auth/login  {"email":"ada@example.com","password":"..."}
//! POST /api/v1/auth/signup {"username":"ada","email":"...","password":"...","confirmPassword":"..."}
//! POST /api/v1/auth/logout
//! GET  /api/v1/auth/me
//! ```
//!
//! Login and signup set the session cookie and return `204 No Content`; the
//! cookie carries only the provider-issued credential. `GET /auth/me` never
//! fails for a bad cookie: it clears it and reports the anonymous shape.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    CurrentUser, Error, LoginCredentials, LoginValidationError, SignupCredentials,
    SignupValidationError, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

/// Signup request body for `POST /api/v1/auth/signup`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl TryFrom<SignupRequest> for SignupCredentials {
    type Error = SignupValidationError;

    fn try_from(value: SignupRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(
            &value.username,
            &value.email,
            &value.password,
            &value.confirm_password,
        )
    }
}

/// The signed-in user, or the anonymous shape when no session is active.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    /// Present only for an active, verified session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::InvalidEmail => Error::invalid_request("email address is not valid")
            .with_details(json!({ "field": "email", "code": "invalid_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password is required")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

fn map_signup_validation_error(err: SignupValidationError) -> Error {
    match err {
        SignupValidationError::InvalidUsername(inner) => Error::invalid_request(inner.to_string())
            .with_details(json!({ "field": "username", "code": "invalid_username" })),
        SignupValidationError::InvalidEmail => Error::invalid_request("email address is not valid")
            .with_details(json!({ "field": "email", "code": "invalid_email" })),
        SignupValidationError::WeakPassword(rules) => {
            let codes: Vec<&str> = rules.iter().map(|rule| rule.code()).collect();
            Error::invalid_request(SignupValidationError::WeakPassword(rules.clone()).to_string())
                .with_details(json!({ "field": "password", "code": "weak_password", "unmet": codes }))
        }
        SignupValidationError::PasswordMismatch => Error::invalid_request("passwords don't match")
            .with_details(json!({ "field": "confirmPassword", "code": "password_mismatch" })),
    }
}

/// Resolve the session cookie into a user, clearing stale cookies.
///
/// Shared by every handler that distinguishes anonymous from signed-in
/// callers; a stale credential is scrubbed here so the client recovers on
/// its next request.
pub(crate) async fn current_user(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<Option<User>> {
    let token = session.token()?;
    match state.sessions.resolve(token).await? {
        CurrentUser::Anonymous => Ok(None),
        CurrentUser::Stale => {
            session.clear();
            Ok(None)
        }
        CurrentUser::SignedIn(user) => Ok(Some(user)),
    }
}

/// Like [`current_user`], but anonymous callers get `401 Unauthorized`.
pub(crate) async fn require_user(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<User> {
    current_user(state, session)
        .await?
        .ok_or_else(|| Error::unauthorized("sign in to perform this action"))
}

/// Authenticate an existing account and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 204, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let auth = state.sessions.login(credentials).await?;
    session.persist_token(&auth.token)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register a new account, persist its profile, and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 204, description = "Signup success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Identity provider or store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/auth/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        SignupCredentials::try_from(payload.into_inner()).map_err(map_signup_validation_error)?;
    let auth = state.sessions.signup(credentials).await?;
    session.persist_token(&auth.token)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Drop the session cookie. Succeeds whether or not a session exists.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

/// Report the current user. Anonymous and stale sessions both yield the
/// empty shape with `200 OK`; a stale cookie is cleared as a side effect.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current session state", body = MeResponse),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "me",
    security([])
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MeResponse>> {
    let user = current_user(&state, &session).await?;
    Ok(web::Json(MeResponse { user }))
}
