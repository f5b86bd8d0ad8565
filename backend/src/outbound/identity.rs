//! [`IdentityProvider`] implementation over an Identity Toolkit style REST
//! API.
//!
//! The provider owns credentials end to end: passwords are forwarded for
//! verification and never stored here, and the returned token is treated as
//! an opaque session credential. Failures the caller can act on (wrong
//! password, duplicate email, expired token) map to their own variants;
//! everything else is an outage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    AuthSession, EmailAddress, IdentityError, IdentityProvider, SessionToken, UserId,
    VerifiedIdentity,
};

/// REST client for the identity provider.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    local_id: String,
    id_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpIdentityProvider {
    /// Build a provider client from its endpoint and API key.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1/accounts:{action}?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        )
    }

    async fn post<Req, Resp>(&self, action: &str, body: &Req) -> Result<Resp, IdentityError>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(self.endpoint(action))
            .json(body)
            .send()
            .await
            .map_err(|err| IdentityError::unavailable(format!("{action} request failed: {err}")))?;

        if response.status().is_success() {
            return response.json::<Resp>().await.map_err(|err| {
                IdentityError::unavailable(format!("{action} returned an unreadable body: {err}"))
            });
        }

        let status = response.status();
        let body = response.json::<ErrorResponse>().await.map_err(|err| {
            IdentityError::unavailable(format!(
                "{action} failed with {status} and an unreadable body: {err}"
            ))
        })?;
        Err(classify_provider_error(action, status, &body.error.message))
    }
}

/// Map the provider's error codes onto the port's variants. Unknown codes
/// are treated as outages so callers retry rather than blame the user.
fn classify_provider_error(
    action: &str,
    status: reqwest::StatusCode,
    code: &str,
) -> IdentityError {
    // Codes may carry a trailing explanation, e.g. "WEAK_PASSWORD : ...".
    let code = code.split_whitespace().next().unwrap_or(code);
    match code {
        "EMAIL_EXISTS" => IdentityError::EmailAlreadyInUse,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityError::InvalidCredentials
        }
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_DISABLED" | "USER_NOT_FOUND" => {
            IdentityError::InvalidToken
        }
        other => {
            warn!(action, %status, code = other, "unrecognised identity provider error");
            IdentityError::unavailable(format!("{action} failed with {status}: {other}"))
        }
    }
}

fn session_from_response(response: SessionResponse) -> Result<AuthSession, IdentityError> {
    let user_id = UserId::new(response.local_id)
        .map_err(|err| IdentityError::unavailable(format!("provider returned a bad subject id: {err}")))?;
    Ok(AuthSession {
        user_id,
        token: SessionToken::new(response.id_token),
    })
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_up(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let response: SessionResponse = self
            .post(
                "signUp",
                &PasswordRequest {
                    email: email.as_ref(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        session_from_response(response)
    }

    async fn sign_in(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let response: SessionResponse = self
            .post(
                "signInWithPassword",
                &PasswordRequest {
                    email: email.as_ref(),
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        session_from_response(response)
    }

    async fn verify(&self, token: &SessionToken) -> Result<VerifiedIdentity, IdentityError> {
        let response: LookupResponse = self
            .post(
                "lookup",
                &LookupRequest {
                    id_token: token.as_str(),
                },
            )
            .await?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::InvalidToken)?;
        let user_id = UserId::new(user.local_id).map_err(|err| {
            IdentityError::unavailable(format!("provider returned a bad subject id: {err}"))
        })?;
        let email = EmailAddress::new(user.email).map_err(|err| {
            IdentityError::unavailable(format!("provider returned a bad email: {err}"))
        })?;
        Ok(VerifiedIdentity { user_id, email })
    }
}
