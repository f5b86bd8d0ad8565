//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers deal only in the domain's
//! opaque [`SessionToken`]. The cookie never holds user data; it carries
//! the identity provider's credential and nothing else.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, SessionToken};

pub(crate) const TOKEN_KEY: &str = "token";

/// Newtype wrapper exposing higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the provider-issued credential in the session cookie.
    pub fn persist_token(&self, token: &SessionToken) -> Result<(), Error> {
        self.0
            .insert(TOKEN_KEY, token.as_str())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the stored credential, if any.
    pub fn token(&self) -> Result<Option<SessionToken>, Error> {
        let raw = self
            .0
            .get::<String>(TOKEN_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.map(SessionToken::new))
    }

    /// Drop the stored credential. Used on logout and whenever resolution
    /// reports the credential as stale.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
