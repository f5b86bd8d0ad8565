//! Session lifecycle: login, signup, and current-user resolution.
//!
//! Credential verification is delegated to the external identity provider;
//! this service owns the glue between a verified subject and the profile
//! document in the store, including the fail-closed handling of subjects
//! whose profile never got persisted.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use super::auth::{LoginCredentials, SignupCredentials};
use super::error::Error;
use super::ports::{
    AuthSession, ContentStore, CurrentUser, IdentityError, IdentityProvider, SessionService,
    SessionToken, StoreError,
};
use super::user::{Role, User};

/// Session service wiring the identity provider to the profile store.
#[derive(Clone)]
pub struct SessionManager<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
}

impl<S, P> SessionManager<S, P> {
    /// Create a new manager over the given adapters.
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self { store, provider }
    }
}

impl<S, P> SessionManager<S, P>
where
    S: ContentStore,
    P: IdentityProvider,
{
    fn map_store_error(error: StoreError) -> Error {
        match error {
            StoreError::Unavailable { message } => {
                Error::service_unavailable(format!("document store unavailable: {message}"))
            }
            StoreError::Query { message } => {
                Error::internal(format!("document store error: {message}"))
            }
            StoreError::Corrupt { message } => {
                error!(%message, "user profile document is malformed");
                Error::data_inconsistency(format!("malformed profile document: {message}"))
            }
        }
    }

    fn map_identity_error(error: IdentityError) -> Error {
        match error {
            IdentityError::InvalidCredentials => Error::unauthorized("invalid email or password"),
            IdentityError::EmailAlreadyInUse => {
                Error::invalid_request("an account with this email already exists")
            }
            // A token error outside `resolve` means we sent something the
            // provider no longer recognises; nothing the caller can fix.
            IdentityError::InvalidToken => Error::internal("identity provider rejected the session"),
            IdentityError::Unavailable { message } => {
                Error::service_unavailable(format!("identity provider unavailable: {message}"))
            }
        }
    }
}

#[async_trait]
impl<S, P> SessionService for SessionManager<S, P>
where
    S: ContentStore,
    P: IdentityProvider,
{
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        self.provider
            .sign_in(credentials.email(), credentials.password())
            .await
            .map_err(Self::map_identity_error)
    }

    async fn signup(&self, credentials: SignupCredentials) -> Result<AuthSession, Error> {
        let session = self
            .provider
            .sign_up(credentials.email(), credentials.password())
            .await
            .map_err(Self::map_identity_error)?;

        let name = credentials.username().clone();
        let profile = User {
            id: session.user_id.clone(),
            avatar_url: User::placeholder_avatar(&name),
            name,
            email: credentials.email().clone(),
            role: Role::User,
        };

        // If this write fails the account exists upstream without a
        // profile; resolution fails closed until signup is retried.
        self.store
            .insert_user(&profile)
            .await
            .map_err(Self::map_store_error)?;

        Ok(session)
    }

    async fn resolve(&self, token: Option<SessionToken>) -> Result<CurrentUser, Error> {
        let Some(token) = token else {
            return Ok(CurrentUser::Anonymous);
        };

        // Verification failures are not errors: the caller clears the
        // stored credential and the request proceeds anonymously.
        let identity = match self.provider.verify(&token).await {
            Ok(identity) => identity,
            Err(reason) => {
                warn!(%reason, "session credential failed verification");
                return Ok(CurrentUser::Stale);
            }
        };

        let profile = self
            .store
            .find_user(&identity.user_id)
            .await
            .map_err(Self::map_store_error)?;

        match profile {
            Some(user) => Ok(CurrentUser::SignedIn(user)),
            None => {
                // Identity exists upstream but no profile was persisted.
                // Fail closed rather than invent a partial user.
                warn!(user_id = %identity.user_id, "verified subject has no profile record");
                Ok(CurrentUser::Stale)
            }
        }
    }
}

/// Authorisation predicate for admin-only surfaces.
pub fn require_admin(user: &User) -> Result<(), Error> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("administrator role required"))
    }
}
