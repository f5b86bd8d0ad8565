//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::ports::{
    MockContentCommand, MockContentQuery, MockSessionService, MockTagSuggester,
};
use crate::domain::{CurrentUser, DisplayName, EmailAddress, Role, User, UserId};
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// A signed-in fixture profile.
pub fn fixture_user(id: &str, name: &str, role: Role) -> User {
    let id = UserId::new(id).expect("valid fixture id");
    let name = DisplayName::new(name).expect("valid fixture name");
    let email = EmailAddress::new(format!("{}@example.com", name.as_ref()))
        .expect("valid fixture email");
    let avatar_url = User::placeholder_avatar(&name);
    User {
        id,
        name,
        email,
        avatar_url,
        role,
    }
}

/// Mutable bundle of driving-port mocks, converted into [`HttpState`] once
/// expectations are set.
pub struct MockPorts {
    pub queries: MockContentQuery,
    pub commands: MockContentCommand,
    pub sessions: MockSessionService,
    pub suggester: MockTagSuggester,
}

impl Default for MockPorts {
    fn default() -> Self {
        Self {
            queries: MockContentQuery::new(),
            commands: MockContentCommand::new(),
            sessions: MockSessionService::new(),
            suggester: MockTagSuggester::new(),
        }
    }
}

impl MockPorts {
    /// Make every session resolution yield the given user.
    pub fn signed_in_as(&mut self, user: User) {
        self.sessions
            .expect_resolve()
            .returning(move |_| Ok(CurrentUser::SignedIn(user.clone())));
    }

    /// Make every session resolution yield the anonymous shape.
    pub fn anonymous(&mut self) {
        self.sessions
            .expect_resolve()
            .returning(|_| Ok(CurrentUser::Anonymous));
    }

    /// Freeze the expectations into shared HTTP state.
    pub fn into_state(self) -> HttpState {
        HttpState::new(
            Arc::new(self.queries),
            Arc::new(self.commands),
            Arc::new(self.sessions),
            Arc::new(self.suggester),
        )
    }
}
