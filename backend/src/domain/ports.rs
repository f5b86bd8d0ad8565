//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to interact with the
//! document store, the identity provider, and the tag-suggestion model.
//! Driving ports are the use-case surface the HTTP adapter calls. Each
//! trait exposes strongly typed errors so adapters map their failures into
//! predictable variants instead of returning `anyhow::Result`.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use super::answer::{Answer, AnswerId, NewAnswer};
use super::auth::{LoginCredentials, SignupCredentials};
use super::error::Error;
use super::question::{NewQuestion, Question, QuestionId, QuestionThread, QuestionWithAuthor};
use super::tag::{Tag, TagName};
use super::user::{EmailAddress, User, UserId};

/// Opaque session credential issued by the identity provider and stored in
/// the session cookie. Never interpreted by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a provider-issued token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw token for transport back to the provider.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are credentials; never render them in logs.
        f.write_str("<session token>")
    }
}

/// Errors surfaced by the document-store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store unreachable or the client is not initialised.
    #[error("document store unavailable: {message}")]
    Unavailable {
        /// Adapter-provided context.
        message: String,
    },
    /// A read or write failed during execution.
    #[error("document store request failed: {message}")]
    Query {
        /// Adapter-provided context.
        message: String,
    },
    /// A stored document failed to deserialise into its record type.
    #[error("document store returned a malformed document: {message}")]
    Corrupt {
        /// Adapter-provided context.
        message: String,
    },
}

impl StoreError {
    /// Helper for connectivity failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Helper for failed reads and writes.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for malformed documents.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the identity-provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Email/password pair rejected by the provider.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Signup attempted with an email the provider already knows.
    #[error("an account with this email already exists")]
    EmailAlreadyInUse,
    /// The session token failed verification (expired, revoked, forged).
    #[error("session credential is not valid")]
    InvalidToken,
    /// Provider unreachable or returned an unexpected payload.
    #[error("identity provider unavailable: {message}")]
    Unavailable {
        /// Adapter-provided context.
        message: String,
    },
}

impl IdentityError {
    /// Helper for provider outages and malformed responses.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the tag-suggestion adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionError {
    /// Model endpoint unreachable.
    #[error("tag suggestion service unavailable: {message}")]
    Unavailable {
        /// Adapter-provided context.
        message: String,
    },
    /// Model responded with an unusable payload.
    #[error("tag suggestion response was malformed: {message}")]
    Malformed {
        /// Adapter-provided context.
        message: String,
    },
}

impl SuggestionError {
    /// Helper for endpoint outages.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Helper for unusable payloads.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// A verified session: the provider vouched for this subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider-issued subject id.
    pub user_id: UserId,
    /// Email the subject registered with.
    pub email: EmailAddress,
}

/// Result of a successful login or signup at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Provider-issued subject id.
    pub user_id: UserId,
    /// Opaque credential for the session cookie.
    pub token: SessionToken,
}

/// Outcome of resolving the request's session credential into a user.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentUser {
    /// No credential was presented.
    Anonymous,
    /// A credential was presented but is no longer usable (failed
    /// verification, or the profile record is missing). The caller should
    /// clear the stored credential; the failure is not surfaced as an
    /// error.
    Stale,
    /// Verified subject with a resolved profile.
    SignedIn(User),
}

/// Driven port over the document store's four collections.
///
/// One trait covers users, questions, answers, and tags: the adapters talk
/// to a single database client, and the content service composes these
/// operations freely.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist a freshly signed-up profile document.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Fetch a profile by subject id.
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// All profile documents; powers the admin user listing.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// All questions ordered by creation time descending.
    async fn list_questions_newest_first(&self) -> Result<Vec<Question>, StoreError>;

    /// Fetch one question by id.
    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, StoreError>;

    /// Persist a new question document.
    async fn insert_question(&self, question: &Question) -> Result<(), StoreError>;

    /// Increment the question's view counter by exactly one. Fails when
    /// the question does not exist.
    async fn record_view(&self, id: QuestionId) -> Result<(), StoreError>;

    /// Increment the question's answer counter by exactly one. Fails when
    /// the question does not exist.
    async fn increment_answer_count(&self, id: QuestionId) -> Result<(), StoreError>;

    /// Create the tag with count 1 if absent, otherwise increment its
    /// question count. Must be atomic per tag: concurrent callers must not
    /// lose an increment.
    async fn record_tag_usage(&self, name: &TagName, display_name: &str)
    -> Result<(), StoreError>;

    /// Up to `limit` tags ordered by question count descending.
    async fn top_tags(&self, limit: usize) -> Result<Vec<Tag>, StoreError>;

    /// Persist a new answer document.
    async fn insert_answer(&self, answer: &Answer) -> Result<(), StoreError>;

    /// Fetch one answer by id.
    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, StoreError>;

    /// All answers belonging to a question, in creation order.
    async fn answers_for_question(&self, id: QuestionId) -> Result<Vec<Answer>, StoreError>;

    /// Ids of the question's answers currently flagged accepted.
    async fn accepted_answers_for_question(
        &self,
        id: QuestionId,
    ) -> Result<Vec<AnswerId>, StoreError>;

    /// Atomically clear the accepted flag on `clear` and set it on `set`.
    ///
    /// Must be all-or-nothing: a failure partway through leaves every flag
    /// unchanged, and no concurrent reader may observe two accepted
    /// answers for one question.
    async fn commit_acceptance(
        &self,
        question_id: QuestionId,
        clear: &[AnswerId],
        set: AnswerId,
    ) -> Result<(), StoreError>;
}

/// Driven port for the external credential verifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account and open a session.
    async fn sign_up(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;

    /// Authenticate an existing account and open a session.
    async fn sign_in(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;

    /// Verify an opaque session credential.
    async fn verify(&self, token: &SessionToken) -> Result<VerifiedIdentity, IdentityError>;
}

/// Driven port for the generative tag-suggestion model. Treated as an
/// opaque collaborator; suggestions are advisory strings, not [`TagName`]s.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagSuggester: Send + Sync {
    /// Suggest tag names for a draft question.
    async fn suggest(&self, title: &str, description: &str)
    -> Result<Vec<String>, SuggestionError>;
}

/// Driving port: read-side content operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentQuery: Send + Sync {
    /// All questions newest-first, joined with their authors.
    async fn questions(&self) -> Result<Vec<QuestionWithAuthor>, Error>;

    /// One question with author and joined answers; counts the view.
    async fn question(&self, id: QuestionId) -> Result<QuestionThread, Error>;

    /// The most used tags, most popular first.
    async fn popular_tags(&self) -> Result<Vec<Tag>, Error>;

    /// Every registered profile; admin-only surface.
    async fn users(&self) -> Result<Vec<User>, Error>;
}

/// Driving port: write-side content operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentCommand: Send + Sync {
    /// Create a question and maintain the tag counters.
    async fn create_question(
        &self,
        author: &UserId,
        question: NewQuestion,
    ) -> Result<QuestionId, Error>;

    /// Post an answer to an existing question.
    async fn add_answer(
        &self,
        question_id: QuestionId,
        author: &UserId,
        answer: NewAnswer,
    ) -> Result<AnswerId, Error>;

    /// Mark one answer as the question's accepted solution.
    async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        acting_user: &UserId,
    ) -> Result<(), Error>;
}

/// Driving port: session lifecycle and current-user resolution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Authenticate and open a session.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    /// Register an account, persist the profile, and open a session.
    async fn signup(&self, credentials: SignupCredentials) -> Result<AuthSession, Error>;

    /// Resolve the request's credential into a user, if any.
    async fn resolve(&self, token: Option<SessionToken>) -> Result<CurrentUser, Error>;
}
