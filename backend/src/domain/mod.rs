//! Domain entities, validation, services, and ports.
//!
//! Purpose: define strongly typed aggregates for the forum (users,
//! questions, answers, tags), the services that enforce their invariants,
//! and the ports adapters implement. Types are immutable after
//! construction; invariants and serialisation contracts live in each
//! type's Rustdoc.

pub mod answer;
pub mod auth;
pub mod content;
pub mod error;
pub mod ports;
pub mod question;
pub mod session;
pub mod tag;
pub mod user;

pub use self::answer::{
    Answer, AnswerId, AnswerValidationError, AnswerWithAuthor, NewAnswer, CONTENT_MIN,
};
pub use self::auth::{
    LoginCredentials, LoginValidationError, PasswordRule, SignupCredentials,
    SignupValidationError,
};
pub use self::content::{ContentService, POPULAR_TAGS_LIMIT};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ports::{
    AuthSession, ContentCommand, ContentQuery, ContentStore, CurrentUser, IdentityError,
    IdentityProvider, SessionService, SessionToken, StoreError, SuggestionError, TagSuggester,
    VerifiedIdentity,
};
pub use self::question::{
    NewQuestion, Question, QuestionId, QuestionThread, QuestionValidationError,
    QuestionWithAuthor, DESCRIPTION_MIN, TAGS_MAX, TAGS_MIN, TITLE_MIN,
};
pub use self::session::{require_admin, SessionManager};
pub use self::tag::{Tag, TagName, TagValidationError};
pub use self::user::{
    DisplayName, EmailAddress, Role, User, UserId, UserValidationError,
};

/// Convenient result alias for domain operations.
///
/// # Examples
/// ```
/// use quorum_backend::domain::{ApiResult, Error};
///
/// fn gate() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(gate().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
