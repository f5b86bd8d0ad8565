//! Answer aggregate and its validated construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::question::QuestionId;
use super::user::{User, UserId};

/// Minimum content length accepted for a new answer.
pub const CONTENT_MIN: usize = 20;

/// Server-assigned answer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AnswerId(Uuid);

impl AnswerId {
    /// Mint a fresh identifier for a new answer.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Answer document stored in the `answers` collection.
///
/// ## Invariants
/// - At most one answer per question has `accepted == true` at any time.
///   The store cannot express "at most one true per group", so the content
///   service enforces it with an all-or-nothing acceptance batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Server-assigned identifier.
    pub id: AnswerId,
    /// The question this answer belongs to.
    pub question_id: QuestionId,
    /// Subject id of the author.
    pub author_id: UserId,
    /// Rich HTML body.
    pub content: String,
    /// Denormalised upvote counter.
    pub upvotes: u64,
    /// Denormalised downvote counter.
    pub downvotes: u64,
    /// Whether the question author marked this as the chosen solution.
    pub accepted: bool,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// Validation errors raised by [`NewAnswer::try_new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValidationError {
    /// Content shorter than [`CONTENT_MIN`].
    ContentTooShort,
}

impl fmt::Display for AnswerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentTooShort => {
                write!(f, "answer content must be at least {CONTENT_MIN} characters")
            }
        }
    }
}

impl std::error::Error for AnswerValidationError {}

/// Validated payload for posting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    content: String,
}

impl NewAnswer {
    /// Validate raw form input into a [`NewAnswer`].
    pub fn try_new(content: impl Into<String>) -> Result<Self, AnswerValidationError> {
        let content = content.into();
        if content.chars().count() < CONTENT_MIN {
            return Err(AnswerValidationError::ContentTooShort);
        }
        Ok(Self { content })
    }

    /// Validated content.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Build the answer document with zeroed counters, unaccepted.
    pub fn into_answer(
        self,
        question_id: QuestionId,
        author_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Answer {
        Answer {
            id: AnswerId::random(),
            question_id,
            author_id,
            content: self.content,
            upvotes: 0,
            downvotes: 0,
            accepted: false,
            created_at,
        }
    }
}

/// Read-time join of an answer with its resolved author. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerWithAuthor {
    /// The answer document.
    #[serde(flatten)]
    pub answer: Answer,
    /// The author's resolved profile.
    pub author: User,
}
