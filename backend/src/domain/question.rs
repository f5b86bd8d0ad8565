//! Question aggregate and its validated construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::answer::AnswerWithAuthor;
use super::tag::{TagName, TagValidationError};
use super::user::{User, UserId};

/// Minimum title length accepted for a new question.
pub const TITLE_MIN: usize = 10;
/// Minimum description length accepted for a new question.
pub const DESCRIPTION_MIN: usize = 20;
/// Minimum number of tags on a question.
pub const TAGS_MIN: usize = 1;
/// Maximum number of tags on a question.
pub const TAGS_MAX: usize = 5;

/// Server-assigned question identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct QuestionId(Uuid);

impl QuestionId {
    /// Mint a fresh identifier for a new question.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Question document stored in the `questions` collection.
///
/// Mutated only through counter increments (`views`, `answer_count`) after
/// creation; there is no edit or delete path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Server-assigned identifier.
    pub id: QuestionId,
    /// Short summary line.
    pub title: String,
    /// Rich HTML body.
    pub description: String,
    /// Subject id of the author; ownership gates answer acceptance.
    pub author_id: UserId,
    /// Ordered tag identifiers, as chosen by the author.
    pub tags: Vec<TagName>,
    /// Denormalised upvote counter.
    pub upvotes: u64,
    /// Denormalised downvote counter.
    pub downvotes: u64,
    /// Denormalised view counter, incremented on every read.
    pub views: u64,
    /// Denormalised count of answers.
    pub answer_count: u64,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// A tag reference on a new question: canonical name plus the author's
/// spelling, which seeds the tag's display name on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTag {
    /// Canonical lowercased identifier.
    pub name: TagName,
    /// The author's original spelling.
    pub display_name: String,
}

/// Validation errors raised by [`NewQuestion::try_new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    /// Title shorter than [`TITLE_MIN`].
    TitleTooShort,
    /// Description shorter than [`DESCRIPTION_MIN`].
    DescriptionTooShort,
    /// Fewer than [`TAGS_MIN`] tags after canonicalisation.
    NotEnoughTags,
    /// More than [`TAGS_MAX`] tags after canonicalisation.
    TooManyTags,
    /// A tag failed canonicalisation.
    InvalidTag(TagValidationError),
}

impl fmt::Display for QuestionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleTooShort => {
                write!(f, "title must be at least {TITLE_MIN} characters")
            }
            Self::DescriptionTooShort => {
                write!(f, "description must be at least {DESCRIPTION_MIN} characters")
            }
            Self::NotEnoughTags => write!(f, "at least {TAGS_MIN} tag is required"),
            Self::TooManyTags => write!(f, "at most {TAGS_MAX} tags are allowed"),
            Self::InvalidTag(inner) => inner.fmt(f),
        }
    }
}

impl std::error::Error for QuestionValidationError {}

/// Validated payload for creating a question.
///
/// ## Invariants
/// - `title` has at least [`TITLE_MIN`] characters.
/// - `description` has at least [`DESCRIPTION_MIN`] characters.
/// - `tags` holds between [`TAGS_MIN`] and [`TAGS_MAX`] entries, deduplicated
///   case-insensitively with the author's ordering preserved. Deduplication
///   here guarantees a question can never double-increment a tag counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    title: String,
    description: String,
    tags: Vec<QuestionTag>,
}

impl NewQuestion {
    /// Validate raw form input into a [`NewQuestion`].
    pub fn try_new(
        title: impl Into<String>,
        description: impl Into<String>,
        raw_tags: &[String],
    ) -> Result<Self, QuestionValidationError> {
        let title = title.into();
        if title.chars().count() < TITLE_MIN {
            return Err(QuestionValidationError::TitleTooShort);
        }

        let description = description.into();
        if description.chars().count() < DESCRIPTION_MIN {
            return Err(QuestionValidationError::DescriptionTooShort);
        }

        let mut tags: Vec<QuestionTag> = Vec::with_capacity(raw_tags.len());
        for raw in raw_tags {
            let name = TagName::new(raw).map_err(QuestionValidationError::InvalidTag)?;
            if tags.iter().any(|tag| tag.name == name) {
                continue;
            }
            tags.push(QuestionTag {
                name,
                display_name: raw.trim().to_owned(),
            });
        }

        if tags.len() < TAGS_MIN {
            return Err(QuestionValidationError::NotEnoughTags);
        }
        if tags.len() > TAGS_MAX {
            return Err(QuestionValidationError::TooManyTags);
        }

        Ok(Self {
            title,
            description,
            tags,
        })
    }

    /// Validated title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Validated description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Deduplicated tags in the author's order.
    pub fn tags(&self) -> &[QuestionTag] {
        &self.tags
    }

    /// Build the question document with zeroed counters and a fresh id.
    pub fn into_question(self, author_id: UserId, created_at: DateTime<Utc>) -> Question {
        Question {
            id: QuestionId::random(),
            title: self.title,
            description: self.description,
            author_id,
            tags: self.tags.into_iter().map(|tag| tag.name).collect(),
            upvotes: 0,
            downvotes: 0,
            views: 0,
            answer_count: 0,
            created_at,
        }
    }
}

/// Read-time join of a question with its resolved author. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithAuthor {
    /// The question document.
    #[serde(flatten)]
    pub question: Question,
    /// The author's resolved profile.
    pub author: User,
}

/// A question with its author and fully joined answers, accepted answer
/// first. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionThread {
    /// The question joined with its author.
    #[serde(flatten)]
    pub question: QuestionWithAuthor,
    /// Answers joined with their authors; an accepted answer sorts first.
    pub answers: Vec<AnswerWithAuthor>,
}
