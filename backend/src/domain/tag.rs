//! Tag data model and the denormalised usage counter.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors returned by [`TagName::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// Tag name was blank after trimming.
    Empty,
}

impl fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "tag name must not be empty"),
        }
    }
}

impl std::error::Error for TagValidationError {}

/// Canonical tag identifier: the lowercased, trimmed tag name.
///
/// Tags are addressed by name rather than by surrogate id, so `React`,
/// `react` and ` react ` all resolve to the same document.
///
/// # Examples
/// ```
/// use quorum_backend::domain::TagName;
///
/// let tag = TagName::new("  Rust ").expect("valid tag");
/// assert_eq!(tag.as_ref(), "rust");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "rust")]
pub struct TagName(String);

impl TagName {
    /// Canonicalise and construct a [`TagName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TagValidationError> {
        let canonical = raw.as_ref().trim().to_lowercase();
        if canonical.is_empty() {
            return Err(TagValidationError::Empty);
        }
        Ok(Self(canonical))
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<TagName> for String {
    fn from(value: TagName) -> Self {
        value.0
    }
}

impl TryFrom<String> for TagName {
    type Error = TagValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Tag document stored in the `tags` collection.
///
/// `question_count` is a denormalised counter incremented on every question
/// creation that references the tag; tags are created lazily on first use
/// and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Canonical lowercased identifier.
    pub name: TagName,
    /// Name as first written by a question author, kept for display.
    pub display_name: String,
    /// Number of questions referencing this tag.
    pub question_count: u64,
}
