//! [`TagSuggester`] implementation over a generative model endpoint.
//!
//! The model is a black box that takes a draft title and description and
//! returns candidate tag names. Responses are advisory; blank and duplicate
//! entries are dropped and the list is capped at the question tag limit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{SuggestionError, TagSuggester, question::TAGS_MAX};

/// REST client for the tag-suggestion model.
pub struct HttpTagSuggester {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestRequest<'a> {
    title: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestResponse {
    #[serde(default)]
    tags: Vec<String>,
}

impl HttpTagSuggester {
    /// Build a suggester client for the given model endpoint.
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

/// Lowercase, trim, deduplicate, and cap the model output.
fn sanitise(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for tag in raw {
        let cleaned = tag.trim().to_lowercase();
        if cleaned.is_empty() || seen.iter().any(|existing| *existing == cleaned) {
            continue;
        }
        seen.push(cleaned);
        if seen.len() == TAGS_MAX {
            break;
        }
    }
    seen
}

/// Stand-in suggester for deployments without a model endpoint. Reports
/// the feature as unavailable rather than inventing suggestions.
pub struct DisabledTagSuggester;

#[async_trait]
impl TagSuggester for DisabledTagSuggester {
    async fn suggest(&self, _: &str, _: &str) -> Result<Vec<String>, SuggestionError> {
        Err(SuggestionError::unavailable(
            "no suggestion endpoint configured",
        ))
    }
}

#[async_trait]
impl TagSuggester for HttpTagSuggester {
    async fn suggest(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Vec<String>, SuggestionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&SuggestRequest { title, description })
            .send()
            .await
            .map_err(|err| SuggestionError::unavailable(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestionError::unavailable(format!(
                "model endpoint returned {status}"
            )));
        }

        let body: SuggestResponse = response
            .json()
            .await
            .map_err(|err| SuggestionError::malformed(format!("unreadable response: {err}")))?;
        Ok(sanitise(body.tags))
    }
}
