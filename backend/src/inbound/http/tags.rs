//! Tag API handlers.
//!
//! ```text
//! GET  /api/v1/tags
//! POST /api/v1/tags/suggest
//! ```
//!
//! The tag listing is public. Suggestions call the generative model on the
//! caller's behalf and so require a session; the result is advisory and the
//! caller is free to ignore it.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::domain::{Error, SuggestionError, Tag};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_user;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Minimum title length before a suggestion request is forwarded.
const SUGGEST_TITLE_MIN: usize = 5;

/// Request body for `POST /api/v1/tags/suggest`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTagsRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Advisory tag names produced by the suggestion model.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTagsResponse {
    pub tags: Vec<String>,
}

/// List the most used tags, most popular first.
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    responses(
        (status = 200, description = "Popular tags", body = [Tag]),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["tags"],
    operation_id = "listTags",
    security([])
)]
#[get("/tags")]
pub async fn list_tags(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Tag>>> {
    let tags = state.queries.popular_tags().await?;
    Ok(web::Json(tags))
}

/// Suggest tags for a draft question.
#[utoipa::path(
    post,
    path = "/api/v1/tags/suggest",
    request_body = SuggestTagsRequest,
    responses(
        (status = 200, description = "Suggested tag names", body = SuggestTagsResponse),
        (status = 400, description = "Title too short to suggest from", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Suggestion service unavailable", body = Error)
    ),
    tags = ["tags"],
    operation_id = "suggestTags"
)]
#[post("/tags/suggest")]
pub async fn suggest_tags(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SuggestTagsRequest>,
) -> ApiResult<web::Json<SuggestTagsResponse>> {
    require_user(&state, &session).await?;

    let body = payload.into_inner();
    if body.title.trim().chars().count() < SUGGEST_TITLE_MIN {
        return Err(Error::invalid_request(format!(
            "title must be at least {SUGGEST_TITLE_MIN} characters to suggest tags"
        ))
        .with_details(json!({ "field": "title", "code": "too_short" })));
    }

    let tags = state
        .suggester
        .suggest(body.title.trim(), body.description.trim())
        .await
        .map_err(map_suggestion_error)?;
    Ok(web::Json(SuggestTagsResponse { tags }))
}

fn map_suggestion_error(err: SuggestionError) -> Error {
    match err {
        SuggestionError::Unavailable { message } => {
            warn!(%message, "tag suggestion endpoint unavailable");
            Error::service_unavailable("tag suggestions are temporarily unavailable")
        }
        SuggestionError::Malformed { message } => {
            warn!(%message, "tag suggestion response unusable");
            Error::service_unavailable("tag suggestions are temporarily unavailable")
        }
    }
}
