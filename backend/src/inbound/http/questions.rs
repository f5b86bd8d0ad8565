//! Question and answer API handlers.
//!
//! ```text
//! GET  /api/v1/questions
//! POST /api/v1/questions
//! GET  /api/v1/questions/{questionId}
//! POST /api/v1/questions/{questionId}/answers
//! POST /api/v1/questions/{questionId}/answers/{answerId}/accept
//! ```
//!
//! Reads are public; writes require a session. Path identifiers are UUIDs;
//! a malformed id is a `400`, an unknown one a `404`.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AnswerId, AnswerValidationError, Error, NewAnswer, NewQuestion, QuestionId,
    QuestionValidationError, QuestionThread, QuestionWithAuthor,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_user;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/questions`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Identifier of a freshly created question.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionResponse {
    pub id: QuestionId,
}

/// Request body for `POST /api/v1/questions/{questionId}/answers`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAnswerRequest {
    pub content: String,
}

/// Identifier of a freshly posted answer.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAnswerResponse {
    pub id: AnswerId,
}

fn parse_question_id(raw: &str) -> ApiResult<QuestionId> {
    QuestionId::parse(raw).map_err(|_| {
        Error::invalid_request("question id must be a UUID")
            .with_details(json!({ "field": "questionId", "code": "invalid_id" }))
    })
}

fn parse_answer_id(raw: &str) -> ApiResult<AnswerId> {
    AnswerId::parse(raw).map_err(|_| {
        Error::invalid_request("answer id must be a UUID")
            .with_details(json!({ "field": "answerId", "code": "invalid_id" }))
    })
}

fn map_question_validation_error(err: QuestionValidationError) -> Error {
    let (field, code) = match &err {
        QuestionValidationError::TitleTooShort => ("title", "too_short"),
        QuestionValidationError::DescriptionTooShort => ("description", "too_short"),
        QuestionValidationError::NotEnoughTags => ("tags", "too_few"),
        QuestionValidationError::TooManyTags => ("tags", "too_many"),
        QuestionValidationError::InvalidTag(_) => ("tags", "invalid_tag"),
    };
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": field, "code": code }))
}

fn map_answer_validation_error(err: AnswerValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": "content", "code": "too_short" }))
}

/// List all questions, newest first, each joined with its author.
#[utoipa::path(
    get,
    path = "/api/v1/questions",
    responses(
        (status = 200, description = "Questions newest first", body = [QuestionWithAuthor]),
        (status = 500, description = "Stored data is inconsistent", body = Error),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["questions"],
    operation_id = "listQuestions",
    security([])
)]
#[get("/questions")]
pub async fn list_questions(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<QuestionWithAuthor>>> {
    let questions = state.queries.questions().await?;
    Ok(web::Json(questions))
}

/// Fetch one question with its author and answers; counts the view.
#[utoipa::path(
    get,
    path = "/api/v1/questions/{questionId}",
    params(
        ("questionId" = String, Path, description = "Question identifier (UUID)")
    ),
    responses(
        (status = 200, description = "Question thread", body = QuestionThread),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 404, description = "No such question", body = Error),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["questions"],
    operation_id = "getQuestion",
    security([])
)]
#[get("/questions/{question_id}")]
pub async fn get_question(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<QuestionThread>> {
    let id = parse_question_id(&path)?;
    let thread = state.queries.question(id).await?;
    Ok(web::Json(thread))
}

/// Create a question for the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = CreateQuestionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["questions"],
    operation_id = "createQuestion"
)]
#[post("/questions")]
pub async fn create_question(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateQuestionRequest>,
) -> ApiResult<HttpResponse> {
    let user = require_user(&state, &session).await?;
    let body = payload.into_inner();
    let question = NewQuestion::try_new(body.title, body.description, &body.tags)
        .map_err(map_question_validation_error)?;
    let id = state.commands.create_question(&user.id, question).await?;
    Ok(HttpResponse::Created().json(CreateQuestionResponse { id }))
}

/// Post an answer to an existing question.
#[utoipa::path(
    post,
    path = "/api/v1/questions/{questionId}/answers",
    params(
        ("questionId" = String, Path, description = "Question identifier (UUID)")
    ),
    request_body = AddAnswerRequest,
    responses(
        (status = 201, description = "Answer posted", body = AddAnswerResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "No such question", body = Error),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["questions"],
    operation_id = "addAnswer"
)]
#[post("/questions/{question_id}/answers")]
pub async fn add_answer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AddAnswerRequest>,
) -> ApiResult<HttpResponse> {
    let user = require_user(&state, &session).await?;
    let question_id = parse_question_id(&path)?;
    let answer =
        NewAnswer::try_new(payload.into_inner().content).map_err(map_answer_validation_error)?;
    let id = state
        .commands
        .add_answer(question_id, &user.id, answer)
        .await?;
    Ok(HttpResponse::Created().json(AddAnswerResponse { id }))
}

/// Mark an answer as the question's accepted solution.
///
/// Only the question's author may accept; re-accepting moves the flag so at
/// most one answer per question carries it.
#[utoipa::path(
    post,
    path = "/api/v1/questions/{questionId}/answers/{answerId}/accept",
    params(
        ("questionId" = String, Path, description = "Question identifier (UUID)"),
        ("answerId" = String, Path, description = "Answer identifier (UUID)")
    ),
    responses(
        (status = 204, description = "Answer accepted"),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Only the question author may accept", body = Error),
        (status = 404, description = "No such question or answer", body = Error),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["questions"],
    operation_id = "acceptAnswer"
)]
#[post("/questions/{question_id}/answers/{answer_id}/accept")]
pub async fn accept_answer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let user = require_user(&state, &session).await?;
    let (raw_question, raw_answer) = path.into_inner();
    let question_id = parse_question_id(&raw_question)?;
    let answer_id = parse_answer_id(&raw_answer)?;
    state
        .commands
        .accept_answer(question_id, answer_id, &user.id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
