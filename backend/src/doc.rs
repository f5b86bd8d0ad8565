//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the generated specification for the REST API. The
//! document registers every HTTP endpoint from the inbound layer together
//! with the domain schemas they serialise, and declares the session cookie
//! security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Answer, AnswerId, AnswerWithAuthor, Error, ErrorCode, Question, QuestionId, QuestionThread,
    QuestionWithAuthor, Role, Tag, User,
};
use crate::inbound::http::auth::{LoginRequest, MeResponse, SignupRequest};
use crate::inbound::http::questions::{
    AddAnswerRequest, AddAnswerResponse, CreateQuestionRequest, CreateQuestionResponse,
};
use crate::inbound::http::tags::{SuggestTagsRequest, SuggestTagsResponse};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Quorum backend API",
        description = "HTTP interface for the Q&A forum: questions, answers, \
                       tags, and session-authenticated access."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::questions::list_questions,
        crate::inbound::http::questions::get_question,
        crate::inbound::http::questions::create_question,
        crate::inbound::http::questions::add_answer,
        crate::inbound::http::questions::accept_answer,
        crate::inbound::http::tags::list_tags,
        crate::inbound::http::tags::suggest_tags,
        crate::inbound::http::users::list_users,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        Question,
        QuestionId,
        QuestionWithAuthor,
        QuestionThread,
        Answer,
        AnswerId,
        AnswerWithAuthor,
        Tag,
        LoginRequest,
        SignupRequest,
        MeResponse,
        CreateQuestionRequest,
        CreateQuestionResponse,
        AddAnswerRequest,
        AddAnswerResponse,
        SuggestTagsRequest,
        SuggestTagsResponse,
    )),
    tags(
        (name = "auth", description = "Session lifecycle"),
        (name = "questions", description = "Questions and answers"),
        (name = "tags", description = "Tag listing and suggestions"),
        (name = "users", description = "Administrative user directory"),
        (name = "health", description = "Probes for orchestration")
    )
)]
pub struct ApiDoc;
