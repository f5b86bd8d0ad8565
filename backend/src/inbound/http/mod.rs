//! HTTP inbound adapter exposing the REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod questions;
pub mod session;
pub mod state;
pub mod tags;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` route on the given scope.
///
/// Session middleware and shared state are attached by the caller so tests
/// can wire the same routes against doubles.
pub fn configure_api(config: &mut web::ServiceConfig) {
    config
        .service(auth::login)
        .service(auth::signup)
        .service(auth::logout)
        .service(auth::me)
        .service(questions::list_questions)
        .service(questions::create_question)
        .service(questions::get_question)
        .service(questions::add_answer)
        .service(questions::accept_answer)
        .service(tags::list_tags)
        .service(tags::suggest_tags)
        .service(users::list_users);
}
