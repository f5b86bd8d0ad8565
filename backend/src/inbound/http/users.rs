//! Admin user-directory handler.
//!
//! ```text
//! GET /api/v1/users
//! ```

use actix_web::{get, web};

use crate::domain::{Error, User, require_admin};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_user;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// List every registered profile. Admin role required.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Registered users", body = [User]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 503, description = "Document store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<User>>> {
    let user = require_user(&state, &session).await?;
    require_admin(&user)?;
    let users = state.queries.users().await?;
    Ok(web::Json(users))
}
