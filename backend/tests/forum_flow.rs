//! End-to-end forum flows over the HTTP surface.
//!
//! Runs the real services against the in-memory store and a fixture
//! identity provider, exercising signup, question creation, answering,
//! acceptance, and the error envelope exactly as a browser client would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use quorum_backend::domain::{
    AuthSession, ContentService, EmailAddress, IdentityError, IdentityProvider, SessionManager,
    SessionToken, SuggestionError, TagSuggester, UserId, VerifiedIdentity,
};
use quorum_backend::inbound::http::configure_api;
use quorum_backend::inbound::http::state::HttpState;
use quorum_backend::outbound::memory::MemoryContentStore;

/// Password-checking identity fixture; tokens encode the email so `verify`
/// can resolve the account without shared global state.
#[derive(Default)]
struct FixtureIdentity {
    accounts: Mutex<HashMap<String, (String, String)>>,
}

#[async_trait]
impl IdentityProvider for FixtureIdentity {
    async fn sign_up(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let mut accounts = self.accounts.lock().expect("fixture lock");
        if accounts.contains_key(email.as_ref()) {
            return Err(IdentityError::EmailAlreadyInUse);
        }
        let uid = format!("uid-{}", accounts.len() + 1);
        accounts.insert(
            email.as_ref().to_owned(),
            (uid.clone(), password.to_owned()),
        );
        Ok(AuthSession {
            user_id: UserId::new(uid).expect("valid fixture uid"),
            token: SessionToken::new(format!("tok:{}", email.as_ref())),
        })
    }

    async fn sign_in(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let accounts = self.accounts.lock().expect("fixture lock");
        match accounts.get(email.as_ref()) {
            Some((uid, stored)) if stored == password => Ok(AuthSession {
                user_id: UserId::new(uid.clone()).expect("valid fixture uid"),
                token: SessionToken::new(format!("tok:{}", email.as_ref())),
            }),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn verify(&self, token: &SessionToken) -> Result<VerifiedIdentity, IdentityError> {
        let email = token
            .as_str()
            .strip_prefix("tok:")
            .ok_or(IdentityError::InvalidToken)?;
        let accounts = self.accounts.lock().expect("fixture lock");
        let (uid, _) = accounts.get(email).ok_or(IdentityError::InvalidToken)?;
        Ok(VerifiedIdentity {
            user_id: UserId::new(uid.clone()).expect("valid fixture uid"),
            email: EmailAddress::new(email).expect("valid fixture email"),
        })
    }
}

struct FixtureSuggester;

#[async_trait]
impl TagSuggester for FixtureSuggester {
    async fn suggest(&self, _: &str, _: &str) -> Result<Vec<String>, SuggestionError> {
        Ok(vec!["react".to_owned(), "hooks".to_owned()])
    }
}

fn forum_state() -> web::Data<HttpState> {
    let store = Arc::new(MemoryContentStore::new());
    let content = Arc::new(ContentService::new(store.clone()));
    let sessions = Arc::new(SessionManager::new(store, Arc::new(FixtureIdentity::default())));
    web::Data::new(HttpState::new(
        content.clone(),
        content,
        sessions,
        Arc::new(FixtureSuggester),
    ))
}

fn forum_app(
    state: web::Data<HttpState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    App::new().service(
        web::scope("/api/v1")
            .wrap(session)
            .app_data(state)
            .configure(configure_api),
    )
}

/// Sign up a user and return the session cookie.
async fn sign_up<S>(app: &S, username: &str, email: &str) -> Cookie<'static>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({
                "username": username,
                "email": email,
                "password": "Abcdef1!",
                "confirmPassword": "Abcdef1!",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT, "signup failed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

async fn post_question<S>(app: &S, cookie: &Cookie<'static>, title: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/questions")
            .cookie(cookie.clone())
            .set_json(json!({
                "title": title,
                "description": "A sufficiently long description of the problem.",
                "tags": ["React", "react", "TypeScript"],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "create failed");
    let body: Value = test::read_body_json(response).await;
    body["id"].as_str().expect("question id").to_owned()
}

#[actix_rt::test]
async fn signup_ask_and_browse_flow() {
    let app = test::init_service(forum_app(forum_state())).await;
    let cookie = sign_up(&app, "ada", "ada@example.com").await;

    // The session resolves to the freshly created profile.
    let me = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(me.status(), StatusCode::OK);
    let me_body: Value = test::read_body_json(me).await;
    assert_eq!(me_body["user"]["name"], "ada");
    assert_eq!(
        me_body["user"]["avatarUrl"],
        "https://placehold.co/100x100.png?text=A"
    );
    assert_eq!(me_body["user"]["role"], "user");

    let question_id = post_question(&app, &cookie, "How do React hooks work?").await;

    // The listing joins the author and exposes the deduplicated tags.
    let listing = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/questions").to_request(),
    )
    .await;
    assert_eq!(listing.status(), StatusCode::OK);
    let questions: Value = test::read_body_json(listing).await;
    let listed = &questions[0];
    assert_eq!(listed["id"], question_id.as_str());
    assert_eq!(listed["author"]["name"], "ada");
    assert_eq!(listed["tags"], json!(["react", "typescript"]));
    assert_eq!(listed["views"], 0);

    // Each read of the thread counts one view.
    for expected_views in 1..=2 {
        let thread = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/questions/{question_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(thread.status(), StatusCode::OK);
        let body: Value = test::read_body_json(thread).await;
        assert_eq!(body["views"], expected_views);
        assert_eq!(body["answers"], json!([]));
    }

    // Both tags exist with one use each; first spelling won the display.
    let tags = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/tags").to_request(),
    )
    .await;
    let tags: Value = test::read_body_json(tags).await;
    let tag_list = tags.as_array().expect("tag array");
    assert_eq!(tag_list.len(), 2);
    let react = tag_list
        .iter()
        .find(|tag| tag["name"] == "react")
        .expect("react tag");
    assert_eq!(react["displayName"], "React");
    assert_eq!(react["questionCount"], 1);
}

#[actix_rt::test]
async fn answering_and_acceptance_flow() {
    let app = test::init_service(forum_app(forum_state())).await;
    let ada = sign_up(&app, "ada", "ada@example.com").await;
    let bob = sign_up(&app, "bob", "bob@example.com").await;

    let question_id = post_question(&app, &ada, "How do React hooks work?").await;

    let mut answer_ids = Vec::new();
    for body in [
        "Hooks let function components hold state between renders.",
        "Read the rules of hooks before reaching for an effect.",
    ] {
        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/questions/{question_id}/answers"))
                .cookie(bob.clone())
                .set_json(json!({ "content": body }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(response).await;
        answer_ids.push(created["id"].as_str().expect("answer id").to_owned());
    }

    // Only the question author may accept.
    let denied = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!(
                "/api/v1/questions/{question_id}/answers/{}/accept",
                answer_ids[0]
            ))
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    let denied_body: Value = test::read_body_json(denied).await;
    assert_eq!(denied_body["code"], "forbidden");

    for accepted in [&answer_ids[0], &answer_ids[1]] {
        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!(
                    "/api/v1/questions/{question_id}/answers/{accepted}/accept"
                ))
                .cookie(ada.clone())
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Re-read the thread: exactly one accepted answer, sorted first.
        let thread = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/questions/{question_id}"))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(thread).await;
        let answers = body["answers"].as_array().expect("answer array");
        assert_eq!(answers.len(), 2);
        let flagged: Vec<&Value> = answers
            .iter()
            .filter(|answer| answer["accepted"] == true)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0]["id"], accepted.as_str());
        assert_eq!(answers[0]["accepted"], true);
        assert_eq!(body["answerCount"], 2);
    }
}

#[actix_rt::test]
async fn anonymous_writes_and_bad_input_are_rejected() {
    let app = test::init_service(forum_app(forum_state())).await;

    // Writes need a session.
    let denied = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/questions")
            .set_json(json!({
                "title": "How do React hooks work?",
                "description": "A sufficiently long description of the problem.",
                "tags": ["react"],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let denied_body: Value = test::read_body_json(denied).await;
    assert_eq!(denied_body["code"], "unauthorized");

    // Weak signup passwords report every unmet rule.
    let weak = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({
                "username": "ada",
                "email": "ada@example.com",
                "password": "short",
                "confirmPassword": "short",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);
    let weak_body: Value = test::read_body_json(weak).await;
    assert_eq!(weak_body["code"], "invalid_request");
    assert_eq!(
        weak_body["details"]["unmet"],
        json!(["min_length", "uppercase", "digit", "special"])
    );

    // Unknown and malformed identifiers are distinguished.
    let missing = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/questions/3fa85f64-5717-4562-b3fc-2c963f66afa6")
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let malformed = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/questions/not-a-uuid")
            .to_request(),
    )
    .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    // Anonymous sessions read as the empty shape, not an error.
    let me = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/auth/me").to_request(),
    )
    .await;
    assert_eq!(me.status(), StatusCode::OK);
    let me_body: Value = test::read_body_json(me).await;
    assert!(me_body.get("user").is_none());
}

#[actix_rt::test]
async fn login_round_trip_and_bad_credentials() {
    let app = test::init_service(forum_app(forum_state())).await;
    sign_up(&app, "ada", "ada@example.com").await;

    let wrong = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "Wrong1!pw" }))
            .to_request(),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let login = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "Abcdef1!" }))
            .to_request(),
    )
    .await;
    assert_eq!(login.status(), StatusCode::NO_CONTENT);
    let cookie = login
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned();

    // Logout clears the cookie; the next `me` read is anonymous.
    let logout = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
}
