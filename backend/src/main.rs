//! Backend entry-point: wires the REST endpoints, adapters, and OpenAPI docs.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use quorum_backend::config::AppConfig;
#[cfg(debug_assertions)]
use quorum_backend::doc::ApiDoc;
use quorum_backend::domain::{ContentService, SessionManager, TagSuggester};
use quorum_backend::inbound::http::health::{HealthState, live, ready};
use quorum_backend::inbound::http::state::HttpState;
use quorum_backend::inbound::http::configure_api;
use quorum_backend::outbound::dynamodb::DynamoContentStore;
use quorum_backend::outbound::identity::HttpIdentityProvider;
use quorum_backend::outbound::suggest::{DisabledTagSuggester, HttpTagSuggester};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let key = match std::fs::read(&config.session_key_file) {
        Ok(bytes) => Key::derive_from(&bytes),
        Err(e) => {
            if cfg!(debug_assertions) || config.session_allow_ephemeral {
                warn!(path = %config.session_key_file, error = %e, "using temporary session key (dev only)");
                Key::generate()
            } else {
                return Err(std::io::Error::other(format!(
                    "failed to read session key at {}: {e}",
                    config.session_key_file
                )));
            }
        }
    };

    let http = reqwest::Client::new();
    let store = Arc::new(
        DynamoContentStore::from_env(config.tables.clone(), config.dynamodb_endpoint.as_deref())
            .await,
    );
    let content = Arc::new(ContentService::new(store.clone()));
    let identity = Arc::new(HttpIdentityProvider::new(
        http.clone(),
        config.identity_base_url.clone(),
        config.identity_api_key.clone(),
    ));
    let sessions = Arc::new(SessionManager::new(store, identity));
    let suggester: Arc<dyn TagSuggester> = match &config.suggest_endpoint {
        Some(endpoint) => Arc::new(HttpTagSuggester::new(http, endpoint.clone())),
        None => {
            warn!("TAG_SUGGEST_URL unset; tag suggestions disabled");
            Arc::new(DisabledTagSuggester)
        }
    };

    let state = web::Data::new(HttpState::new(
        content.clone(),
        content,
        sessions,
        suggester,
    ));
    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness flip stays visible.
    let server_health_state = health_state.clone();
    let server_state = state.clone();
    let cookie_secure = config.cookie_secure;

    let server = HttpServer::new(move || {
        build_app(
            server_state.clone(),
            server_health_state.clone(),
            key.clone(),
            cookie_secure,
        )
    })
    .bind(("0.0.0.0", config.http_port))?;

    health_state.mark_ready();
    server.run().await
}

fn build_app(
    state: web::Data<HttpState>,
    health_state: web::Data<HealthState>,
    key: Key,
    cookie_secure: bool,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .app_data(state)
        .configure(configure_api);

    let mut app = App::new()
        .app_data(health_state)
        .wrap(quorum_backend::Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    {
        app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}
