use crate::config::Config;
use crate::users::routes::{AppState, user_routes};
use crate::users::storage::UserStore;
use axum::{
    Json, Router,
    extract::{Extension, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{any, get},
};
use roster_utils::version_info::{RuntimeEnv, format_version_for_runtime_env};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod users;

/// Builds the application router around the given user store.
///
/// The store is injected here so tests and the binary can supply their own;
/// the user resource lives under `/api/users`.
pub async fn routes<S>(store: S, config: Config) -> Router
where
    S: UserStore,
{
    let state = AppState::new(store);

    Router::new()
        .route("/", get(index))
        .route("/is-health", get(health_check::<S>))
        .nest("/api/users", user_routes::<S>())
        .fallback(any(catch_all))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    http_request.method = ?request.method(),
                    http_request.uri = ?request.uri(),
                    http_request.version = ?request.version(),
                    http_request.user_agent = ?request.headers().get(axum::http::header::USER_AGENT),
                )
            }),
        )
        .layer(Extension(config))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct IndexEndpoints {
    users: &'static str,
    health: &'static str,
}

#[derive(Debug, Serialize)]
struct IndexResponse {
    message: &'static str,
    endpoints: IndexEndpoints,
}

/// Root endpoint: a small API index.
async fn index() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(IndexResponse {
            message: "User Management API",
            endpoints: IndexEndpoints {
                users: "/api/users",
                health: "/is-health",
            },
        }),
    )
}

async fn health_check<S>(
    State(state): State<AppState<S>>,
    Extension(config): Extension<Config>,
) -> impl IntoResponse
where
    S: UserStore,
{
    // The store has no external backend; "reachable" means its lock is
    // still usable.
    let mut response = if state.store.list().await.is_ok() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "502").into_response()
    };

    let env_value = config.environment().to_string();
    response.headers_mut().insert(
        HeaderName::from_static("x-service-env"),
        HeaderValue::from_str(&env_value).expect("environment header is valid ASCII"),
    );

    let runtime_env: RuntimeEnv = config.environment().into();
    let version_value = format_version_for_runtime_env(runtime_env);
    response.headers_mut().insert(
        HeaderName::from_static("x-service-version"),
        HeaderValue::from_str(&version_value).expect("version header is valid ASCII"),
    );

    response
}

async fn catch_all() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}
