//! HTTP routes for the user resource.
//!
//! Handlers translate requests into store operations with validation and
//! response shaping. All validation happens before any store mutation, so a
//! failed request leaves the store untouched. Handlers hold the store only
//! for the duration of one request.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use super::storage::UserStore;
use super::types::{
    ErrorResponse, ListUsersQuery, PatchUserRequest, UpsertUserRequest, UserError,
};

/// Application state handed to every handler.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
}

impl<S> AppState<S> {
    /// Creates a new `AppState` around the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

/// Creates the router for the user resource. Nested under `/api/users`.
pub fn user_routes<S>() -> Router<AppState<S>>
where
    S: UserStore,
{
    Router::new()
        .route("/", get(list_users::<S>))
        .route("/", post(create_user::<S>))
        .route("/{id}", get(get_user::<S>))
        .route("/{id}", put(replace_user::<S>))
        .route("/{id}", patch(patch_user::<S>))
        .route("/{id}", delete(delete_user::<S>))
}

fn err_response(err: UserError) -> Response {
    let (status, body): (StatusCode, Json<ErrorResponse>) = err.into();
    (status, body).into_response()
}

fn store_error<E: std::error::Error>(err: E) -> Response {
    tracing::error!("store operation failed: {err}");
    err_response(UserError::Internal(err.to_string()))
}

/// Ids are opaque UUIDs; a path segment that is not one cannot match any
/// record, so it reads as "not found" rather than "bad request".
fn parse_user_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// Unwraps a body extraction, mapping the extractor's rejection onto the
/// resource's own error shape so every 4xx carries the same JSON body.
fn require_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, UserError> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(rejection) => Err(UserError::InvalidBody(rejection.body_text())),
    }
}

/// Handler for `GET /api/users`, with an optional `limit` on the number of
/// records returned.
#[tracing::instrument(skip_all)]
async fn list_users<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListUsersQuery>,
) -> Response
where
    S: UserStore,
{
    let limit = match query.parse_limit() {
        Ok(limit) => limit,
        Err(err) => return err_response(err),
    };

    match state.store.list().await {
        Ok(users) => {
            let users: Vec<_> = match limit {
                Some(n) => users.into_iter().take(n).collect(),
                None => users,
            };
            (StatusCode::OK, Json(users)).into_response()
        }
        Err(err) => store_error(err),
    }
}

/// Handler for `GET /api/users/{id}`.
async fn get_user<S>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Response
where
    S: UserStore,
{
    let Some(id) = parse_user_id(&id) else {
        return err_response(UserError::NotFound(id));
    };

    match state.store.find_by_id(id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => err_response(UserError::NotFound(id.to_string())),
        Err(err) => store_error(err),
    }
}

/// Handler for `POST /api/users`.
#[tracing::instrument(skip_all)]
async fn create_user<S>(
    State(state): State<AppState<S>>,
    payload: Result<Json<UpsertUserRequest>, JsonRejection>,
) -> Response
where
    S: UserStore,
{
    let fields = match require_body(payload).and_then(UpsertUserRequest::validate) {
        Ok(fields) => fields,
        Err(err) => return err_response(err),
    };

    match state.store.append(fields).await {
        Ok(user) => {
            tracing::info!(id = %user.id, "created user");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(err) => store_error(err),
    }
}

/// Handler for `PUT /api/users/{id}`: full replacement.
///
/// Unknown ids fail before the body is validated, and the id always comes
/// from the path, never from the body.
#[tracing::instrument(skip_all)]
async fn replace_user<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<UpsertUserRequest>, JsonRejection>,
) -> Response
where
    S: UserStore,
{
    let Some(id) = parse_user_id(&id) else {
        return err_response(UserError::NotFound(id));
    };

    match state.store.find_by_id(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return err_response(UserError::NotFound(id.to_string())),
        Err(err) => return store_error(err),
    }

    let fields = match require_body(payload).and_then(UpsertUserRequest::validate) {
        Ok(fields) => fields,
        Err(err) => return err_response(err),
    };

    match state.store.replace(id, fields).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => err_response(UserError::NotFound(id.to_string())),
        Err(err) => store_error(err),
    }
}

/// Handler for `PATCH /api/users/{id}`: partial update. Only the fields
/// present in the body overwrite stored values.
#[tracing::instrument(skip_all)]
async fn patch_user<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<PatchUserRequest>, JsonRejection>,
) -> Response
where
    S: UserStore,
{
    let Some(id) = parse_user_id(&id) else {
        return err_response(UserError::NotFound(id));
    };

    let user = match state.store.find_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return err_response(UserError::NotFound(id.to_string())),
        Err(err) => return store_error(err),
    };

    let fields = match require_body(payload).and_then(|patch| patch.apply_to(&user)) {
        Ok(fields) => fields,
        Err(err) => return err_response(err),
    };

    match state.store.replace(id, fields).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => err_response(UserError::NotFound(id.to_string())),
        Err(err) => store_error(err),
    }
}

/// Handler for `DELETE /api/users/{id}`: removes the record permanently and
/// returns it.
#[tracing::instrument(skip_all)]
async fn delete_user<S>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Response
where
    S: UserStore,
{
    let Some(id) = parse_user_id(&id) else {
        return err_response(UserError::NotFound(id));
    };

    match state.store.remove(id).await {
        Ok(Some(user)) => {
            tracing::info!(id = %user.id, "deleted user");
            (StatusCode::OK, Json(user)).into_response()
        }
        Ok(None) => err_response(UserError::NotFound(id.to_string())),
        Err(err) => store_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::storage::MemoryUserStore;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(store: MemoryUserStore) -> Router {
        Router::new()
            .nest("/api/users", user_routes::<MemoryUserStore>())
            .with_state(AppState::new(store))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn test_get_with_malformed_id_is_not_found() {
        let app = app(MemoryUserStore::with_seed());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_invalid_limit_reports_invalid_parameter() {
        let app = app(MemoryUserStore::with_seed());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users?limit=zero")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_parameter");
    }

    #[tokio::test]
    async fn test_failed_create_leaves_store_unchanged() {
        let store = MemoryUserStore::with_seed();
        let app = app(store.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"firstName": "Only"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "missing_fields");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_body_reports_invalid_body() {
        let store = MemoryUserStore::with_seed();
        let app = app(store.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"firstName": "#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_body");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_unknown_id_is_not_found_before_validation() {
        let app = app(MemoryUserStore::with_seed());

        // The body is invalid too; the unknown id must win.
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/users/{}", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_patch_leaves_record_unchanged() {
        let store = MemoryUserStore::with_seed();
        let first = store.list().await.expect("should list")[0].clone();
        let app = app(store.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/users/{}", first.id))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"firstName": "Changed", "age": -1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let unchanged = store
            .find_by_id(first.id)
            .await
            .expect("should not error")
            .expect("record should still exist");
        assert_eq!(unchanged, first);
    }
}
