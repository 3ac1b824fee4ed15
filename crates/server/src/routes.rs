//! REST routes: one collection and one member route per record type.

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use birdbook_core::sheet::{Row, TableStore};
use birdbook_core::{Bird, Chick, FarmError, Pair, Record};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TableStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }
}

/// Liveness response.
#[derive(Serialize, Deserialize)]
pub struct Health {
    /// Always `true` when the process answers.
    pub ok: bool,
    /// Server version from Cargo.toml.
    pub version: String,
}

/// Body of successful updates and deletes.
#[derive(Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

/// A failed request: the record is missing, or the store call failed.
#[derive(Debug)]
pub struct ApiError {
    context: String,
    error: FarmError,
}

impl ApiError {
    fn not_found<R: Record>(id: String) -> Self {
        Self {
            context: format!("{} not found", R::KIND),
            error: FarmError::not_found(R::KIND, id),
        }
    }

    fn store(verb: &str, noun: &str, error: impl Into<FarmError>) -> Self {
        Self {
            context: format!("Error {verb} {noun}"),
            error: error.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error {
            FarmError::NotFound { kind, ref id } => {
                tracing::warn!(kind, id = %id, "record not found");
                (StatusCode::NOT_FOUND, Json(json!({ "error": self.error.to_string() })))
                    .into_response()
            }
            ref other => {
                tracing::error!(error = %other, "{}", self.context);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.context, "detail": other.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// A record body that falls back to the blank input.
///
/// A body that is empty, or not sent as JSON, reads as `T::default()`, so a
/// bare `POST` still creates a record with every field empty. Malformed JSON
/// is a 400.
pub struct InputBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for InputBody<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes).map(Self).map_err(|e| {
            tracing::warn!(error = %e, "rejected request body");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON body", "detail": e.to_string() })),
            )
                .into_response()
        })
    }
}

/// Root endpoint handler.
pub async fn root() -> Json<JsonValue> {
    Json(json!({ "ok": true, "message": "Bird API is running" }))
}

/// Health check endpoint handler.
pub async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list<R: Record>(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = state
        .store
        .read_all(&R::TABLE)
        .await
        .map_err(|e| ApiError::store("fetching", R::RESOURCE, e))?;
    Ok(Json(rows))
}

async fn create<R: Record>(
    State(state): State<AppState>,
    InputBody(input): InputBody<R::Input>,
) -> Result<Json<JsonValue>, ApiError> {
    let id = state
        .store
        .insert(&R::TABLE, R::cells(&input))
        .await
        .map_err(|e| ApiError::store("creating", &R::KIND.to_lowercase(), e))?;

    tracing::info!(kind = R::KIND, id = %id, "record created");

    let mut body = Map::new();
    body.insert("success".to_string(), JsonValue::Bool(true));
    body.insert(R::ID_FIELD.to_string(), JsonValue::String(id));
    Ok(Json(JsonValue::Object(body)))
}

async fn update<R: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    InputBody(input): InputBody<R::Input>,
) -> Result<Json<Ack>, ApiError> {
    let replaced = state
        .store
        .replace(&R::TABLE, &id, R::cells(&input))
        .await
        .map_err(|e| ApiError::store("updating", &R::KIND.to_lowercase(), e))?;

    if !replaced {
        return Err(ApiError::not_found::<R>(id));
    }
    tracing::info!(kind = R::KIND, id = %id, "record updated");
    Ok(Json(Ack { success: true }))
}

async fn remove<R: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    let removed = state
        .store
        .delete_and_compact(&R::TABLE, &id)
        .await
        .map_err(|e| ApiError::store("deleting", &R::KIND.to_lowercase(), e))?;

    if !removed {
        return Err(ApiError::not_found::<R>(id));
    }
    tracing::info!(kind = R::KIND, id = %id, "record deleted");
    Ok(Json(Ack { success: true }))
}

/// `GET|POST /{resource}` and `PUT|DELETE /{resource}/:id` for one record type.
fn resource<R: Record>() -> Router<AppState> {
    let collection = format!("/{}", R::RESOURCE);
    let member = format!("/{}/:id", R::RESOURCE);
    Router::new()
        .route(&collection, get(list::<R>).post(create::<R>))
        .route(&member, axum::routing::put(update::<R>).delete(remove::<R>))
}

/// Create the application router.
///
/// This is separated from `main()` to allow testing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(resource::<Bird>())
        .merge(resource::<Pair>())
        .merge(resource::<Chick>())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
