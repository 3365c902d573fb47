//! HTTP API for sets and cards
//!
//! Provides REST endpoints over the local store for the collection frontend.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::database;
use crate::models::{Card, Set};

/// Frontend dev servers allowed to call the API from a browser
const ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
];

/// Shared application state (thread-safe database connection)
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}

/// API error, rendered as `{"detail": "..."}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        log::error!("Database error: {}", err);
        ApiError::Internal(format!("Database error: {}", err))
    }
}

impl From<crate::error::CatalogError> for ApiError {
    fn from(err: crate::error::CatalogError) -> Self {
        match err {
            crate::error::CatalogError::SetNotFound(id) => set_not_found(&id),
            err => {
                log::error!("Store error: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// Offset pagination query parameters
#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

/// Card listing parameters
#[derive(Deserialize)]
struct CardListParams {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    set_id: Option<String>,
}

fn default_limit() -> usize {
    100
}

fn set_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Set with id '{}' not found", id))
}

/// GET /
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the PokéndeX Pro API" }))
}

/// POST /sets
async fn create_set_handler(
    State(state): State<AppState>,
    Json(set): Json<Set>,
) -> Result<(StatusCode, Json<Set>), ApiError> {
    let mut conn = state.conn()?;

    if database::get_set(&conn, &set.id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Set with id '{}' already exists",
            set.id
        )));
    }
    database::insert_sets(&mut conn, std::slice::from_ref(&set))?;

    Ok((StatusCode::CREATED, Json(set)))
}

/// GET /sets?skip={skip}&limit={limit}
async fn list_sets_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Set>>, ApiError> {
    let conn = state.conn()?;
    Ok(Json(database::list_sets(&conn, params.skip, params.limit)?))
}

/// GET /sets/{id}
async fn get_set_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Set>, ApiError> {
    let conn = state.conn()?;
    database::get_set(&conn, &id)?
        .map(Json)
        .ok_or_else(|| set_not_found(&id))
}

/// POST /cards - the referenced set must exist
async fn create_card_handler(
    State(state): State<AppState>,
    Json(card): Json<Card>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let mut conn = state.conn()?;

    if database::get_set(&conn, &card.set_id)?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Set with id '{}' not found. Cannot create card.",
            card.set_id
        )));
    }
    if database::get_card(&conn, &card.id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Card with id '{}' already exists",
            card.id
        )));
    }
    database::insert_cards(&mut conn, std::slice::from_ref(&card))?;

    Ok((StatusCode::CREATED, Json(card)))
}

/// GET /cards?skip={skip}&limit={limit}&set_id={set_id}
async fn list_cards_handler(
    State(state): State<AppState>,
    Query(params): Query<CardListParams>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let conn = state.conn()?;
    let cards = database::list_cards(
        &conn,
        params.skip,
        params.limit,
        params.set_id.as_deref().filter(|id| !id.is_empty()),
    )?;
    Ok(Json(cards))
}

/// GET /cards/{id}
async fn get_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let conn = state.conn()?;
    database::get_card(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Card with id '{}' not found", id)))
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Build the API router
pub fn create_router(db: Arc<Mutex<Connection>>) -> Router {
    let state = AppState { db };

    Router::new()
        .route("/", get(root_handler))
        .route("/sets", get(list_sets_handler).post(create_set_handler))
        .route("/sets/{id}", get(get_set_handler))
        .route("/cards", get(list_cards_handler).post(create_card_handler))
        .route("/cards/{id}", get(get_card_handler))
        .layer(cors_layer())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

/// Start the API server on all interfaces
pub async fn serve(db: Arc<Mutex<Connection>>, port: u16) -> std::io::Result<()> {
    let app = create_router(db);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
