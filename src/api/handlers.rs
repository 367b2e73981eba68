//! HTTP request handlers

use super::types::{
    ErrorResponse, HealthResponse, InitializeRequest, LastSessionResponse, ListSessionsQuery,
    MessageRequest, OperationResponse, SessionListResponse, SessionResponse, TopicCheckQuery,
    TopicCheckResponse,
};
use super::AppState;
use crate::age::{AgeEstimate, InvalidAge};
use crate::runtime::{ProductionController, RuntimeError, SessionView};
use crate::state_machine::TransitionError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 50;

/// Transcript cap for a single session lookup
const SESSION_MESSAGE_LIMIT: usize = 200;

/// Transcript cap for the "resume last session" lookup
const LAST_SESSION_MESSAGE_LIMIT: usize = 100;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/last", get(last_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/initialize", post(initialize_session))
        .route("/api/sessions/:id/messages", post(send_message))
        .route(
            "/api/sessions/:id/parenting-mode/toggle",
            post(toggle_parenting_mode),
        )
        .route("/api/sessions/:id/reset", post(reset_conversation))
        .route("/api/sessions/:id/topic-check", get(topic_check))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.runtime.model_id().to_string(),
    })
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.runtime.create_session()?;
    Ok((StatusCode::CREATED, Json(SessionResponse { session })))
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let limit = list_limit(query.limit.as_deref());
    let sessions = state.runtime.list_sessions(limit)?;
    Ok(Json(SessionListResponse { sessions }))
}

async fn last_session(
    State(state): State<AppState>,
) -> Result<Json<LastSessionResponse>, AppError> {
    let session = match state.runtime.last_session().await? {
        Some(controller) => Some(
            controller
                .lock()
                .await
                .view()
                .with_recent_messages(LAST_SESSION_MESSAGE_LIMIT),
        ),
        None => None,
    };
    Ok(Json(LastSessionResponse { session }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let controller = controller(&state, &id).await?;
    let view = controller
        .lock()
        .await
        .view()
        .with_recent_messages(SESSION_MESSAGE_LIMIT);
    Ok(Json(view))
}

/// Parse `?limit=`, clamped to `1..=50`; missing or malformed means 20
fn list_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map_or(DEFAULT_LIST_LIMIT, |n| {
            u32::try_from(n.clamp(1, i64::from(MAX_LIST_LIMIT))).unwrap_or(DEFAULT_LIST_LIMIT)
        })
}

async fn initialize_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InitializeRequest>,
) -> Result<Json<OperationResponse>, AppError> {
    let estimate = match req.predicted_age {
        Some(years) => AgeEstimate::years(years)?,
        None => AgeEstimate::Unknown,
    };
    let gender = req
        .gender
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty());

    let controller = controller(&state, &id).await?;
    let mut controller = controller.lock().await;
    let messages = controller.initialize(estimate, gender).await;
    Ok(Json(OperationResponse {
        messages,
        view: controller.view(),
    }))
}

// ============================================================
// Conversation
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<OperationResponse>, AppError> {
    let controller = controller(&state, &id).await?;
    let mut controller = controller.lock().await;
    let messages = controller.submit_user_message(&req.text).await;
    Ok(Json(OperationResponse {
        messages,
        view: controller.view(),
    }))
}

async fn toggle_parenting_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OperationResponse>, AppError> {
    let controller = controller(&state, &id).await?;
    let mut controller = controller.lock().await;
    let messages = controller.toggle_parenting_mode().await?;
    Ok(Json(OperationResponse {
        messages,
        view: controller.view(),
    }))
}

async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OperationResponse>, AppError> {
    let controller = controller(&state, &id).await?;
    let mut controller = controller.lock().await;
    let messages = controller.reset_conversation().await;
    Ok(Json(OperationResponse {
        messages,
        view: controller.view(),
    }))
}

async fn topic_check(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TopicCheckQuery>,
) -> Result<Json<TopicCheckResponse>, AppError> {
    let controller = controller(&state, &id).await?;
    let controller = controller.lock().await;
    Ok(Json(TopicCheckResponse {
        recent: controller.is_topic_recent(&query.text),
        topics: controller.view().topics,
    }))
}

async fn controller(
    state: &AppState,
    id: &str,
) -> Result<Arc<Mutex<ProductionController>>, AppError> {
    Ok(state.runtime.get_or_load(id).await?)
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::SessionNotFound(_) => AppError::NotFound(e.to_string()),
            RuntimeError::Database(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<InvalidAge> for AppError {
    fn from(e: InvalidAge) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::Conflict(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
