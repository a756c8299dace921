//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ActionResponse, ChatRequest, ConversationResponse, CreateConversationRequest, ErrorResponse,
    LanguageResponse, ResetRequest, SuccessResponse, TurnResponse,
};
use super::AppState;
use crate::actions::ActionButton;
use crate::conversation::{Conversation, PendingTurn, TransitionError};
use crate::knowledge::PageSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/conversations", post(create_conversation))
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/:id/stream", get(stream_conversation))
        // Turns
        .route("/api/conversations/:id/chat", post(send_chat))
        .route("/api/conversations/:id/analyze-page", post(analyze_page))
        .route("/api/conversations/:id/stop", post(stop_generating))
        // Session
        .route("/api/conversations/:id/reset", post(reset_conversation))
        .route(
            "/api/conversations/:id/language/toggle",
            post(toggle_language),
        )
        .route("/api/conversations/:id/actions", post(dispatch_action))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn lookup(state: &AppState, id: &str) -> Result<Arc<Conversation>, AppError> {
    state
        .conversation(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {id}")))
}

async fn create_conversation(
    State(state): State<AppState>,
    body: Option<Json<CreateConversationRequest>>,
) -> Json<ConversationResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let conversation = state.create_conversation(req.language).await;
    Json(ConversationResponse {
        conversation: conversation.snapshot(),
    })
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    Ok(Json(ConversationResponse {
        conversation: conversation.snapshot(),
    }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let conversation = state
        .remove_conversation(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {id}")))?;
    conversation.close();
    Ok(Json(SuccessResponse::ok()))
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = lookup(&state, &id).await?;
    // subscribe first so nothing between snapshot and stream is lost
    let rx = conversation.subscribe();
    Ok(sse_stream(conversation.snapshot(), rx))
}

/// Produce the reply in the background; progress arrives over SSE
fn spawn_turn(conversation: Arc<Conversation>, pending: PendingTurn) {
    tokio::spawn(async move {
        conversation.run_turn(pending).await;
    });
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    let pending = conversation.begin_turn(&req.text, None)?;
    spawn_turn(conversation, pending);
    Ok(Json(TurnResponse { queued: true }))
}

async fn analyze_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(snapshot): Json<PageSnapshot>,
) -> Result<Json<TurnResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    let pending = conversation.begin_page_analysis(&snapshot)?;
    spawn_turn(conversation, pending);
    Ok(Json(TurnResponse { queued: true }))
}

async fn stop_generating(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    conversation.stop_generating()?;
    Ok(Json(SuccessResponse::ok()))
}

async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ResetRequest>>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let language = req
        .language
        .unwrap_or_else(|| conversation.session().language);
    conversation.reset_conversation(language);
    Ok(Json(ConversationResponse {
        conversation: conversation.snapshot(),
    }))
}

async fn toggle_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LanguageResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    let language = conversation.toggle_language();
    Ok(Json(LanguageResponse { language }))
}

async fn dispatch_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(button): Json<ActionButton>,
) -> Result<Json<ActionResponse>, AppError> {
    let conversation = lookup(&state, &id).await?;
    let target = conversation.dispatch_action(&button)?;
    Ok(Json(ActionResponse { target }))
}

async fn get_version() -> &'static str {
    concat!("homestay-concierge ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::EmptyInput => AppError::BadRequest(e.to_string()),
            TransitionError::Busy | TransitionError::NothingToStop | TransitionError::StaleTurn => {
                AppError::Conflict(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
