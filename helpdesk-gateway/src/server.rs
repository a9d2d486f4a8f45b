use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, ws::WebSocketUpgrade},
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use helpdesk_db::{DbError, Ticket, TicketRepository};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use crate::chat::ChatError;
use crate::providers::GenerationError;
use crate::state::{AppState, LogEntry};

/// Chat request from HTTP API
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user_contact: Option<String>,
}

/// Chat response for HTTP API
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub ticket_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<GenerationError>,
}

#[derive(Debug, Deserialize)]
pub struct TicketCreateRequest {
    pub user_question: String,
    #[serde(default)]
    pub user_contact: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketCreateResponse {
    pub ticket_id: i64,
    pub ticket: Ticket,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub message_id: String,
    pub is_helpful: bool,
    #[serde(default)]
    pub user_contact: Option<String>,
    #[serde(default)]
    pub original_question: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub ticket_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    pub duplicate: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub knowledge_sections: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Request failure mapped to an HTTP status
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("ticket storage failed: {0}")]
    Db(#[from] DbError),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Chat(ChatError::Validation(_)) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::Chat(ChatError::Persistence(_)) | ApiError::Db(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}

/// Run the HTTP server
pub async fn run(
    state: Arc<AppState>,
    bind_addr: &str,
    cors_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state, cors_origins);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/ticket", post(create_ticket_handler))
        .route("/feedback", post(feedback_handler))
        .route("/tickets", get(list_tickets_handler))
        .route("/tickets/{id}", get(get_ticket_handler))
        .route("/logs", get(logs_ws_handler))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "helpdesk API is running" }))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        knowledge_sections: state.orchestrator.index().len(),
    })
}

fn log_request(state: &AppState, method: &str, path: &str, result: &Result<impl Sized, ApiError>) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_and_kind().0,
    };
    state.log(LogEntry::HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
    });
}

/// Chat handler - POST /chat
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    info!("Received chat request");

    let result = state
        .orchestrator
        .chat(&request.message, request.user_contact.as_deref())
        .await
        .map_err(ApiError::from);
    log_request(&state, "POST", "/chat", &result);
    let exchange = result?;

    match (&exchange.message_id, exchange.ticket_id) {
        (_, Some(ticket_id)) => state.log(LogEntry::Escalated {
            ticket_id,
            reason: exchange
                .generation_error
                .map(|e| e.as_str().to_string())
                .unwrap_or_else(|| "fallback_phrase".to_string()),
            question: exchange.question.clone(),
        }),
        (Some(message_id), None) => state.log(LogEntry::ChatAnswered {
            message_id: message_id.clone(),
            question: exchange.question.clone(),
        }),
        (None, None) => {}
    }

    Ok(Json(ChatResponse {
        ticket_created: exchange.ticket_created(),
        response: exchange.response,
        message_id: exchange.message_id,
        ticket_id: exchange.ticket_id,
        generation_error: exchange.generation_error,
    }))
}

/// Ticket handler - POST /ticket
async fn create_ticket_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TicketCreateRequest>,
) -> Result<Json<TicketCreateResponse>, ApiError> {
    let result = state
        .orchestrator
        .create_ticket(&request.user_question, request.user_contact.as_deref())
        .await
        .map_err(ApiError::from);
    log_request(&state, "POST", "/ticket", &result);
    let ticket = result?;

    state.log(LogEntry::Escalated {
        ticket_id: ticket.id,
        reason: "manual".to_string(),
        question: ticket.question.clone(),
    });

    Ok(Json(TicketCreateResponse {
        ticket_id: ticket.id,
        ticket,
    }))
}

/// Feedback handler - POST /feedback
async fn feedback_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let result = state
        .feedback
        .record(
            &request.message_id,
            request.is_helpful,
            request.user_contact.as_deref(),
            &request.original_question,
        )
        .await
        .map_err(ApiError::from);
    log_request(&state, "POST", "/feedback", &result);
    let outcome = result?;

    state.log(LogEntry::Feedback {
        message_id: request.message_id.clone(),
        helpful: request.is_helpful,
        duplicate: outcome.duplicate,
    });
    if let Some(ticket_id) = outcome.ticket_id {
        state.log(LogEntry::Escalated {
            ticket_id,
            reason: "negative_feedback".to_string(),
            question: request.original_question.clone(),
        });
    }

    Ok(Json(FeedbackResponse {
        success: true,
        ticket_created: outcome.ticket_created,
        ticket_id: outcome.ticket_id,
        duplicate: outcome.duplicate,
    }))
}

/// Ticket list handler - GET /tickets
async fn list_tickets_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let result = TicketRepository::list_all(state.db().pool())
        .await
        .map_err(ApiError::from);
    log_request(&state, "GET", "/tickets", &result);
    Ok(Json(result?))
}

/// Ticket lookup handler - GET /tickets/{id}
async fn get_ticket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>, ApiError> {
    let result = match TicketRepository::get_by_id(state.db().pool(), id).await {
        Ok(Some(ticket)) => Ok(ticket),
        Ok(None) => Err(ApiError::NotFound(format!("ticket {} not found", id))),
        Err(e) => Err(ApiError::from(e)),
    };
    log_request(&state, "GET", "/tickets/{id}", &result);
    Ok(Json(result?))
}

/// WebSocket upgrade handler for logs
async fn logs_ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_logs_websocket(socket, state))
}

/// Handle logs WebSocket connection - streams log entries to client
async fn handle_logs_websocket(socket: axum::extract::ws::WebSocket, state: Arc<AppState>) {
    use axum::extract::ws::Message;
    use futures::{sink::SinkExt, stream::StreamExt};

    let client_id = format!("log_client_{}", uuid::Uuid::new_v4());
    info!("Log WebSocket client connected: {}", client_id);
    state.log(LogEntry::WebSocket {
        event: "connected".to_string(),
        client_id: client_id.clone(),
    });

    let (mut sender, mut receiver) = socket.split();

    // Subscribe to log broadcasts
    let mut log_rx = state.subscribe_logs();

    let _ = sender
        .send(Message::Text(
            serde_json::json!({
                "type": "connected",
                "message": "Connected to helpdesk gateway logs"
            })
            .to_string()
            .into(),
        ))
        .await;

    loop {
        tokio::select! {
            Ok(entry) = log_rx.recv() => {
                let log_line = entry.to_string();
                if sender.send(Message::Text(log_line.into())).await.is_err() {
                    break;
                }
            }

            Some(Ok(msg)) = receiver.next() => {
                if matches!(msg, Message::Close(_)) {
                    break;
                }
            }

            else => break,
        }
    }

    info!("Log WebSocket client disconnected: {}", client_id);
}
