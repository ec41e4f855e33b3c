//! Streamable HTTP transport
//!
//! JSON-RPC over `POST /mcp` with JSON responses. `initialize` opens a
//! session whose id travels in the `mcp-session-id` header; `DELETE /mcp`
//! closes it. Sessions live until deleted or until the process exits.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::sync::Mutex;

use crate::config::http::{MCP_PATH, SESSION_HEADER};
use crate::config::HttpConfig;
use crate::error::{McpError, Result};
use crate::mcp::server::McpServer;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::{methods, JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Protocol state of one HTTP session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// The client sent `notifications/initialized` on this session
    pub initialized: bool,
}

/// Shared state of the HTTP transport
pub struct HttpState<H: ToolHandler> {
    server: McpServer<H>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl<H: ToolHandler> HttpState<H> {
    pub fn new(server: McpServer<H>) -> Self {
        Self {
            server,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn session(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.get(id).copied()
    }
}

/// Build the axum router serving `server` on [`MCP_PATH`]
pub fn router<H: ToolHandler>(server: McpServer<H>) -> Router {
    router_with_state(Arc::new(HttpState::new(server)))
}

pub fn router_with_state<H: ToolHandler>(state: Arc<HttpState<H>>) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_post::<H>).delete(handle_delete::<H>))
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve<H: ToolHandler>(server: McpServer<H>, config: &HttpConfig) -> Result<()> {
    let name = server.name().to_string();
    let app = router(server);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| McpError::Transport {
            message: format!("cannot bind {}: {}", config.bind, e),
        })?;
    tracing::info!(server = %name, "Application started on http://{}{}", config.bind, MCP_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Application shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
}

fn transport_error(status: StatusCode, message: &str) -> Response {
    let error = JsonRpcError {
        code: -32000,
        message: message.to_string(),
        data: None,
    };
    (status, Json(JsonRpcResponse::error(None, error))).into_response()
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

async fn handle_post<H: ToolHandler>(
    State(state): State<Arc<HttpState<H>>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Unreadable JSON-RPC body: {}", e);
            let resp = JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(resp)).into_response();
        }
    };

    if request.method == methods::INITIALIZE {
        let Some(response) = state.server.handle_request(request).await else {
            return StatusCode::ACCEPTED.into_response();
        };
        if response.error.is_some() {
            return (StatusCode::OK, Json(response)).into_response();
        }

        let session = uuid::Uuid::new_v4().simple().to_string();
        state
            .sessions
            .lock()
            .await
            .insert(session.clone(), Session::default());
        tracing::info!(session = %session, "Session opened");

        return (StatusCode::OK, [(SESSION_HEADER, session)], Json(response)).into_response();
    }

    let Some(session) = session_id(&headers) else {
        return transport_error(StatusCode::BAD_REQUEST, "Bad Request: Missing session ID");
    };
    {
        let mut sessions = state.sessions.lock().await;
        let Some(entry) = sessions.get_mut(session) else {
            return transport_error(StatusCode::NOT_FOUND, "Session not found");
        };
        if request.is_notification() && request.method == methods::INITIALIZED {
            entry.initialized = true;
            tracing::debug!(session = %session, "Session initialized");
        }
    }

    match state.server.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_delete<H: ToolHandler>(
    State(state): State<Arc<HttpState<H>>>,
    headers: HeaderMap,
) -> Response {
    let Some(session) = session_id(&headers) else {
        return transport_error(StatusCode::BAD_REQUEST, "Bad Request: Missing session ID");
    };

    if state.sessions.lock().await.remove(session).is_some() {
        tracing::info!(session = %session, "Session closed");
        StatusCode::OK.into_response()
    } else {
        transport_error(StatusCode::NOT_FOUND, "Session not found")
    }
}
