//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::DEFAULT_ACTIVE_WINDOW_DAYS;

use super::{
    handler::{http, websocket::websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Runtime configuration, filled from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g., "127.0.0.1")
    pub host: String,
    /// The port number to bind to (e.g., 8080)
    pub port: u16,
    /// Days of inactivity after which a user no longer counts as active
    pub active_window_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            active_window_days: DEFAULT_ACTIVE_WINDOW_DAYS,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Estimation room server
///
/// # Example
///
/// ```ignore
/// let state = AppState::in_memory(Arc::new(SystemClock), config.active_window_days);
/// Server::new(state).run(&config).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the router with every route mounted.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(http::health_check))
            .route("/api/rooms/{room_id}", get(http::get_room))
            .route("/api/sessions", post(http::create_session))
            .route("/api/sessions/{session_id}", get(http::get_session))
            .route(
                "/api/sessions/{session_id}/participants",
                post(http::add_participant),
            )
            .route("/api/sessions/{session_id}/votes", post(http::add_vote))
            .route("/api/sessions/{session_id}/reveal", post(http::reveal_votes))
            .route(
                "/api/sessions/{session_id}/complete",
                post(http::complete_session),
            )
            .route(
                "/api/sessions/{session_id}/reactions",
                post(http::add_reaction),
            )
            .route(
                "/api/sessions/{session_id}/statistics",
                get(http::session_statistics),
            )
            .route("/api/users/{user_id}/sessions", get(http::user_history))
            .route("/api/users/{user_id}/stats", get(http::user_stats))
            .route("/api/stats/global", get(http::global_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the address or
    /// if there's an error during server execution.
    pub async fn run(self, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Huddle server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?room=<room id>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
