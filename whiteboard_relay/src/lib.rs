//! WebSocket relay for the collaborative whiteboard.
//!
//! Every connection joins a room. Drawing frames received from one connection
//! are fanned out to the rest of the room according to the configured
//! [`relay::RelayPolicy`]. The relay also serves the static browser client.

use axum::{Router, extract::FromRef, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use websocket::AppWsState;

pub mod config;
pub mod error;
pub mod relay;
pub mod websocket;

use config::RelayConfig;

#[derive(Clone)]
pub struct AppState {
    pub ws_state: Arc<AppWsState>,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            ws_state: Arc::new(AppWsState::new(
                config.policy,
                config.channel_capacity,
                config.default_room.clone(),
            )),
        }
    }
}

impl FromRef<AppState> for Arc<AppWsState> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.ws_state)
    }
}

/// Builds the relay router: the WebSocket endpoints plus the static client.
pub fn app(config: &RelayConfig, app_state: AppState) -> Router {
    // --- CORS Setup ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = &config.static_dir;

    Router::new()
        .route("/ws", get(websocket::default_room_handler))
        .route("/ws/{room}", get(websocket::websocket_handler))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/assets", ServeDir::new(static_dir.join("assets")))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
