pub mod error;
pub mod rest;
pub mod websocket;

use std::sync::Arc;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::broadcast::TokenBroadcaster;
use crate::config::server::PaginationConfig;
use crate::service::TokenService;

pub use error::ApiError;

pub struct AppState {
    pub service: Arc<TokenService>,
    pub broadcaster: Arc<TokenBroadcaster>,
    pub pagination: PaginationConfig,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    rest::routes()
        .route("/ws", get(websocket::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
