use std::sync::Arc;
use axum::{
    Router,
    routing::{delete, get},
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use crate::api::{ApiError, AppState};
use crate::observability::metrics;
use crate::types::{PaginatedResult, QueryOptions, SortField, SortOrder, TimePeriod, TokenRecord};
use crate::utils::helper::is_valid_token_address;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/tokens", get(list_tokens))
        .route("/api/tokens/:address", get(get_token))
        .route("/api/cache", delete(clear_cache))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub time_period: Option<String>,
}

impl TokensQuery {
    fn to_options(&self, state: &AppState) -> QueryOptions {
        let defaults = QueryOptions::default();

        QueryOptions {
            limit: state.pagination.clamp(self.limit),
            cursor: self.cursor.clone().filter(|c| !c.is_empty()),
            sort_by: self.sort_by.as_deref().map(SortField::parse).unwrap_or(defaults.sort_by),
            sort_order: self.sort_order.as_deref().map(SortOrder::parse).unwrap_or(defaults.sort_order),
            time_period: self.time_period.as_deref()
                .and_then(TimePeriod::parse)
                .or(defaults.time_period),
        }
    }
}

async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokensQuery>,
) -> Result<Json<PaginatedResult>, ApiError> {
    let options = query.to_options(&state);
    let page = state.service.get_tokens(&options).await?;
    Ok(Json(page))
}

#[derive(Serialize)]
struct TokenResponse {
    data: TokenRecord,
}

async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !is_valid_token_address(&address) {
        return Err(ApiError::BadRequest("Invalid token address".to_string()));
    }

    match state.service.get_token_by_address(&address).await? {
        Some(data) => Ok(Json(TokenResponse { data })),
        None => Err(ApiError::NotFound(format!("Token {} not found", address))),
    }
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.clear_cache().await;
    StatusCode::NO_CONTENT
}
