use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use crate::api::models::{HealthResponse, SubscribeRequest, SubscribeResponse, SummaryResponse};
use crate::error::{AppError, AppResult};
use crate::registry::RegistryReader;
use crate::store::SubscriberStore;
use crate::summary::{format::render_summary, Aggregator};

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<RegistryReader>,
    pub aggregator: Arc<Aggregator>,
    pub subscribers: Arc<dyn SubscriberStore>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// The request-driven path: one buyer's unpaid summary across all active
/// boxes. A registry failure maps to 503; a clean-but-empty result is an
/// explicit nothing-found outcome, not an empty summary.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<SummaryResponse>> {
    if handle.trim().is_empty() {
        return Err(AppError::InvalidInput("handle must not be empty".to_string()));
    }

    let entries = state.reader.list_active_boxes().await?;
    let outcome = state.aggregator.summarize(&handle, &entries).await;
    let message = render_summary(&outcome);

    Ok(Json(SummaryResponse { outcome, message }))
}

pub async fn register_subscriber(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> AppResult<Json<SubscribeResponse>> {
    let handle = request.handle.trim();
    if handle.is_empty() {
        return Err(AppError::InvalidInput("handle must not be empty".to_string()));
    }

    state.subscribers.register(handle).await?;
    info!("Subscriber registered: {}", handle);

    Ok(Json(SubscribeResponse {
        handle: handle.to_string(),
        subscribed: true,
    }))
}
