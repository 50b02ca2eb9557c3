use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use log::debug;
use serde::Serialize;

use super::{ApiError, AppState};
use crate::container::{Action, ContainerRecord, Outcome};

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    written: usize,
}

#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    name: String,
    action: Action,
    outcome: Outcome,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_inventory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContainerRecord>>, ApiError> {
    let rows = state.control.list_inventory().await?;
    debug!("Listing {} inventory rows", rows.len());
    Ok(Json(rows))
}

pub async fn sync_inventory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncResponse>, ApiError> {
    let written = state.control.sync_inventory().await?;
    Ok(Json(SyncResponse { written }))
}

pub async fn start_container(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    let outcome = state.control.start_by_name(&name).await?;
    Ok(Json(LifecycleResponse {
        name,
        action: Action::Start,
        outcome,
    }))
}

pub async fn stop_container(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    let outcome = state.control.stop_by_name(&name).await?;
    Ok(Json(LifecycleResponse {
        name,
        action: Action::Stop,
        outcome,
    }))
}
