//! HTTP dispatch for the control plane.
//!
//! Every route under `/containers` requires the shared secret in the
//! `X-Api-Key` header:
//!
//! - `GET /containers/list`: persisted inventory
//! - `GET /containers/add`: sync the live snapshot into the inventory
//! - `GET /containers/start/{name}`: start a container by name
//! - `GET /containers/stop/{name}`: stop a container by name
//!
//! `GET /health` is open.

mod access_log;
mod auth;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, middleware, routing::get};
use log::info;
use tokio::net::TcpListener;

use crate::control::ControlPlane;
use crate::error::CorralError;

pub use auth::API_KEY_HEADER;

/// State shared across axum handlers.
pub struct AppState {
    control: Arc<ControlPlane>,
    api_key: String,
}

impl AppState {
    pub fn new(control: Arc<ControlPlane>, api_key: impl Into<String>) -> Self {
        Self {
            control,
            api_key: api_key.into(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let containers = Router::new()
        .route("/list", get(handlers::list_inventory))
        .route("/add", get(handlers::sync_inventory))
        .route("/start/{name}", get(handlers::start_container))
        .route("/stop/{name}", get(handlers::stop_container))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_api_key,
        ));

    Router::new()
        .nest("/containers", containers)
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(middleware::from_fn(access_log::log_requests))
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Control plane listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Control(CorralError),
}

impl From<CorralError> for ApiError {
    fn from(value: CorralError) -> Self {
        ApiError::Control(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized",
                    message: format!("Missing or invalid {} header", API_KEY_HEADER),
                },
            ),
            ApiError::Control(err) => {
                let status = match &err {
                    CorralError::ContainerNotFound(_) => StatusCode::NOT_FOUND,
                    CorralError::RuntimeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    CorralError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    ErrorBody {
                        error: err.kind(),
                        message: err.to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
