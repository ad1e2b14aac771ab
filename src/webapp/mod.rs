//! HTTP surface for the engine
//!
//! `GET /api/market/surface/:symbol` returns a [`SurfaceResponse`] as JSON.
//! Failures map to a 500 with a fixed message; details stay in the logs.

use crate::engine::SurfaceEngine;
use crate::models::SurfaceResponse;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error};

const SYNC_FAILED: &str = "Market engine synchronization failed";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SurfaceEngine>,
}

impl AppState {
    pub fn new(engine: SurfaceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Error body returned on any internal failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/market/surface/:symbol", get(surface_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn surface_handler(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.engine.get_surface(&symbol).await {
        Ok(surface) => {
            debug!("served surface for {}", symbol);
            Json::<SurfaceResponse>(surface).into_response()
        }
        Err(e) => {
            error!("surface request for {} failed: {}", symbol, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: SYNC_FAILED.to_string(),
                }),
            )
                .into_response()
        }
    }
}
