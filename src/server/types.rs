//! Server state and wire types.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::audit::AuditEngine;
use crate::error_handling::AuditError;

/// Shared state for the trigger endpoints
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AuditEngine>,
    /// Concurrency ceiling for batches triggered over HTTP
    pub max_concurrency: usize,
}

/// Body of `POST /audits/batch`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BatchRequest {
    pub lead_ids: Vec<i64>,
    pub search_id: Option<i64>,
}

/// Response of `POST /audits/batch`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAccepted {
    pub queued: usize,
    pub lead_ids: Vec<i64>,
}

/// JSON response for `/health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub performance_probe: bool,
    pub ads_lookup: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps pipeline errors onto HTTP statuses.
pub struct ApiError(pub AuditError);

impl From<AuditError> for ApiError {
    fn from(e: AuditError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuditError::LeadNotFound(_) => StatusCode::NOT_FOUND,
            // 499: client closed request
            AuditError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AuditError::Database(_) | AuditError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
