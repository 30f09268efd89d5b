//! Trigger endpoint handlers.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::Stream;
use futures::StreamExt;
use log::{info, warn};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::types::{ApiError, AppState, BatchAccepted, BatchRequest, HealthResponse};
use crate::app::print_batch_statistics;
use crate::audit::{ChannelSink, ProgressEvent};
use crate::error_handling::AuditError;
use crate::models::AuditOutcome;

/// Buffered progress events per stream; a full buffer applies backpressure to the audit.
const SSE_CHANNEL_CAPACITY: usize = 32;

/// `POST /leads/{id}/audit` - runs the audit and returns the classification
pub async fn audit_handler(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<Json<AuditOutcome>, ApiError> {
    let outcome = state.engine.audit_lead(lead_id).await?;
    Ok(Json(outcome))
}

fn to_sse(event: ProgressEvent) -> Result<Event, Infallible> {
    let stage = event.stage.as_ref();
    match Event::default().event(stage).json_data(&event) {
        Ok(sse) => Ok(sse),
        Err(_) => Ok(Event::default().event(stage).data(event.message.as_str())),
    }
}

/// `GET /leads/{id}/audit/stream` - one SSE event per pipeline stage
///
/// Closing the connection drops the receiver, which cancels the audit at
/// the next stage boundary.
pub async fn stream_handler(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);
    let engine = state.engine.clone();
    tokio::spawn(async move {
        let sink = ChannelSink::new(tx);
        match engine.stream_audit(lead_id, &sink).await {
            Ok(outcome) => info!("Lead {lead_id}: streamed audit finished ({})", outcome.status),
            Err(AuditError::Cancelled) => info!("Lead {lead_id}: streamed audit cancelled"),
            Err(e) => warn!("Lead {lead_id}: streamed audit failed: {e}"),
        }
    });

    Sse::new(ReceiverStream::new(rx).map(to_sse)).keep_alive(KeepAlive::default())
}

/// `POST /audits/batch` - queues a batch and returns immediately
pub async fn batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = state
        .engine
        .resolve_batch(request.lead_ids, request.search_id)
        .await?;
    let accepted = BatchAccepted {
        queued: ids.len(),
        lead_ids: ids.clone(),
    };

    let engine = state.engine.clone();
    let max_concurrency = state.max_concurrency;
    tokio::spawn(async move {
        let report = engine.run_batch(ids, max_concurrency).await;
        print_batch_statistics(&report, engine.stats());
    });

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        performance_probe: state.engine.has_performance_probe(),
        ads_lookup: state.engine.has_ads_lookup(),
    })
}
