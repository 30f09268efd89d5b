//! Progress reporting for the audit pipeline.
//!
//! The pipeline is written once and parameterized by a [`ProgressSink`]:
//! the synchronous entry point discards events, the streamed one forwards them
//! to a channel and the batch runner keeps them per lead.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter};
use tokio::sync::mpsc;

/// Pipeline stage reported in progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Fetch,
    Seo,
    Tracking,
    Social,
    Trust,
    Email,
    Tech,
    Pagespeed,
    Score,
    Save,
    Complete,
    Error,
}

/// One progress event: a stage, a human-readable status and stage details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl ProgressEvent {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Receiver of pipeline progress.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent);

    /// True once the consumer went away; the pipeline stops at the next stage boundary.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Discards every event.
pub struct NoopSink;

#[async_trait]
impl ProgressSink for NoopSink {
    async fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events to a channel, e.g. an SSE response.
///
/// Dropping the receiver cancels the audit.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn emit(&self, event: ProgressEvent) {
        if self.tx.send(event).await.is_err() {
            log::debug!("Progress receiver dropped");
        }
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Keeps every event of one lead for the batch report.
#[derive(Default)]
pub struct BatchCollector {
    events: Mutex<Vec<ProgressEvent>>,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last stage reached, if any event was emitted.
    pub fn last_stage(&self) -> Option<Stage> {
        self.events
            .lock()
            .ok()
            .and_then(|events| events.last().map(|e| e.stage))
    }

    pub fn into_events(self) -> Vec<ProgressEvent> {
        self.events.into_inner().unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for BatchCollector {
    async fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        sink.emit(ProgressEvent::new(Stage::Fetch, "Scaricamento homepage"))
            .await;
        assert_eq!(rx.recv().await.map(|e| e.stage), Some(Stage::Fetch));
        assert!(!sink.is_closed());

        drop(rx);
        assert!(sink.is_closed());
        // sending after close must not panic
        sink.emit(ProgressEvent::new(Stage::Seo, "SEO")).await;
    }

    #[tokio::test]
    async fn test_batch_collector_keeps_order() {
        let sink = BatchCollector::new();
        sink.emit(ProgressEvent::new(Stage::Fetch, "a")).await;
        sink.emit(ProgressEvent::new(Stage::Score, "b")).await;
        assert_eq!(sink.last_stage(), Some(Stage::Score));
        let stages: Vec<Stage> = sink.into_events().into_iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![Stage::Fetch, Stage::Score]);
    }

    #[test]
    fn test_event_serialization_omits_empty_data() {
        let event = ProgressEvent::new(Stage::Pagespeed, "ok");
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(json["stage"], "pagespeed");
        assert!(json.get("data").is_none());

        let event = event.with_data(serde_json::json!({"score": 42}));
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(json["data"]["score"], 42);
    }
}
