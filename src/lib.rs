//! lead_audit library: website audit and commercial qualification of leads
//!
//! Given a lead's website, the engine fetches the homepage, runs a suite of
//! heuristic detectors over the markup, turns their output into a 0-100
//! opportunity score, assigns exactly one commercial tag and writes sales
//! talking points plus a three-block outreach script.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lead_audit::initialization::init_engine;
//! use lead_audit::storage::SqliteLeadStore;
//! use lead_audit::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let store = SqliteLeadStore::open(&config.db_path).await?;
//! let engine = init_engine(&config, Arc::new(store))?;
//!
//! let outcome = engine.audit_lead(42).await?;
//! println!("{:?} -> {:?}", outcome.status, outcome.commercial_tag);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod ads;
mod app;
pub mod audit;
pub mod classify;
pub mod config;
pub mod detectors;
mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod scoring;
pub mod server;
pub mod storage;
pub mod talking_points;
mod utils;

// Re-export public API
pub use app::{
    cancel_on_ctrl_c, is_non_business_website, print_batch_statistics, print_error_statistics,
    validate_and_normalize_url,
};
pub use audit::{AuditEngine, BatchReport, ProgressEvent, ProgressSink, Stage};
pub use config::{Command, Config, LogFormat, LogLevel, Opt};
pub use error_handling::{
    AuditError, DatabaseError, ErrorType, FetchError, InfoType, InitializationError,
    ProcessingStats, WarningType,
};
pub use models::{AuditOutcome, AuditStatus, CommercialTag};
