//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions (initialization, database, fetch, audit)
//! - Processing statistics tracking (errors, warnings, info metrics)
//!
//! Counters are categorized into:
//! - **Errors**: A signal could not be collected
//! - **Warnings**: Missing page elements that don't prevent an audit
//! - **Info**: Informational metrics (skipped probes, partial audits, etc.)

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    AuditError, DatabaseError, ErrorType, FetchError, InfoType, InitializationError, WarningType,
};
