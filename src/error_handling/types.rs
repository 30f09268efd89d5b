//! Error type definitions.
//!
//! This module defines all error, warning, and info types used throughout the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Typed failure of a page fetch.
///
/// Returned instead of raised: the orchestrator turns it into a partial audit,
/// optional enrichments turn it into "unknown".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("timeout after {0}s")]
    Timeout(u64),

    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// DNS, TCP or TLS failure before a response was received.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The body could not be read or decoded.
    #[error("body read failed: {0}")]
    Body(String),

    /// The URL could not be parsed after normalization.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Maps a reqwest error onto the fetch taxonomy.
    pub fn from_reqwest(error: &ReqwestError, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(timeout_secs)
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else if error.is_connect() || error.is_request() {
            FetchError::Connect(error.to_string())
        } else if error.is_builder() {
            FetchError::InvalidUrl(error.to_string())
        } else {
            FetchError::Body(error.to_string())
        }
    }

    /// Counter bucket for this failure.
    pub fn error_type(&self) -> ErrorType {
        match self {
            FetchError::Timeout(_) => ErrorType::PageFetchTimeout,
            FetchError::Status(403) => ErrorType::PageFetchBotDetection,
            FetchError::Status(_) => ErrorType::PageFetchStatus,
            FetchError::Connect(_) => ErrorType::PageFetchConnect,
            FetchError::Body(_) => ErrorType::PageFetchBody,
            FetchError::InvalidUrl(_) => ErrorType::InvalidUrl,
        }
    }
}

/// Error returned by the audit pipeline.
#[derive(Error, Debug)]
pub enum AuditError {
    /// No lead exists with this id.
    #[error("lead {0} not found")]
    LeadNotFound(i64),

    /// Reading or writing the lead failed.
    #[error("persistence failure: {0}")]
    Database(#[from] DatabaseError),

    /// The progress consumer went away before the audit finished.
    #[error("audit cancelled by the client")]
    Cancelled,

    /// Any other unrecoverable failure.
    #[error("audit failed: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Types of errors that can occur while auditing a lead.
///
/// This enum categorizes actual error conditions - failures that prevent a
/// signal from being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Homepage fetch
    PageFetchTimeout,
    PageFetchStatus,
    PageFetchBotDetection, // 403 Forbidden - typically a WAF
    PageFetchConnect,
    PageFetchBody,
    InvalidUrl,
    // Optional enrichment
    SiteFileCheckError,
    BlogFetchError,
    PerformanceProbeError,
    AdsLookupError,
    // Persistence
    PersistenceError,
}

/// Types of warnings that can occur while auditing a lead.
///
/// Warnings indicate missing page elements that don't prevent an audit but
/// are worth tracking across a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
#[allow(clippy::enum_variant_names)] // All variants start with "Missing"
pub enum WarningType {
    MissingTitle,
    MissingMetaDescription,
    MissingH1,
    MissingBlogDate,
}

/// Types of informational metrics recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    NoWebsite,
    PerformanceProbeSkipped,
    AdsLookupSkipped,
    AuditCancelled,
    PartialAudit,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::PageFetchTimeout => "Page fetch timeout",
            ErrorType::PageFetchStatus => "Page fetch non-2xx status",
            ErrorType::PageFetchBotDetection => "Bot detection (403 Forbidden)",
            ErrorType::PageFetchConnect => "Page fetch connect error",
            ErrorType::PageFetchBody => "Page fetch body error",
            ErrorType::InvalidUrl => "Invalid website URL",
            ErrorType::SiteFileCheckError => "Sitemap/robots check error",
            ErrorType::BlogFetchError => "Blog fetch error",
            ErrorType::PerformanceProbeError => "Performance probe error",
            ErrorType::AdsLookupError => "Paid search lookup error",
            ErrorType::PersistenceError => "Persistence error",
        }
    }
}

impl WarningType {
    /// Returns a human-readable string representation of the warning type.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::MissingTitle => "Missing title",
            WarningType::MissingMetaDescription => "Missing meta description",
            WarningType::MissingH1 => "Missing H1",
            WarningType::MissingBlogDate => "Blog found without a parsable date",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::NoWebsite => "No business website",
            InfoType::PerformanceProbeSkipped => "Performance probe not configured",
            InfoType::AdsLookupSkipped => "Paid search lookup skipped",
            InfoType::AuditCancelled => "Audit cancelled",
            InfoType::PartialAudit => "Partial audit (homepage unreachable)",
        }
    }
}
