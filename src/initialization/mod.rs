//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - HTTP client (browser-like headers, timeouts)
//! - Logger
//! - Concurrency semaphore for batch runs
//! - The audit engine with its optional enrichment capabilities

mod client;
mod logger;

use std::sync::Arc;

use log::info;
use tokio::sync::Semaphore;

use crate::ads::{AdsSearchLookup, SerpApiLookup};
use crate::audit::AuditEngine;
use crate::config::Config;
use crate::detectors::{PageSpeedProbe, PerformanceProbe};
use crate::error_handling::ProcessingStats;
use crate::fetch::PageFetcher;
use crate::storage::LeadStore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes a semaphore for controlling concurrency.
///
/// # Arguments
///
/// * `count` - Maximum number of concurrent audits allowed
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}

/// Builds the audit engine from configuration.
///
/// The performance probe and the paid-search lookup are only attached when
/// their API key is present (and, for the lookup, not explicitly skipped),
/// so the engine's capability flags mirror the configuration exactly.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn init_engine(
    config: &Config,
    store: Arc<dyn LeadStore>,
) -> Result<AuditEngine, crate::error_handling::InitializationError> {
    let client = init_client(config)?;
    let fetcher = PageFetcher::new(Arc::clone(&client), config.page_timeout_secs());

    let performance: Option<Arc<dyn PerformanceProbe>> =
        config.pagespeed_api_key.as_ref().map(|key| {
            info!("PageSpeed probe enabled");
            Arc::new(PageSpeedProbe::new(Arc::clone(&client), key.clone())) as Arc<dyn PerformanceProbe>
        });

    let ads_lookup: Option<Arc<dyn AdsSearchLookup>> = match &config.serpapi_api_key {
        Some(_) if config.skip_search_lookup => {
            info!("Paid search lookup configured but skipped (--skip-search-lookup)");
            None
        }
        Some(key) => {
            info!("Paid search lookup enabled");
            Some(Arc::new(SerpApiLookup::new(Arc::clone(&client), key.clone())))
        }
        None => None,
    };

    Ok(AuditEngine::new(
        fetcher,
        store,
        performance,
        ads_lookup,
        Arc::new(ProcessingStats::new()),
    ))
}
