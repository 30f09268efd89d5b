//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::ClientBuilder;

use crate::config::{Config, TCP_CONNECT_TIMEOUT_SECS};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client shared by every audit.
///
/// Creates a `reqwest::Client` configured with:
/// - Browser-like User-Agent and `Accept` headers
/// - `Accept-Language` biased to Italian
/// - Homepage timeout from config (individual calls may set a shorter one)
/// - TCP connect timeout so dead hosts fail fast
/// - Redirect following (up to 10 hops)
///
/// # Arguments
///
/// * `config` - Library configuration with user-agent, language and timeout settings
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    let client = ClientBuilder::new()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.page_timeout_secs()))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(Arc::new(client))
}
