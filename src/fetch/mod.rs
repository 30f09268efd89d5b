//! Page fetching.
//!
//! Retrieves raw markup with a bounded timeout. Failures are returned as a
//! typed [`FetchError`] and never raised into the detectors: the orchestrator
//! decides whether a failure ends the audit, optional enrichments degrade to
//! "unknown".

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::StatusCode;

use crate::app::validate_and_normalize_url;
use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::FetchError;
use crate::models::Check;

/// Markup retrieved for a URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested (normalized)
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    /// `X-Powered-By` response header, used as a server-stack hint
    pub powered_by: Option<String>,
    pub html: String,
}

/// Thin wrapper around the shared HTTP client with audit-specific timeouts.
#[derive(Clone)]
pub struct PageFetcher {
    client: Arc<reqwest::Client>,
    timeout_secs: u64,
}

impl PageFetcher {
    /// Creates a fetcher whose homepage requests time out after `timeout_secs`.
    pub fn new(client: Arc<reqwest::Client>, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    /// The underlying client, shared with the external probes.
    pub fn client(&self) -> &Arc<reqwest::Client> {
        &self.client
    }

    /// Fetches a page with the homepage timeout.
    ///
    /// A URL without a scheme gets `https://` prepended.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` for invalid URLs, timeouts, connection failures,
    /// non-2xx statuses and unreadable bodies.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetch_with_timeout(url, Duration::from_secs(self.timeout_secs))
            .await
    }

    /// Fetches a page with an explicit timeout (used for the blog page).
    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<FetchedPage, FetchError> {
        let normalized =
            validate_and_normalize_url(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        let timeout_secs = timeout.as_secs().max(1);

        debug!("Fetching {normalized} (timeout {timeout_secs}s)");
        let mut response = self
            .client
            .get(&normalized)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e, timeout_secs))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let powered_by = response
            .headers()
            .get("x-powered-by")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !status.is_success() {
            debug!("Non-success status {} for {normalized}", status.as_u16());
            return Err(FetchError::Status(status.as_u16()));
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(&e, timeout_secs))?
        {
            let remaining = MAX_RESPONSE_BODY_SIZE.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                debug!("Body of {normalized} truncated at {MAX_RESPONSE_BODY_SIZE} bytes");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            url: normalized,
            final_url,
            status: status.as_u16(),
            powered_by,
            html: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    /// Checks whether a resource exists with a `HEAD` request.
    ///
    /// Servers that refuse `HEAD` (405/501) get a `GET` with the same timeout.
    /// Returns `Present` on 2xx, `Absent` on other 4xx, and `Unknown` on
    /// timeouts, connection errors and 5xx responses.
    pub async fn resource_exists(&self, url: &str, timeout: Duration) -> Check {
        let head = self.client.head(url).timeout(timeout).send().await;
        let status = match head {
            Ok(resp)
                if resp.status() == StatusCode::METHOD_NOT_ALLOWED
                    || resp.status() == StatusCode::NOT_IMPLEMENTED =>
            {
                match self.client.get(url).timeout(timeout).send().await {
                    Ok(resp) => resp.status(),
                    Err(e) => {
                        debug!("GET fallback for {url} failed: {e}");
                        return Check::Unknown;
                    }
                }
            }
            Ok(resp) => resp.status(),
            Err(e) => {
                debug!("HEAD {url} failed: {e}");
                return Check::Unknown;
            }
        };

        if status.is_success() {
            Check::Present
        } else if status.is_client_error() {
            Check::Absent
        } else {
            Check::Unknown
        }
    }
}
