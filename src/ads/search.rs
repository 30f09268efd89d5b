//! Paid-search lookup.
//!
//! The lookup is an optional capability. A missing lookup, an error or a
//! timeout all degrade to landing-page-only evidence.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::ads::SearchPresence;
use crate::config::{ADS_LOOKUP_TIMEOUT, SERPAPI_URL};

/// External paid-search results provider.
#[async_trait]
pub trait AdsSearchLookup: Send + Sync {
    /// Returns true when a paid result for `brand` links to `domain`.
    async fn has_paid_presence(&self, domain: &str, brand: &str) -> Result<bool>;
}

/// SerpApi Google search (Italian locale), reading the `ads` block.
pub struct SerpApiLookup {
    client: Arc<reqwest::Client>,
    api_key: String,
    endpoint: String,
}

impl SerpApiLookup {
    pub fn new(client: Arc<reqwest::Client>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: SERPAPI_URL.to_string(),
        }
    }

    /// Points the lookup at a different endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Host of an ad link, lowercased and without a leading `www.`.
///
/// `displayed_link` values carry no scheme and may append a breadcrumb
/// after a space, so only the first token is parsed, with a scheme added.
fn ad_host(link: &str) -> Option<String> {
    let link = link.split_whitespace().next()?;
    let parsed = if link.contains("://") {
        url::Url::parse(link)
    } else {
        url::Url::parse(&format!("https://{link}"))
    };
    let host = parsed.ok()?.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// True when any entry of the `ads` array links to `domain` or one of its
/// subdomains.
pub(crate) fn ads_mention_domain(body: &Value, domain: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    let domain = domain.strip_prefix("www.").unwrap_or(&domain);
    if domain.is_empty() {
        return false;
    }
    let subdomain_suffix = format!(".{domain}");
    body.get("ads")
        .and_then(Value::as_array)
        .map(|ads| {
            ads.iter().any(|ad| {
                ["link", "displayed_link"]
                    .iter()
                    .filter_map(|k| ad.get(*k).and_then(Value::as_str))
                    .filter_map(ad_host)
                    .any(|host| host == domain || host.ends_with(&subdomain_suffix))
            })
        })
        .unwrap_or(false)
}

#[async_trait]
impl AdsSearchLookup for SerpApiLookup {
    async fn has_paid_presence(&self, domain: &str, brand: &str) -> Result<bool> {
        let query = if brand.trim().is_empty() { domain } else { brand };
        let body: Value = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("gl", "it"),
                ("hl", "it"),
                ("api_key", self.api_key.as_str()),
            ])
            .timeout(ADS_LOOKUP_TIMEOUT)
            .send()
            .await
            .context("SerpApi request failed")?
            .error_for_status()
            .context("SerpApi returned an error status")?
            .json()
            .await
            .context("SerpApi response is not valid JSON")?;

        if let Some(err) = body.get("error").and_then(Value::as_str) {
            anyhow::bail!("SerpApi error: {err}");
        }
        Ok(ads_mention_domain(&body, domain))
    }
}

/// Runs the lookup when configured, bounded by `ADS_LOOKUP_TIMEOUT`.
///
/// Never fails: errors and timeouts are logged and reported as `Failed`.
pub async fn lookup_search_presence(
    lookup: Option<&Arc<dyn AdsSearchLookup>>,
    domain: &str,
    brand: &str,
) -> SearchPresence {
    let Some(lookup) = lookup else {
        return SearchPresence::Skipped;
    };
    match tokio::time::timeout(ADS_LOOKUP_TIMEOUT, lookup.has_paid_presence(domain, brand)).await {
        Ok(Ok(true)) => SearchPresence::Confirmed,
        Ok(Ok(false)) => SearchPresence::NotFound,
        Ok(Err(e)) => {
            log::warn!("Paid-search lookup failed for {domain}: {e:#}");
            SearchPresence::Failed
        }
        Err(_) => {
            log::warn!("Paid-search lookup timed out for {domain}");
            SearchPresence::Failed
        }
    }
}
