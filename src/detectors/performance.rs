//! Performance probe.
//!
//! The probe is an optional capability: when it is not configured, or fails,
//! the audit uses [`PerformanceResult::neutral`] so scoring stays total.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    NEUTRAL_CLS, NEUTRAL_LCP_MS, NEUTRAL_MOBILE_FRIENDLY, NEUTRAL_PERFORMANCE_SCORE,
    PAGESPEED_API_URL, PAGESPEED_TIMEOUT,
};

/// Lighthouse-style performance measurements for the mobile homepage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceResult {
    /// False when the values are neutral defaults
    pub measured: bool,
    /// 0..=100
    pub performance_score: u8,
    pub accessibility_score: Option<u8>,
    pub best_practices_score: Option<u8>,
    pub seo_score: Option<u8>,
    pub is_mobile_friendly: bool,
    pub lcp_ms: u32,
    pub cls: f64,
    /// Total Blocking Time in ms
    pub tbt_ms: u32,
}

impl PerformanceResult {
    /// Values used when no measurement is available.
    pub fn neutral() -> Self {
        Self {
            measured: false,
            performance_score: NEUTRAL_PERFORMANCE_SCORE,
            accessibility_score: None,
            best_practices_score: None,
            seo_score: None,
            is_mobile_friendly: NEUTRAL_MOBILE_FRIENDLY,
            lcp_ms: NEUTRAL_LCP_MS,
            cls: NEUTRAL_CLS,
            tbt_ms: 0,
        }
    }
}

impl Default for PerformanceResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// External performance measurement service.
#[async_trait]
pub trait PerformanceProbe: Send + Sync {
    /// Measures a page. Errors are logged by the caller and replaced by neutral values.
    async fn analyze(&self, url: &str) -> Result<PerformanceResult>;
}

/// Google PageSpeed Insights v5 client (mobile strategy).
pub struct PageSpeedProbe {
    client: Arc<reqwest::Client>,
    api_key: String,
    endpoint: String,
}

impl PageSpeedProbe {
    pub fn new(client: Arc<reqwest::Client>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: PAGESPEED_API_URL.to_string(),
        }
    }

    /// Points the probe at a different endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn category_score(lighthouse: &Value, category: &str) -> Option<u8> {
    lighthouse
        .pointer(&format!("/categories/{category}/score"))
        .and_then(Value::as_f64)
        .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as u8)
}

fn audit_numeric(lighthouse: &Value, audit: &str) -> Option<f64> {
    lighthouse
        .pointer(&format!("/audits/{audit}/numericValue"))
        .and_then(Value::as_f64)
}

/// Converts a PageSpeed v5 response into a [`PerformanceResult`].
///
/// Missing metrics fall back to their neutral value individually.
pub(crate) fn parse_pagespeed_response(body: &Value) -> Result<PerformanceResult> {
    let lighthouse = body
        .get("lighthouseResult")
        .context("PageSpeed response has no lighthouseResult")?;
    let performance_score =
        category_score(lighthouse, "performance").context("PageSpeed response has no performance score")?;

    // Lighthouse marks the viewport audit 1 when the page is mobile-ready
    let is_mobile_friendly = lighthouse
        .pointer("/audits/viewport/score")
        .and_then(Value::as_f64)
        .map(|s| s >= 1.0)
        .unwrap_or(NEUTRAL_MOBILE_FRIENDLY);

    Ok(PerformanceResult {
        measured: true,
        performance_score,
        accessibility_score: category_score(lighthouse, "accessibility"),
        best_practices_score: category_score(lighthouse, "best-practices"),
        seo_score: category_score(lighthouse, "seo"),
        is_mobile_friendly,
        lcp_ms: audit_numeric(lighthouse, "largest-contentful-paint")
            .map(|v| v.round() as u32)
            .unwrap_or(NEUTRAL_LCP_MS),
        cls: audit_numeric(lighthouse, "cumulative-layout-shift").unwrap_or(NEUTRAL_CLS),
        tbt_ms: audit_numeric(lighthouse, "total-blocking-time")
            .map(|v| v.round() as u32)
            .unwrap_or(0),
    })
}

#[async_trait]
impl PerformanceProbe for PageSpeedProbe {
    async fn analyze(&self, url: &str) -> Result<PerformanceResult> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", "mobile"),
                ("category", "performance"),
                ("category", "accessibility"),
                ("category", "best-practices"),
                ("category", "seo"),
            ])
            .timeout(PAGESPEED_TIMEOUT)
            .send()
            .await
            .context("PageSpeed request failed")?
            .error_for_status()
            .context("PageSpeed returned an error status")?;

        let body: Value = response
            .json()
            .await
            .context("PageSpeed response is not valid JSON")?;
        parse_pagespeed_response(&body)
    }
}
