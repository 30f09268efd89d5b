//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the application,
//! including timeouts, size limits, neutral fallbacks and the website denylist.

use std::time::Duration;

// Network operation timeouts
/// Default homepage fetch timeout in seconds
/// Slow shared hosting often needs more than 10s before the first byte
pub const PAGE_FETCH_TIMEOUT_SECS: u64 = 15;
/// Upper bound accepted for a configured homepage timeout
pub const MAX_PAGE_FETCH_TIMEOUT_SECS: u64 = 20;
/// HEAD check for `/sitemap.xml` and `/robots.txt`
pub const SITE_FILE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
/// Secondary fetch of the blog page
pub const BLOG_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// External performance probe (PageSpeed runs a full Lighthouse pass)
pub const PAGESPEED_TIMEOUT: Duration = Duration::from_secs(60);
/// External paid-search lookup
pub const ADS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default User-Agent string for HTTP requests.
///
/// Many small business sites sit behind WAF rules that drop obvious bot agents,
/// so the auditor presents itself as a desktop Chrome.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default `Accept-Language`, biased to Italian so localized sites serve their Italian homepage
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7";

// Response and body size limits
/// Maximum response body size in bytes (3MB)
/// Responses larger than this are truncated to prevent memory exhaustion
pub const MAX_RESPONSE_BODY_SIZE: usize = 3 * 1024 * 1024;

/// Maximum error message length stored in the `issues` list
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 300;

// Concurrency
/// Maximum simultaneous audits for the queued/batch entry point
pub const DEFAULT_BATCH_CONCURRENCY: usize = 10;
/// Delay between audits for the sequential entry point
pub const DEFAULT_INTER_AUDIT_DELAY_MS: u64 = 2000;

// Performance probe neutral defaults (used whenever the probe did not run)
pub const NEUTRAL_PERFORMANCE_SCORE: u8 = 50;
pub const NEUTRAL_MOBILE_FRIENDLY: bool = true;
pub const NEUTRAL_LCP_MS: u32 = 2500;
pub const NEUTRAL_CLS: f64 = 0.1;

// Scoring
/// Opportunity score assigned when the homepage could not be fetched at all
pub const FETCH_FAILURE_SCORE: u8 = 40;
/// Hard ceiling of the opportunity score
pub const MAX_OPPORTUNITY_SCORE: u8 = 100;

/// Version written into every persisted `AuditData` snapshot
pub const AUDIT_DATA_SCHEMA_VERSION: u32 = 2;

/// Hosts that are not a business website.
///
/// Matched against the host and every parent domain, so `m.facebook.com`
/// and `wa.me` links short-circuit to `NO_WEBSITE` before any fetch.
pub const NON_BUSINESS_DOMAINS: &[&str] = &[
    "facebook.com",
    "fb.com",
    "fb.me",
    "instagram.com",
    "linkedin.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "youtube.com",
    "youtu.be",
    "whatsapp.com",
    "wa.me",
    "t.me",
    "telegram.org",
    "telegram.me",
    "example.com",
];

// PageSpeed Insights endpoint
pub const PAGESPEED_API_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
// SerpApi endpoint for paid search results
pub const SERPAPI_URL: &str = "https://serpapi.com/search.json";
