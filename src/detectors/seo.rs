//! SEO detector.
//!
//! Extracts on-page SEO basics from the parsed homepage and checks for
//! `/sitemap.xml` and `/robots.txt` with bounded `HEAD` requests.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::config::SITE_FILE_CHECK_TIMEOUT;
use crate::detectors::element_text;
use crate::fetch::PageFetcher;
use crate::models::Check;
use crate::utils::parse_selector_unsafe;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("title", "TITLE_SELECTOR"));
static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe("meta[name='description']", "META_DESCRIPTION_SELECTOR")
});
static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("h1", "H1_SELECTOR"));
static CANONICAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("link[rel='canonical'][href]", "CANONICAL_SELECTOR"));
static OPEN_GRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("meta[property^='og:']", "OPEN_GRAPH_SELECTOR"));
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("img", "IMG_SELECTOR"));
static SCHEMA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(
        "script[type='application/ld+json'], [itemtype*='schema.org']",
        "SCHEMA_SELECTOR",
    )
});
static VIEWPORT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("meta[name='viewport']", "VIEWPORT_SELECTOR"));

/// Core Web Vitals as reported by the performance probe (or neutral defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreWebVitals {
    pub lcp_ms: u32,
    /// Total Blocking Time, used as a lab proxy for FID
    pub fid_ms: u32,
    pub cls: f64,
    /// False when the values are neutral defaults
    pub measured: bool,
}

impl Default for CoreWebVitals {
    fn default() -> Self {
        Self {
            lcp_ms: crate::config::NEUTRAL_LCP_MS,
            fid_ms: 0,
            cls: crate::config::NEUTRAL_CLS,
            measured: false,
        }
    }
}

/// SEO findings for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeoResult {
    pub has_meta_title: bool,
    pub meta_title: Option<String>,
    pub meta_title_length: usize,
    pub has_meta_description: bool,
    pub meta_description: Option<String>,
    pub meta_description_length: usize,
    pub h1_count: usize,
    pub h1_text: Option<String>,
    pub has_canonical: bool,
    pub has_open_graph: bool,
    pub has_schema_markup: bool,
    pub has_viewport: bool,
    pub images_total: usize,
    pub images_with_alt: usize,
    /// Share of images with a non-empty `alt` (1.0 when the page has no images)
    pub alt_coverage: f64,
    pub has_sitemap: Check,
    pub has_robots_txt: Check,
    pub core_web_vitals: CoreWebVitals,
}

impl SeoResult {
    /// Title shorter than 30 or longer than 65 characters.
    pub fn title_length_poor(&self) -> bool {
        self.has_meta_title && !(30..=65).contains(&self.meta_title_length)
    }

    /// Description shorter than 70 or longer than 160 characters.
    pub fn description_length_poor(&self) -> bool {
        self.has_meta_description && !(70..=160).contains(&self.meta_description_length)
    }
}

/// Extracts on-page SEO signals from an HTML document.
///
/// Sitemap, robots and Core Web Vitals are left at their unknown defaults;
/// they are filled in by [`check_site_files`] and the performance probe.
///
/// # Arguments
///
/// * `document` - The parsed HTML document
pub fn analyze_seo(document: &Html) -> SeoResult {
    let meta_title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty());

    let meta_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .find_map(|e| e.value().attr("content"))
        .map(crate::utils::collapse_whitespace)
        .filter(|d| !d.is_empty());

    let h1s: Vec<String> = document
        .select(&H1_SELECTOR)
        .map(|e| element_text(&e))
        .collect();
    let h1_text = h1s.iter().find(|t| !t.is_empty()).cloned();

    let mut images_total = 0usize;
    let mut images_with_alt = 0usize;
    for img in document.select(&IMG_SELECTOR) {
        images_total += 1;
        if img
            .value()
            .attr("alt")
            .map(|alt| !alt.trim().is_empty())
            .unwrap_or(false)
        {
            images_with_alt += 1;
        }
    }
    let alt_coverage = if images_total == 0 {
        1.0
    } else {
        images_with_alt as f64 / images_total as f64
    };

    log::debug!(
        "SEO: title={:?}, h1_count={}, images={}/{}",
        meta_title,
        h1s.len(),
        images_with_alt,
        images_total
    );

    SeoResult {
        has_meta_title: meta_title.is_some(),
        meta_title_length: meta_title.as_deref().map(|t| t.chars().count()).unwrap_or(0),
        meta_title,
        has_meta_description: meta_description.is_some(),
        meta_description_length: meta_description
            .as_deref()
            .map(|d| d.chars().count())
            .unwrap_or(0),
        meta_description,
        h1_count: h1s.len(),
        h1_text,
        has_canonical: document.select(&CANONICAL_SELECTOR).next().is_some(),
        has_open_graph: document.select(&OPEN_GRAPH_SELECTOR).next().is_some(),
        has_schema_markup: document.select(&SCHEMA_SELECTOR).next().is_some(),
        has_viewport: document.select(&VIEWPORT_SELECTOR).next().is_some(),
        images_total,
        images_with_alt,
        alt_coverage,
        has_sitemap: Check::Unknown,
        has_robots_txt: Check::Unknown,
        core_web_vitals: CoreWebVitals::default(),
    }
}

/// Checks `/sitemap.xml` and `/robots.txt` concurrently.
///
/// Each request is bounded by `SITE_FILE_CHECK_TIMEOUT`; any failure yields
/// `Check::Unknown` for that file only.
///
/// # Returns
///
/// `(sitemap, robots)`
pub async fn check_site_files(fetcher: &PageFetcher, page_url: &str) -> (Check, Check) {
    let Ok(base) = Url::parse(page_url) else {
        return (Check::Unknown, Check::Unknown);
    };
    let (Ok(sitemap_url), Ok(robots_url)) = (base.join("/sitemap.xml"), base.join("/robots.txt"))
    else {
        return (Check::Unknown, Check::Unknown);
    };

    tokio::join!(
        fetcher.resource_exists(sitemap_url.as_str(), SITE_FILE_CHECK_TIMEOUT),
        fetcher.resource_exists(robots_url.as_str(), SITE_FILE_CHECK_TIMEOUT),
    )
}
