//! Technology stack fingerprinting.
//!
//! Signatures are checked in order and the first CMS match wins. Version
//! hints come from the `generator` meta tag, WordPress asset query strings
//! and the `X-Powered-By` header.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::utils::{compile_regex_unsafe, parse_selector_unsafe};

/// Ordered CMS signatures matched against lowercased markup.
const CMS_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("WordPress", &["/wp-content/", "/wp-includes/", "wp-json"]),
    ("Shopify", &["cdn.shopify.com", "shopify.theme"]),
    ("Wix", &["static.wixstatic.com", "wix-bolt", "x-wix-"]),
    ("Squarespace", &["static1.squarespace.com", "squarespace-cdn"]),
    ("Webflow", &["data-wf-site", "webflow.js", "assets.website-files.com"]),
    ("Joomla", &["/media/jui/", "/components/com_", "joomla!"]),
    ("Drupal", &["drupal.settings", "/sites/default/files/", "data-drupal-"]),
    ("PrestaShop", &["prestashop", "/modules/ps_"]),
    ("Magento", &["mage/cookies", "mage-cache", "/static/version"]),
    ("Jimdo", &["jimdo"]),
];

/// JS frameworks; more than one can match.
const JS_FRAMEWORK_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("Next.js", &["__next_data__", "/_next/static/"]),
    ("Nuxt", &["__nuxt__", "/_nuxt/"]),
    ("Gatsby", &["___gatsby"]),
    ("React", &["data-reactroot", "react-dom"]),
    ("Vue", &["data-v-app", "vue.min.js", "vue.js", "vue.global"]),
    ("Angular", &["ng-version", "ng-app"]),
    ("Svelte", &["svelte-"]),
    ("jQuery", &["jquery.min.js", "jquery.js", "/jquery/"]),
];

static GENERATOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("meta[name='generator']", "GENERATOR_SELECTOR"));
static GENERATOR_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)^(wordpress|joomla!?|drupal|prestashop|wix\.com|squarespace|webflow|shopify)\D*(\d+(?:\.\d+)*)?",
        "GENERATOR_VERSION_PATTERN",
    )
});
static WP_ASSET_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"wp-includes/[^'\x22?]+\?ver=(\d+\.\d+(?:\.\d+)?)",
        "WP_ASSET_VERSION_PATTERN",
    )
});
static PHP_VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"(?i)\bPHP/(\d+\.\d+(?:\.\d+)?)", "PHP_VERSION_PATTERN"));

/// Technology findings for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TechStackResult {
    pub cms: Option<String>,
    pub cms_version: Option<String>,
    pub js_frameworks: Vec<String>,
    pub php_version: Option<String>,
    pub is_outdated: bool,
    /// Human readable reasons, e.g. "PHP 7.4"
    pub outdated_reasons: Vec<String>,
}

fn major_version(version: &str) -> Option<u32> {
    version.split('.').next().and_then(|m| m.parse().ok())
}

fn normalize_cms_name(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    CMS_FINGERPRINTS
        .iter()
        .map(|(name, _)| *name)
        .find(|name| lower.starts_with(&name.to_lowercase()))
        .or(if lower.starts_with("wix") { Some("Wix") } else { None })
}

/// Fingerprints CMS, JS frameworks and server-side versions.
///
/// A site is outdated when PHP is older than 8 or WordPress older than 6.
///
/// # Arguments
///
/// * `document` - The parsed HTML document
/// * `html` - The raw markup
/// * `powered_by` - `X-Powered-By` header value, if the server sent one
pub fn analyze_tech(document: &Html, html: &str, powered_by: Option<&str>) -> TechStackResult {
    let lower = html.to_lowercase();

    let generator = document
        .select(&GENERATOR_SELECTOR)
        .filter_map(|e| e.value().attr("content"))
        .find_map(|content| GENERATOR_VERSION_PATTERN.captures(content.trim()));

    let generator_cms = generator
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| normalize_cms_name(m.as_str()));
    let cms = generator_cms.or_else(|| crate::detectors::first_fingerprint(&lower, CMS_FINGERPRINTS));

    let mut cms_version = generator
        .as_ref()
        .filter(|_| generator_cms.is_some() && generator_cms == cms)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string());
    if cms_version.is_none() && cms == Some("WordPress") {
        cms_version = WP_ASSET_VERSION_PATTERN
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
    }

    let js_frameworks: Vec<String> = JS_FRAMEWORK_FINGERPRINTS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|m| lower.contains(m)))
        .map(|(name, _)| name.to_string())
        .collect();

    let php_version = powered_by
        .and_then(|h| PHP_VERSION_PATTERN.captures(h))
        .or_else(|| PHP_VERSION_PATTERN.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let mut outdated_reasons = Vec::new();
    if let Some(php) = php_version.as_deref() {
        if major_version(php).is_some_and(|m| m < 8) {
            outdated_reasons.push(format!("PHP {php}"));
        }
    }
    if cms == Some("WordPress") {
        if let Some(v) = cms_version.as_deref() {
            if major_version(v).is_some_and(|m| m < 6) {
                outdated_reasons.push(format!("WordPress {v}"));
            }
        }
    }

    log::debug!(
        "Tech: cms={:?} version={:?} php={:?} frameworks={:?}",
        cms,
        cms_version,
        php_version,
        js_frameworks
    );

    TechStackResult {
        cms: cms.map(str::to_string),
        cms_version,
        js_frameworks,
        php_version,
        is_outdated: !outdated_reasons.is_empty(),
        outdated_reasons,
    }
}
