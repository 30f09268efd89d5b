//! Website signal detectors.
//!
//! Each detector extracts one category of signal from a homepage:
//! - SEO (title, description, headings, canonical, Open Graph, alt text, sitemap/robots)
//! - Tracking and ad tags (GA, GTM, Meta Pixel, Google Ads, heatmaps, Consent Mode)
//! - Social profile links
//! - Trust and compliance (cookie banner, privacy, contact form, WhatsApp, live chat)
//! - Content freshness (blog + most recent post date)
//! - Email marketing (newsletter, popup, lead magnet, provider)
//! - Technology stack (CMS, JS frameworks, PHP, outdated versions)
//! - Commercial signals (clear CTA, focused offer)
//! - Performance (optional external PageSpeed probe)
//!
//! Markup detectors are pure: absence of a signal is a valid `false`/`None`,
//! never an error. Parsing happens once in [`analyze_markup`]; the parsed
//! document is not `Send`, so it never lives across an `.await`.

mod commercial;
mod content;
mod email;
mod performance;
mod seo;
mod social;
mod tech;
mod tracking;
mod trust;

use scraper::Html;
use url::Url;

pub use commercial::{analyze_commercial_signals, CommercialSignals};
pub use content::{analyze_blog_freshness, find_blog_link, parse_latest_date, ContentResult};
pub use email::{analyze_email_marketing, EmailMarketingResult};
pub use performance::{PageSpeedProbe, PerformanceProbe, PerformanceResult};
pub use seo::{analyze_seo, check_site_files, CoreWebVitals, SeoResult};
pub use social::{analyze_social, SocialLink, SocialPlatform, SocialResult};
pub use tech::{analyze_tech, TechStackResult};
pub use tracking::{analyze_tracking, TrackingResult};
pub use trust::{analyze_trust, TrustResult};

/// Output of every markup-only detector for one page.
#[derive(Debug, Clone, Default)]
pub struct MarkupFindings {
    pub seo: SeoResult,
    pub tracking: TrackingResult,
    pub social: SocialResult,
    pub trust: TrustResult,
    pub email_marketing: EmailMarketingResult,
    pub tech: TechStackResult,
    pub commercial: CommercialSignals,
    /// Blog-like link found on the page, resolved against the page URL
    pub blog_url: Option<String>,
}

/// Parses the page once and runs all markup detectors over it.
///
/// # Arguments
///
/// * `html` - Raw homepage markup
/// * `page_url` - Final URL of the page (used to resolve relative links)
/// * `powered_by` - `X-Powered-By` response header, when present
pub fn analyze_markup(html: &str, page_url: &str, powered_by: Option<&str>) -> MarkupFindings {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    MarkupFindings {
        seo: analyze_seo(&document),
        tracking: analyze_tracking(html),
        social: analyze_social(&document),
        trust: analyze_trust(&document, html),
        email_marketing: analyze_email_marketing(&document, html),
        tech: analyze_tech(&document, html, powered_by),
        commercial: analyze_commercial_signals(&document),
        blog_url: base.as_ref().and_then(|b| find_blog_link(&document, b)),
    }
}

/// Lowercased text content of the page, skipping script/style/noscript bodies.
pub(crate) fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .map(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"))
            .unwrap_or(false);
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    crate::utils::collapse_whitespace(&out).to_lowercase()
}

/// Text of an element with whitespace collapsed.
pub(crate) fn element_text(element: &scraper::ElementRef<'_>) -> String {
    crate::utils::collapse_whitespace(&element.text().collect::<String>())
}

/// Returns the first `(name, marker)` entry whose marker appears in `haystack`.
///
/// `haystack` must already be lowercased.
pub(crate) fn first_fingerprint(
    haystack: &str,
    fingerprints: &[(&'static str, &[&'static str])],
) -> Option<&'static str> {
    fingerprints
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| haystack.contains(m)))
        .map(|(name, _)| *name)
}
