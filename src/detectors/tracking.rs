//! Tracking and advertising tag detection.
//!
//! Scans raw markup (including inline scripts) for analytics, tag manager,
//! pixel and ad-platform fingerprints. Consent Mode v2 detection looks for a
//! `gtag('consent', ...)` call that sets the v2 signals.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::utils::compile_regex_unsafe;

/// Tracking/advertising signals found on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingResult {
    /// Universal Analytics or GA4
    pub has_google_analytics: bool,
    pub has_ga4: bool,
    pub ga4_id: Option<String>,
    pub has_universal_analytics: bool,
    pub ua_id: Option<String>,
    pub has_gtm: bool,
    pub gtm_id: Option<String>,
    pub has_facebook_pixel: bool,
    pub facebook_pixel_id: Option<String>,
    /// `AW-` tag loaded on the page
    pub has_google_ads_tag: bool,
    pub google_ads_id: Option<String>,
    /// A conversion event or an `AW-…/label` send_to target
    pub has_google_ads_conversion: bool,
    pub has_remarketing: bool,
    pub has_conversion_linker: bool,
    pub has_gclid: bool,
    pub has_fbclid: bool,
    pub has_hotjar: bool,
    pub has_clarity: bool,
    pub has_linkedin_insight: bool,
    pub has_tiktok_pixel: bool,
    pub has_consent_mode_v2: bool,
}

impl TrackingResult {
    /// Google Analytics, GTM or Google Ads conversion tracking.
    pub fn tracking_present(&self) -> bool {
        self.has_google_analytics || self.has_gtm || self.has_google_ads_conversion
    }

    /// GA4 + GTM + at least one ad conversion pixel.
    pub fn is_mature(&self) -> bool {
        self.has_ga4 && self.has_gtm && (self.has_facebook_pixel || self.has_google_ads_conversion)
    }

    /// Tags that only an advertiser would install.
    pub fn has_ad_platform_tags(&self) -> bool {
        self.has_google_ads_tag
            || self.has_remarketing
            || self.has_facebook_pixel
            || self.has_linkedin_insight
            || self.has_tiktok_pixel
    }
}

static UA_CREATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"(?i)ga\s*\(\s*['"]create['"]\s*,\s*['"](UA-\d+-\d+)['"]"#,
        "UA_CREATE_PATTERN",
    )
});
static UA_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r#"['"=](UA-\d{4,10}-\d{1,4})\b"#, "UA_ID_PATTERN"));
static UA_SCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)google-analytics\.com/(?:analytics|ga|urchin)\.js",
        "UA_SCRIPT_PATTERN",
    )
});
static GA4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"(?:gtag\s*\(\s*['"]config['"]\s*,\s*['"]|gtag/js\?id=)(G-[A-Z0-9]{4,})"#,
        "GA4_PATTERN",
    )
});
static GTM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\b(GTM-[A-Z0-9]{4,10})\b", "GTM_PATTERN"));
static FB_PIXEL_INIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"fbq\s*\(\s*['"]init['"]\s*,\s*['"](\d{6,20})['"]"#,
        "FB_PIXEL_INIT_PATTERN",
    )
});
static FB_PIXEL_NOSCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"facebook\.com/tr\?id=(\d{6,20})",
        "FB_PIXEL_NOSCRIPT_PATTERN",
    )
});
static FB_EVENTS_SCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"connect\.facebook\.net/[a-zA-Z_]+/fbevents\.js",
        "FB_EVENTS_SCRIPT_PATTERN",
    )
});
static GOOGLE_ADS_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\b(AW-\d{6,12})\b", "GOOGLE_ADS_ID_PATTERN"));
static GOOGLE_ADS_CONVERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"(?i)gtag\s*\(\s*['"]event['"]\s*,\s*['"]conversion['"]|send_to['"]?\s*:\s*['"]AW-\d+/[\w-]+|googleadservices\.com/pagead/conversion|google_conversion_id"#,
        "GOOGLE_ADS_CONVERSION_PATTERN",
    )
});
static REMARKETING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)google_remarketing_only|pagead/viewthroughconversion|google_tag_params",
        "REMARKETING_PATTERN",
    )
});
static CONVERSION_LINKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)conversion_linker|conversionlinker|_gcl_aw|_gcl_au",
        "CONVERSION_LINKER_PATTERN",
    )
});
static GCLID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\bgclid\b", "GCLID_PATTERN"));
static FBCLID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\bfbclid\b", "FBCLID_PATTERN"));
static HOTJAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"(?i)static\.hotjar\.com|\bhjid\s*:", "HOTJAR_PATTERN")
});
static CLARITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r#"(?i)clarity\.ms/tag|\(\s*window\s*,\s*document\s*,\s*['"]clarity['"]"#, "CLARITY_PATTERN")
});
static LINKEDIN_INSIGHT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)snap\.licdn\.com/li\.lms-analytics|_linkedin_partner_id",
        "LINKEDIN_INSIGHT_PATTERN",
    )
});
static TIKTOK_PIXEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)analytics\.tiktok\.com|ttq\.load\s*\(",
        "TIKTOK_PIXEL_PATTERN",
    )
});
static CONSENT_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"gtag\s*\(\s*['"]consent['"]\s*,\s*['"](?:default|update)['"]"#,
        "CONSENT_CALL_PATTERN",
    )
});
static CONSENT_V2_SIGNAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"\bad_user_data\b|\bad_personalization\b", "CONSENT_V2_SIGNAL_PATTERN")
});

fn first_capture(pattern: &Regex, html: &str) -> Option<String> {
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Detects tracking and advertising tags in raw HTML.
///
/// Searches for:
/// - Google Analytics: `ga('create', 'UA-…')`, `analytics.js`, `gtag('config', 'G-…')`
/// - Google Tag Manager: `GTM-XXXXXX` container IDs
/// - Meta Pixel: `fbq('init', '…')`, `facebook.com/tr?id=…`, `fbevents.js`
/// - Google Ads: `AW-…` tags, conversion events, remarketing, conversion linker
/// - Click IDs (`gclid`, `fbclid`), Hotjar, Clarity, LinkedIn Insight, TikTok Pixel
/// - Consent Mode v2
///
/// # Arguments
///
/// * `html` - The raw HTML content (including script tags)
pub fn analyze_tracking(html: &str) -> TrackingResult {
    let ua_id = first_capture(&UA_CREATE_PATTERN, html).or_else(|| first_capture(&UA_ID_PATTERN, html));
    let has_universal_analytics = ua_id.is_some() || UA_SCRIPT_PATTERN.is_match(html);
    let ga4_id = first_capture(&GA4_PATTERN, html);

    let facebook_pixel_id = first_capture(&FB_PIXEL_INIT_PATTERN, html)
        .or_else(|| first_capture(&FB_PIXEL_NOSCRIPT_PATTERN, html));
    let has_facebook_pixel =
        facebook_pixel_id.is_some() || FB_EVENTS_SCRIPT_PATTERN.is_match(html);

    let gtm_id = first_capture(&GTM_PATTERN, html);
    let google_ads_id = first_capture(&GOOGLE_ADS_ID_PATTERN, html);

    let result = TrackingResult {
        has_google_analytics: has_universal_analytics || ga4_id.is_some(),
        has_ga4: ga4_id.is_some(),
        ga4_id,
        has_universal_analytics,
        ua_id,
        has_gtm: gtm_id.is_some(),
        gtm_id,
        has_facebook_pixel,
        facebook_pixel_id,
        has_google_ads_tag: google_ads_id.is_some(),
        google_ads_id,
        has_google_ads_conversion: GOOGLE_ADS_CONVERSION_PATTERN.is_match(html),
        has_remarketing: REMARKETING_PATTERN.is_match(html),
        has_conversion_linker: CONVERSION_LINKER_PATTERN.is_match(html),
        has_gclid: GCLID_PATTERN.is_match(html),
        has_fbclid: FBCLID_PATTERN.is_match(html),
        has_hotjar: HOTJAR_PATTERN.is_match(html),
        has_clarity: CLARITY_PATTERN.is_match(html),
        has_linkedin_insight: LINKEDIN_INSIGHT_PATTERN.is_match(html),
        has_tiktok_pixel: TIKTOK_PIXEL_PATTERN.is_match(html),
        has_consent_mode_v2: CONSENT_CALL_PATTERN.is_match(html)
            && CONSENT_V2_SIGNAL_PATTERN.is_match(html),
    };

    log::debug!(
        "Tracking: ga={} gtm={} pixel={} ads_tag={} conversion={}",
        result.has_google_analytics,
        result.has_gtm,
        result.has_facebook_pixel,
        result.has_google_ads_tag,
        result.has_google_ads_conversion
    );
    result
}
