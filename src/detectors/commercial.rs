//! Commercial conversion signals: does the homepage ask for contact through
//! clear channels, and does it present a concrete offer?

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::detectors::trust::{find_whatsapp_link, has_contact_form, has_scheme_link};
use crate::detectors::{element_text, visible_text};
use crate::utils::{compile_regex_unsafe, parse_selector_unsafe};

const CTA_KEYWORDS: &[&str] = &[
    "contattaci",
    "contatta",
    "richiedi",
    "prenota",
    "preventivo",
    "chiama",
    "scrivici",
    "acquista",
    "compra",
    "ordina",
    "iscriviti ora",
    "contact us",
    "get a quote",
    "book now",
    "call now",
    "buy now",
];

/// Headings that say nothing about the business.
const GENERIC_HEADINGS: &[&str] = &[
    "home",
    "homepage",
    "welcome",
    "benvenuti",
    "benvenuto",
    "about",
    "about us",
    "chi siamo",
    "menu",
    "contatti",
];

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("h1, h2", "HEADING_SELECTOR"));
static CTA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(
        "button, a[class*='btn'], a[class*='button'], a[class*='cta'], input[type='submit']",
        "CTA_SELECTOR",
    )
});
static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe("meta[name='description']", "META_DESCRIPTION_SELECTOR")
});

/// Offer/price patterns; each one counts at most once.
static OFFER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("price", r"€\s?\d|\d+(?:[.,]\d{2})?\s?€|\b\d+\s?euro\b"),
        ("prezzi", r"\bprezz[oi]\b|\blistino\b|\btariff[ae]\b|\bpricing\b"),
        ("offerta", r"\bofferte?\b|\bpromo(?:zion[ei])?\b"),
        ("sconto", r"\bscont[oi]\b|\bscontat[oi]\b"),
        ("gratis", r"\bgratis\b|\bgratuit[oaie]\b"),
        ("pacchetto", r"\bpacchett[oi]\b|\babbonament[oi]\b"),
        ("a partire da", r"\ba partire da\b|\bda soli\b"),
        ("preventivo", r"\bpreventiv[oi] (?:gratuit|gratis|in \d+)"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, compile_regex_unsafe(pattern, "OFFER_PATTERNS")))
    .collect()
});

/// Conversion-readiness of the homepage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommercialSignals {
    /// At least two distinct contact channels
    pub cta_clear: bool,
    /// e.g. `["contact_form", "phone", "whatsapp"]`
    pub cta_channels: Vec<String>,
    pub offer_focused: bool,
    /// Names of the offer patterns that matched
    pub offer_matches: Vec<String>,
    /// Page has headings and all of them are generic
    pub generic_headings_only: bool,
}

fn is_generic_heading(text: &str) -> bool {
    let lower = text.trim().trim_end_matches(['!', '.']).to_lowercase();
    GENERIC_HEADINGS.contains(&lower.as_str())
        || lower.starts_with("benvenut")
        || lower.starts_with("welcome")
}

/// Detects CTA clarity and offer focus.
///
/// Channels are contact form, clickable phone, WhatsApp, clickable email and
/// an explicit CTA button; two or more make the CTA clear.
///
/// The offer is focused with two offer patterns, or one pattern plus a
/// specific heading or meta description. Generic headings with no specific
/// heading force it to false.
pub fn analyze_commercial_signals(document: &Html) -> CommercialSignals {
    let mut cta_channels = Vec::new();
    if has_contact_form(document) {
        cta_channels.push("contact_form".to_string());
    }
    if has_scheme_link(document, "tel:") {
        cta_channels.push("phone".to_string());
    }
    if find_whatsapp_link(document).is_some() {
        cta_channels.push("whatsapp".to_string());
    }
    if has_scheme_link(document, "mailto:") {
        cta_channels.push("email".to_string());
    }
    let has_cta_button = document.select(&CTA_SELECTOR).any(|el| {
        let label = element_text(&el)
            + " "
            + el.value().attr("value").unwrap_or("");
        let label = label.to_lowercase();
        CTA_KEYWORDS.iter().any(|k| label.contains(k))
    });
    if has_cta_button {
        cta_channels.push("cta_button".to_string());
    }

    let headings: Vec<String> = document
        .select(&HEADING_SELECTOR)
        .map(|h| element_text(&h))
        .filter(|t| !t.is_empty())
        .collect();
    let specific_heading = headings
        .iter()
        .any(|h| !is_generic_heading(h) && h.split_whitespace().count() >= 2);
    let generic_headings_only = !headings.is_empty() && !specific_heading;

    let specific_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .filter_map(|m| m.value().attr("content"))
        .any(|d| d.split_whitespace().count() >= 5 && !is_generic_heading(d));

    let text = visible_text(document);
    let offer_matches: Vec<String> = OFFER_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(&text))
        .map(|(name, _)| name.to_string())
        .collect();

    let offer_focused = !generic_headings_only
        && (offer_matches.len() >= 2
            || (!offer_matches.is_empty() && (specific_heading || specific_description)));

    CommercialSignals {
        cta_clear: cta_channels.len() >= 2,
        cta_channels,
        offer_focused,
        offer_matches,
        generic_headings_only,
    }
}
