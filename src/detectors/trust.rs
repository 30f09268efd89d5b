//! Trust and compliance signals.
//!
//! Cookie consent tooling, legal pages, contact form and instant-contact
//! channels (WhatsApp, live chat, clickable phone/email).

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::detectors::{element_text, first_fingerprint};
use crate::utils::parse_selector_unsafe;

/// Consent management platforms, matched against lowercased markup.
const COOKIE_BANNER_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("iubenda", &["iubenda"]),
    ("Cookiebot", &["cookiebot"]),
    ("OneTrust", &["onetrust", "cookielaw.org"]),
    ("CookieYes", &["cookieyes", "cky-consent"]),
    ("Complianz", &["complianz", "cmplz-"]),
    ("Cookie Law Info", &["cookie-law-info", "cookielawinfo"]),
    ("Usercentrics", &["usercentrics"]),
    ("Didomi", &["didomi"]),
    ("Quantcast Choice", &["quantcast.mgr.consensu.org", "quantcast choice"]),
    ("TrustArc", &["trustarc", "truste.com"]),
    ("Axeptio", &["axeptio"]),
    ("Klaro", &["klaro.js", "klaro-config"]),
    ("Cookie Notice", &["cookie-notice", "cn-notice"]),
    ("Osano", &["osano.com"]),
    ("Termly", &["termly.io"]),
];

const LIVE_CHAT_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("Tawk.to", &["embed.tawk.to", "tawk_api"]),
    ("Tidio", &["code.tidio.co", "tidiochat"]),
    ("Intercom", &["widget.intercom.io", "intercomsettings"]),
    ("Crisp", &["client.crisp.chat", "$crisp"]),
    ("Zendesk Chat", &["zopim", "static.zdassets.com"]),
    ("LiveChat", &["cdn.livechatinc.com"]),
    ("Drift", &["js.driftt.com"]),
    ("HubSpot Chat", &["js.usemessages.com"]),
    ("Smartsupp", &["smartsuppchat.com", "smartsupp"]),
    ("Facebook Messenger", &["fb-customerchat", "customerchat.php"]),
    ("Olark", &["static.olark.com"]),
    ("JivoChat", &["code.jivosite.com", "jivosite"]),
    ("Freshchat", &["wchat.freshchat.com"]),
];

const WHATSAPP_MARKERS: &[&str] = &[
    "wa.me/",
    "api.whatsapp.com/send",
    "web.whatsapp.com/send",
    "whatsapp://send",
    "chat.whatsapp.com/",
];

const PRIVACY_MARKERS: &[&str] = &["privacy", "informativa", "riservatezza", "gdpr"];
const TERMS_MARKERS: &[&str] = &[
    "termini",
    "condizioni",
    "terms",
    "note legali",
    "note-legali",
    "legal-notice",
];

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("a[href]", "ANCHOR_SELECTOR"));
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("form", "FORM_SELECTOR"));
static FIELD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("input, textarea, select", "FIELD_SELECTOR"));

/// Trust/compliance findings for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrustResult {
    pub has_cookie_banner: bool,
    pub cookie_banner_vendor: Option<String>,
    pub has_privacy_policy: bool,
    pub has_terms: bool,
    pub has_contact_form: bool,
    pub has_whatsapp: bool,
    pub whatsapp_url: Option<String>,
    pub has_live_chat: bool,
    pub live_chat_vendor: Option<String>,
    pub has_clickable_phone: bool,
    pub has_clickable_email: bool,
}

impl TrustResult {
    /// WhatsApp or live chat.
    pub fn has_instant_contact(&self) -> bool {
        self.has_whatsapp || self.has_live_chat
    }
}

/// Field hints collected from one form.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FormHints {
    pub email: bool,
    pub name: bool,
    pub phone: bool,
    pub message: bool,
    pub visible_fields: usize,
}

/// Reads name/type/id/placeholder attributes of a form's fields.
pub(crate) fn form_hints(form: &ElementRef<'_>) -> FormHints {
    let mut hints = FormHints::default();
    for field in form.select(&FIELD_SELECTOR) {
        let el = field.value();
        let kind = el.attr("type").unwrap_or("").to_lowercase();
        if matches!(kind.as_str(), "hidden" | "submit" | "button" | "checkbox" | "radio") {
            continue;
        }
        hints.visible_fields += 1;
        let descriptor = [
            el.attr("name"),
            el.attr("id"),
            el.attr("placeholder"),
            el.attr("autocomplete"),
            el.attr("aria-label"),
        ]
        .iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

        if el.name() == "textarea"
            || ["messag", "richiesta", "comment", "note", "domanda"]
                .iter()
                .any(|k| descriptor.contains(k))
        {
            hints.message = true;
        }
        if kind == "email" || descriptor.contains("mail") {
            hints.email = true;
        }
        if kind == "tel" || ["phone", "telefono", "cellulare"].iter().any(|k| descriptor.contains(k)) {
            hints.phone = true;
        }
        if ["nome", "name", "cognome", "surname"].iter().any(|k| descriptor.contains(k)) {
            hints.name = true;
        }
    }
    hints
}

/// True when any form on the page looks like a contact form.
///
/// A form qualifies with a message-like field, or with email + name + phone.
/// A lone email box (newsletter) does not.
pub(crate) fn has_contact_form(document: &Html) -> bool {
    document.select(&FORM_SELECTOR).any(|form| {
        let class = form.value().attr("class").unwrap_or("").to_lowercase();
        if class.contains("wpcf7") || class.contains("contact") {
            return true;
        }
        let hints = form_hints(&form);
        hints.message || (hints.email && hints.name && hints.phone)
    })
}

/// First WhatsApp click-to-chat link on the page.
pub(crate) fn find_whatsapp_link(document: &Html) -> Option<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| {
            let lower = href.to_lowercase();
            WHATSAPP_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(str::to_string)
}

/// Whether the page has an anchor with the given scheme (`tel:` / `mailto:`).
pub(crate) fn has_scheme_link(document: &Html, scheme: &str) -> bool {
    document.select(&ANCHOR_SELECTOR).any(|a| {
        a.value()
            .attr("href")
            .map(|h| h.trim().to_lowercase().starts_with(scheme))
            .unwrap_or(false)
    })
}

fn has_legal_link(document: &Html, markers: &[&str]) -> bool {
    document.select(&ANCHOR_SELECTOR).any(|a| {
        let href = a.value().attr("href").unwrap_or("").to_lowercase();
        let text = element_text(&a).to_lowercase();
        markers.iter().any(|m| href.contains(m) || text.contains(m))
    })
}

/// Extracts trust and compliance signals.
///
/// # Arguments
///
/// * `document` - The parsed HTML document
/// * `html` - The raw markup (vendor scripts are matched on it)
pub fn analyze_trust(document: &Html, html: &str) -> TrustResult {
    let lower = html.to_lowercase();
    let cookie_banner_vendor = first_fingerprint(&lower, COOKIE_BANNER_FINGERPRINTS);
    let live_chat_vendor = first_fingerprint(&lower, LIVE_CHAT_FINGERPRINTS);
    let whatsapp_url = find_whatsapp_link(document);

    TrustResult {
        has_cookie_banner: cookie_banner_vendor.is_some(),
        cookie_banner_vendor: cookie_banner_vendor.map(str::to_string),
        has_privacy_policy: has_legal_link(document, PRIVACY_MARKERS),
        has_terms: has_legal_link(document, TERMS_MARKERS),
        has_contact_form: has_contact_form(document),
        has_whatsapp: whatsapp_url.is_some(),
        whatsapp_url,
        has_live_chat: live_chat_vendor.is_some(),
        live_chat_vendor: live_chat_vendor.map(str::to_string),
        has_clickable_phone: has_scheme_link(document, "tel:"),
        has_clickable_email: has_scheme_link(document, "mailto:"),
    }
}
