//! Email marketing detection: newsletter forms, popups, lead magnets and
//! the email service provider behind them.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::detectors::trust::form_hints;
use crate::detectors::{element_text, first_fingerprint, visible_text};
use crate::utils::parse_selector_unsafe;

const SUBSCRIBE_KEYWORDS: &[&str] = &[
    "newsletter",
    "iscriviti",
    "iscrizione",
    "subscribe",
    "resta aggiornato",
    "rimani aggiornato",
    "ricevi le nostre",
    "sign up",
    "mailing list",
];

const LEAD_MAGNET_KEYWORDS: &[&str] = &[
    "ebook",
    "e-book",
    "guida gratuita",
    "guida gratis",
    "scarica gratis",
    "scarica la guida",
    "download gratuito",
    "checklist",
    "webinar",
    "free download",
    "free guide",
    "codice sconto",
    "coupon",
];

const EMAIL_PROVIDER_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("Mailchimp", &["list-manage.com", "chimpstatic.com", "mailchimp"]),
    ("Brevo", &["sibforms.com", "sendinblue", "brevo"]),
    ("MailerLite", &["mailerlite"]),
    ("Klaviyo", &["klaviyo"]),
    ("ActiveCampaign", &["activehosted.com", "activecampaign"]),
    ("HubSpot", &["hsforms", "hs-scripts.com"]),
    ("ConvertKit", &["convertkit", "ck.page"]),
    ("GetResponse", &["getresponse"]),
    ("Mailjet", &["mailjet"]),
    ("Omnisend", &["omnisend"]),
    ("MailUp", &["mailup"]),
    ("Moosend", &["moosend"]),
];

static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("form", "FORM_SELECTOR"));
static POPUP_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(
        "[class*='popup'], [class*='pop-up'], [class*='modal'], [class*='optin'], [id*='popup'], [id*='modal']",
        "POPUP_SELECTOR",
    )
});

/// Email marketing findings for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailMarketingResult {
    pub has_newsletter_form: bool,
    pub has_popup: bool,
    pub has_lead_magnet: bool,
    pub email_provider: Option<String>,
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Detects newsletter capture and the email tooling behind it.
///
/// A newsletter form is a `<form>` with an email field whose own text,
/// placeholders or button labels mention subscribing. A popup is an element
/// with popup/modal classes whose text mentions subscribing.
///
/// # Arguments
///
/// * `document` - The parsed HTML document
/// * `html` - The raw markup (provider embeds are matched on it)
pub fn analyze_email_marketing(document: &Html, html: &str) -> EmailMarketingResult {
    let has_newsletter_form = document.select(&FORM_SELECTOR).any(|form| {
        if !form_hints(&form).email {
            return false;
        }
        let mut text = element_text(&form).to_lowercase();
        text.push(' ');
        text.push_str(&form.html().to_lowercase());
        contains_any(&text, SUBSCRIBE_KEYWORDS)
    });

    let has_popup = document
        .select(&POPUP_SELECTOR)
        .any(|el| contains_any(&element_text(&el).to_lowercase(), SUBSCRIBE_KEYWORDS));

    let text = visible_text(document);
    let lower = html.to_lowercase();

    EmailMarketingResult {
        has_newsletter_form,
        has_popup,
        has_lead_magnet: contains_any(&text, LEAD_MAGNET_KEYWORDS),
        email_provider: first_fingerprint(&lower, EMAIL_PROVIDER_FINGERPRINTS).map(str::to_string),
    }
}
