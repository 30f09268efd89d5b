//! URL validation, normalization and the non-business denylist.

use log::warn;

use crate::config::NON_BUSINESS_DOMAINS;

/// Maximum URL length (2048 characters) to prevent abuse via extremely long URLs.
const MAX_URL_LENGTH: usize = 2048;

/// Validates and normalizes a URL.
///
/// Trims whitespace, adds an `https://` prefix if no scheme is present, then
/// validates that the URL is syntactically valid and uses an http/https scheme.
///
/// # Arguments
///
/// * `url` - The URL string to validate and normalize
///
/// # Returns
///
/// `Some(normalized_url)` if the URL is valid and should be audited, `None` otherwise.
pub fn validate_and_normalize_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if url.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping URL exceeding maximum length ({} > {}): {}...",
            url.len(),
            MAX_URL_LENGTH,
            url.chars().take(50).collect::<String>()
        );
        return None;
    }

    let lower = url.to_ascii_lowercase();
    let normalized = if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    match url::Url::parse(&normalized) {
        Ok(parsed) => match (parsed.scheme(), parsed.host_str()) {
            ("http" | "https", Some(_)) => Some(normalized),
            _ => {
                warn!("Skipping unsupported URL: {url}");
                None
            }
        },
        Err(_) => {
            warn!("Skipping invalid URL: {url}");
            None
        }
    }
}

/// Returns the lowercase host of a URL without a leading `www.`.
pub fn bare_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Checks whether a website field points at a social profile, a messaging
/// link or a placeholder rather than a business site.
///
/// The check is purely textual: no network call is made. Hosts match when
/// they equal a denylisted domain or are a subdomain of one.
pub fn is_non_business_website(website: &str) -> bool {
    let Some(normalized) = validate_and_normalize_url(website) else {
        return false;
    };
    let Some(host) = bare_host(&normalized) else {
        return false;
    };
    NON_BUSINESS_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}
