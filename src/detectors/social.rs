//! Social profile link detection.
//!
//! Finds the first outbound link per platform that points at a profile or
//! page, rejecting share/intent/plugin links that any site can embed.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum_macros::{AsRefStr, EnumIter};

use crate::utils::{compile_regex_unsafe, parse_selector_unsafe};

const FACEBOOK_URL_PATTERN: &str = r"(?i)^(?:https?:)?//(?:[a-z0-9-]+\.)*(?:facebook|fb)\.com/([^/?#]+)";
const INSTAGRAM_URL_PATTERN: &str = r"(?i)^(?:https?:)?//(?:www\.)?instagram\.com/([^/?#]+)";
const LINKEDIN_URL_PATTERN: &str =
    r"(?i)^(?:https?:)?//(?:[a-z]{2,3}\.|www\.)?linkedin\.com/(?:company|in|school|showcase)/([^/?#]+)";
const YOUTUBE_URL_PATTERN: &str =
    r"(?i)^(?:https?:)?//(?:www\.|m\.)?youtube\.com/(?:(?:channel|c|user)/|@)([^/?#]+)";
const TIKTOK_URL_PATTERN: &str = r"(?i)^(?:https?:)?//(?:www\.)?tiktok\.com/@([^/?#]+)";
const TWITTER_URL_PATTERN: &str =
    r"(?i)^(?:https?:)?//(?:www\.|mobile\.)?(?:twitter|x)\.com/([^/?#]+)";

/// First path segments that belong to share widgets, login pages or plugins.
const FACEBOOK_NON_PROFILE: &[&str] = &[
    "sharer",
    "sharer.php",
    "share",
    "share.php",
    "dialog",
    "plugins",
    "tr",
    "login",
    "login.php",
    "policies",
    "privacy",
    "help",
];
const INSTAGRAM_NON_PROFILE: &[&str] = &["explore", "accounts", "share", "about", "legal"];
const TWITTER_NON_PROFILE: &[&str] = &["intent", "share", "home", "hashtag", "search", "i", "privacy", "tos"];

static FACEBOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(FACEBOOK_URL_PATTERN, "FACEBOOK_RE"));
static INSTAGRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(INSTAGRAM_URL_PATTERN, "INSTAGRAM_RE"));
static LINKEDIN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(LINKEDIN_URL_PATTERN, "LINKEDIN_RE"));
static YOUTUBE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(YOUTUBE_URL_PATTERN, "YOUTUBE_RE"));
static TIKTOK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(TIKTOK_URL_PATTERN, "TIKTOK_RE"));
static TWITTER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(TWITTER_URL_PATTERN, "TWITTER_RE"));

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("a[href]", "ANCHOR_SELECTOR"));

/// Platforms tracked by the social detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr)]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    LinkedIn,
    YouTube,
    TikTok,
    Twitter,
}

impl SocialPlatform {
    fn pattern(self) -> &'static Regex {
        match self {
            SocialPlatform::Facebook => &FACEBOOK_RE,
            SocialPlatform::Instagram => &INSTAGRAM_RE,
            SocialPlatform::LinkedIn => &LINKEDIN_RE,
            SocialPlatform::YouTube => &YOUTUBE_RE,
            SocialPlatform::TikTok => &TIKTOK_RE,
            SocialPlatform::Twitter => &TWITTER_RE,
        }
    }

    fn rejected_segments(self) -> &'static [&'static str] {
        match self {
            SocialPlatform::Facebook => FACEBOOK_NON_PROFILE,
            SocialPlatform::Instagram => INSTAGRAM_NON_PROFILE,
            SocialPlatform::Twitter => TWITTER_NON_PROFILE,
            _ => &[],
        }
    }

    /// Returns the normalized profile URL if `href` points at a profile on this platform.
    fn match_profile(self, href: &str) -> Option<String> {
        let caps = self.pattern().captures(href)?;
        let segment = caps.get(1)?.as_str().to_lowercase();
        if self.rejected_segments().contains(&segment.as_str()) {
            return None;
        }
        if href.starts_with("//") {
            Some(format!("https:{href}"))
        } else {
            Some(href.to_string())
        }
    }
}

/// Presence and URL of one social profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialLink {
    pub found: bool,
    pub url: Option<String>,
}

impl SocialLink {
    fn from_url(url: Option<String>) -> Self {
        Self {
            found: url.is_some(),
            url,
        }
    }
}

/// Social profiles linked from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialResult {
    pub facebook: SocialLink,
    pub instagram: SocialLink,
    pub linkedin: SocialLink,
    pub youtube: SocialLink,
    pub tiktok: SocialLink,
    pub twitter: SocialLink,
}

impl SocialResult {
    pub fn link(&self, platform: SocialPlatform) -> &SocialLink {
        match platform {
            SocialPlatform::Facebook => &self.facebook,
            SocialPlatform::Instagram => &self.instagram,
            SocialPlatform::LinkedIn => &self.linkedin,
            SocialPlatform::YouTube => &self.youtube,
            SocialPlatform::TikTok => &self.tiktok,
            SocialPlatform::Twitter => &self.twitter,
        }
    }

    /// Number of platforms with a profile link.
    pub fn platforms_found(&self) -> usize {
        use strum::IntoEnumIterator;
        SocialPlatform::iter()
            .filter(|p| self.link(*p).found)
            .count()
    }
}

/// Extracts social profile links from an HTML document.
///
/// For each platform the first matching anchor wins. Relative links are
/// ignored since they cannot point at a social network.
///
/// # Arguments
///
/// * `document` - The parsed HTML document
pub fn analyze_social(document: &Html) -> SocialResult {
    use strum::IntoEnumIterator;

    let hrefs: Vec<&str> = document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|e| e.value().attr("href"))
        .map(str::trim)
        .collect();

    let find = |platform: SocialPlatform| -> Option<String> {
        hrefs.iter().find_map(|href| platform.match_profile(href))
    };

    let mut result = SocialResult::default();
    for platform in SocialPlatform::iter() {
        let link = SocialLink::from_url(find(platform));
        match platform {
            SocialPlatform::Facebook => result.facebook = link,
            SocialPlatform::Instagram => result.instagram = link,
            SocialPlatform::LinkedIn => result.linkedin = link,
            SocialPlatform::YouTube => result.youtube = link,
            SocialPlatform::TikTok => result.tiktok = link,
            SocialPlatform::Twitter => result.twitter = link,
        }
    }
    log::debug!("Social: {} platforms linked", result.platforms_found());
    result
}
