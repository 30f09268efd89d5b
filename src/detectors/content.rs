//! Content freshness: locates a blog/news section and estimates the date of
//! the most recent post.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::config::BLOG_FETCH_TIMEOUT;
use crate::fetch::PageFetcher;
use crate::utils::{compile_regex_unsafe, parse_selector_unsafe};

/// Path segments that identify a blog/news section.
const BLOG_SEGMENTS: &[&str] = &[
    "blog",
    "news",
    "notizie",
    "articoli",
    "magazine",
    "journal",
    "novita",
    "novità",
    "approfondimenti",
    "insights",
];

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("a[href]", "ANCHOR_SELECTOR"));
static TIME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("time[datetime]", "TIME_SELECTOR"));
static PUBLISHED_META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe(
        "meta[property='article:published_time'], meta[property='article:modified_time']",
        "PUBLISHED_META_SELECTOR",
    )
});

static ISO_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\b(\d{4})-(\d{2})-(\d{2})\b", "ISO_DATE_PATTERN"));
static NUMERIC_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b", "NUMERIC_DATE_PATTERN")
});
static DAY_MONTH_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)\b(\d{1,2})\s+([a-zà]{3,9})\.?\s+(\d{4})\b",
        "DAY_MONTH_YEAR_PATTERN",
    )
});
static MONTH_DAY_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b",
        "MONTH_DAY_YEAR_PATTERN",
    )
});

/// Blog presence and freshness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentResult {
    pub has_blog: bool,
    pub blog_url: Option<String>,
    pub last_post_date: Option<NaiveDate>,
    /// Days between the most recent post and the audit date
    pub days_since_last_post: Option<i64>,
    /// The blog page could not be fetched; freshness is unknown
    pub blog_fetch_failed: bool,
}

/// Finds the first same-site link whose path has a blog-like segment.
///
/// Segments match exactly or as a prefix followed by `-` (`/news-ed-eventi`),
/// so `/newsletter` is not a blog.
pub fn find_blog_link(document: &Html, base: &Url) -> Option<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .filter(|u| same_site(u, base))
        .find(|u| {
            u.path_segments()
                .map(|mut segs| segs.any(is_blog_segment))
                .unwrap_or(false)
        })
        .map(|u| u.to_string())
}

fn same_site(candidate: &Url, base: &Url) -> bool {
    let strip = |h: &str| h.trim_start_matches("www.").to_lowercase();
    match (candidate.host_str(), base.host_str()) {
        (Some(a), Some(b)) => strip(a) == strip(b),
        _ => false,
    }
}

fn is_blog_segment(segment: &str) -> bool {
    let decoded = segment.to_lowercase().replace("%C3%A0", "à").replace("%c3%a0", "à");
    BLOG_SEGMENTS.iter().any(|kw| {
        decoded == *kw
            || decoded
                .strip_prefix(kw)
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// Maps Italian and English month names (full or abbreviated) to 1..=12.
fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.as_str() {
        "gennaio" | "gen" | "january" | "jan" => 1,
        "febbraio" | "feb" | "february" => 2,
        "marzo" | "mar" | "march" => 3,
        "aprile" | "apr" | "april" => 4,
        "maggio" | "mag" | "may" => 5,
        "giugno" | "giu" | "june" | "jun" => 6,
        "luglio" | "lug" | "july" | "jul" => 7,
        "agosto" | "ago" | "august" | "aug" => 8,
        "settembre" | "set" | "sett" | "september" | "sep" | "sept" => 9,
        "ottobre" | "ott" | "october" | "oct" => 10,
        "novembre" | "nov" | "november" => 11,
        "dicembre" | "dic" | "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Extracts every plausible date from a page and returns the most recent.
///
/// Recognized formats: `<time datetime>`, `article:published_time`,
/// `YYYY-MM-DD`, `DD/MM/YYYY` (also with dots), `5 marzo 2024`,
/// `March 5, 2024`. Dates after `today` or before 2000 are ignored.
pub fn parse_latest_date(html: &str, today: NaiveDate) -> Option<NaiveDate> {
    let document = Html::parse_document(html);
    let mut dates: Vec<NaiveDate> = Vec::new();

    let attribute_dates = document
        .select(&TIME_SELECTOR)
        .filter_map(|e| e.value().attr("datetime"))
        .chain(
            document
                .select(&PUBLISHED_META_SELECTOR)
                .filter_map(|e| e.value().attr("content")),
        );
    for value in attribute_dates {
        if let Some(c) = ISO_DATE_PATTERN.captures(value) {
            if let Ok(month) = c[2].parse::<u32>() {
                dates.extend(ymd(&c[1], month, &c[3]));
            }
        }
    }

    let text = crate::detectors::visible_text(&document);
    for c in ISO_DATE_PATTERN.captures_iter(&text) {
        if let Ok(month) = c[2].parse::<u32>() {
            dates.extend(ymd(&c[1], month, &c[3]));
        }
    }
    for c in NUMERIC_DATE_PATTERN.captures_iter(&text) {
        if let Ok(month) = c[2].parse::<u32>() {
            dates.extend(ymd(&c[3], month, &c[1]));
        }
    }
    for c in DAY_MONTH_YEAR_PATTERN.captures_iter(&text) {
        if let Some(month) = month_number(&c[2]) {
            dates.extend(ymd(&c[3], month, &c[1]));
        }
    }
    for c in MONTH_DAY_YEAR_PATTERN.captures_iter(&text) {
        if let Some(month) = month_number(&c[1]) {
            dates.extend(ymd(&c[3], month, &c[2]));
        }
    }

    dates
        .into_iter()
        .filter(|d| *d <= today && d.year() >= 2000)
        .max()
}

/// Fetches the blog page (10s budget) and computes freshness.
///
/// A missing blog link yields `has_blog = false`. A blog that cannot be
/// fetched keeps `has_blog = true` with unknown freshness.
pub async fn analyze_blog_freshness(
    fetcher: &PageFetcher,
    blog_url: Option<String>,
    today: NaiveDate,
) -> ContentResult {
    let Some(blog_url) = blog_url else {
        return ContentResult::default();
    };

    match fetcher.fetch_with_timeout(&blog_url, BLOG_FETCH_TIMEOUT).await {
        Ok(page) => {
            let last_post_date = parse_latest_date(&page.html, today);
            log::debug!("Blog {blog_url}: latest post {last_post_date:?}");
            ContentResult {
                has_blog: true,
                blog_url: Some(blog_url),
                days_since_last_post: last_post_date.map(|d| (today - d).num_days()),
                last_post_date,
                blog_fetch_failed: false,
            }
        }
        Err(e) => {
            log::debug!("Blog fetch failed for {blog_url}: {e}");
            ContentResult {
                has_blog: true,
                blog_url: Some(blog_url),
                last_post_date: None,
                days_since_last_post: None,
                blog_fetch_failed: true,
            }
        }
    }
}
