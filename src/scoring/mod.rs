//! Opportunity scoring.
//!
//! Pure additive rules over the detector output. Higher means more
//! deficiencies, i.e. more to sell, not a better website. Each category has
//! its own ceiling and the total is capped at 100.

use serde::{Deserialize, Serialize};

use crate::config::MAX_OPPORTUNITY_SCORE;
use crate::models::AuditData;

const WEBSITE_CAP: u8 = 25;
const SEO_CAP: u8 = 25;
const TRACKING_CAP: u8 = 20;
const SOCIAL_CAP: u8 = 10;
const GOOGLE_BUSINESS_CAP: u8 = 10;
const CONTENT_CAP: u8 = 5;
const TRUST_CAP: u8 = 5;
const EMAIL_CAP: u8 = 5;

/// Points per category; `total` is the opportunity score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub website: u8,
    pub seo: u8,
    pub tracking: u8,
    pub social: u8,
    pub google_business: u8,
    pub content: u8,
    pub trust: u8,
    pub email_marketing: u8,
    pub total: u8,
}

/// Sums `(condition, points)` pairs and applies the category ceiling.
fn category(rules: &[(bool, u8)], cap: u8) -> u8 {
    let sum: u32 = rules
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, points)| u32::from(*points))
        .sum();
    sum.min(u32::from(cap)) as u8
}

fn website_points(data: &AuditData) -> u8 {
    let perf = data.performance.performance_score;
    category(
        &[
            (perf < 50, 10),
            ((50..70).contains(&perf), 5),
            (!data.performance.is_mobile_friendly, 10),
            (!data.has_https, 5),
            (!data.trust.has_contact_form, 3),
            (!data.trust.has_instant_contact(), 2),
        ],
        WEBSITE_CAP,
    )
}

fn seo_points(data: &AuditData) -> u8 {
    let lcp = data.performance.lcp_ms;
    category(
        &[
            (!data.seo.has_meta_title, 5),
            (!data.seo.has_meta_description, 5),
            (data.seo.h1_count == 0, 4),
            (data.seo.has_sitemap.is_absent(), 3),
            (!data.seo.has_schema_markup, 3),
            (lcp > 4000, 5),
            (lcp > 2500 && lcp <= 4000, 3),
        ],
        SEO_CAP,
    )
}

fn tracking_points(data: &AuditData) -> u8 {
    let t = &data.tracking;
    category(
        &[
            (!t.has_google_analytics, 8),
            (!t.has_facebook_pixel, 6),
            (!(t.has_google_ads_tag || t.has_google_ads_conversion), 6),
        ],
        TRACKING_CAP,
    )
}

fn social_points(data: &AuditData) -> u8 {
    let s = &data.social;
    category(
        &[
            (!s.facebook.found, 3),
            (!s.instagram.found, 3),
            (!s.linkedin.found, 2),
            (!s.youtube.found, 2),
        ],
        SOCIAL_CAP,
    )
}

fn google_business_points(data: &AuditData) -> u8 {
    let rating = data.google_rating;
    let reviews = data.google_reviews_count;
    category(
        &[
            (rating.map_or(true, |r| r < 4.0), 5),
            (rating.is_some_and(|r| (4.0..4.5).contains(&r)), 3),
            (reviews.map_or(true, |n| n < 10), 5),
            (reviews.is_some_and(|n| (10..50).contains(&n)), 3),
        ],
        GOOGLE_BUSINESS_CAP,
    )
}

fn content_points(data: &AuditData) -> u8 {
    let c = &data.content;
    let days = c.days_since_last_post;
    category(
        &[
            (!c.has_blog, 5),
            (c.has_blog && days.is_some_and(|d| d > 180), 4),
            (c.has_blog && days.is_some_and(|d| d > 90 && d <= 180), 2),
        ],
        CONTENT_CAP,
    )
}

fn trust_points(data: &AuditData) -> u8 {
    category(
        &[
            (!data.trust.has_cookie_banner, 3),
            (!data.trust.has_privacy_policy, 2),
        ],
        TRUST_CAP,
    )
}

fn email_points(data: &AuditData) -> u8 {
    let e = &data.email_marketing;
    category(
        &[(!e.has_newsletter_form, 3), (e.email_provider.is_none(), 2)],
        EMAIL_CAP,
    )
}

/// Computes the opportunity score and its per-category breakdown.
///
/// Unknown tri-state checks (e.g. a sitemap that could not be probed) add no
/// points. Missing performance data must be the neutral defaults.
pub fn calculate_opportunity_score(data: &AuditData) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown {
        website: website_points(data),
        seo: seo_points(data),
        tracking: tracking_points(data),
        social: social_points(data),
        google_business: google_business_points(data),
        content: content_points(data),
        trust: trust_points(data),
        email_marketing: email_points(data),
        total: 0,
    };
    let sum = u32::from(breakdown.website)
        + u32::from(breakdown.seo)
        + u32::from(breakdown.tracking)
        + u32::from(breakdown.social)
        + u32::from(breakdown.google_business)
        + u32::from(breakdown.content)
        + u32::from(breakdown.trust)
        + u32::from(breakdown.email_marketing);
    breakdown.total = sum.min(u32::from(MAX_OPPORTUNITY_SCORE)) as u8;
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{ContentResult, PerformanceResult, SocialLink};
    use crate::models::Check;
    use proptest::prelude::*;

    /// A site with no deficiencies at all.
    fn healthy() -> AuditData {
        let mut data = AuditData {
            has_https: true,
            google_rating: Some(4.8),
            google_reviews_count: Some(200),
            ..Default::default()
        };
        data.performance = PerformanceResult {
            measured: true,
            performance_score: 95,
            lcp_ms: 1200,
            ..PerformanceResult::neutral()
        };
        data.trust.has_contact_form = true;
        data.trust.has_whatsapp = true;
        data.trust.has_cookie_banner = true;
        data.trust.has_privacy_policy = true;
        data.seo.has_meta_title = true;
        data.seo.has_meta_description = true;
        data.seo.h1_count = 1;
        data.seo.has_sitemap = Check::Present;
        data.seo.has_schema_markup = true;
        data.tracking.has_google_analytics = true;
        data.tracking.has_facebook_pixel = true;
        data.tracking.has_google_ads_tag = true;
        let found = SocialLink {
            found: true,
            url: Some("https://x".into()),
        };
        data.social.facebook = found.clone();
        data.social.instagram = found.clone();
        data.social.linkedin = found.clone();
        data.social.youtube = found;
        data.content = ContentResult {
            has_blog: true,
            days_since_last_post: Some(10),
            ..Default::default()
        };
        data.email_marketing.has_newsletter_form = true;
        data.email_marketing.email_provider = Some("Mailchimp".into());
        data
    }

    /// Deficiency toggles used by the property tests.
    const FLAG_COUNT: usize = 24;

    fn apply_flag(data: &mut AuditData, flag: usize) {
        match flag {
            0 => data.performance.performance_score = 40,
            1 => data.performance.is_mobile_friendly = false,
            2 => data.has_https = false,
            3 => data.trust.has_contact_form = false,
            4 => data.trust.has_whatsapp = false,
            5 => data.seo.has_meta_title = false,
            6 => data.seo.has_meta_description = false,
            7 => data.seo.h1_count = 0,
            8 => data.seo.has_sitemap = Check::Absent,
            9 => data.seo.has_schema_markup = false,
            10 => data.performance.lcp_ms = 5000,
            11 => data.tracking.has_google_analytics = false,
            12 => data.tracking.has_facebook_pixel = false,
            13 => data.tracking.has_google_ads_tag = false,
            14 => data.social.facebook = SocialLink::default(),
            15 => data.social.instagram = SocialLink::default(),
            16 => data.social.linkedin = SocialLink::default(),
            17 => data.social.youtube = SocialLink::default(),
            18 => data.google_rating = Some(3.2),
            19 => data.google_reviews_count = None,
            20 => data.content.days_since_last_post = Some(400),
            21 => data.trust.has_cookie_banner = false,
            22 => data.email_marketing.has_newsletter_form = false,
            23 => data.email_marketing.email_provider = None,
            _ => unreachable!("flag index out of range"),
        }
    }

    #[test]
    fn test_healthy_site_scores_zero() {
        let breakdown = calculate_opportunity_score(&healthy());
        assert_eq!(breakdown, ScoreBreakdown::default());
    }

    #[test]
    fn test_empty_site_is_capped_at_100() {
        let mut data = AuditData::default();
        data.performance.performance_score = 10;
        data.performance.is_mobile_friendly = false;
        data.performance.lcp_ms = 9000;
        data.seo.has_sitemap = Check::Absent;
        let breakdown = calculate_opportunity_score(&data);
        assert_eq!(breakdown.website, 25);
        assert_eq!(breakdown.seo, 25);
        assert_eq!(breakdown.tracking, 20);
        assert_eq!(breakdown.social, 10);
        assert_eq!(breakdown.google_business, 10);
        assert_eq!(breakdown.total, 100);
    }

    #[test]
    fn test_unknown_sitemap_is_not_penalized() {
        let mut data = healthy();
        data.seo.has_sitemap = Check::Unknown;
        assert_eq!(calculate_opportunity_score(&data).seo, 0);
        data.seo.has_sitemap = Check::Absent;
        assert_eq!(calculate_opportunity_score(&data).seo, 3);
    }

    #[test]
    fn test_neutral_performance_adds_website_tier() {
        let mut data = healthy();
        data.performance = PerformanceResult::neutral();
        let breakdown = calculate_opportunity_score(&data);
        // 50 falls in the 50..70 tier; neutral LCP 2500 is not penalized
        assert_eq!(breakdown.website, 5);
        assert_eq!(breakdown.seo, 0);
    }

    #[test]
    fn test_stale_blog_penalties() {
        let mut data = healthy();
        data.content.days_since_last_post = Some(200);
        assert_eq!(calculate_opportunity_score(&data).content, 4);
        data.content.days_since_last_post = Some(120);
        assert_eq!(calculate_opportunity_score(&data).content, 2);
        data.content.days_since_last_post = None;
        assert_eq!(calculate_opportunity_score(&data).content, 0);
        data.content = ContentResult::default();
        assert_eq!(calculate_opportunity_score(&data).content, 5);
    }

    #[test]
    fn test_google_business_tiers() {
        let mut data = healthy();
        data.google_rating = Some(4.2);
        data.google_reviews_count = Some(30);
        assert_eq!(calculate_opportunity_score(&data).google_business, 6);
        data.google_rating = None;
        data.google_reviews_count = None;
        assert_eq!(calculate_opportunity_score(&data).google_business, 10);
    }

    proptest! {
        #[test]
        fn prop_score_in_range(flags in proptest::collection::vec(any::<bool>(), FLAG_COUNT)) {
            let mut data = healthy();
            for (i, on) in flags.iter().enumerate() {
                if *on {
                    apply_flag(&mut data, i);
                }
            }
            let breakdown = calculate_opportunity_score(&data);
            prop_assert!(breakdown.total <= 100);
        }

        #[test]
        fn prop_score_monotonic_under_flag_flips(
            flags in proptest::collection::vec(any::<bool>(), FLAG_COUNT),
            extra in 0..FLAG_COUNT,
        ) {
            let mut before = healthy();
            for (i, on) in flags.iter().enumerate() {
                if *on {
                    apply_flag(&mut before, i);
                }
            }
            let mut after = before.clone();
            apply_flag(&mut after, extra);
            prop_assert!(
                calculate_opportunity_score(&after).total
                    >= calculate_opportunity_score(&before).total
            );
        }
    }
}
