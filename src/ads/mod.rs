//! Ads-evidence engine.
//!
//! Combines landing-page tag signals with an optional paid-search lookup into
//! a four-level confidence that the business is paying for online ads.
//!
//! Decision order (first match wins):
//! 1. Confirmed paid-search presence or conversion tracking → `strong`
//! 2. Two or more indirect tag signals → `medium`
//! 3. Exactly one indirect tag signal → `weak`
//! 4. Tag Manager container alone → `weak`
//! 5. Otherwise → `none`

mod search;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::detectors::TrackingResult;

pub use search::{lookup_search_presence, AdsSearchLookup, SerpApiLookup};

/// Confidence that the business is running paid advertising.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdsLevel {
    Strong,
    Medium,
    Weak,
    #[default]
    None,
}

impl AdsLevel {
    /// `strong` or `medium`.
    pub fn is_established(&self) -> bool {
        matches!(self, AdsLevel::Strong | AdsLevel::Medium)
    }
}

/// Outcome of the optional paid-search lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPresence {
    /// The domain appears among paid results for the brand
    Confirmed,
    /// Lookup ran and found no paid result for the domain
    NotFound,
    /// Lookup not configured or disabled
    #[default]
    Skipped,
    /// Lookup errored or timed out; evidence is landing-page only
    Failed,
}

/// Raw inputs of the evidence decision, persisted for auditability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdsSignals {
    pub google_ads_tag: bool,
    pub remarketing: bool,
    pub facebook_pixel: bool,
    pub gclid: bool,
    pub fbclid: bool,
    pub conversion_linker: bool,
    pub linkedin_insight: bool,
    pub tiktok_pixel: bool,
    pub tag_manager: bool,
    pub conversion_tracking: bool,
    pub search_presence: SearchPresence,
}

impl AdsSignals {
    /// Collects the ad-related signals from the tracking detector.
    pub fn from_tracking(tracking: &TrackingResult, search_presence: SearchPresence) -> Self {
        Self {
            google_ads_tag: tracking.has_google_ads_tag,
            remarketing: tracking.has_remarketing,
            facebook_pixel: tracking.has_facebook_pixel,
            gclid: tracking.has_gclid,
            fbclid: tracking.has_fbclid,
            conversion_linker: tracking.has_conversion_linker,
            linkedin_insight: tracking.has_linkedin_insight,
            tiktok_pixel: tracking.has_tiktok_pixel,
            tag_manager: tracking.has_gtm,
            conversion_tracking: tracking.has_google_ads_conversion,
            search_presence,
        }
    }

    /// Names of the indirect signals that are set. Tag Manager is not one of them.
    pub fn indirect_signals(&self) -> Vec<&'static str> {
        [
            (self.google_ads_tag, "tag Google Ads"),
            (self.remarketing, "remarketing Google"),
            (self.facebook_pixel, "Meta Pixel"),
            (self.gclid, "parametro gclid"),
            (self.fbclid, "parametro fbclid"),
            (self.conversion_linker, "conversion linker"),
            (self.linkedin_insight, "LinkedIn Insight Tag"),
            (self.tiktok_pixel, "TikTok Pixel"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| name)
        .collect()
    }
}

/// Ads-evidence verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdsEvidence {
    pub level: AdsLevel,
    pub reason: String,
    pub raw_signals: AdsSignals,
}

/// Applies the evidence rule table to a set of signals.
pub fn evaluate_ads_evidence(signals: AdsSignals) -> AdsEvidence {
    let indirect = signals.indirect_signals();

    let (level, reason) = if signals.search_presence == SearchPresence::Confirmed {
        (
            AdsLevel::Strong,
            "Presenza confermata tra gli annunci a pagamento di Google".to_string(),
        )
    } else if signals.conversion_tracking {
        (
            AdsLevel::Strong,
            "Tracciamento conversioni Google Ads attivo sul sito".to_string(),
        )
    } else if indirect.len() >= 2 {
        (
            AdsLevel::Medium,
            format!(
                "{} segnali pubblicitari indiretti: {}",
                indirect.len(),
                indirect.join(", ")
            ),
        )
    } else if indirect.len() == 1 {
        (
            AdsLevel::Weak,
            format!("Un solo segnale pubblicitario: {}", indirect[0]),
        )
    } else if signals.tag_manager {
        (
            AdsLevel::Weak,
            "Solo Google Tag Manager presente, nessun tag pubblicitario specifico".to_string(),
        )
    } else {
        (
            AdsLevel::None,
            "Nessun segnale di pubblicità a pagamento".to_string(),
        )
    };

    log::debug!("Ads evidence: {level} ({reason})");
    AdsEvidence {
        level,
        reason,
        raw_signals: signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracking() -> TrackingResult {
        TrackingResult::default()
    }

    #[test]
    fn test_no_signals_is_none() {
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(
            &tracking(),
            SearchPresence::Skipped,
        ));
        assert_eq!(evidence.level, AdsLevel::None);
    }

    #[test]
    fn test_confirmed_search_presence_is_strong() {
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(
            &tracking(),
            SearchPresence::Confirmed,
        ));
        assert_eq!(evidence.level, AdsLevel::Strong);
    }

    #[test]
    fn test_conversion_tracking_is_strong() {
        let t = TrackingResult {
            has_google_ads_conversion: true,
            ..tracking()
        };
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&t, SearchPresence::NotFound));
        assert_eq!(evidence.level, AdsLevel::Strong);
    }

    #[test]
    fn test_pixel_and_ads_tag_is_medium() {
        let t = TrackingResult {
            has_facebook_pixel: true,
            has_google_ads_tag: true,
            ..tracking()
        };
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&t, SearchPresence::Skipped));
        assert_eq!(evidence.level, AdsLevel::Medium);
        assert!(evidence.reason.contains("Meta Pixel"));
        assert!(evidence.reason.contains("tag Google Ads"));
    }

    #[test]
    fn test_single_signal_is_weak() {
        let t = TrackingResult {
            has_fbclid: true,
            ..tracking()
        };
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&t, SearchPresence::Skipped));
        assert_eq!(evidence.level, AdsLevel::Weak);
    }

    #[test]
    fn test_gtm_alone_is_weak_even_when_search_finds_nothing() {
        let t = TrackingResult {
            has_gtm: true,
            gtm_id: Some("GTM-XXXXXX".into()),
            ..tracking()
        };
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&t, SearchPresence::NotFound));
        assert_eq!(evidence.level, AdsLevel::Weak);
        assert!(evidence.reason.contains("Tag Manager"));
    }

    #[test]
    fn test_gtm_does_not_count_as_indirect_signal() {
        let t = TrackingResult {
            has_gtm: true,
            has_facebook_pixel: true,
            ..tracking()
        };
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&t, SearchPresence::Skipped));
        assert_eq!(evidence.level, AdsLevel::Weak);
    }

    #[test]
    fn test_level_wire_names() {
        assert_eq!(AdsLevel::Strong.as_ref(), "strong");
        assert_eq!(
            serde_json::to_string(&AdsLevel::None).expect("serializes"),
            "\"none\""
        );
        assert!(AdsLevel::Medium.is_established());
        assert!(!AdsLevel::Weak.is_established());
    }
}
