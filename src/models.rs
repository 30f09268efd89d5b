//! Domain types shared across the audit pipeline.
//!
//! Leads come in from the lead store, an [`AuditSnapshot`] is the immutable
//! input of one audit, and [`AuditData`] is the closed, versioned record that
//! gets persisted as the audit payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::ads::AdsEvidence;
use crate::config::AUDIT_DATA_SCHEMA_VERSION;
use crate::detectors::{
    CommercialSignals, ContentResult, EmailMarketingResult, PerformanceResult, SeoResult,
    SocialResult, TechStackResult, TrackingResult, TrustResult,
};
use crate::scoring::ScoreBreakdown;

/// Lead record as provided by the lead store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub google_rating: Option<f64>,
    pub google_reviews_count: Option<i64>,
    /// Search batch the lead was imported with
    pub search_id: Option<i64>,
    pub audit_status: AuditStatus,
}

/// Immutable input of a single audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    /// Normalized website URL (always carries a scheme)
    pub website: String,
    pub google_rating: Option<f64>,
    pub google_reviews_count: Option<i64>,
    /// Business name used to query paid search results
    pub brand_name_hint: String,
}

impl AuditSnapshot {
    /// Builds the snapshot for a lead whose website has already been normalized.
    pub fn from_lead(lead: &Lead, website: String) -> Self {
        Self {
            website,
            google_rating: lead.google_rating,
            google_reviews_count: lead.google_reviews_count,
            brand_name_hint: lead.name.trim().to_string(),
        }
    }
}

/// Audit lifecycle.
///
/// `PENDING → RUNNING → {COMPLETED | FAILED | NO_WEBSITE}`. Only the audit
/// engine moves a lead between states.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    NoWebsite,
}

/// Commercial qualification of a lead.
///
/// Exactly one tag is assigned per audit. `DaApprofondire` is reserved for
/// manual escalation by the sales pipeline; the classifier never emits it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CommercialTag {
    /// Ads running, nothing measuring them
    AdsAttiveControlloAssente,
    /// Paid traffic lands on a site without a clear conversion path
    TrafficoSenzaDirezione,
    /// Technically fine but the offer is generic
    StrutturaOkNonPrioritizzata,
    /// No evidence of advertising spend
    NonTarget,
    DaApprofondire,
}

impl CommercialTag {
    /// Outreach priority: 1 is the most urgent call.
    pub fn priority(&self) -> u8 {
        match self {
            CommercialTag::AdsAttiveControlloAssente => 1,
            CommercialTag::TrafficoSenzaDirezione => 2,
            CommercialTag::DaApprofondire => 2,
            CommercialTag::StrutturaOkNonPrioritizzata => 3,
            CommercialTag::NonTarget => 4,
        }
    }

    /// Every tag except `NON_TARGET` is worth a call.
    pub fn is_callable(&self) -> bool {
        !matches!(self, CommercialTag::NonTarget)
    }
}

/// Result of a check that may not have run.
///
/// `Unknown` keeps "the probe failed" apart from "the thing is missing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Present,
    Absent,
    #[default]
    Unknown,
}

impl Check {
    /// True only when the check ran and found nothing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Check::Absent)
    }
}

/// Aggregate audit payload persisted for a lead.
///
/// Sections default individually, so snapshots written by an older schema
/// version still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditData {
    pub schema_version: u32,
    pub website: String,
    /// URL after redirects, when the homepage was reached
    pub final_url: Option<String>,
    pub has_https: bool,
    /// Set when the homepage could not be fetched; detector sections are then defaults
    pub fetch_error: Option<String>,
    pub seo: SeoResult,
    pub tracking: TrackingResult,
    pub social: SocialResult,
    pub trust: TrustResult,
    pub content: ContentResult,
    pub email_marketing: EmailMarketingResult,
    pub tech: TechStackResult,
    pub performance: PerformanceResult,
    pub commercial: CommercialSignals,
    pub ads_evidence: Option<AdsEvidence>,
    pub score_breakdown: ScoreBreakdown,
    pub google_rating: Option<f64>,
    pub google_reviews_count: Option<i64>,
    /// Flattened human-readable findings
    pub issues: Vec<String>,
    pub audited_at: Option<DateTime<Utc>>,
}

impl Default for AuditData {
    fn default() -> Self {
        Self {
            schema_version: AUDIT_DATA_SCHEMA_VERSION,
            website: String::new(),
            final_url: None,
            has_https: false,
            fetch_error: None,
            seo: SeoResult::default(),
            tracking: TrackingResult::default(),
            social: SocialResult::default(),
            trust: TrustResult::default(),
            content: ContentResult::default(),
            email_marketing: EmailMarketingResult::default(),
            tech: TechStackResult::default(),
            performance: PerformanceResult::default(),
            commercial: CommercialSignals::default(),
            ads_evidence: None,
            score_breakdown: ScoreBreakdown::default(),
            google_rating: None,
            google_reviews_count: None,
            issues: Vec::new(),
            audited_at: None,
        }
    }
}

impl AuditData {
    /// Starts a record for a snapshot, echoing the Google business fields.
    pub fn for_snapshot(snapshot: &AuditSnapshot) -> Self {
        Self {
            website: snapshot.website.clone(),
            has_https: snapshot.website.to_ascii_lowercase().starts_with("https://"),
            google_rating: snapshot.google_rating,
            google_reviews_count: snapshot.google_reviews_count,
            ..Default::default()
        }
    }

    /// Whether the homepage was unreachable and the record is a fallback.
    pub fn is_partial(&self) -> bool {
        self.fetch_error.is_some()
    }
}

/// Three-block outreach script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachScript {
    pub compliment: String,
    pub problems: Vec<ProblemBlock>,
    pub call_to_action: String,
}

/// One problem argument of the outreach script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemBlock {
    pub area: String,
    pub problem: String,
    pub impact: String,
}

/// Classifier verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub tag: CommercialTag,
    pub reason: String,
    pub priority: u8,
    pub is_callable: bool,
}

/// Everything written back to the lead when an audit completes.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub status: AuditStatus,
    pub completed_at: DateTime<Utc>,
    pub opportunity_score: u8,
    pub audit_data: AuditData,
    pub talking_points: Vec<String>,
    pub outreach_script: OutreachScript,
    pub classification: Classification,
    /// Classifier inputs and ads evidence, persisted as JSON
    pub commercial_signals: serde_json::Value,
}

/// Final result returned by every entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutcome {
    pub lead_id: i64,
    pub status: AuditStatus,
    pub opportunity_score: Option<u8>,
    pub commercial_tag: Option<CommercialTag>,
    pub commercial_priority: Option<u8>,
    pub is_callable: Option<bool>,
    pub reason: Option<String>,
}

impl AuditOutcome {
    /// Outcome for a lead short-circuited before any fetch.
    pub fn no_website(lead_id: i64) -> Self {
        Self {
            lead_id,
            status: AuditStatus::NoWebsite,
            opportunity_score: None,
            commercial_tag: None,
            commercial_priority: None,
            is_callable: None,
            reason: None,
        }
    }

    pub fn from_record(lead_id: i64, record: &AuditRecord) -> Self {
        Self {
            lead_id,
            status: record.status,
            opportunity_score: Some(record.opportunity_score),
            commercial_tag: Some(record.classification.tag),
            commercial_priority: Some(record.classification.priority),
            is_callable: Some(record.classification.is_callable),
            reason: Some(record.classification.reason.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(AuditStatus::NoWebsite.to_string(), "NO_WEBSITE");
        assert_eq!(
            AuditStatus::from_str("RUNNING").ok(),
            Some(AuditStatus::Running)
        );
    }

    #[test]
    fn test_tag_wire_names() {
        assert_eq!(
            CommercialTag::AdsAttiveControlloAssente.as_ref(),
            "ADS_ATTIVE_CONTROLLO_ASSENTE"
        );
        assert_eq!(
            serde_json::to_string(&CommercialTag::StrutturaOkNonPrioritizzata)
                .expect("tag serializes"),
            "\"STRUTTURA_OK_NON_PRIORITIZZATA\""
        );
        assert_eq!(
            CommercialTag::from_str("DA_APPROFONDIRE").ok(),
            Some(CommercialTag::DaApprofondire)
        );
    }

    #[test]
    fn test_only_non_target_is_not_callable() {
        for tag in CommercialTag::iter() {
            assert_eq!(tag.is_callable(), tag != CommercialTag::NonTarget);
            assert!((1..=4).contains(&tag.priority()));
        }
    }

    #[test]
    fn test_audit_data_decodes_older_snapshot() {
        let old = r#"{"schemaVersion":1,"website":"https://studio.it","issues":["x"]}"#;
        let data: AuditData = serde_json::from_str(old).expect("old snapshot decodes");
        assert_eq!(data.schema_version, 1);
        assert_eq!(data.issues, vec!["x".to_string()]);
        assert_eq!(data.seo, SeoResult::default());
    }

    #[test]
    fn test_snapshot_echoes_google_fields() {
        let lead = Lead {
            id: 1,
            name: " Pizzeria Mario ".into(),
            website: Some("pizzeria.it".into()),
            google_rating: Some(4.6),
            google_reviews_count: Some(120),
            search_id: None,
            audit_status: AuditStatus::Pending,
        };
        let snapshot = AuditSnapshot::from_lead(&lead, "https://pizzeria.it".into());
        assert_eq!(snapshot.brand_name_hint, "Pizzeria Mario");
        let data = AuditData::for_snapshot(&snapshot);
        assert!(data.has_https);
        assert_eq!(data.google_reviews_count, Some(120));
    }
}
