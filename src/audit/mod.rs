//! Audit orchestration.
//!
//! One pipeline, three entry points:
//! - [`AuditEngine::audit_lead`]: synchronous, returns the final classification
//! - [`AuditEngine::stream_audit`]: emits one [`ProgressEvent`] per stage and
//!   stops at the next stage boundary once the consumer disconnects
//! - [`AuditEngine::run_batch`] / [`AuditEngine::run_sequential`]: fan out to
//!   the synchronous pipeline with a concurrency ceiling or a fixed delay
//!
//! The engine is the only component that changes a lead's audit status.
//! Network failures never end in `FAILED`: an unreachable homepage still
//! produces a `COMPLETED` audit with the fallback score.

mod batch;
mod progress;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::json;

use crate::ads::{
    evaluate_ads_evidence, lookup_search_presence, AdsEvidence, AdsSearchLookup, AdsSignals,
    SearchPresence,
};
use crate::app::{bare_host, is_non_business_website, validate_and_normalize_url};
use crate::classify::{classify, ClassifierInput};
use crate::config::{FETCH_FAILURE_SCORE, PAGESPEED_TIMEOUT};
use crate::detectors::{
    analyze_blog_freshness, analyze_markup, check_site_files, CoreWebVitals, PerformanceProbe,
    PerformanceResult, SeoResult,
};
use crate::error_handling::{AuditError, ErrorType, FetchError, InfoType, ProcessingStats, WarningType};
use crate::fetch::PageFetcher;
use crate::models::{AuditData, AuditOutcome, AuditRecord, AuditSnapshot, AuditStatus, Check, Lead};
use crate::scoring::{calculate_opportunity_score, ScoreBreakdown};
use crate::storage::LeadStore;
use crate::talking_points::{collect_issues, generate_outreach_script, generate_talking_points};
use crate::utils::sanitize_and_truncate_error_message;

pub use batch::{BatchFailure, BatchReport};
pub use progress::{BatchCollector, ChannelSink, NoopSink, ProgressEvent, ProgressSink, Stage};

/// Sequences fetch, detectors, scoring, classification and persistence.
///
/// Optional enrichments are capabilities injected at construction: `None`
/// means the probe is not configured and its neutral fallback is used.
pub struct AuditEngine {
    fetcher: PageFetcher,
    store: Arc<dyn LeadStore>,
    performance: Option<Arc<dyn PerformanceProbe>>,
    ads_lookup: Option<Arc<dyn AdsSearchLookup>>,
    stats: Arc<ProcessingStats>,
    performance_timeout: Duration,
}

/// Returns the normalized website of a lead, or `None` when it has no
/// auditable business site (missing, unparsable or a denylisted host).
pub fn business_website(lead: &Lead) -> Option<String> {
    let raw = lead.website.as_deref()?.trim();
    if raw.is_empty() || is_non_business_website(raw) {
        return None;
    }
    validate_and_normalize_url(raw)
}

impl AuditEngine {
    pub fn new(
        fetcher: PageFetcher,
        store: Arc<dyn LeadStore>,
        performance: Option<Arc<dyn PerformanceProbe>>,
        ads_lookup: Option<Arc<dyn AdsSearchLookup>>,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            fetcher,
            store,
            performance,
            ads_lookup,
            stats,
            performance_timeout: PAGESPEED_TIMEOUT,
        }
    }

    /// Overrides how long the performance probe may run before neutral
    /// values are used.
    pub fn with_performance_timeout(mut self, timeout: Duration) -> Self {
        self.performance_timeout = timeout;
        self
    }

    /// Counters shared by every audit run through this engine.
    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    pub fn has_performance_probe(&self) -> bool {
        self.performance.is_some()
    }

    pub fn has_ads_lookup(&self) -> bool {
        self.ads_lookup.is_some()
    }

    /// Audits one lead and returns its final classification.
    ///
    /// # Errors
    ///
    /// `LeadNotFound` for an unknown id and `Database` when the lead cannot be
    /// read or written. Fetch and probe failures are not errors.
    pub async fn audit_lead(&self, lead_id: i64) -> Result<AuditOutcome, AuditError> {
        self.run(lead_id, &NoopSink).await
    }

    /// Audits one lead while reporting every stage to `sink`.
    ///
    /// When the sink closes, the audit data computed so far is saved and the
    /// lead stays `RUNNING`. Any other unrecoverable error marks the lead
    /// `FAILED` and is reported as an `error` event.
    pub async fn stream_audit(
        &self,
        lead_id: i64,
        sink: &dyn ProgressSink,
    ) -> Result<AuditOutcome, AuditError> {
        match self.run(lead_id, sink).await {
            Ok(outcome) => Ok(outcome),
            Err(AuditError::Cancelled) => Err(AuditError::Cancelled),
            Err(e @ AuditError::LeadNotFound(_)) => {
                sink.emit(ProgressEvent::new(Stage::Error, e.to_string())).await;
                Err(e)
            }
            Err(e) => {
                error!("Lead {lead_id}: audit failed: {e}");
                if let Err(db) = self.store.set_status(lead_id, AuditStatus::Failed).await {
                    warn!("Lead {lead_id}: could not mark audit as FAILED: {db}");
                }
                sink.emit(
                    ProgressEvent::new(Stage::Error, format!("Analisi non riuscita: {e}"))
                        .with_data(json!({ "status": AuditStatus::Failed })),
                )
                .await;
                Err(e)
            }
        }
    }

    /// The shared pipeline behind every entry point.
    async fn run(&self, lead_id: i64, sink: &dyn ProgressSink) -> Result<AuditOutcome, AuditError> {
        let lead = self
            .store
            .get_lead(lead_id)
            .await?
            .ok_or(AuditError::LeadNotFound(lead_id))?;

        let Some(website) = business_website(&lead) else {
            info!(
                "Lead {lead_id}: no business website ({:?}), marking NO_WEBSITE",
                lead.website
            );
            self.stats.increment_info(InfoType::NoWebsite);
            self.store.set_status(lead_id, AuditStatus::NoWebsite).await?;
            let outcome = AuditOutcome::no_website(lead_id);
            sink.emit(
                ProgressEvent::new(Stage::Complete, "Nessun sito web aziendale da analizzare")
                    .with_data(json!(outcome)),
            )
            .await;
            return Ok(outcome);
        };

        self.store.set_status(lead_id, AuditStatus::Running).await?;
        info!("🔎 Lead {lead_id}: auditing {website}");

        let snapshot = AuditSnapshot::from_lead(&lead, website);
        let mut data = AuditData::for_snapshot(&snapshot);

        let page = match self.fetcher.fetch_page(&snapshot.website).await {
            Ok(page) => page,
            Err(e) => return self.complete_without_page(lead_id, &snapshot, data, e, sink).await,
        };
        data.final_url = Some(page.final_url.clone());
        data.has_https = page.final_url.to_ascii_lowercase().starts_with("https://");
        sink.emit(
            ProgressEvent::new(Stage::Fetch, "Homepage scaricata").with_data(json!({
                "finalUrl": page.final_url,
                "status": page.status,
                "hasHttps": data.has_https,
            })),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        let mut markup = analyze_markup(&page.html, &page.final_url, page.powered_by.as_deref());

        let (sitemap, robots) = check_site_files(&self.fetcher, &page.final_url).await;
        if sitemap == Check::Unknown || robots == Check::Unknown {
            self.stats.increment_error(ErrorType::SiteFileCheckError);
        }
        data.seo = std::mem::take(&mut markup.seo);
        data.seo.has_sitemap = sitemap;
        data.seo.has_robots_txt = robots;
        self.record_seo_warnings(&data.seo);
        sink.emit(
            ProgressEvent::new(Stage::Seo, "Analisi SEO completata").with_data(json!({
                "hasMetaTitle": data.seo.has_meta_title,
                "hasMetaDescription": data.seo.has_meta_description,
                "h1Count": data.seo.h1_count,
                "hasSitemap": data.seo.has_sitemap,
                "hasRobotsTxt": data.seo.has_robots_txt,
                "hasSchemaMarkup": data.seo.has_schema_markup,
            })),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        data.tracking = std::mem::take(&mut markup.tracking);
        sink.emit(
            ProgressEvent::new(Stage::Tracking, "Analisi tracciamento completata").with_data(
                json!({
                    "hasGoogleAnalytics": data.tracking.has_google_analytics,
                    "hasGtm": data.tracking.has_gtm,
                    "hasFacebookPixel": data.tracking.has_facebook_pixel,
                    "hasGoogleAdsTag": data.tracking.has_google_ads_tag,
                    "hasGoogleAdsConversion": data.tracking.has_google_ads_conversion,
                    "hasConsentModeV2": data.tracking.has_consent_mode_v2,
                }),
            ),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        data.social = std::mem::take(&mut markup.social);
        sink.emit(
            ProgressEvent::new(Stage::Social, "Analisi social completata")
                .with_data(json!({ "platformsFound": data.social.platforms_found() })),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        data.trust = std::mem::take(&mut markup.trust);
        data.commercial = std::mem::take(&mut markup.commercial);
        sink.emit(
            ProgressEvent::new(Stage::Trust, "Analisi fiducia e contatti completata").with_data(
                json!({
                    "hasCookieBanner": data.trust.has_cookie_banner,
                    "hasPrivacyPolicy": data.trust.has_privacy_policy,
                    "hasContactForm": data.trust.has_contact_form,
                    "ctaClear": data.commercial.cta_clear,
                    "offerFocused": data.commercial.offer_focused,
                }),
            ),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        data.email_marketing = std::mem::take(&mut markup.email_marketing);
        sink.emit(
            ProgressEvent::new(Stage::Email, "Analisi email marketing completata").with_data(
                json!({
                    "hasNewsletterForm": data.email_marketing.has_newsletter_form,
                    "emailProvider": data.email_marketing.email_provider,
                }),
            ),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        data.tech = std::mem::take(&mut markup.tech);
        sink.emit(
            ProgressEvent::new(Stage::Tech, "Analisi tecnologia completata").with_data(json!({
                "cms": data.tech.cms,
                "isOutdated": data.tech.is_outdated,
            })),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        let domain = bare_host(&page.final_url)
            .or_else(|| bare_host(&snapshot.website))
            .unwrap_or_default();
        let today = Utc::now().date_naive();
        let (performance, content, presence) = tokio::join!(
            self.measure_performance(&page.final_url),
            analyze_blog_freshness(&self.fetcher, markup.blog_url.take(), today),
            self.search_presence(&domain, &snapshot.brand_name_hint),
        );
        if content.blog_fetch_failed {
            self.stats.increment_error(ErrorType::BlogFetchError);
        } else if content.has_blog && content.last_post_date.is_none() {
            self.stats.increment_warning(WarningType::MissingBlogDate);
        }
        data.seo.core_web_vitals = CoreWebVitals {
            lcp_ms: performance.lcp_ms,
            fid_ms: performance.tbt_ms,
            cls: performance.cls,
            measured: performance.measured,
        };
        data.performance = performance;
        data.content = content;
        sink.emit(
            ProgressEvent::new(Stage::Pagespeed, "Prestazioni e contenuti analizzati").with_data(
                json!({
                    "measured": data.performance.measured,
                    "performanceScore": data.performance.performance_score,
                    "isMobileFriendly": data.performance.is_mobile_friendly,
                    "hasBlog": data.content.has_blog,
                    "daysSinceLastPost": data.content.days_since_last_post,
                }),
            ),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&data.tracking, presence));
        self.finish(lead_id, data, evidence, sink).await
    }

    /// Completes an audit whose homepage could not be fetched.
    ///
    /// Detector sections stay at their defaults, the score is the fixed
    /// fallback and the failure is listed in `issues`. Ads evidence still
    /// uses the paid-search lookup when configured.
    async fn complete_without_page(
        &self,
        lead_id: i64,
        snapshot: &AuditSnapshot,
        mut data: AuditData,
        err: FetchError,
        sink: &dyn ProgressSink,
    ) -> Result<AuditOutcome, AuditError> {
        let message = sanitize_and_truncate_error_message(&err.to_string());
        warn!(
            "Lead {lead_id}: homepage fetch failed for {} ({message}), completing with partial audit",
            snapshot.website
        );
        self.stats.increment_error(err.error_type());
        self.stats.increment_info(InfoType::PartialAudit);

        data.fetch_error = Some(message.clone());
        sink.emit(
            ProgressEvent::new(Stage::Fetch, format!("Sito non raggiungibile: {message}"))
                .with_data(json!({ "error": message })),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        let domain = bare_host(&snapshot.website).unwrap_or_default();
        let presence = self.search_presence(&domain, &snapshot.brand_name_hint).await;
        let evidence = evaluate_ads_evidence(AdsSignals::from_tracking(&data.tracking, presence));
        self.finish(lead_id, data, evidence, sink).await
    }

    /// Scores, classifies, writes the talking points and persists the result.
    async fn finish(
        &self,
        lead_id: i64,
        mut data: AuditData,
        evidence: AdsEvidence,
        sink: &dyn ProgressSink,
    ) -> Result<AuditOutcome, AuditError> {
        data.score_breakdown = if data.is_partial() {
            ScoreBreakdown {
                total: FETCH_FAILURE_SCORE,
                ..Default::default()
            }
        } else {
            calculate_opportunity_score(&data)
        };
        let score = data.score_breakdown.total;

        let input = ClassifierInput {
            ads_evidence: evidence.level,
            tracking_present: data.tracking.tracking_present(),
            cta_clear: data.commercial.cta_clear,
            offer_focused: data.commercial.offer_focused,
            consent_mode_v2: data.tracking.has_consent_mode_v2,
        };
        let classification = classify(&input);
        debug!(
            "Lead {lead_id}: ads evidence {} -> {}",
            evidence.level, classification.tag
        );

        data.issues = collect_issues(&data);
        let talking_points = generate_talking_points(&data);
        let outreach_script = generate_outreach_script(&data, classification.tag);
        let commercial_signals = json!({
            "classifierInput": input,
            "adsEvidence": evidence,
            "landing": data.commercial,
        });
        data.ads_evidence = Some(evidence);
        let completed_at = Utc::now();
        data.audited_at = Some(completed_at);

        sink.emit(
            ProgressEvent::new(Stage::Score, format!("Punteggio opportunità: {score}/100"))
                .with_data(json!({
                    "opportunityScore": score,
                    "scoreBreakdown": data.score_breakdown,
                    "commercialTag": classification.tag,
                    "commercialPriority": classification.priority,
                    "isCallable": classification.is_callable,
                })),
        )
        .await;
        self.checkpoint(lead_id, &data, sink).await?;

        let record = AuditRecord {
            status: AuditStatus::Completed,
            completed_at,
            opportunity_score: score,
            audit_data: data,
            talking_points,
            outreach_script,
            classification,
            commercial_signals,
        };
        if let Err(e) = self.store.save_result(lead_id, &record).await {
            self.stats.increment_error(ErrorType::PersistenceError);
            return Err(e.into());
        }
        sink.emit(ProgressEvent::new(Stage::Save, "Risultati salvati")).await;

        let outcome = AuditOutcome::from_record(lead_id, &record);
        info!(
            "✅ Lead {lead_id}: COMPLETED score={score} tag={} priority={}",
            record.classification.tag, record.classification.priority
        );
        sink.emit(
            ProgressEvent::new(Stage::Complete, "Analisi completata").with_data(json!(outcome)),
        )
        .await;
        Ok(outcome)
    }

    /// Stops the pipeline once the progress consumer is gone.
    ///
    /// The data computed so far is saved; the status is left `RUNNING`.
    async fn checkpoint(
        &self,
        lead_id: i64,
        data: &AuditData,
        sink: &dyn ProgressSink,
    ) -> Result<(), AuditError> {
        if !sink.is_closed() {
            return Ok(());
        }
        info!("Lead {lead_id}: client disconnected, saving partial audit (status stays RUNNING)");
        self.stats.increment_info(InfoType::AuditCancelled);
        self.store.save_partial(lead_id, data).await?;
        Err(AuditError::Cancelled)
    }

    /// Runs the performance probe, falling back to neutral values.
    async fn measure_performance(&self, url: &str) -> PerformanceResult {
        let Some(probe) = &self.performance else {
            self.stats.increment_info(InfoType::PerformanceProbeSkipped);
            return PerformanceResult::neutral();
        };
        match tokio::time::timeout(self.performance_timeout, probe.analyze(url)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Performance probe failed for {url}: {e:#}");
                self.stats.increment_error(ErrorType::PerformanceProbeError);
                PerformanceResult::neutral()
            }
            Err(_) => {
                warn!("Performance probe timed out for {url}");
                self.stats.increment_error(ErrorType::PerformanceProbeError);
                PerformanceResult::neutral()
            }
        }
    }

    async fn search_presence(&self, domain: &str, brand: &str) -> SearchPresence {
        if domain.is_empty() {
            return SearchPresence::Skipped;
        }
        let presence = lookup_search_presence(self.ads_lookup.as_ref(), domain, brand).await;
        match presence {
            SearchPresence::Skipped => self.stats.increment_info(InfoType::AdsLookupSkipped),
            SearchPresence::Failed => self.stats.increment_error(ErrorType::AdsLookupError),
            _ => {}
        }
        presence
    }

    fn record_seo_warnings(&self, seo: &SeoResult) {
        if !seo.has_meta_title {
            self.stats.increment_warning(WarningType::MissingTitle);
        }
        if !seo.has_meta_description {
            self.stats.increment_warning(WarningType::MissingMetaDescription);
        }
        if seo.h1_count == 0 {
            self.stats.increment_warning(WarningType::MissingH1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(website: Option<&str>) -> Lead {
        Lead {
            id: 1,
            name: "Studio Rossi".into(),
            website: website.map(str::to_string),
            google_rating: None,
            google_reviews_count: None,
            search_id: None,
            audit_status: AuditStatus::Pending,
        }
    }

    #[test]
    fn test_business_website_normalizes() {
        assert_eq!(
            business_website(&lead(Some(" studiorossi.it "))),
            Some("https://studiorossi.it".to_string())
        );
    }

    #[test]
    fn test_business_website_rejects_missing_and_denylisted() {
        assert_eq!(business_website(&lead(None)), None);
        assert_eq!(business_website(&lead(Some("   "))), None);
        assert_eq!(
            business_website(&lead(Some("https://www.facebook.com/studiorossi"))),
            None
        );
        assert_eq!(business_website(&lead(Some("wa.me/393331234567"))), None);
        assert_eq!(business_website(&lead(Some("http://example.com"))), None);
    }
}
