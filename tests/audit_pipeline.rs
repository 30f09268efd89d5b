// End-to-end tests of the audit pipeline against mock websites.
//
// Each test serves a small site from wiremock, audits a lead pointing at it
// and checks both the returned outcome and what was persisted.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{
    create_test_store, html_page, insert_lead, lead_column, lead_status, mount_page, test_engine,
    CONTACT_LINKS, GTM_SNIPPET, SEO_HEAD,
};
use lead_audit::ads::{AdsLevel, AdsSearchLookup, SearchPresence, SerpApiLookup};
use lead_audit::audit::{BatchCollector, ChannelSink};
use lead_audit::detectors::{PerformanceProbe, PerformanceResult};
use lead_audit::fetch::PageFetcher;
use lead_audit::models::{AuditData, AuditRecord, Lead};
use lead_audit::storage::{LeadStore, SqliteLeadStore};
use lead_audit::{
    AuditEngine, AuditError, AuditStatus, CommercialTag, DatabaseError, ErrorType, InfoType,
    ProcessingStats, ProgressEvent, ProgressSink, Stage,
};

#[tokio::test]
async fn test_sync_audit_completes_and_persists() {
    let server = MockServer::start().await;
    let body = format!("<h1>Studio Dentistico Rossi</h1>{GTM_SNIPPET}{CONTACT_LINKS}");
    mount_page(&server, "/", html_page(SEO_HEAD, &body)).await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 5, None);

    let outcome = engine.audit_lead(lead_id).await.expect("audit should succeed");

    assert_eq!(outcome.lead_id, lead_id);
    assert_eq!(outcome.status, AuditStatus::Completed);
    assert!(outcome.opportunity_score.is_some());
    assert!(outcome.commercial_tag.is_some());
    assert_eq!(lead_status(&store, lead_id).await, AuditStatus::Completed);

    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("audit data saved");
    assert!(data.final_url.as_deref().unwrap_or("").starts_with(&server.uri()));
    assert!(data.seo.has_meta_title);
    assert!(data.seo.has_meta_description);
    assert_eq!(data.seo.h1_count, 1);
    assert!(data.tracking.has_gtm);
    assert!(!data.performance.measured);
    assert!(data.audited_at.is_some());
    assert!(data.ads_evidence.is_some());

    assert!(lead_column(&store, lead_id, "talking_points").await.is_some());
    assert!(lead_column(&store, lead_id, "outreach_script").await.is_some());
    assert!(lead_column(&store, lead_id, "audit_completed_at").await.is_some());
    assert_eq!(
        engine.stats().get_info_count(InfoType::PerformanceProbeSkipped),
        1
    );
}

#[tokio::test]
async fn test_unknown_lead_is_not_found() {
    let store = create_test_store().await;
    let engine = test_engine(store, 5, None);

    let err = engine.audit_lead(9_999).await.expect_err("lead does not exist");
    assert!(matches!(err, AuditError::LeadNotFound(9_999)));
}

#[tokio::test]
async fn test_denylisted_website_short_circuits_without_fetch() {
    let store = create_test_store().await;
    let social = insert_lead(
        &store,
        "Pizzeria Da Mario",
        Some("https://www.facebook.com/pizzeriadamario"),
        None,
    )
    .await;
    let missing = insert_lead(&store, "Bar Centrale", None, None).await;
    let engine = test_engine(store.clone(), 5, None);

    let collector = BatchCollector::new();
    let outcome = engine
        .stream_audit(social, &collector)
        .await
        .expect("short-circuit is not an error");
    assert_eq!(outcome.status, AuditStatus::NoWebsite);
    assert_eq!(outcome.opportunity_score, None);
    assert_eq!(outcome.commercial_tag, None);
    let stages: Vec<Stage> = collector.into_events().iter().map(|e| e.stage).collect();
    assert_eq!(stages, vec![Stage::Complete]);

    let outcome = engine.audit_lead(missing).await.expect("short-circuit is not an error");
    assert_eq!(outcome.status, AuditStatus::NoWebsite);

    assert_eq!(lead_status(&store, social).await, AuditStatus::NoWebsite);
    assert_eq!(lead_status(&store, missing).await, AuditStatus::NoWebsite);
    assert_eq!(engine.stats().get_info_count(InfoType::NoWebsite), 2);
    assert_eq!(engine.stats().total_errors(), 0);
    assert!(lead_column(&store, social, "audit_data").await.is_none());
}

#[tokio::test]
async fn test_stream_emits_stages_in_order() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page(SEO_HEAD, &format!("<h1>Studio Rossi</h1>{CONTACT_LINKS}")),
    )
    .await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let engine = test_engine(store, 5, None);

    let collector = BatchCollector::new();
    engine
        .stream_audit(lead_id, &collector)
        .await
        .expect("audit should succeed");

    let events = collector.into_events();
    let stages: Vec<Stage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Fetch,
            Stage::Seo,
            Stage::Tracking,
            Stage::Social,
            Stage::Trust,
            Stage::Email,
            Stage::Tech,
            Stage::Pagespeed,
            Stage::Score,
            Stage::Save,
            Stage::Complete,
        ]
    );
    assert!(events.iter().all(|e| !e.message.is_empty()));
    assert_eq!(events[1].data["hasMetaTitle"], json!(true));
    assert_eq!(events[10].data["status"], json!("COMPLETED"));
}

/// Sink that reports itself closed once `close_after` events were emitted.
struct DisconnectingSink {
    emitted: AtomicUsize,
    close_after: usize,
}

#[async_trait]
impl ProgressSink for DisconnectingSink {
    async fn emit(&self, _event: ProgressEvent) {
        self.emitted.fetch_add(1, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.emitted.load(Ordering::SeqCst) >= self.close_after
    }
}

#[tokio::test]
async fn test_disconnect_saves_partial_data_and_stays_running() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page(SEO_HEAD, &format!("<h1>Studio Rossi</h1>{GTM_SNIPPET}")),
    )
    .await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 5, None);

    // Closes right after the seo event
    let sink = DisconnectingSink {
        emitted: AtomicUsize::new(0),
        close_after: 2,
    };
    let err = engine
        .stream_audit(lead_id, &sink)
        .await
        .expect_err("audit should stop");

    assert!(matches!(err, AuditError::Cancelled));
    assert_eq!(lead_status(&store, lead_id).await, AuditStatus::Running);
    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("partial data saved");
    assert!(data.seo.has_meta_title);
    assert!(!data.tracking.has_gtm, "tracking stage never ran");
    assert!(lead_column(&store, lead_id, "commercial_tag").await.is_none());
    assert_eq!(engine.stats().get_info_count(InfoType::AuditCancelled), 1);
}

#[tokio::test]
async fn test_dropped_receiver_cancels_after_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page(SEO_HEAD, "<h1>Studio Rossi</h1>")).await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 5, None);

    let (tx, rx) = mpsc::channel(8);
    drop(rx);
    let sink = ChannelSink::new(tx);
    let err = engine
        .stream_audit(lead_id, &sink)
        .await
        .expect_err("audit should stop");

    assert!(matches!(err, AuditError::Cancelled));
    assert_eq!(lead_status(&store, lead_id).await, AuditStatus::Running);
    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("partial data saved");
    assert!(data.final_url.is_some());
    assert!(!data.seo.has_meta_title, "seo stage never ran");
}

#[tokio::test]
async fn test_fetch_timeout_completes_with_fallback_score() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(SEO_HEAD, "<h1>Lento</h1>"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Sito Lento", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 1, None);

    let outcome = engine.audit_lead(lead_id).await.expect("fetch failure is not an error");

    assert_eq!(outcome.status, AuditStatus::Completed);
    assert_eq!(outcome.opportunity_score, Some(40));
    assert!(outcome.commercial_tag.is_some());
    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("audit data saved");
    assert!(data.fetch_error.is_some());
    assert!(!data.issues.is_empty());
    assert_eq!(data.score_breakdown.total, 40);
    assert_eq!(engine.stats().get_info_count(InfoType::PartialAudit), 1);
    assert!(engine.stats().total_errors() >= 1);
}

#[tokio::test]
async fn test_server_error_page_completes_with_fallback_score() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Sito Giù", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 5, None);

    let outcome = engine.audit_lead(lead_id).await.expect("fetch failure is not an error");
    assert_eq!(outcome.status, AuditStatus::Completed);
    assert_eq!(outcome.opportunity_score, Some(40));
}

#[tokio::test]
async fn test_gtm_only_with_no_paid_results_is_non_target() {
    let site = MockServer::start().await;
    let body = format!("<h1>Studio Dentistico Rossi</h1>{GTM_SNIPPET}{CONTACT_LINKS}");
    mount_page(&site, "/", html_page(SEO_HEAD, &body)).await;

    let serp = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ads": [{"link": "https://www.concorrente.it/", "title": "Concorrente"}]
        })))
        .expect(1)
        .mount(&serp)
        .await;
    let lookup: Arc<dyn AdsSearchLookup> = Arc::new(
        SerpApiLookup::new(Arc::new(reqwest::Client::new()), "test-key")
            .with_endpoint(format!("{}/search.json", serp.uri())),
    );

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&site.uri()), None).await;
    let engine = test_engine(store.clone(), 5, Some(lookup));

    let outcome = engine.audit_lead(lead_id).await.expect("audit should succeed");

    assert_eq!(outcome.commercial_tag, Some(CommercialTag::NonTarget));
    assert_eq!(outcome.commercial_priority, Some(4));
    assert_eq!(outcome.is_callable, Some(false));
    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("audit data saved");
    let evidence = data.ads_evidence.expect("ads evidence saved");
    assert_eq!(evidence.level, AdsLevel::Weak);
    assert_eq!(evidence.raw_signals.search_presence, SearchPresence::NotFound);
    assert_eq!(lead_column(&store, lead_id, "commercial_tag").await.as_deref(), Some("NON_TARGET"));
}

#[tokio::test]
async fn test_pixel_and_ads_tag_without_analytics_is_priority_one() {
    let server = MockServer::start().await;
    let body = r#"<h1>Ristorante Il Faro</h1>
<script>
  !function(f,b,e,v,n,t,s){}(window, document,'script','https://connect.facebook.net/en_US/fbevents.js');
  fbq('init', '123456789012345');
  fbq('track', 'PageView');
</script>
<script>gtag('config', 'AW-123456789');</script>"#;
    mount_page(&server, "/", html_page(SEO_HEAD, body)).await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Il Faro", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 5, None);

    let outcome = engine.audit_lead(lead_id).await.expect("audit should succeed");

    assert_eq!(
        outcome.commercial_tag,
        Some(CommercialTag::AdsAttiveControlloAssente)
    );
    assert_eq!(outcome.commercial_priority, Some(1));
    assert_eq!(outcome.is_callable, Some(true));
    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("audit data saved");
    assert_eq!(
        data.ads_evidence.expect("ads evidence saved").level,
        AdsLevel::Medium
    );
    assert!(!data.tracking.tracking_present());
}

#[tokio::test]
async fn test_stale_blog_becomes_problem_block() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<h1>Studio Dentistico Rossi</h1>{GTM_SNIPPET}{CONTACT_LINKS}
<a href="/blog">Blog</a>
<script src="https://consent.cookiebot.com/uc.js"></script>"#
    );
    mount_page(&server, "/", html_page(SEO_HEAD, &body)).await;
    let last_post = Utc::now().date_naive() - chrono::Duration::days(200);
    mount_page(
        &server,
        "/blog",
        html_page(
            "<title>Blog</title>",
            &format!(
                r#"<article><h2>Sbiancamento dentale</h2><time datetime="{}">post</time></article>"#,
                last_post.format("%Y-%m-%d")
            ),
        ),
    )
    .await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let engine = test_engine(store.clone(), 5, None);

    engine.audit_lead(lead_id).await.expect("audit should succeed");

    let data = store
        .load_audit_data(lead_id)
        .await
        .expect("audit data readable")
        .expect("audit data saved");
    assert!(data.content.has_blog);
    assert_eq!(data.content.days_since_last_post, Some(200));

    let script = lead_column(&store, lead_id, "outreach_script")
        .await
        .expect("script saved");
    assert!(script.contains("Il blog è fermo da 6 mesi"), "{script}");
    let talking_points = lead_column(&store, lead_id, "talking_points")
        .await
        .expect("talking points saved");
    assert!(talking_points.contains("Blog fermo da 6 mesi"), "{talking_points}");
}

/// Store whose final write always fails.
struct ReadOnlyStore {
    inner: Arc<SqliteLeadStore>,
}

#[async_trait]
impl LeadStore for ReadOnlyStore {
    async fn get_lead(&self, lead_id: i64) -> Result<Option<Lead>, DatabaseError> {
        self.inner.get_lead(lead_id).await
    }

    async fn set_status(&self, lead_id: i64, status: AuditStatus) -> Result<(), DatabaseError> {
        self.inner.set_status(lead_id, status).await
    }

    async fn save_partial(&self, lead_id: i64, data: &AuditData) -> Result<(), DatabaseError> {
        self.inner.save_partial(lead_id, data).await
    }

    async fn save_result(&self, _lead_id: i64, _record: &AuditRecord) -> Result<(), DatabaseError> {
        Err(DatabaseError::SqlError(sqlx::Error::PoolClosed))
    }

    async fn pending_leads(&self, search_id: i64) -> Result<Vec<i64>, DatabaseError> {
        self.inner.pending_leads(search_id).await
    }
}

#[tokio::test]
async fn test_stream_persistence_failure_marks_lead_failed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page(SEO_HEAD, "<h1>Studio Rossi</h1>")).await;

    let store = create_test_store().await;
    let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let engine = AuditEngine::new(
        PageFetcher::new(Arc::new(reqwest::Client::new()), 5),
        Arc::new(ReadOnlyStore {
            inner: store.clone(),
        }),
        None,
        None,
        Arc::new(ProcessingStats::new()),
    );

    let (tx, mut rx) = mpsc::channel(32);
    let sink = ChannelSink::new(tx);
    let err = engine
        .stream_audit(lead_id, &sink)
        .await
        .expect_err("save should fail");
    drop(sink);

    assert!(matches!(err, AuditError::Database(_)), "{err:?}");
    assert_eq!(lead_status(&store, lead_id).await, AuditStatus::Failed);
    assert_eq!(engine.stats().get_error_count(ErrorType::PersistenceError), 1);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let last = events.last().expect("events were sent");
    assert_eq!(last.stage, Stage::Error);
    assert_eq!(last.data["status"], json!("FAILED"));
    assert!(!events.iter().any(|e| e.stage == Stage::Complete));
}

/// Performance probe that errors or outlives its timeout.
enum BrokenProbe {
    Failing,
    Slow(Duration),
}

#[async_trait]
impl PerformanceProbe for BrokenProbe {
    async fn analyze(&self, _url: &str) -> anyhow::Result<PerformanceResult> {
        match self {
            BrokenProbe::Failing => anyhow::bail!("PageSpeed quota exceeded"),
            BrokenProbe::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(PerformanceResult {
                    measured: true,
                    performance_score: 12,
                    is_mobile_friendly: false,
                    ..PerformanceResult::neutral()
                })
            }
        }
    }
}

#[tokio::test]
async fn test_broken_performance_probe_scores_like_no_probe() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page(SEO_HEAD, &format!("<h1>Studio Rossi</h1>{CONTACT_LINKS}")),
    )
    .await;
    let store = create_test_store().await;

    let baseline_lead = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
    let baseline = test_engine(store.clone(), 5, None)
        .audit_lead(baseline_lead)
        .await
        .expect("audit should succeed");

    for probe in [
        BrokenProbe::Failing,
        BrokenProbe::Slow(Duration::from_secs(3)),
    ] {
        let lead_id = insert_lead(&store, "Studio Rossi", Some(&server.uri()), None).await;
        let engine = AuditEngine::new(
            PageFetcher::new(Arc::new(reqwest::Client::new()), 5),
            store.clone(),
            Some(Arc::new(probe)),
            None,
            Arc::new(ProcessingStats::new()),
        )
        .with_performance_timeout(Duration::from_millis(200));

        let outcome = engine.audit_lead(lead_id).await.expect("audit should succeed");

        assert_eq!(outcome.status, AuditStatus::Completed);
        assert_eq!(outcome.opportunity_score, baseline.opportunity_score);
        assert_eq!(
            engine.stats().get_error_count(ErrorType::PerformanceProbeError),
            1
        );
        let data = store
            .load_audit_data(lead_id)
            .await
            .expect("audit data readable")
            .expect("audit data saved");
        assert_eq!(data.performance, PerformanceResult::neutral());
        assert!(!data.seo.core_web_vitals.measured);
    }
}
