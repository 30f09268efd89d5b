// Shared test helpers for lead fixtures, mock sites and engine setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lead_audit::ads::AdsSearchLookup;
use lead_audit::fetch::PageFetcher;
use lead_audit::storage::{run_migrations, LeadStore, NewLead, SqliteLeadStore};
use lead_audit::{AuditEngine, AuditStatus, ProcessingStats};

/// Creates a lead store over an in-memory database with migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_store() -> Arc<SqliteLeadStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Arc::new(SqliteLeadStore::new(pool))
}

/// Builds an engine with a plain client, no performance probe and an
/// optional paid-search lookup.
#[allow(dead_code)]
pub fn test_engine(
    store: Arc<SqliteLeadStore>,
    timeout_secs: u64,
    ads_lookup: Option<Arc<dyn AdsSearchLookup>>,
) -> AuditEngine {
    let fetcher = PageFetcher::new(Arc::new(reqwest::Client::new()), timeout_secs);
    AuditEngine::new(
        fetcher,
        store,
        None,
        ads_lookup,
        Arc::new(ProcessingStats::new()),
    )
}

/// Inserts a `PENDING` lead and returns its id.
#[allow(dead_code)]
pub async fn insert_lead(
    store: &SqliteLeadStore,
    name: &str,
    website: Option<&str>,
    search_id: Option<i64>,
) -> i64 {
    store
        .insert_lead(&NewLead {
            name: name.to_string(),
            website: website.map(str::to_string),
            search_id,
            ..Default::default()
        })
        .await
        .expect("Failed to insert lead")
}

/// Current audit status of a lead.
#[allow(dead_code)]
pub async fn lead_status(store: &SqliteLeadStore, lead_id: i64) -> AuditStatus {
    store
        .get_lead(lead_id)
        .await
        .expect("Failed to read lead")
        .expect("Lead should exist")
        .audit_status
}

/// Reads a raw text column of a lead.
#[allow(dead_code)]
pub async fn lead_column(store: &SqliteLeadStore, lead_id: i64, column: &str) -> Option<String> {
    sqlx::query_scalar(&format!("SELECT {column} FROM leads WHERE id = ?"))
        .bind(lead_id)
        .fetch_one(store.pool())
        .await
        .expect("Failed to read lead column")
}

/// Wraps head and body fragments into a full HTML document.
#[allow(dead_code)]
pub fn html_page(head: &str, body: &str) -> String {
    format!("<!DOCTYPE html><html lang=\"it\"><head>{head}</head><body>{body}</body></html>")
}

/// Head with a title and a meta description.
#[allow(dead_code)]
pub const SEO_HEAD: &str = r#"<title>Studio Dentistico Rossi | Implantologia a Milano</title>
<meta name="description" content="Studio dentistico a Milano specializzato in implantologia e ortodonzia invisibile. Prima visita gratuita.">"#;

/// Two contact channels, enough for a clear CTA.
#[allow(dead_code)]
pub const CONTACT_LINKS: &str =
    r#"<a href="tel:+390212345678">Chiamaci</a> <a href="mailto:info@studiorossi.it">Scrivici</a>"#;

/// Google Tag Manager snippet.
#[allow(dead_code)]
pub const GTM_SNIPPET: &str = r#"<script>(function(w,d,s,l,i){w[l]=w[l]||[];})(window,document,'script','dataLayer','GTM-AB12CD3');</script>"#;

/// Mounts an HTML page at `route`.
#[allow(dead_code)]
pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}
