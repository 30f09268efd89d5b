//! Lead persistence.
//!
//! The audit engine only talks to the [`LeadStore`] trait; [`SqliteLeadStore`]
//! is the implementation backed by the `leads` table.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{AuditData, AuditRecord, AuditStatus, Lead};

use super::{init_db_pool_with_path, run_migrations};

/// Lead record source and audit result sink.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Loads a lead, `None` when the id is unknown.
    async fn get_lead(&self, lead_id: i64) -> Result<Option<Lead>, DatabaseError>;

    /// Moves a lead to `status`, stamping start/completion times.
    async fn set_status(&self, lead_id: i64, status: AuditStatus) -> Result<(), DatabaseError>;

    /// Stores the audit payload computed so far without touching the status.
    async fn save_partial(&self, lead_id: i64, data: &AuditData) -> Result<(), DatabaseError>;

    /// Overwrites every audit output column of the lead.
    async fn save_result(&self, lead_id: i64, record: &AuditRecord) -> Result<(), DatabaseError>;

    /// Ids of the `PENDING` leads imported with a search, oldest first.
    async fn pending_leads(&self, search_id: i64) -> Result<Vec<i64>, DatabaseError>;
}

/// Lead as imported by the sourcing pipeline.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub name: String,
    pub website: Option<String>,
    pub google_rating: Option<f64>,
    pub google_reviews_count: Option<i64>,
    pub search_id: Option<i64>,
}

/// [`LeadStore`] backed by SQLite.
#[derive(Clone)]
pub struct SqliteLeadStore {
    pool: SqlitePool,
}

impl SqliteLeadStore {
    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (or creates) the database file and applies pending migrations.
    pub async fn open(db_path: &Path) -> Result<Self, DatabaseError> {
        let pool = init_db_pool_with_path(db_path).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a lead in `PENDING` state and returns its id.
    pub async fn insert_lead(&self, lead: &NewLead) -> Result<i64, DatabaseError> {
        let row = sqlx::query(
            "INSERT INTO leads (name, website, google_rating, google_reviews_count, search_id, audit_status)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&lead.name)
        .bind(&lead.website)
        .bind(lead.google_rating)
        .bind(lead.google_reviews_count)
        .bind(lead.search_id)
        .bind(AuditStatus::Pending.as_ref())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id")?)
    }

    /// Reads back the persisted audit payload of a lead.
    pub async fn load_audit_data(&self, lead_id: i64) -> Result<Option<AuditData>, DatabaseError> {
        let raw: Option<Option<String>> =
            sqlx::query_scalar("SELECT audit_data FROM leads WHERE id = ?")
                .bind(lead_id)
                .fetch_optional(&self.pool)
                .await?;
        match raw.flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

fn lead_from_row(row: &SqliteRow) -> Result<Lead, DatabaseError> {
    let id: i64 = row.try_get("id")?;
    let raw_status: String = row.try_get("audit_status")?;
    let audit_status = AuditStatus::from_str(&raw_status).unwrap_or_else(|_| {
        warn!("Lead {id} has unknown audit status {raw_status:?}, treating as PENDING");
        AuditStatus::Pending
    });
    Ok(Lead {
        id,
        name: row.try_get("name")?,
        website: row.try_get("website")?,
        google_rating: row.try_get("google_rating")?,
        google_reviews_count: row.try_get("google_reviews_count")?,
        search_id: row.try_get("search_id")?,
        audit_status,
    })
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn get_lead(&self, lead_id: i64) -> Result<Option<Lead>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, name, website, google_rating, google_reviews_count, search_id, audit_status
             FROM leads WHERE id = ?",
        )
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(lead_from_row).transpose()
    }

    async fn set_status(&self, lead_id: i64, status: AuditStatus) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        // Running clears the previous completion, terminal states stamp it.
        let query = match status {
            AuditStatus::Pending => sqlx::query(
                "UPDATE leads SET audit_status = ?, audit_started_at = NULL, audit_completed_at = NULL
                 WHERE id = ?",
            )
            .bind(status.as_ref()),
            AuditStatus::Running => sqlx::query(
                "UPDATE leads SET audit_status = ?, audit_started_at = ?, audit_completed_at = NULL
                 WHERE id = ?",
            )
            .bind(status.as_ref())
            .bind(now),
            _ => sqlx::query(
                "UPDATE leads SET audit_status = ?, audit_completed_at = ? WHERE id = ?",
            )
            .bind(status.as_ref())
            .bind(now),
        };
        let result = query.bind(lead_id).execute(&self.pool).await?;
        debug!(
            "Lead {lead_id} -> {status} ({} row(s))",
            result.rows_affected()
        );
        Ok(())
    }

    async fn save_partial(&self, lead_id: i64, data: &AuditData) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(data)?;
        sqlx::query("UPDATE leads SET audit_data = ? WHERE id = ?")
            .bind(json)
            .bind(lead_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_result(&self, lead_id: i64, record: &AuditRecord) -> Result<(), DatabaseError> {
        let audit_data = serde_json::to_string(&record.audit_data)?;
        let talking_points = serde_json::to_string(&record.talking_points)?;
        let outreach_script = serde_json::to_string(&record.outreach_script)?;
        let commercial_signals = serde_json::to_string(&record.commercial_signals)?;

        sqlx::query(
            "UPDATE leads SET
                audit_status = ?,
                audit_completed_at = ?,
                opportunity_score = ?,
                audit_data = ?,
                talking_points = ?,
                outreach_script = ?,
                commercial_tag = ?,
                commercial_tag_reason = ?,
                commercial_signals = ?,
                commercial_priority = ?,
                is_callable = ?
             WHERE id = ?",
        )
        .bind(record.status.as_ref())
        .bind(record.completed_at.to_rfc3339())
        .bind(i64::from(record.opportunity_score))
        .bind(audit_data)
        .bind(talking_points)
        .bind(outreach_script)
        .bind(record.classification.tag.as_ref())
        .bind(&record.classification.reason)
        .bind(commercial_signals)
        .bind(i64::from(record.classification.priority))
        .bind(record.classification.is_callable)
        .bind(lead_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pending_leads(&self, search_id: i64) -> Result<Vec<i64>, DatabaseError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM leads WHERE search_id = ? AND audit_status = ? ORDER BY id",
        )
        .bind(search_id)
        .bind(AuditStatus::Pending.as_ref())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, CommercialTag, OutreachScript};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> SqliteLeadStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        run_migrations(&pool).await.expect("migrations apply");
        SqliteLeadStore::new(pool)
    }

    fn lead(name: &str, search_id: Option<i64>) -> NewLead {
        NewLead {
            name: name.to_string(),
            website: Some(format!("{}.it", name.to_lowercase())),
            google_rating: Some(4.2),
            google_reviews_count: Some(31),
            search_id,
        }
    }

    fn record(score: u8, tag: CommercialTag) -> AuditRecord {
        AuditRecord {
            status: AuditStatus::Completed,
            completed_at: Utc::now(),
            opportunity_score: score,
            audit_data: AuditData {
                website: "https://rossi.it".into(),
                issues: vec!["Manca la meta description".into()],
                ..Default::default()
            },
            talking_points: vec!["[SEO] Manca la meta description".into()],
            outreach_script: OutreachScript::default(),
            classification: Classification {
                tag,
                reason: "test".into(),
                priority: tag.priority(),
                is_callable: tag.is_callable(),
            },
            commercial_signals: serde_json::json!({"trackingPresent": false}),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_lead() {
        let store = test_store().await;
        let id = store.insert_lead(&lead("Rossi", Some(3))).await.expect("insert");
        let loaded = store.get_lead(id).await.expect("query").expect("lead exists");
        assert_eq!(loaded.name, "Rossi");
        assert_eq!(loaded.website.as_deref(), Some("rossi.it"));
        assert_eq!(loaded.audit_status, AuditStatus::Pending);
        assert_eq!(loaded.search_id, Some(3));
        assert!(store.get_lead(id + 100).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn test_set_status_stamps_times() {
        let store = test_store().await;
        let id = store.insert_lead(&lead("Bianchi", None)).await.expect("insert");

        store.set_status(id, AuditStatus::Running).await.expect("running");
        let (status, started, completed): (String, Option<String>, Option<String>) =
            sqlx::query_as(
                "SELECT audit_status, audit_started_at, audit_completed_at FROM leads WHERE id = ?",
            )
            .bind(id)
            .fetch_one(store.pool())
            .await
            .expect("row");
        assert_eq!(status, "RUNNING");
        assert!(started.is_some());
        assert!(completed.is_none());

        store.set_status(id, AuditStatus::NoWebsite).await.expect("terminal");
        let completed: Option<String> =
            sqlx::query_scalar("SELECT audit_completed_at FROM leads WHERE id = ?")
                .bind(id)
                .fetch_one(store.pool())
                .await
                .expect("row");
        assert!(completed.is_some());
    }

    #[tokio::test]
    async fn test_save_partial_keeps_status() {
        let store = test_store().await;
        let id = store.insert_lead(&lead("Verdi", None)).await.expect("insert");
        store.set_status(id, AuditStatus::Running).await.expect("running");

        let data = AuditData {
            website: "https://verdi.it".into(),
            has_https: true,
            ..Default::default()
        };
        store.save_partial(id, &data).await.expect("partial");

        let loaded = store.get_lead(id).await.expect("query").expect("lead");
        assert_eq!(loaded.audit_status, AuditStatus::Running);
        let stored = store.load_audit_data(id).await.expect("query").expect("payload");
        assert_eq!(stored.website, "https://verdi.it");
    }

    #[tokio::test]
    async fn test_save_result_overwrites_previous_run() {
        let store = test_store().await;
        let id = store.insert_lead(&lead("Neri", None)).await.expect("insert");

        store
            .save_result(id, &record(80, CommercialTag::AdsAttiveControlloAssente))
            .await
            .expect("first save");
        store
            .save_result(id, &record(12, CommercialTag::NonTarget))
            .await
            .expect("second save");

        let (score, tag, priority, callable): (i64, String, i64, bool) = sqlx::query_as(
            "SELECT opportunity_score, commercial_tag, commercial_priority, is_callable
             FROM leads WHERE id = ?",
        )
        .bind(id)
        .fetch_one(store.pool())
        .await
        .expect("row");
        assert_eq!(score, 12);
        assert_eq!(tag, "NON_TARGET");
        assert_eq!(priority, 4);
        assert!(!callable);

        let loaded = store.get_lead(id).await.expect("query").expect("lead");
        assert_eq!(loaded.audit_status, AuditStatus::Completed);
    }

    #[tokio::test]
    async fn test_pending_leads_scoped_to_search() {
        let store = test_store().await;
        let a = store.insert_lead(&lead("A", Some(7))).await.expect("insert");
        let b = store.insert_lead(&lead("B", Some(7))).await.expect("insert");
        store.insert_lead(&lead("C", Some(8))).await.expect("insert");
        store.set_status(b, AuditStatus::Completed).await.expect("status");

        assert_eq!(store.pending_leads(7).await.expect("query"), vec![a]);
        assert!(store.pending_leads(99).await.expect("query").is_empty());
    }
}
