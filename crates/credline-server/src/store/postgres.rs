use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use credline_core::{Complexity, CredlineError, Result, Status, Submission};

use super::RecordStore;

/// Postgres-backed record store.
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    /// Connect and apply migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::PgPool::connect(database_url)
            .await
            .map_err(storage_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| CredlineError::Storage(format!("migration failed: {e}")))?;

        Ok(Self { pool })
    }
}

fn storage_err(e: sqlx::Error) -> CredlineError {
    CredlineError::Storage(e.to_string())
}

fn row_to_submission(row: &PgRow) -> Result<Submission> {
    let status: String = row.try_get("status").map_err(storage_err)?;
    let complexity: String = row.try_get("complexity").map_err(storage_err)?;

    Ok(Submission {
        id: row.try_get("id").map_err(storage_err)?,
        title: row.try_get("title").map_err(storage_err)?,
        link: row.try_get("link").map_err(storage_err)?,
        creator_name: row.try_get("creator_name").map_err(storage_err)?,
        creator_email: row.try_get("creator_email").map_err(storage_err)?,
        creator_sector: row.try_get("creator_sector").map_err(storage_err)?,
        problem: row.try_get("problem").map_err(storage_err)?,
        description: row.try_get("description").map_err(storage_err)?,
        usage_instructions: row.try_get("usage_instructions").map_err(storage_err)?,
        complexity: Complexity::parse(&complexity)?,
        status: Status::parse(&status)?,
        created_at: row.try_get("created_at").map_err(storage_err)?,
        approved_at: row.try_get("approved_at").map_err(storage_err)?,
        report_deadline: row.try_get("report_deadline").map_err(storage_err)?,
        report_submitted_at: row.try_get("report_submitted_at").map_err(storage_err)?,
        report_result: row.try_get("report_result").map_err(storage_err)?,
        report_improvement: row.try_get("report_improvement").map_err(storage_err)?,
        report_learnings: row.try_get("report_learnings").map_err(storage_err)?,
        rejection_reason: row.try_get("rejection_reason").map_err(storage_err)?,
        creation_credit: row.try_get("creation_credit").map_err(storage_err)?,
        report_credit: row.try_get("report_credit").map_err(storage_err)?,
        total_credit: row.try_get("total_credit").map_err(storage_err)?,
        notified_7d: row.try_get("notified_7d").map_err(storage_err)?,
        notified_3d: row.try_get("notified_3d").map_err(storage_err)?,
        notified_1d: row.try_get("notified_1d").map_err(storage_err)?,
    })
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list_all(&self) -> Result<Vec<Submission>> {
        let rows = sqlx::query("SELECT * FROM submissions")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter().map(row_to_submission).collect()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>> {
        let row = sqlx::query("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.as_ref().map(row_to_submission).transpose()
    }

    async fn insert(&self, sub: &Submission) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (
                id, title, link, creator_name, creator_email, creator_sector,
                problem, description, usage_instructions, complexity, status,
                created_at, approved_at, report_deadline, report_submitted_at,
                report_result, report_improvement, report_learnings, rejection_reason,
                creation_credit, report_credit, total_credit,
                notified_7d, notified_3d, notified_1d
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            "#,
        )
        .bind(sub.id)
        .bind(&sub.title)
        .bind(&sub.link)
        .bind(&sub.creator_name)
        .bind(&sub.creator_email)
        .bind(&sub.creator_sector)
        .bind(&sub.problem)
        .bind(&sub.description)
        .bind(&sub.usage_instructions)
        .bind(sub.complexity.as_str())
        .bind(sub.status.as_str())
        .bind(sub.created_at)
        .bind(sub.approved_at)
        .bind(sub.report_deadline)
        .bind(sub.report_submitted_at)
        .bind(&sub.report_result)
        .bind(&sub.report_improvement)
        .bind(&sub.report_learnings)
        .bind(&sub.rejection_reason)
        .bind(sub.creation_credit)
        .bind(sub.report_credit)
        .bind(sub.total_credit)
        .bind(sub.notified_7d)
        .bind(sub.notified_3d)
        .bind(sub.notified_1d)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn update(&self, sub: &Submission) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE submissions SET
                status = $2, approved_at = $3, report_deadline = $4,
                report_submitted_at = $5, report_result = $6,
                report_improvement = $7, report_learnings = $8,
                rejection_reason = $9, creation_credit = $10,
                report_credit = $11, total_credit = $12,
                notified_7d = $13, notified_3d = $14, notified_1d = $15
            WHERE id = $1
            "#,
        )
        .bind(sub.id)
        .bind(sub.status.as_str())
        .bind(sub.approved_at)
        .bind(sub.report_deadline)
        .bind(sub.report_submitted_at)
        .bind(&sub.report_result)
        .bind(&sub.report_improvement)
        .bind(&sub.report_learnings)
        .bind(&sub.rejection_reason)
        .bind(sub.creation_credit)
        .bind(sub.report_credit)
        .bind(sub.total_credit)
        .bind(sub.notified_7d)
        .bind(sub.notified_3d)
        .bind(sub.notified_1d)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(CredlineError::NotFound(format!("submission {}", sub.id)));
        }
        Ok(())
    }
}
