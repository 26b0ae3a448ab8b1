//! Submission repository

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    error::{WorkerError, WorkerResult},
    models::{Submission, SubmissionStatus},
};

/// Repository for submission database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Create a new submission at `Initializing`
    pub async fn create(
        pool: &PgPool,
        user_id: &Uuid,
        commit_hash: &str,
        is_upgrade: bool,
        description: &str,
    ) -> WorkerResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (user_id, commit_hash, status, description, is_upgrade)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(commit_hash)
        .bind(SubmissionStatus::Initializing.as_str())
        .bind(description)
        .bind(is_upgrade)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| WorkerError::Persistence("submission insert returned no row".to_string()))?;

        Ok(submission)
    }

    /// Find submission by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> WorkerResult<Option<Submission>> {
        let submission =
            sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(submission)
    }

    /// Update status and description inside an open transaction.
    ///
    /// The caller owns the transaction so the write can be rolled back when
    /// the paired upstream commit-status call fails.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: &Uuid,
        status: SubmissionStatus,
        description: &str,
    ) -> WorkerResult<()> {
        sqlx::query(r#"UPDATE submissions SET status = $2, description = $3 WHERE id = $1"#)
            .bind(id)
            .bind(status.as_str())
            .bind(description)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Persist the final benchmark result inside an open transaction
    pub async fn update_result(
        conn: &mut PgConnection,
        id: &Uuid,
        description: &str,
        runtime: f64,
        parsed_stats: &serde_json::Value,
        raw_stats: &serde_json::Value,
    ) -> WorkerResult<()> {
        sqlx::query(
            r#"
            UPDATE submissions
            SET
                status = $2,
                description = $3,
                runtime = $4,
                parsed_stats = $5,
                raw_stats = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(SubmissionStatus::Success.as_str())
        .bind(description)
        .bind(runtime)
        .bind(parsed_stats)
        .bind(raw_stats)
        .execute(conn)
        .await?;

        Ok(())
    }
}
