//! User repository

use sqlx::PgPool;

use crate::{error::WorkerResult, models::TrackedOwner};

/// Repository for tracked-repository owner lookups
pub struct UserRepository;

impl UserRepository {
    /// Find the owner of a tracked repository by its external identifier
    pub async fn find_by_repo(pool: &PgPool, repo_id: &str) -> WorkerResult<Option<TrackedOwner>> {
        let owner = sqlx::query_as::<_, TrackedOwner>(
            r#"SELECT id, username FROM users WHERE github_repo = $1"#,
        )
        .bind(repo_id)
        .fetch_optional(pool)
        .await?;

        Ok(owner)
    }
}
