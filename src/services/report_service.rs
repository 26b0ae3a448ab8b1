//! Status reporting adapter
//!
//! The persisted submission status and the hosting-platform commit status
//! must move together. Each report runs the local update inside a
//! transaction and only commits after the upstream call succeeds, so a
//! failed upstream call rolls the local write back and the two views never
//! permanently diverge.

use sqlx::PgPool;
use uuid::Uuid;

use crate::constants::COMMIT_DESCRIPTION_LIMIT;
use crate::db::repositories::SubmissionRepository;
use crate::error::WorkerResult;
use crate::models::{MessageRepo, SubmissionStatus};
use crate::services::github_service::GitHubService;

/// Two-phase status reporter for one submission
pub struct CommitReporter {
    db: PgPool,
    github: GitHubService,
    /// Installation token minted for this submission
    token: String,
    owner: String,
    repo: String,
    sha: String,
    submission_id: Uuid,
}

impl CommitReporter {
    pub fn new(
        db: PgPool,
        github: GitHubService,
        token: String,
        repository: &MessageRepo,
        sha: &str,
        submission_id: Uuid,
    ) -> Self {
        Self {
            db,
            github,
            token,
            owner: repository.owner.login.clone(),
            repo: repository.name.clone(),
            sha: sha.to_string(),
            submission_id,
        }
    }

    /// Update the persisted status and mirror it upstream as one logical step
    pub async fn report(&self, status: SubmissionStatus, description: &str) -> WorkerResult<()> {
        let description = truncate_description(description);

        let mut tx = self.db.begin().await?;
        SubmissionRepository::update_status(&mut *tx, &self.submission_id, status, &description)
            .await?;

        // An upstream failure returns here, dropping the transaction and
        // rolling back the local write.
        self.github
            .create_commit_status(
                &self.token,
                &self.owner,
                &self.repo,
                &self.sha,
                status.commit_state(),
                &description,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            submission_id = %self.submission_id,
            status = %status,
            "status reported"
        );
        Ok(())
    }

    /// Persist the final result and mirror the success status upstream,
    /// under the same two-phase contract as [`report`](Self::report)
    pub async fn finalize(
        &self,
        description: &str,
        runtime: f64,
        parsed_stats: &serde_json::Value,
        raw_stats: &serde_json::Value,
    ) -> WorkerResult<()> {
        let description = truncate_description(description);

        let mut tx = self.db.begin().await?;
        SubmissionRepository::update_result(
            &mut *tx,
            &self.submission_id,
            &description,
            runtime,
            parsed_stats,
            raw_stats,
        )
        .await?;

        self.github
            .create_commit_status(
                &self.token,
                &self.owner,
                &self.repo,
                &self.sha,
                SubmissionStatus::Success.commit_state(),
                &description,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(submission_id = %self.submission_id, "submission finalized");
        Ok(())
    }
}

/// Truncate a description to the hosting platform's length limit
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= COMMIT_DESCRIPTION_LIMIT {
        return description.to_string();
    }

    description.chars().take(COMMIT_DESCRIPTION_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_descriptions_pass_through() {
        assert_eq!(truncate_description("all good"), "all good");
    }

    #[test]
    fn test_long_descriptions_are_cut_at_limit() {
        let long = "x".repeat(500);
        let truncated = truncate_description(&long);
        assert_eq!(truncated.chars().count(), COMMIT_DESCRIPTION_LIMIT);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(200);
        let truncated = truncate_description(&long);
        assert_eq!(truncated.chars().count(), COMMIT_DESCRIPTION_LIMIT);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
