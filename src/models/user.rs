//! Tracked-repository owner model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User database model. One row per tracked repository owner; submissions
/// reference the owner through `user_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub github_user_id: i64,
    pub username: String,
    pub email: String,
    /// External identifier of the tracked repository
    pub github_repo: String,
    pub last_upgrade_time: DateTime<Utc>,
    pub role: String,
}

/// Projection used by the worker when resolving a task's owner
#[derive(Debug, Clone, FromRow)]
pub struct TrackedOwner {
    pub id: Uuid,
    pub username: String,
}
