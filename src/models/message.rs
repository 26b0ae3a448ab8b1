//! Inbound task message model
//!
//! Shape of the JSON the broker delivers. Deserialization is the validation
//! layer: a message missing `data.repository`, `data.installation` or
//! `data.after` fails to parse and is discarded as malformed.

use serde::{Deserialize, Serialize};

/// Where a task came from. Upgrades run a heavier benchmark level and skip
/// the latest-commit staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOrigin {
    Push,
    Upgrade,
}

/// One unit of work: a commit to benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub from: TaskOrigin,
    pub data: MessageData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageData {
    pub repository: MessageRepo,
    pub installation: Installation,
    /// Commit hash the push/upgrade landed on
    pub after: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRepo {
    /// External repository identifier, matched against tracked owners
    pub id: String,
    pub name: String,
    pub clone_url: String,
    pub owner: RepoOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: i64,
}

impl MessageRepo {
    /// Deterministic container/working-folder name for this repository
    pub fn container_name(&self) -> String {
        format!("{}_{}", self.owner.login, self.name).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "from": "push",
        "data": {
            "repository": {
                "id": "98765",
                "name": "FastLaps",
                "clone_url": "https://github.com/speedy/FastLaps.git",
                "owner": { "login": "Speedy" }
            },
            "installation": { "id": 1234 },
            "after": "deadbeef"
        }
    }"#;

    #[test]
    fn test_valid_message_parses() {
        let msg: QueueMessage = serde_json::from_str(VALID).unwrap();
        assert_eq!(msg.from, TaskOrigin::Push);
        assert_eq!(msg.data.after, "deadbeef");
        assert_eq!(msg.data.repository.owner.login, "Speedy");
    }

    #[test]
    fn test_missing_after_is_rejected() {
        let broken = VALID.replace(r#""after": "deadbeef""#, r#""before": "deadbeef""#);
        assert!(serde_json::from_str::<QueueMessage>(&broken).is_err());
    }

    #[test]
    fn test_missing_installation_is_rejected() {
        let broken = VALID.replace("installation", "installment");
        assert!(serde_json::from_str::<QueueMessage>(&broken).is_err());
    }

    #[test]
    fn test_unknown_origin_is_rejected() {
        let broken = VALID.replace(r#""from": "push""#, r#""from": "poke""#);
        assert!(serde_json::from_str::<QueueMessage>(&broken).is_err());
    }

    #[test]
    fn test_container_name_is_lowercased() {
        let msg: QueueMessage = serde_json::from_str(VALID).unwrap();
        assert_eq!(msg.data.repository.container_name(), "speedy_fastlaps");
    }
}
