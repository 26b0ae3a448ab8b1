//! Hosting-platform (GitHub App) client
//!
//! Authenticates as a GitHub App via a short-lived RS256 JWT, exchanges it
//! for per-installation access tokens, and wraps the three REST calls the
//! worker consumes: token exchange, commit-status creation, and the
//! latest-commit lookup used by the push staleness check.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::constants::{APP_JWT_SKEW_SECS, APP_JWT_TTL_SECS, GITHUB_API_VERSION};
use crate::error::{WorkerError, WorkerResult};
use crate::models::CommitState;

/// GitHub App API client
#[derive(Clone)]
pub struct GitHubService {
    client: reqwest::Client,
    api_base: String,
    app_id: String,
    encoding_key: EncodingKey,
}

#[derive(Serialize)]
struct AppClaims<'a> {
    iat: u64,
    exp: u64,
    iss: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct CommitStatusRequest<'a> {
    state: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
struct CommitEntry {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<CommitSignature>,
}

#[derive(Deserialize)]
struct CommitSignature {
    date: Option<DateTime<Utc>>,
}

impl GitHubService {
    /// Create a client from the App's base64-encoded private key
    pub fn new(config: &GitHubConfig) -> anyhow::Result<Self> {
        let pem = base64::engine::general_purpose::STANDARD
            .decode(config.private_key_base64.trim())
            .map_err(|e| anyhow::anyhow!("GITHUB_PRIVATE_KEY is not valid base64: {e}"))?;

        let encoding_key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| anyhow::anyhow!("GITHUB_PRIVATE_KEY is not a valid RSA key: {e}"))?;

        let client = reqwest::Client::builder()
            .user_agent("pushbench-worker")
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            app_id: config.app_id.clone(),
            encoding_key,
        })
    }

    /// Sign a short-lived App JWT, backdated to absorb clock skew
    fn app_jwt(&self) -> WorkerResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let claims = AppClaims {
            iat: now.saturating_sub(APP_JWT_SKEW_SECS),
            exp: now + APP_JWT_TTL_SECS,
            iss: &self.app_id,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| WorkerError::Reporting(format!("failed to sign app token: {e}")))
    }

    /// Mint an installation token carrying the installation's full
    /// permission set, used for commit statuses and commit lookups
    pub async fn installation_token(&self, installation_id: i64) -> WorkerResult<String> {
        self.request_token(installation_id, None).await
    }

    /// Mint a token restricted to one repository with read-only contents,
    /// used only inside clone URLs
    pub async fn scoped_clone_token(
        &self,
        installation_id: i64,
        repo: &str,
    ) -> WorkerResult<String> {
        let body = serde_json::json!({
            "repositories": [repo],
            "permissions": { "contents": "read" },
        });
        self.request_token(installation_id, Some(body)).await
    }

    async fn request_token(
        &self,
        installation_id: i64,
        body: Option<serde_json::Value>,
    ) -> WorkerResult<String> {
        let jwt = self.app_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, installation_id
        );

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(jwt)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = ensure_success(request.send().await?, "token exchange").await?;
        let token: TokenResponse = response.json().await?;

        Ok(token.token)
    }

    /// Create a commit status on the hosting platform
    pub async fn create_commit_status(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        sha: &str,
        state: CommitState,
        description: &str,
    ) -> WorkerResult<()> {
        let url = format!("{}/repos/{}/{}/statuses/{}", self.api_base, owner, repo, sha);

        let request = CommitStatusRequest {
            state: state.as_str(),
            description,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .await?;

        ensure_success(response, "commit status update").await?;
        Ok(())
    }

    /// Fetch the repository's current latest commit hash, newest committer
    /// date first. Used only for the push-origin staleness check.
    pub async fn latest_commit(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> WorkerResult<Option<String>> {
        let url = format!("{}/repos/{}/{}/commits", self.api_base, owner, repo);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let response = ensure_success(response, "commit listing").await?;
        let mut commits: Vec<CommitEntry> = response.json().await?;

        commits.sort_by(|a, b| committer_date(b).cmp(&committer_date(a)));

        Ok(commits.into_iter().next().map(|c| c.sha))
    }
}

fn committer_date(entry: &CommitEntry) -> DateTime<Utc> {
    entry
        .commit
        .committer
        .as_ref()
        .and_then(|c| c.date)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

async fn ensure_success(response: reqwest::Response, what: &str) -> WorkerResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(WorkerError::Reporting(format!(
        "{what} returned {status}: {body}"
    )))
}
