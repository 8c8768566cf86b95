//! GitHub contents API client.
//!
//! Blocking reqwest client (no Tokio runtime required).

use std::time::Duration;

use base64::Engine;
use serde::Serialize;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Contents API client (blocking).
#[derive(Clone)]
pub struct PublishClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

/// Error type for publish operations.
#[derive(Debug)]
pub enum PublishError {
    /// No token configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Request rejected (409 conflict, 422 unprocessable)
    Validation(String),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::NotAuthenticated => write!(f, "Not authenticated: set GITHUB_TOKEN or run `smaster login`"),
            PublishError::Network(msg) => write!(f, "Network error: {}", msg),
            PublishError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            PublishError::Parse(msg) => write!(f, "Parse error: {}", msg),
            PublishError::Validation(msg) => write!(f, "Rejected by server: {}", msg),
        }
    }
}

impl std::error::Error for PublishError {}

/// Where a file lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// `owner/name`
    pub repo: String,
    pub branch: String,
    /// Path inside the repository
    pub path: String,
}

impl PublishTarget {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>, path: impl Into<String>) -> Self {
        Self { repo: repo.into(), branch: branch.into(), path: path.into() }
    }
}

/// Outcome of an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub repo: String,
    pub branch: String,
    pub path: String,
    /// True when the file did not exist on the branch before.
    pub created: bool,
    pub status: u16,
    pub commit_sha: Option<String>,
    pub content_sha: Option<String>,
    /// `blake3:<hex>` of the uploaded bytes
    pub content_hash: String,
    pub byte_size: u64,
}

impl PublishClient {
    /// Client against api.github.com.
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, DEFAULT_API_BASE.to_string())
    }

    pub fn with_base_url(token: String, api_base: String) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("smaster/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Token from `env_token` or the stored auth file.
    pub fn from_token_or_saved(env_token: Option<&str>, api_base: String) -> Result<Self, PublishError> {
        let token = crate::auth::resolve_token(env_token).ok_or(PublishError::NotAuthenticated)?;
        Ok(Self::with_base_url(token, api_base))
    }

    fn contents_url(&self, target: &PublishTarget) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            target.repo.trim_matches('/'),
            target.path.trim_start_matches('/')
        )
    }

    /// Blob sha of the file on the target branch, None when it does not exist.
    pub fn current_sha(&self, target: &PublishTarget) -> Result<Option<String>, PublishError> {
        let response = self.http.get(self.contents_url(target))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .query(&[("ref", target.branch.as_str())])
            .send()
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        let response = check_status(response)?;
        let json: serde_json::Value = response.json().map_err(|e| PublishError::Parse(e.to_string()))?;
        Ok(json["sha"].as_str().map(String::from))
    }

    /// Create or replace the file at `target` with `data` in one commit.
    ///
    /// A failed sha lookup is logged and the PUT goes ahead without a sha,
    /// which the server rejects if the file already exists.
    pub fn upsert_file(&self, target: &PublishTarget, data: &[u8], message: &str) -> Result<PublishResult, PublishError> {
        let sha = match self.current_sha(target) {
            Ok(sha) => sha,
            Err(e) => {
                log::warn!("could not read current sha of {}: {e}", target.path);
                None
            }
        };

        let mut body = serde_json::json!({
            "message": message,
            "content": base64::engine::general_purpose::STANDARD.encode(data),
            "branch": target.branch,
        });
        if let Some(ref sha) = sha {
            body["sha"] = serde_json::Value::String(sha.clone());
        }

        log::info!(
            "publishing {} bytes to {}:{}/{}",
            data.len(),
            target.repo,
            target.branch,
            target.path
        );

        let response = self.http.put(self.contents_url(target))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .map_err(|e| PublishError::Network(e.to_string()))?;
        let response = check_status(response)?;
        let status = response.status().as_u16();
        let json: serde_json::Value = response.json().map_err(|e| PublishError::Parse(e.to_string()))?;

        Ok(PublishResult {
            repo: target.repo.clone(),
            branch: target.branch.clone(),
            path: target.path.clone(),
            created: sha.is_none(),
            status,
            commit_sha: json["commit"]["sha"].as_str().map(String::from),
            content_sha: json["content"]["sha"].as_str().map(String::from),
            content_hash: hash_bytes(data),
            byte_size: data.len() as u64,
        })
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, PublishError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    match status {
        401 | 403 if body.contains("Bad credentials") => Err(PublishError::NotAuthenticated),
        409 | 422 => Err(PublishError::Validation(body)),
        _ => Err(PublishError::Http(status, body)),
    }
}

/// Compute blake3 hash of bytes (with algorithm prefix).
pub fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data).to_hex())
}
