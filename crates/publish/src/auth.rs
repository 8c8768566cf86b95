//! Token storage.
//!
//! Reads/writes ~/.config/seriesmaster/auth.json (0600 on Unix). A token in
//! the environment always takes precedence over the stored one.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Stored GitHub credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishCredentials {
    /// Personal access token with contents:write on the target repository
    pub token: String,
    /// Login the token belongs to (for display)
    #[serde(default)]
    pub login: Option<String>,
}

impl PublishCredentials {
    pub fn new(token: String) -> Self {
        Self { token, login: None }
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("seriesmaster/auth.json"))
}

/// Load saved credentials. None if absent or unreadable.
pub fn load_auth() -> Option<PublishCredentials> {
    load_auth_from(&auth_file_path()?)
}

fn load_auth_from(path: &Path) -> Option<PublishCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    let creds: PublishCredentials = serde_json::from_str(&contents).ok()?;
    (!creds.token.trim().is_empty()).then_some(creds)
}

/// Token to publish with: a non-blank `env_token` wins, then the stored file.
pub fn resolve_token(env_token: Option<&str>) -> Option<String> {
    match env_token.map(str::trim) {
        Some(t) if !t.is_empty() => Some(t.to_string()),
        _ => load_auth().map(|c| c.token),
    }
}

/// Save credentials, creating the parent directory. Sets 0600 on Unix.
pub fn save_auth(creds: &PublishCredentials) -> Result<PathBuf, String> {
    let path = auth_file_path().ok_or("Could not determine config directory")?;
    save_auth_to(creds, &path)?;
    Ok(path)
}

fn save_auth_to(creds: &PublishCredentials, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

    std::fs::write(path, &contents)
        .map_err(|e| format!("Failed to write auth file: {}", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| format!("Failed to set file permissions: {}", e))?;
    }

    Ok(())
}

/// Delete saved credentials. Returns whether a file was removed.
pub fn delete_auth() -> Result<bool, String> {
    let Some(path) = auth_file_path() else {
        return Ok(false);
    };
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path)
        .map_err(|e| format!("Failed to delete auth file: {}", e))?;
    Ok(true)
}
