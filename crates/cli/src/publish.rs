//! `smaster publish`, `login` and `logout`.

use std::path::{Path, PathBuf};

use clap::Args;

use seriesmaster_config::Settings;
use seriesmaster_publish::{
    delete_auth, save_auth, PublishClient, PublishCredentials, PublishResult, PublishTarget,
};

use crate::exit_codes::EXIT_READ;
use crate::CliError;

/// Destination overrides shared by `publish` and `update --publish`.
#[derive(Args, Debug, Default, Clone)]
pub struct PublishArgs {
    /// Repository as owner/name
    #[arg(long, env = "GH_REPO")]
    pub repo: Option<String>,

    /// Target branch
    #[arg(long, env = "GH_BRANCH")]
    pub branch: Option<String>,

    /// Path of the file inside the repository
    #[arg(long = "repo-path", env = "GH_PATH", value_name = "PATH")]
    pub repo_path: Option<String>,

    /// GitHub token (falls back to the saved login)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Commit message
    #[arg(long)]
    pub message: Option<String>,

    /// API base URL (GitHub Enterprise)
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,
}

impl PublishArgs {
    /// Merge flags over the `[publish]` settings.
    pub fn target(&self, settings: &Settings) -> Result<PublishTarget, CliError> {
        let repo = self
            .repo
            .clone()
            .or_else(|| settings.publish.repo.clone())
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                CliError::args("no repository to publish to")
                    .with_hint("pass --repo owner/name or set [publish] repo in seriesmaster.toml")
            })?;
        if repo.split('/').filter(|p| !p.is_empty()).count() != 2 {
            return Err(CliError::args(format!("repository must be owner/name, got '{repo}'")));
        }
        let branch = self.branch.clone().unwrap_or_else(|| settings.publish.branch.clone());
        let path = self.repo_path.clone().unwrap_or_else(|| settings.publish.path.clone());
        Ok(PublishTarget::new(repo, branch, path))
    }
}

/// Upload one file to a resolved target. `update --publish` resolves the
/// target before touching the master.
pub fn publish_file(
    file: &Path,
    target: &PublishTarget,
    args: &PublishArgs,
    settings: &Settings,
) -> Result<PublishResult, CliError> {
    let data = std::fs::read(file)
        .map_err(|e| CliError::new(EXIT_READ, format!("cannot read {}: {e}", file.display())))?;

    let api_base = args.api_base.clone().unwrap_or_else(|| settings.publish.api_base.clone());
    let client = PublishClient::from_token_or_saved(args.token.as_deref(), api_base).map_err(CliError::publish)?;
    let message = args.message.clone().unwrap_or_else(|| settings.publish.commit_message.clone());

    log::info!("publishing {} to {}:{}/{}", file.display(), target.repo, target.branch, target.path);
    client.upsert_file(target, &data, &message).map_err(CliError::publish)
}

pub fn cmd_publish(file: Option<PathBuf>, args: PublishArgs, json: bool, settings: &Settings) -> Result<(), CliError> {
    let file = file.unwrap_or_else(|| settings.master.path.clone());
    let target = args.target(settings)?;
    let result = publish_file(&file, &target, &args, settings)?;

    if json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        let verb = if result.created { "created" } else { "updated" };
        eprintln!("{verb} {}:{}/{} ({} bytes)", result.repo, result.branch, result.path, result.byte_size);
        if let Some(sha) = &result.commit_sha {
            eprintln!("commit: {sha}");
        }
        eprintln!("hash:   {}", result.content_hash);
    }
    Ok(())
}

pub fn cmd_login(token: String) -> Result<(), CliError> {
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(CliError::args("token is empty"));
    }
    let path = save_auth(&PublishCredentials::new(token)).map_err(CliError::general)?;
    eprintln!("token saved to {}", path.display());
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    match delete_auth().map_err(CliError::general)? {
        true => eprintln!("saved token removed"),
        false => eprintln!("no saved token"),
    }
    Ok(())
}
