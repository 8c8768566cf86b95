// Settings
// Loaded from --config, ./seriesmaster.toml, or ~/.config/seriesmaster/settings.toml

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use seriesmaster_recon::Schema;

/// Settings file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "seriesmaster.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read.
    Read { path: String, message: String },
    /// TOML syntax or type error.
    Parse { path: String, message: String },
    /// Parsed, but semantically invalid.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read settings {path}: {message}"),
            Self::Parse { path, message } => write!(f, "invalid settings {path}: {message}"),
            Self::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterSettings {
    pub path: PathBuf,
    pub sheet: String,
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./MasterSeriesHistory.xlsx"),
            sheet: "Master".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Directory receiving one audit file per run.
    pub dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("./logs") }
    }
}

/// Target of `publish`. `repo` is `owner/name`; unset disables publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub repo: Option<String>,
    pub branch: String,
    /// Path of the master inside the repository.
    pub path: String,
    pub api_base: String,
    pub commit_message: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            repo: None,
            branch: "main".into(),
            path: "MasterSeriesHistory.xlsx".into(),
            api_base: "https://api.github.com".into(),
            commit_message: "Update master series history".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    pub top_n: usize,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub master: MasterSettings,
    pub logs: LogSettings,
    pub schema: Schema,
    pub publish: PublishSettings,
    pub compare: CompareSettings,
}

impl Settings {
    /// User-level settings file path.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("seriesmaster")
            .join("settings.toml")
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Self::parse(input, "<inline>")
    }

    fn parse(input: &str, origin: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and validate one settings file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Resolve settings. An explicit path must exist; otherwise the local
    /// file, then the user file, then built-in defaults. Returns the file
    /// used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_from(explicit, Path::new(LOCAL_CONFIG_FILE), &Self::config_path())
    }

    fn load_from(explicit: Option<&Path>, local: &Path, user: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        for candidate in [local, user] {
            if candidate.is_file() {
                log::debug!("using settings from {}", candidate.display());
                return Ok((Self::from_file(candidate)?, Some(candidate.to_path_buf())));
            }
        }
        log::debug!("no settings file found; using defaults");
        Ok((Self::default(), None))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.master.sheet.trim().is_empty() {
            return Err(ConfigError::Invalid("master.sheet must not be blank".into()));
        }
        if self.compare.top_n == 0 {
            return Err(ConfigError::Invalid("compare.top_n must be at least 1".into()));
        }
        if let Some(repo) = &self.publish.repo {
            if repo.split('/').filter(|p| !p.is_empty()).count() != 2 {
                return Err(ConfigError::Invalid(format!(
                    "publish.repo must be owner/name, got '{repo}'"
                )));
            }
        }
        Ok(())
    }

    /// Effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
