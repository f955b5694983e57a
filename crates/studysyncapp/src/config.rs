//! # Configuration
//!
//! Settings are loaded with [`confique`] from three layers, highest first:
//!
//! 1. **Environment variables**: `STUDYSYNC_API_URL`, `STUDYSYNC_TOKEN`, etc.
//! 2. **Config file**: `studysync.toml` in the OS config directory (via the
//!    `directories` crate), or whatever path the caller passes.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! A missing config file is not an error.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `api_base_url` | `STUDYSYNC_API_URL` | `http://localhost:8000` | Server root |
//! | `request_timeout_secs` | `STUDYSYNC_TIMEOUT_SECS` | `30` | Per-request timeout |
//! | `data_dir` | `STUDYSYNC_DATA_DIR` | OS data dir | Where collection blobs live |
//! | `user_id` | `STUDYSYNC_USER_ID` | none | Owner stamped on created records |
//! | `auth_token` | `STUDYSYNC_TOKEN` | none | Bearer token for the session |

use std::path::{Path, PathBuf};

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub const CONFIG_FILE_NAME: &str = "studysync.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StudyConfig {
    /// Root URL of the study server.
    #[config(env = "STUDYSYNC_API_URL", default = "http://localhost:8000")]
    pub api_base_url: String,

    /// Seconds before a request is abandoned.
    #[config(env = "STUDYSYNC_TIMEOUT_SECS", default = 30)]
    pub request_timeout_secs: u64,

    /// Directory holding the persisted collections.
    #[config(env = "STUDYSYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Signed-in user. Creating records requires it.
    #[config(env = "STUDYSYNC_USER_ID")]
    pub user_id: Option<String>,

    /// Session token, sent as `Authorization: Bearer`.
    #[config(env = "STUDYSYNC_TOKEN")]
    pub auth_token: Option<String>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            data_dir: None,
            user_id: None,
            auth_token: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "studysync", "studysync")
}

/// `studysync.toml` in the OS config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl StudyConfig {
    /// Load env over `path` (or the default config file) over defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = StudyConfig::builder().env();
        let file = path.map(Path::to_path_buf).or_else(default_config_path);
        if let Some(file) = &file {
            tracing::debug!("Reading configuration from {}", file.display());
            builder = builder.file(file);
        }
        let config = builder.load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured data directory, falling back to the OS data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                SyncError::Config(
                    "No home directory found; set STUDYSYNC_DATA_DIR".to_string(),
                )
            })
    }

    /// Blank values count as unset.
    pub fn user_id(&self) -> Option<String> {
        self.user_id.clone().filter(|u| !u.trim().is_empty())
    }
}
