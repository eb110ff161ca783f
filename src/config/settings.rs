use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ShellError;
use crate::resolve::DEFAULT_MAX_ALIAS_DEPTH;
use crate::tracker::DEFAULT_FAILURE_THRESHOLD;

/// Settings for building a [`Shell`](crate::shell::Shell).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShellSettings {
    pub system_dir: PathBuf,
    #[serde(default)]
    pub user_dir: Option<PathBuf>,
    #[serde(default = "default_nav_prefix")]
    pub nav_prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub golden_failure_threshold: u64,
    /// Directory for workflow records. Records are kept in memory when unset.
    #[serde(default)]
    pub record_dir: Option<PathBuf>,
    #[serde(default = "default_max_alias_depth")]
    pub max_alias_depth: usize,
}

fn default_nav_prefix() -> String {
    "0".to_string()
}

fn default_timeout_secs() -> u64 {
    crate::exec::DEFAULT_TIMEOUT_SECS
}

fn default_failure_threshold() -> u64 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_max_alias_depth() -> usize {
    DEFAULT_MAX_ALIAS_DEPTH
}

impl Default for ShellSettings {
    fn default() -> Self {
        ShellSettings {
            system_dir: PathBuf::from("config"),
            user_dir: None,
            nav_prefix: default_nav_prefix(),
            default_timeout_secs: default_timeout_secs(),
            golden_failure_threshold: default_failure_threshold(),
            record_dir: None,
            max_alias_depth: default_max_alias_depth(),
        }
    }
}

impl ShellSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, ShellError> {
        toml::from_str(content).map_err(|e| ShellError::ConfigParse(format!("settings: {}", e)))
    }

    /// Read settings from a TOML file. Relative directories are taken
    /// relative to the file's own directory.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ShellError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let mut settings = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            settings.system_dir = rebase(base, &settings.system_dir);
            settings.user_dir = settings.user_dir.map(|dir| rebase(base, &dir));
            settings.record_dir = settings.record_dir.map(|dir| rebase(base, &dir));
        }
        Ok(settings)
    }
}

fn rebase(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}
