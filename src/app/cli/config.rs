//! TOML configuration file parsing and loading
//!
//! An explicitly given path must exist; otherwise the default location
//! under the user configuration directory is used when present. All
//! fields are optional and merge under CLI flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional settings loaded from a `dispatchq.toml` file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub max_retries: Option<u32>,
    pub visibility_timeout_ms: Option<u64>,
    pub retry_backoff_ms: Option<u64>,
    pub reclaim_delay_ms: Option<u64>,
}

/// Load configuration from `path`, or from the default location
///
/// With an explicit `path` the file must exist and parse. Without one,
/// a missing default file simply yields an empty configuration.
pub fn load(path: Option<&Path>) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let config_path = match path {
        Some(explicit) => {
            if !explicit.exists() {
                return Err(format!(
                    "The specified configuration file does not exist: {}",
                    explicit.display()
                )
                .into());
            }
            Some(explicit.to_path_buf())
        }
        None => default_config_path().filter(|p| p.exists()),
    };

    match config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| format!("Error reading configuration file {}: {}", path.display(), e))?;
            let config: FileConfig = toml::from_str(&contents)
                .map_err(|e| format!("Error parsing configuration file {}: {}", path.display(), e))?;
            log::debug!("loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(FileConfig::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dispatchq").join("dispatchq.toml"))
}
