use crate::error::{CoreError, Result};
use crate::oracle::OracleConfig;
use calscrape_scanner::{DEFAULT_USER_AGENT, ExtractConfig, SectionClassifier};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Everything a run needs: HTTP politeness, extraction tunables and the
/// oracle endpoint. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub workers: usize,
    /// Pause after each fetch, per worker.
    pub delay_ms: u64,
    pub extract: ExtractConfig,
    pub oracle: OracleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
            workers: 8,
            delay_ms: 500,
            extract: ExtractConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| CoreError::json(path, e))?;
        config.extract.validate()?;
        SectionClassifier::for_programs(&config.extract)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
        crate::store::write_json_atomic(path, self)
    }
}
