//! Configuration for the resrun binary.
//!
//! An optional `resrun.yaml` in the working directory names the resource
//! documents to load; `--file` flags on the command line extend or
//! replace it.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default resource document, used when neither a config file nor
/// `--file` flags name any.
pub const DEFAULT_RESOURCE_FILE: &str = "resources.yaml";

/// Name of the optional config file.
pub const CONFIG_FILE: &str = "resrun.yaml";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resource documents to load: filesystem paths or http(s) URLs
    pub resources: Vec<String>,

    /// Working directory for the run's temp files (defaults to a fresh
    /// temp dir)
    pub workdir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self { resources: vec![DEFAULT_RESOURCE_FILE.to_string()], workdir: None }
    }
}

impl Config {
    /// Load the config file from `dir`, falling back to defaults when it
    /// does not exist.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        if config.resources.is_empty() {
            config.resources = vec![DEFAULT_RESOURCE_FILE.to_string()];
        }
        Ok(config)
    }

    /// Resolve the final list of resource URIs: `--file` flags win over
    /// the config file.
    pub fn resource_uris(&self, file_flags: &[String]) -> Vec<String> {
        if file_flags.is_empty() {
            self.resources.clone()
        } else {
            file_flags.to_vec()
        }
    }
}
