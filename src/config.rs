//! Configuration for the command line front end
//!
//! Read from `~/.config/cloudstub/config.json` (platform config dir, or the
//! file named by `CLOUDSTUB_CONFIG`), then overridden by `CLOUDSTUB_*`
//! environment variables. Every field is optional in the file.

use crate::store::{DEFAULT_EXPIRY_SECS, DEFAULT_URL_BASE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "CLOUDSTUB_CONFIG";
pub const ENV_ROOT: &str = "CLOUDSTUB_ROOT";
pub const ENV_URL_BASE: &str = "CLOUDSTUB_URL_BASE";
pub const ENV_DEFAULT_EXPIRY: &str = "CLOUDSTUB_DEFAULT_EXPIRY";

/// Effective settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `containers/` and `buckets/`
    pub root: PathBuf,
    /// Base for generated presigned URLs
    pub url_base: String,
    /// Expiry used when `presign` is not given one
    pub default_expiry_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from(".cloudstub"),
            url_base: DEFAULT_URL_BASE.to_string(),
            default_expiry_secs: DEFAULT_EXPIRY_SECS,
        }
    }
}

impl Config {
    /// Config file location: `CLOUDSTUB_CONFIG`, else the platform config dir
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_CONFIG) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("cloudstub").join("config.json"))
    }

    /// Defaults, then the config file, then the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path().as_deref(), |name| {
            std::env::var(name).ok()
        })
    }

    /// Defaults, then `path` (if given and present), then `env` lookups
    pub fn load_from(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env(env)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    fn apply_env(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(root) = env(ENV_ROOT) {
            self.root = PathBuf::from(root);
        }
        if let Some(url_base) = env(ENV_URL_BASE) {
            self.url_base = url_base;
        }
        if let Some(expiry) = env(ENV_DEFAULT_EXPIRY) {
            self.default_expiry_secs = expiry.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be an integer, got '{}'",
                    ENV_DEFAULT_EXPIRY, expiry
                ))
            })?;
        }
        Ok(self)
    }

    /// Root of the container flavored store
    pub fn container_root(&self) -> PathBuf {
        self.root.join("containers")
    }

    /// Root of the bucket flavored store
    pub fn bucket_root(&self) -> PathBuf {
        self.root.join("buckets")
    }
}
