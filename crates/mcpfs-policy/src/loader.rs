use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_yml::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::env::{Env, OsEnv};
use crate::error::{ConfigError, Result};
use crate::evaluator::RuleSet;
use crate::expand::expand_value;
use crate::schema::{ConfigDocument, CONFIG_VERSION_V1};

/// Application name used for per-user directories.
pub const APP_NAME: &str = "mcpfs";

/// File name of the per-user configuration.
pub const DEFAULT_CONFIG_FILENAME: &str = "config.yaml";

/// Reads configuration files and turns them into queryable [`Config`]s.
///
/// Pipeline: raw bytes → YAML value → version stamp → environment
/// expansion → typed document → rule normalization.
///
/// ```rust,no_run
/// use mcpfs_policy::{Loader, Permission};
///
/// let cfg = Loader::default().load("config.yaml").unwrap();
/// let allowed = cfg.is_allowed(Permission::WRITE, "/var/data/foo");
/// ```
#[derive(Clone)]
pub struct Loader {
    env: Arc<dyn Env>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(OsEnv)
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").finish_non_exhaustive()
    }
}

impl Loader {
    pub fn new(env: impl Env + 'static) -> Self {
        Self { env: Arc::new(env) }
    }

    /// The environment this loader expands variables and resolves paths with.
    pub fn env(&self) -> &dyn Env {
        self.env.as_ref()
    }

    /// `<user config dir>/mcpfs/config.yaml`.
    pub fn default_path(&self) -> Result<PathBuf> {
        let dir = self.env.config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(APP_NAME).join(DEFAULT_CONFIG_FILENAME))
    }

    /// Read the raw bytes of a configuration file.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| ConfigError::from_io(path, e))?;
        if meta.is_dir() {
            return Err(ConfigError::IsDirectory {
                path: path.to_path_buf(),
            });
        }
        std::fs::read(path).map_err(|e| ConfigError::from_io(path, e))
    }

    /// Parse configuration bytes into a [`Config`].
    ///
    /// An empty document yields a configuration with no rules. The default
    /// version is stamped before expansion, so `version: "${UNSET}"` ends up
    /// as an empty version rather than `"1.0"`.
    pub fn parse(&self, data: &[u8]) -> Result<Config> {
        let mut value: Value = serde_yml::from_slice(data)?;
        stamp_version(&mut value);
        expand_value(&mut value, self.env.as_ref());

        let document: ConfigDocument = if value.is_null() {
            ConfigDocument {
                version: Some(CONFIG_VERSION_V1.to_string()),
                ..ConfigDocument::default()
            }
        } else {
            serde_yml::from_value(value)?
        };

        let base_dir = match self.env.current_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!(error = %e, "cannot determine working directory; relative paths stay relative");
                None
            }
        };
        let rules = RuleSet::from_declared(&document.paths, base_dir)?;

        info!(
            version = document.version.as_deref().unwrap_or_default(),
            rules = rules.len(),
            "configuration parsed"
        );
        Ok(Config::new(document, rules))
    }

    /// Read and parse the configuration at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let data = self.read(path)?;
        self.parse(&data)
    }

    /// Load the per-user configuration from [`Loader::default_path`].
    pub fn load_default(&self) -> Result<Config> {
        let path = self.default_path()?;
        self.load(path)
    }

    /// Load `path` when given, otherwise the per-user configuration.
    pub fn load_optional(&self, path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => self.load(path),
            None => self.load_default(),
        }
    }

    /// Like [`Loader::load`], but on the async runtime and bounded by
    /// `timeout`. A slow filesystem fails with [`ConfigError::Timeout`]
    /// instead of blocking the caller indefinitely.
    pub async fn load_with_timeout(
        &self,
        path: impl AsRef<Path>,
        timeout: Duration,
    ) -> Result<Config> {
        let path = path.as_ref();
        debug!(path = %path.display(), ?timeout, "loading configuration");
        let data = read_within(path, timeout, read_async(path)).await?;
        self.parse(&data)
    }
}

/// Documents without a version predate versioning and are read as `1.0`.
fn stamp_version(value: &mut Value) {
    let Value::Mapping(map) = value else {
        return;
    };
    let blank = match map.get("version") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if blank {
        map.insert(Value::from("version"), Value::from(CONFIG_VERSION_V1));
    }
}

async fn read_async(path: &Path) -> Result<Vec<u8>> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| ConfigError::from_io(path, e))?;
    if meta.is_dir() {
        return Err(ConfigError::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::from_io(path, e))
}

async fn read_within<F>(path: &Path, timeout: Duration, read: F) -> Result<Vec<u8>>
where
    F: Future<Output = Result<Vec<u8>>>,
{
    tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| ConfigError::Timeout {
            path: path.to_path_buf(),
            timeout,
        })?
}
