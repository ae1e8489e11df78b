use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::config::Config;
use crate::decision::AccessDecision;
use crate::error::Result;
use crate::loader::Loader;
use crate::permission::Permission;

/// A swappable handle to the active [`Config`].
///
/// Readers take a cheap [`Arc`] snapshot and evaluate without holding the
/// lock. A reload builds the new configuration first and swaps it in only
/// on success, so a broken file never replaces a working policy.
#[derive(Debug, Clone)]
pub struct SharedPolicy {
    inner: Arc<RwLock<Arc<Config>>>,
}

impl SharedPolicy {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// A policy with no rules. Denies everything.
    pub fn empty() -> Self {
        Self::new(Config::default())
    }

    /// The configuration in effect right now.
    pub fn snapshot(&self) -> Arc<Config> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `config`, returning the one it replaced.
    pub fn replace(&self, config: Config) -> Arc<Config> {
        self.install(Arc::new(config))
    }

    fn install(&self, config: Arc<Config>) -> Arc<Config> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, config)
    }

    /// Reload from `path`, returning the configuration this call installed.
    /// On failure the current configuration stays active and the error is
    /// returned.
    pub fn reload(&self, loader: &Loader, path: impl AsRef<Path>) -> Result<Arc<Config>> {
        let path = path.as_ref();
        match loader.load(path) {
            Ok(config) => {
                let config = Arc::new(config);
                self.install(Arc::clone(&config));
                info!(path = %path.display(), rules = config.rules().len(), "policy reloaded");
                Ok(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "policy reload failed; keeping previous rules");
                Err(e)
            }
        }
    }

    pub fn is_allowed(&self, op: Permission, path: impl AsRef<Path>) -> bool {
        self.snapshot().is_allowed(op, path)
    }

    pub fn evaluate(&self, op: Permission, path: impl AsRef<Path>) -> AccessDecision {
        self.snapshot().evaluate(op, path)
    }
}

impl Default for SharedPolicy {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Config> for SharedPolicy {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}
