//! Process environment abstraction.
//!
//! The loader never consults `std::env` directly: it is handed an [`Env`]
//! at construction so tests can supply variables, a working directory, and
//! a home directory without touching the real process state.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// The parts of the process environment the policy loader depends on.
pub trait Env: Send + Sync {
    /// Value of an environment variable, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Directory relative paths are resolved against.
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Per-user configuration base directory (e.g. `~/.config`).
    fn config_dir(&self) -> Option<PathBuf>;

    /// Per-user state base directory (e.g. `~/.local/state`).
    fn state_dir(&self) -> Option<PathBuf>;
}

/// [`Env`] backed by the real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }

    fn state_dir(&self) -> Option<PathBuf> {
        // macOS and Windows have no state dir; fall back to local data.
        dirs::state_dir().or_else(dirs::data_local_dir)
    }
}

/// In-memory [`Env`] for tests.
///
/// Directories follow the XDG layout below `home`. Without a working
/// directory, [`Env::current_dir`] fails, which exercises the best-effort
/// path fallback.
#[derive(Debug, Clone, Default)]
pub struct TestEnv {
    vars: HashMap<String, String>,
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl TestEnv {
    /// Environment with `HOME` and the working directory both set to `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let mut env = Self {
            vars: HashMap::new(),
            cwd: Some(home.clone()),
            home: None,
        };
        env.set("HOME", home.to_string_lossy());
        env.home = Some(home);
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Make [`Env::current_dir`] fail.
    #[must_use]
    pub fn without_cwd(mut self) -> Self {
        self.cwd = None;
        self
    }
}

impl Env for TestEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        self.cwd
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no working directory"))
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join(".config"))
    }

    fn state_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join(".local").join("state"))
    }
}
