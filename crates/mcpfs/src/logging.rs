use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use mcpfs_policy::loader::APP_NAME;
use mcpfs_policy::Env;
use tracing::level_filters::LevelFilter;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const LOG_FILENAME: &str = "log.json";

/// Map a user-facing level name to a filter directive. Unknown names fall
/// back to `info`.
pub fn level_directive(name: &str) -> &'static str {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Pick the log level: flag, then config, then `info`.
pub fn resolve_level(flag: Option<&str>, config: &str) -> &'static str {
    match flag.filter(|s| !s.is_empty()) {
        Some(level) => level_directive(level),
        None if !config.is_empty() => level_directive(config),
        None => "info",
    }
}

/// Pick the log file: flag, then config, then `<state dir>/mcpfs/log.json`.
pub fn resolve_destination(flag: Option<&Path>, config: &str, env: &dyn Env) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }
    if !config.is_empty() {
        return Some(PathBuf::from(config));
    }
    env.state_dir()
        .map(|dir| dir.join(APP_NAME).join(LOG_FILENAME))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

enum Target {
    /// Formatted events held until the destination is known.
    Buffer(Vec<(Level, Vec<u8>)>),
    Stderr,
    File(File),
}

impl Target {
    fn write_event(&mut self, level: Level, buf: &[u8]) -> io::Result<usize> {
        match self {
            Target::Buffer(events) => {
                events.push((level, buf.to_vec()));
                Ok(buf.len())
            }
            Target::Stderr => io::stderr().write(buf),
            Target::File(file) => file.write(buf),
        }
    }

    fn write_all_event(&mut self, level: Level, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.write_event(level, buf)?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            buf = &buf[n..];
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Target::Buffer(_) => Ok(()),
            Target::Stderr => io::stderr().flush(),
            Target::File(file) => file.flush(),
        }
    }
}

/// Writer whose destination is decided after the subscriber is installed.
///
/// Starts out buffering; activating it switches it to stderr or a
/// file and replays the buffered events that pass the final level.
#[derive(Clone)]
pub struct LogSink {
    target: Arc<Mutex<Target>>,
}

impl LogSink {
    pub fn buffered() -> Self {
        Self {
            target: Arc::new(Mutex::new(Target::Buffer(Vec::new()))),
        }
    }

    fn activate(&self, next: Target, max_level: LevelFilter) -> io::Result<()> {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        if let Target::Buffer(events) = mem::replace(&mut *target, next) {
            for (level, line) in events {
                if level <= max_level {
                    target.write_all_event(level, &line)?;
                }
            }
        }
        target.flush()
    }
}

pub struct SinkWriter {
    target: Arc<Mutex<Target>>,
    level: Level,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        target.write_event(self.level, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        target.flush()
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            target: Arc::clone(&self.target),
            level: Level::INFO,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SinkWriter {
            target: Arc::clone(&self.target),
            level: *meta.level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Startup logging
// ---------------------------------------------------------------------------

/// Where log output ended up.
#[derive(Debug)]
pub enum Destination {
    File(PathBuf),
    Stderr,
    /// The file could not be opened; output went to stderr instead.
    Fallback { path: PathBuf, error: io::Error },
}

/// Handle to the global subscriber while its level and destination are
/// still unknown.
pub struct Logging {
    sink: LogSink,
    filter: reload::Handle<EnvFilter, Registry>,
    /// `RUST_LOG` was set and already filters every event.
    env_override: bool,
}

/// Install the global JSON subscriber before the configuration is loaded.
///
/// Events are buffered until [`Logging::finish`] picks the final level and
/// destination, so nothing logged while loading is lost.
pub fn init() -> Logging {
    let (initial, env_override) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new("trace"), false),
    };
    let (filter, handle) = reload::Layer::new(initial);
    let sink = LogSink::buffered();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(sink.clone()),
        )
        .init();

    Logging {
        sink,
        filter: handle,
        env_override,
    }
}

impl Logging {
    /// Apply the final level and send output to `destination` (stderr when
    /// `None`). `RUST_LOG` overrides `level`.
    pub fn finish(self, level: &str, destination: Option<PathBuf>) -> io::Result<Destination> {
        let max_level = if self.env_override {
            LevelFilter::TRACE
        } else {
            self.filter
                .reload(EnvFilter::new(level))
                .map_err(io::Error::other)?;
            level.parse().unwrap_or(LevelFilter::INFO)
        };

        let (target, destination) = open_destination(destination);
        self.sink.activate(target, max_level)?;
        Ok(destination)
    }
}

fn open_destination(destination: Option<PathBuf>) -> (Target, Destination) {
    match destination {
        Some(path) => match open_log_file(&path) {
            Ok(file) => (Target::File(file), Destination::File(path)),
            Err(error) => (Target::Stderr, Destination::Fallback { path, error }),
        },
        None => (Target::Stderr, Destination::Stderr),
    }
}
