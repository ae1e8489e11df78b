mod cli;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use mcpfs_policy::{Config, ConfigError, Loader, Permission};

use crate::cli::{Cli, Command, Format};
use crate::logging::Destination;

/// Exit status of `check` when the operation is denied.
const EXIT_DENIED: u8 = 2;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

struct LoadedConfig {
    config: Config,
    path: PathBuf,
    /// The default location had no file; `config` is empty.
    missing: bool,
}

async fn load_config(loader: &Loader, cli: &Cli) -> Result<LoadedConfig> {
    let timeout = Duration::from_secs(cli.load_timeout);

    if let Some(path) = &cli.config {
        let config = loader
            .load_with_timeout(path, timeout)
            .await
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok(LoadedConfig {
            config,
            path: path.clone(),
            missing: false,
        });
    }

    let path = loader.default_path()?;
    match loader.load_with_timeout(&path, timeout).await {
        Ok(config) => Ok(LoadedConfig {
            config,
            path,
            missing: false,
        }),
        Err(ConfigError::NotFound { .. }) => Ok(LoadedConfig {
            config: Config::default(),
            path,
            missing: true,
        }),
        Err(e) => Err(e).with_context(|| format!("failed to load config {}", path.display())),
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn check(config: &Config, op: Permission, path: &Path) -> ExitCode {
    let decision = config.evaluate(op, path);
    info!(%op, path = %path.display(), allowed = decision.allowed, "access checked");
    println!("{decision}");
    if decision.allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DENIED)
    }
}

fn show(config: &Config, format: Format) -> Result<()> {
    let out = match format {
        Format::Yaml => config.document().to_yaml()?,
        Format::Json => config.document().to_json()?,
    };
    print!("{out}");
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn list_rules(config: &Config) {
    for (index, (decl, rule)) in config.entries().enumerate() {
        let scope = if rule.allow_subpaths() { "subpaths" } else { "exact" };
        let mut line = format!("{index}\t{}\t{}\t{scope}", rule.path().display(), rule.mask());
        if !decl.description.is_empty() {
            line.push('\t');
            line.push_str(&decl.description);
        }
        println!("{line}");
    }
}

fn summary(loaded: &LoadedConfig) {
    let cfg = &loaded.config;
    if loaded.missing {
        println!(
            "no config at {}; all access denied",
            loaded.path.display()
        );
    } else {
        println!(
            "{}: version {}, {} rule(s)",
            loaded.path.display(),
            cfg.version(),
            cfg.rules().len()
        );
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Install tracing-subscriber with JSON format. Events are held back
    //    until the config has named the level and destination.
    let logging = logging::init();

    // 3. Load config.
    let loader = Loader::default();
    let loaded = load_config(&loader, &cli).await;

    // 4. Settle logging, with defaults when the config did not load.
    let (config_level, config_path) = match &loaded {
        Ok(loaded) => (loaded.config.log_level(), loaded.config.log_path()),
        Err(_) => ("", ""),
    };
    let level = logging::resolve_level(cli.log_level.as_deref(), config_level);
    let destination =
        logging::resolve_destination(cli.logfile.as_deref(), config_path, loader.env());
    match logging.finish(level, destination) {
        Ok(Destination::Fallback { path, error }) => {
            warn!(path = %path.display(), %error, "cannot open log file; logging to stderr");
        }
        Ok(Destination::File(path)) => debug!(path = %path.display(), "logging to file"),
        Ok(Destination::Stderr) => {}
        Err(e) => eprintln!("mcpfs: failed to set up logging: {e}"),
    }

    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to load configuration");
            return Err(e);
        }
    };
    if loaded.missing {
        warn!(path = %loaded.path.display(), "config file not found; denying all access");
    }
    info!(
        config_file = %loaded.path.display(),
        version = loaded.config.version(),
        rules = loaded.config.rules().len(),
        "mcpfs starting"
    );

    // 5. Dispatch.
    let code = match cli.command {
        Some(Command::Check { op, ref path }) => check(&loaded.config, op, path),
        Some(Command::Show { format }) => {
            show(&loaded.config, format)?;
            ExitCode::SUCCESS
        }
        Some(Command::Rules) => {
            list_rules(&loaded.config);
            ExitCode::SUCCESS
        }
        None => {
            summary(&loaded);
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
