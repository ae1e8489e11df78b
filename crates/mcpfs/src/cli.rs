use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mcpfs_policy::Permission;

#[derive(Parser, Debug)]
#[command(name = "mcpfs", version, about = "Filesystem access policy for MCP servers")]
pub struct Cli {
    /// Path to the configuration file (default: <config dir>/mcpfs/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: debug, info, warn, error (overrides config file setting)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log file (overrides config file setting)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    /// Seconds to wait for the configuration file to be read
    #[arg(long, global = true, default_value_t = 5)]
    pub load_timeout: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether an operation on a path is allowed
    Check {
        /// Operation: read, write or exec
        op: Permission,
        /// Path to check; relative paths resolve against the working directory
        path: PathBuf,
    },
    /// Print the configuration after environment expansion
    Show {
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
    /// List the normalized rules in evaluation order
    Rules,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_parses_operation() {
        let cli = Cli::try_parse_from(["mcpfs", "check", "W", "/srv/file"]).unwrap();
        match cli.command {
            Some(Command::Check { op, path }) => {
                assert_eq!(op, Permission::WRITE);
                assert_eq!(path, PathBuf::from("/srv/file"));
            }
            other => panic!("expected check, got {other:?}"),
        }
        assert_eq!(cli.load_timeout, 5);
    }

    #[test]
    fn check_rejects_unknown_operation() {
        assert!(Cli::try_parse_from(["mcpfs", "check", "delete", "/srv"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "mcpfs",
            "show",
            "--format",
            "json",
            "-c",
            "/etc/mcpfs.yaml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/mcpfs.yaml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Some(Command::Show { format: Format::Json })));
    }
}
