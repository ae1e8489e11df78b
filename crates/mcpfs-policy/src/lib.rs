//! # mcpfs-policy
//!
//! Path access control for the mcpfs filesystem server. This crate loads a
//! YAML configuration, expands environment references, normalizes each
//! declared path rule once, and answers "may operation X touch path Y?"
//! with first-match-wins semantics. Anything not explicitly granted is
//! denied.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mcpfs_policy::{Loader, Permission};
//!
//! let config = Loader::default().load("config.yaml").unwrap();
//! let decision = config.evaluate(Permission::WRITE, "/var/data/report.csv");
//! println!("{decision}");
//! ```

mod config;
mod decision;
pub mod env;
mod error;
mod evaluator;
pub mod expand;
pub mod loader;
pub mod paths;
mod permission;
mod rule;
mod schema;
mod shared;

// Re-export primary public API at crate root.
pub use config::Config;
pub use decision::{AccessDecision, MatchedRule};
pub use env::{Env, OsEnv, TestEnv};
pub use error::{ConfigError, Result, UnknownPermission};
pub use evaluator::RuleSet;
pub use loader::Loader;
pub use permission::Permission;
pub use rule::{CanonicalPathRule, DEFAULT_ALLOW_SUBPATHS, DEFAULT_PERMISSION};
pub use schema::{ConfigDocument, DeclaredPathRule, CONFIG_VERSION_V1};
pub use shared::SharedPolicy;
