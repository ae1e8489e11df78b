use std::path::Path;

use crate::decision::AccessDecision;
use crate::evaluator::RuleSet;
use crate::permission::Permission;
use crate::rule::CanonicalPathRule;
use crate::schema::{ConfigDocument, DeclaredPathRule, CONFIG_VERSION_V1};

/// A loaded configuration: the expanded document plus its queryable rules.
///
/// Produced by [`Loader`](crate::Loader). The default value has no rules
/// and denies every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    document: ConfigDocument,
    rules: RuleSet,
}

impl Config {
    pub(crate) fn new(document: ConfigDocument, rules: RuleSet) -> Self {
        Self { document, rules }
    }

    /// Document after environment expansion and version stamping.
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn version(&self) -> &str {
        self.document.version.as_deref().unwrap_or(CONFIG_VERSION_V1)
    }

    pub fn log_level(&self) -> &str {
        &self.document.log_level
    }

    pub fn log_path(&self) -> &str {
        &self.document.log_path
    }

    /// Declared rules paired with their canonical form, in declared order.
    pub fn entries(&self) -> impl Iterator<Item = (&DeclaredPathRule, &CanonicalPathRule)> {
        self.document.paths.iter().zip(self.rules.rules())
    }

    pub fn is_allowed(&self, op: Permission, path: impl AsRef<Path>) -> bool {
        self.rules.is_allowed(op, path)
    }

    pub fn evaluate(&self, op: Permission, path: impl AsRef<Path>) -> AccessDecision {
        self.rules.evaluate(op, path)
    }
}
