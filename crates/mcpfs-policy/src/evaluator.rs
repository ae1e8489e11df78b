use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::decision::AccessDecision;
use crate::error::Result;
use crate::paths;
use crate::permission::Permission;
use crate::rule::CanonicalPathRule;
use crate::schema::DeclaredPathRule;

/// Ordered, immutable set of canonical path rules.
///
/// Queries walk the rules in declared order and stop at the first rule that
/// both grants the requested operation and covers the path. There are no
/// deny rules: anything not granted is denied, and an empty set denies
/// everything.
///
/// A `RuleSet` holds no interior mutability, so it can be shared across
/// threads and queried concurrently without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<CanonicalPathRule>,
    /// Directory relative query paths are resolved against.
    base_dir: Option<PathBuf>,
}

impl RuleSet {
    pub fn new(rules: Vec<CanonicalPathRule>, base_dir: Option<PathBuf>) -> Self {
        Self { rules, base_dir }
    }

    /// Normalize every declared rule in order.
    ///
    /// The first invalid rule fails the whole set.
    pub fn from_declared(decls: &[DeclaredPathRule], base_dir: Option<PathBuf>) -> Result<Self> {
        let rules = decls
            .iter()
            .map(|d| CanonicalPathRule::normalize(d, base_dir.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules, base_dir))
    }

    pub fn rules(&self) -> &[CanonicalPathRule] {
        &self.rules
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `op` on `path` is permitted.
    pub fn is_allowed(&self, op: Permission, path: impl AsRef<Path>) -> bool {
        self.evaluate(op, path).allowed
    }

    /// Evaluate `op` on `path`, reporting which rule granted it.
    ///
    /// `path` may be relative; it is cleaned and resolved the same way rule
    /// paths are.
    pub fn evaluate(&self, op: Permission, path: impl AsRef<Path>) -> AccessDecision {
        let target = paths::absolutize(path, self.base_dir.as_deref());
        debug!(%op, path = %target.display(), rules = self.rules.len(), "evaluating access");

        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.grants(op) {
                continue;
            }
            if rule.matches_path(&target) {
                trace!(index, rule = %rule.path().display(), "rule granted access");
                return AccessDecision::allow(index, rule.path());
            }
        }

        AccessDecision::deny(format!("no rule grants {op} on {}", target.display()))
    }
}
