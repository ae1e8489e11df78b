use std::fmt;
use std::path::PathBuf;

/// The outcome of evaluating an access request against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the operation is permitted.
    pub allowed: bool,
    /// The granting rule, if any.
    pub matched_rule: Option<MatchedRule>,
    /// Human-readable reason explaining the decision.
    pub reason: String,
}

/// Position and path of the rule that granted access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRule {
    /// Zero-based position in declared order.
    pub index: usize,
    pub path: PathBuf,
}

impl AccessDecision {
    pub fn allow(index: usize, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            allowed: true,
            reason: format!("granted by rule #{index} ({})", path.display()),
            matched_rule: Some(MatchedRule { index, path }),
        }
    }

    /// Denial with no granting rule.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            matched_rule: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "allowed" } else { "denied" };
        write!(f, "{verdict}: {}", self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_records_rule() {
        let d = AccessDecision::allow(2, "/srv/data");
        assert!(d.allowed);
        assert_eq!(
            d.matched_rule,
            Some(MatchedRule {
                index: 2,
                path: PathBuf::from("/srv/data"),
            })
        );
        assert_eq!(d.to_string(), "allowed: granted by rule #2 (/srv/data)");
    }

    #[test]
    fn deny_has_no_rule() {
        let d = AccessDecision::deny("no rule grants write");
        assert!(!d.allowed);
        assert!(d.matched_rule.is_none());
        assert_eq!(d.to_string(), "denied: no rule grants write");
    }
}
