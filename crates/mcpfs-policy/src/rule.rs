use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::paths;
use crate::permission::Permission;
use crate::schema::DeclaredPathRule;

/// Subpaths are covered unless a rule opts out.
pub const DEFAULT_ALLOW_SUBPATHS: bool = true;

/// Mask granted by a rule that lists no permissions. Never write or exec.
pub const DEFAULT_PERMISSION: Permission = Permission::READ;

/// A path rule in its evaluatable form.
///
/// Built once from a [`DeclaredPathRule`] by [`CanonicalPathRule::normalize`]
/// and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPathRule {
    path: PathBuf,
    mask: Permission,
    allow_subpaths: bool,
}

impl CanonicalPathRule {
    /// Normalize a declared rule.
    ///
    /// Relative paths are resolved against `base`; without a base the
    /// cleaned relative path is kept and loading continues. Fails only when
    /// a permission token is unrecognised.
    pub fn normalize(decl: &DeclaredPathRule, base: Option<&Path>) -> Result<Self> {
        let mask = if decl.perms.is_empty() {
            DEFAULT_PERMISSION
        } else {
            Permission::parse(&decl.perms)
                .map_err(|e| ConfigError::invalid_permission(&decl.path, e))?
        };

        let path = paths::absolutize(&decl.path, base);
        if !path.is_absolute() {
            warn!(
                rule = %decl.path,
                path = %path.display(),
                "could not make rule path absolute; keeping relative form"
            );
        }

        Ok(Self {
            path,
            mask,
            allow_subpaths: decl.allow_subpaths.unwrap_or(DEFAULT_ALLOW_SUBPATHS),
        })
    }

    /// Cleaned, absolute (best effort) path the rule covers.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mask(&self) -> Permission {
        self.mask
    }

    pub fn allow_subpaths(&self) -> bool {
        self.allow_subpaths
    }

    /// Whether the rule grants any part of `op`.
    pub fn grants(&self, op: Permission) -> bool {
        self.mask.intersects(op)
    }

    /// Whether `target` (already cleaned) falls under this rule's path.
    pub fn matches_path(&self, target: &Path) -> bool {
        if self.path == target {
            return true;
        }
        self.allow_subpaths && paths::is_within(&self.path, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decl(path: &str, perms: &[&str], allow_subpaths: Option<bool>) -> DeclaredPathRule {
        DeclaredPathRule {
            path: path.to_string(),
            perms: perms.iter().map(|p| p.to_string()).collect(),
            allow_subpaths,
            description: String::new(),
        }
    }

    #[test]
    fn empty_perms_default_to_read_only() {
        let rule = CanonicalPathRule::normalize(&decl("/srv", &[], None), None).unwrap();
        assert_eq!(rule.mask(), Permission::READ);
        assert!(!rule.grants(Permission::WRITE));
        assert!(!rule.grants(Permission::EXEC));
    }

    #[test]
    fn unset_subpath_flag_defaults_to_true() {
        let rule = CanonicalPathRule::normalize(&decl("/srv", &["w"], None), None).unwrap();
        assert!(rule.allow_subpaths());

        let rule = CanonicalPathRule::normalize(&decl("/srv", &["w"], Some(false)), None).unwrap();
        assert!(!rule.allow_subpaths());
    }

    #[test]
    fn relative_path_resolves_against_base() {
        let base = Path::new("/work");
        let rule = CanonicalPathRule::normalize(&decl("./data/../out", &[], None), Some(base))
            .unwrap();
        assert_eq!(rule.path(), Path::new("/work/out"));
    }

    #[test]
    fn relative_path_without_base_is_kept() {
        let rule = CanonicalPathRule::normalize(&decl("data//in/", &[], None), None).unwrap();
        assert_eq!(rule.path(), Path::new("data/in"));
    }

    #[test]
    fn invalid_permission_reports_rule_path() {
        let err = CanonicalPathRule::normalize(&decl("/srv/data", &["read", "delete"], None), None)
            .unwrap_err();
        match err {
            ConfigError::InvalidPermission { path, token } => {
                assert_eq!(path, "/srv/data");
                assert_eq!(token, "delete");
            }
            other => panic!("expected InvalidPermission, got {other:?}"),
        }
    }

    #[test]
    fn canonical_path_is_stable() {
        let rule = CanonicalPathRule::normalize(&decl("/a/b/c", &[], None), None).unwrap();
        let again = CanonicalPathRule::normalize(
            &decl(&rule.path().to_string_lossy(), &[], None),
            Some(Path::new("/elsewhere")),
        )
        .unwrap();
        assert_eq!(again.path(), rule.path());
    }

    proptest! {
        #[test]
        fn missing_perms_never_grant_write_or_exec(path in "/[a-z]{1,8}(/[a-z]{1,8}){0,3}", subpaths in proptest::option::of(any::<bool>())) {
            let rule = CanonicalPathRule::normalize(&decl(&path, &[], subpaths), None).unwrap();
            prop_assert_eq!(rule.mask(), Permission::READ);
            prop_assert_eq!(rule.allow_subpaths(), subpaths.unwrap_or(true));
        }
    }
}
