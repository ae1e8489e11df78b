//! Lexical path handling shared by rule normalization and queries.
//!
//! Nothing here touches the filesystem: paths need not exist, and symlinks
//! are not resolved.

use std::path::{Component, Path, PathBuf};

/// Lexically clean `path`.
///
/// Removes `.` segments and redundant separators, and resolves `..` against
/// the preceding normal segment. `..` directly below a root is dropped;
/// leading `..` segments of a relative path are kept. An empty result
/// becomes `.`.
pub fn clean(path: impl AsRef<Path>) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            c => out.push(c),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Clean `path` and, when relative, join it onto `base`.
///
/// Without a base the cleaned relative form is returned unchanged.
pub fn absolutize(path: impl AsRef<Path>, base: Option<&Path>) -> PathBuf {
    let cleaned = clean(path);
    if cleaned.is_absolute() {
        return cleaned;
    }
    match base {
        Some(base) => clean(base.join(cleaned)),
        None => cleaned,
    }
}

/// Whether `target` is `ancestor` itself or lies strictly below it.
///
/// Both paths must already be cleaned. The comparison is per component, so
/// `/a/bc` is not below `/a/b`, and paths on different roots never relate.
pub fn is_within(ancestor: &Path, target: &Path) -> bool {
    target.strip_prefix(ancestor).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clean_removes_dots_and_separators() {
        assert_eq!(clean("/a//b/./c/"), PathBuf::from("/a/b/c"));
        assert_eq!(clean("/a/b/../c"), PathBuf::from("/a/c"));
        assert_eq!(clean("./a/b"), PathBuf::from("a/b"));
    }

    #[test]
    fn clean_drops_parent_above_root() {
        assert_eq!(clean("/../../etc"), PathBuf::from("/etc"));
        assert_eq!(clean("/.."), PathBuf::from("/"));
    }

    #[test]
    fn clean_keeps_leading_parent_of_relative_path() {
        assert_eq!(clean("../a/../../b"), PathBuf::from("../../b"));
        assert_eq!(clean("a/../.."), PathBuf::from(".."));
    }

    #[test]
    fn clean_empty_is_dot() {
        assert_eq!(clean(""), PathBuf::from("."));
        assert_eq!(clean("a/.."), PathBuf::from("."));
    }

    #[test]
    fn absolutize_joins_relative_onto_base() {
        let base = Path::new("/srv/app");
        assert_eq!(absolutize("data/../logs", Some(base)), PathBuf::from("/srv/app/logs"));
        assert_eq!(absolutize("../x", Some(base)), PathBuf::from("/srv/x"));
        assert_eq!(absolutize(".", Some(base)), PathBuf::from("/srv/app"));
        assert_eq!(absolutize("/etc/./hosts", Some(base)), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn absolutize_without_base_keeps_relative() {
        assert_eq!(absolutize("./data/", None), PathBuf::from("data"));
    }

    #[test]
    fn is_within_checks_components() {
        let rule = Path::new("/a/b");
        assert!(is_within(rule, Path::new("/a/b")));
        assert!(is_within(rule, Path::new("/a/b/c/d")));
        assert!(!is_within(rule, Path::new("/a/bc")));
        assert!(!is_within(rule, Path::new("/a")));
        assert!(!is_within(rule, Path::new("b/c")));
    }

    #[test]
    fn is_within_accepts_dot_dot_prefixed_names() {
        // A child literally named `..data` is still below the rule path.
        assert!(is_within(Path::new("/srv"), Path::new("/srv/..data")));
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(segments in prop::collection::vec("[a-z]{1,3}|\\.|\\.\\.", 0..8), absolute in any::<bool>()) {
            let joined = segments.join("/");
            let raw = if absolute { format!("/{joined}") } else { joined };
            let once = clean(&raw);
            prop_assert_eq!(clean(&once), once);
        }
    }
}
