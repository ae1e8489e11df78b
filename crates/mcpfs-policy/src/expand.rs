//! Environment-variable substitution over a configuration tree.
//!
//! Expansion runs on the generic YAML value before it is deserialized into
//! [`ConfigDocument`](crate::ConfigDocument), so every string the document
//! carries is expanded regardless of which typed field it ends up in.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_yml::value::Tag;
use serde_yml::Value;

use crate::env::Env;

/// Shell-style variable references, tried in order:
///
/// 1. `${c}` for a single special character `c`
/// 2. `${NAME}` (anything up to the first `}`)
/// 3. an unterminated `${`, which expands to nothing
/// 4. `$c` for a single special character: `*#$@!?-` or a digit
/// 5. `$NAME` with `NAME` made of ASCII alphanumerics and `_`
static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(?:\{([*#$@!?\-0-9])\}|\{([^}]*)\}|\{|([*#$@!?\-0-9])|([A-Za-z0-9_]+))",
    )
    .expect("variable pattern is valid")
});

/// Substitute variable references in `input` using `env`.
///
/// Follows shell expansion rules: unset variables expand to the empty
/// string, a digit or special character after `$` is a one-character name
/// (`$12` is `$1` followed by `2`), and malformed `${` or `${}` is dropped.
/// A `$` followed by anything else, or at the end of input, is kept
/// literally. Substituted values are not expanded again.
pub fn expand_str(input: &str, env: &dyn Env) -> String {
    if !input.contains('$') {
        return input.to_string();
    }
    VAR_REF
        .replace_all(input, |caps: &Captures<'_>| {
            let name = [1, 2, 3, 4]
                .into_iter()
                .find_map(|i| caps.get(i))
                .map_or("", |m| m.as_str());
            if name.is_empty() {
                return String::new();
            }
            env.var(name).unwrap_or_default()
        })
        .into_owned()
}

/// Expand every string scalar inside `value`, in place.
///
/// Mapping values and sequence elements are visited recursively; mapping
/// keys are left alone. Values tagged `!binary` (or `!!binary`) hold
/// encoded bytes and are never expanded.
pub fn expand_value(value: &mut Value, env: &dyn Env) {
    match value {
        Value::String(s) => {
            let expanded = expand_str(s, env);
            *s = expanded;
        }
        Value::Sequence(items) => {
            for item in items.iter_mut() {
                expand_value(item, env);
            }
        }
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_value(v, env);
            }
        }
        Value::Tagged(tagged) => {
            if !is_binary_tag(&tagged.tag) {
                expand_value(&mut tagged.value, env);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn is_binary_tag(tag: &Tag) -> bool {
    let tag = tag.to_string();
    tag.trim_start_matches('!').rsplit(':').next() == Some("binary")
}
