use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yml::Value;

use crate::error::Result;

/// Version stamped on documents that do not declare one.
pub const CONFIG_VERSION_V1: &str = "1.0";

/// Top-level configuration document as authored in YAML.
///
/// This is the wire form: strings are kept exactly as written (after
/// environment expansion). Unknown fields are ignored. String fields accept
/// any scalar: a blank value reads as `""` and `version: 1.0` as `"1.0"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Schema version; `"1.0"` is assumed when absent.
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    /// Ordered path rules. Earlier rules take precedence.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub paths: Vec<DeclaredPathRule>,
    /// Log level preference for the command-line front end.
    #[serde(default, deserialize_with = "lenient_string")]
    pub log_level: String,
    /// Log file preference for the command-line front end.
    #[serde(default, deserialize_with = "lenient_string")]
    pub log_path: String,
}

/// One path rule as declared by the user.
///
/// ```yaml
/// - path: "${HOME}/data"        # may reference environment variables
///   perms: ["read", "write"]    # default: ["read"]
///   allow_subpaths: true        # default: true
///   description: "free text"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclaredPathRule {
    #[serde(deserialize_with = "lenient_string")]
    pub path: String,
    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub perms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_subpaths: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
}

impl ConfigDocument {
    /// Serialize the document as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---- lenient scalar fields ----

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Sequence(_) => Unexpected::Seq,
        Value::Mapping(_) => Unexpected::Map,
        Value::Tagged(_) => Unexpected::Other("tagged value"),
    }
}

/// Text of a scalar as a string field sees it.
fn scalar_text<E: de::Error>(value: Value) -> std::result::Result<String, E> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Tagged(tagged) => {
            let tagged = *tagged;
            scalar_text(tagged.value)
        }
        other => Err(E::invalid_type(unexpected(&other), &"a string")),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?)
}

fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => scalar_text(value).map(Some),
    }
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.into_iter().map(scalar_text).collect(),
        other => Err(de::Error::invalid_type(
            unexpected(&other),
            &"a sequence of strings",
        )),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_full_document() {
        let yaml = r#"
version: "1.0"
log_level: "info"
log_path: "/var/log/mcpfs.json"
paths:
  - path: "/srv/data"
    perms: ["read", "write"]
    allow_subpaths: false
    description: "shared data"
"#;
        let doc: ConfigDocument = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            doc,
            ConfigDocument {
                version: Some("1.0".to_string()),
                log_level: "info".to_string(),
                log_path: "/var/log/mcpfs.json".to_string(),
                paths: vec![DeclaredPathRule {
                    path: "/srv/data".to_string(),
                    perms: vec!["read".to_string(), "write".to_string()],
                    allow_subpaths: Some(false),
                    description: "shared data".to_string(),
                }],
            }
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let yaml = r#"
paths:
  - path: "/srv"
    users: ["alice"]
    roles: ["admin"]
listen: "127.0.0.1:9000"
"#;
        let doc: ConfigDocument = serde_yml::from_str(yaml).unwrap();
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.paths[0].allow_subpaths, None);
        assert!(doc.paths[0].perms.is_empty());
        assert_eq!(doc.version, None);
    }

    #[test]
    fn scalar_fields_accept_blank_and_non_string_values() {
        let yaml = r#"
version: 1.0
log_level:
log_path:
paths:
  - path: /srv
    perms: [read, ~]
    description: 2024
  - path: /opt
    perms:
    description:
  - path: /etc
    description: true
"#;
        let doc: ConfigDocument = serde_yml::from_str(yaml).unwrap();
        assert_eq!(doc.version.as_deref(), Some("1.0"));
        assert_eq!(doc.log_level, "");
        assert_eq!(doc.log_path, "");
        assert_eq!(doc.paths[0].perms, vec!["read".to_string(), String::new()]);
        assert_eq!(doc.paths[0].description, "2024");
        assert!(doc.paths[1].perms.is_empty());
        assert_eq!(doc.paths[1].description, "");
        assert_eq!(doc.paths[2].description, "true");
    }

    #[test]
    fn blank_version_reads_as_absent() {
        let doc: ConfigDocument = serde_yml::from_str("version:\npaths: []\n").unwrap();
        assert_eq!(doc.version, None);
    }

    #[test]
    fn blank_paths_read_as_no_rules() {
        let doc: ConfigDocument = serde_yml::from_str("version: \"1.0\"\npaths:\n").unwrap();
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn structured_values_in_string_fields_are_rejected() {
        let err = serde_yml::from_str::<ConfigDocument>("log_level: [debug]\n").unwrap_err();
        assert!(err.to_string().contains("expected a string"), "{err}");

        let err =
            serde_yml::from_str::<ConfigDocument>("paths:\n  - path: /srv\n    perms: read\n")
                .unwrap_err();
        assert!(err.to_string().contains("sequence of strings"), "{err}");
    }

    #[test]
    fn json_dump_omits_unset_fields() {
        let doc = ConfigDocument {
            version: Some(CONFIG_VERSION_V1.to_string()),
            paths: vec![DeclaredPathRule {
                path: "/srv".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"path\": \"/srv\""));
        assert!(!json.contains("allow_subpaths"));
        assert!(!json.contains("perms"));
    }

    #[test]
    fn yaml_dump_reparses() {
        let doc = ConfigDocument {
            version: Some(CONFIG_VERSION_V1.to_string()),
            log_level: "debug".to_string(),
            paths: vec![DeclaredPathRule {
                path: "/srv".to_string(),
                perms: vec!["exec".to_string()],
                allow_subpaths: Some(true),
                description: String::new(),
            }],
            ..Default::default()
        };
        let yaml = doc.to_yaml().unwrap();
        let back: ConfigDocument = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back, doc);
    }
}
