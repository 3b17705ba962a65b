//! Deep merge of TOML layers with per-field source tracking.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from a layer never overrides the layer below.

use std::collections::HashMap;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// User-level configuration (`~/.bqgate/config.toml`).
    User,
    /// Workspace-level configuration (`{workspace}/.bqgate/config.toml`).
    Workspace,
    /// A file named explicitly on the command line.
    Explicit(String),
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user (~/.bqgate/config.toml)"),
            Self::Workspace => write!(f, "workspace (.bqgate/config.toml)"),
            Self::Explicit(path) => write!(f, "explicit ({path})"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Tracks which layer set each field's value.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf
/// field. Tables merge per key; scalars and arrays replace.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);

                if let Some(base_val) = base_table.get_mut(key) {
                    if overlay_val.is_table() {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    } else {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer.clone());
                    }
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Walk a value tree and record every leaf path with `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_scalars_and_keeps_siblings() {
        let mut base = parse(
            r#"
            [gateway]
            approval = "token_echo"
            token_ttl_secs = 60
        "#,
        );
        let overlay = parse(
            r#"
            [gateway]
            approval = "sampling"
        "#,
        );
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(base["gateway"]["approval"].as_str(), Some("sampling"));
        assert_eq!(base["gateway"]["token_ttl_secs"].as_integer(), Some(60));
        assert_eq!(sources.get("gateway.approval"), Some(&ConfigLayer::User));
        assert!(!sources.contains_key("gateway.token_ttl_secs"));
    }

    #[test]
    fn test_arrays_replace_rather_than_append() {
        let mut base = parse(r#"classifier = { keywords = ["DROP", "DELETE"] }"#);
        let overlay = parse(r#"classifier = { keywords = ["MERGE"] }"#);
        let mut sources = FieldSources::new();
        deep_merge_tracking(
            &mut base,
            &overlay,
            "",
            &ConfigLayer::Workspace,
            &mut sources,
        );

        let keywords = base["classifier"]["keywords"].as_array().unwrap();
        assert_eq!(keywords.len(), 1);
        assert_eq!(
            sources.get("classifier.keywords"),
            Some(&ConfigLayer::Workspace)
        );
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base = parse("[gateway]\ntoken_ttl_secs = 60");
        let overlay = parse("[engine]\nbinary = \"/opt/bq\"\nuse_legacy_sql = true");
        let mut sources = FieldSources::new();
        let layer = ConfigLayer::Explicit("ci.toml".to_owned());
        deep_merge_tracking(&mut base, &overlay, "", &layer, &mut sources);

        assert_eq!(sources.get("engine.binary"), Some(&layer));
        assert_eq!(sources.get("engine.use_legacy_sql"), Some(&layer));
    }
}
