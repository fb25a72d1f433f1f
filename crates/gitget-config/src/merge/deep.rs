use super::{ConfigLayer, FieldSources};

fn child_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value. `prefix` is the dotted path of `base` (empty at the root).
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
                let path = child_path(prefix, key);

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

/// Record every leaf under `val` as set by `layer`.
pub(crate) fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &child_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_replaces_only_named_keys() {
        let mut base = parse("[fetch]\nclone_timeout_secs = 300\ngit_program = \"git\"\n");
        let overlay = parse("[fetch]\nclone_timeout_secs = 60\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(base["fetch"]["clone_timeout_secs"].as_integer(), Some(60));
        assert_eq!(base["fetch"]["git_program"].as_str(), Some("git"));
        assert_eq!(
            sources.get("fetch.clone_timeout_secs"),
            Some(&ConfigLayer::User)
        );
        assert!(!sources.contains_key("fetch.git_program"));
    }

    #[test]
    fn new_tables_record_all_leaves() {
        let mut base = parse("[fetch]\nrequire_branch = false\n");
        let overlay = parse("[logging]\nlevel = \"debug\"\nansi = false\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::Explicit, &mut sources);

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Explicit));
        assert_eq!(sources.get("logging.ansi"), Some(&ConfigLayer::Explicit));
    }

    #[test]
    fn arrays_replace() {
        let mut base = parse("[logging]\ndirectives = [\"a=info\"]\n");
        let overlay = parse("[logging]\ndirectives = [\"b=debug\", \"c=trace\"]\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        let directives = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].as_str(), Some("b=debug"));
    }
}
