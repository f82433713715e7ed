use indexmap::IndexMap;
use tracing::debug;

use crate::source::Source;

/// Build a flat map from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels.
/// Single `_` within a segment is literal (part of the key).
/// Segments are lowercased and joined with `.`.
///
/// Values stay strings; list promotion on the resulting source decides what
/// `a,b,c` or an empty value means.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_flat_map(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> IndexMap<String, String> {
    let needle = format!("{prefix}__");
    let mut map = IndexMap::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let path = rest
            .split("__")
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(".");
        map.insert(path, value);
    }

    map
}

/// A promoted flat source built from matching environment variables.
pub fn env_source(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Source {
    let map = env_to_flat_map(prefix, vars);
    debug!(prefix, vars = map.len(), "loaded environment source");
    let mut source = Source::flat(map).with_type("system-environment");
    source.info_mut().set("prefix", prefix);
    source
}
