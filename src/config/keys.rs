//! Case-insensitive key matching
//!
//! Every mapping key read from a file is folded to lower case, and the target's
//! own spelling is restored just before unmarshalling, so `Server.Port` in a
//! file still fills `server.port` (or a field renamed to `Port`).

use serde_yaml::{Mapping, Value as YamlValue};

/// Lower-case every string mapping key, recursively.
pub fn fold_keys(value: YamlValue) -> YamlValue {
    match value {
        YamlValue::Mapping(map) => YamlValue::Mapping(
            map.into_iter().map(|(key, value)| (fold_key(key), fold_keys(value))).collect(),
        ),
        YamlValue::Sequence(items) => {
            YamlValue::Sequence(items.into_iter().map(fold_keys).collect())
        }
        YamlValue::Tagged(mut tagged) => {
            tagged.value = fold_keys(std::mem::take(&mut tagged.value));
            YamlValue::Tagged(tagged)
        }
        other => other,
    }
}

fn fold_key(key: YamlValue) -> YamlValue {
    match key {
        YamlValue::String(s) => YamlValue::String(s.to_lowercase()),
        other => other,
    }
}

/// Rename the keys of a folded tree to the spelling `shape` uses.
///
/// Keys with no counterpart in `shape` are left folded.
pub fn recase_keys(tree: YamlValue, shape: &YamlValue) -> YamlValue {
    match (tree, shape) {
        (tree, YamlValue::Tagged(tagged)) => recase_keys(tree, &tagged.value),
        (YamlValue::Mapping(map), YamlValue::Mapping(spelled)) => YamlValue::Mapping(
            map.into_iter()
                .map(|(key, value)| match spelling(&key, spelled) {
                    Some((original, inner)) => (original.clone(), recase_keys(value, inner)),
                    None => (key, value),
                })
                .collect(),
        ),
        (tree, _) => tree,
    }
}

fn spelling<'a>(key: &YamlValue, spelled: &'a Mapping) -> Option<(&'a YamlValue, &'a YamlValue)> {
    let folded = key.as_str()?;
    spelled
        .iter()
        .find(|(original, _)| original.as_str().is_some_and(|o| o.to_lowercase() == folded))
}
