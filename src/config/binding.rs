//! Environment-variable binding for configuration keys
//!
//! A binding ties a dotted key path (`database.max-conns`) to the variable
//! name derived from it (`DATABASE_MAX_CONNS`). Bindings come from two walks:
//! the target's own fields, taken from its `Serialize` output, and the leaves
//! of the merged file tree. Every sibling field is visited; nested mappings
//! are recursed into with the path accumulated.

use crate::error::{ConfigError, ConfigResult};
use figment::providers::Env;
use figment::util::nest;
use figment::value::Value;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, trace};

/// Variable name for a dotted key: `.` and `-` become `_`, then upper-case.
pub fn env_name(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// How a single env value is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    /// The key currently holds text; keep the env value verbatim
    Text,
    /// Parse the env value (`8080` becomes a number, `true` a bool)
    Parsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Scalar(Scalar),
    /// Split on `,`; items typed like the first non-null element, if any
    List(Option<Scalar>),
}

impl Kind {
    fn of(leaf: &YamlValue) -> Option<Kind> {
        match leaf {
            YamlValue::Sequence(items) => Some(Kind::List(items.iter().find_map(scalar_of))),
            YamlValue::Tagged(tagged) => Kind::of(&tagged.value),
            other => scalar_of(other).map(Kind::Scalar),
        }
    }
}

fn scalar_of(value: &YamlValue) -> Option<Scalar> {
    match value {
        YamlValue::Null => None,
        YamlValue::String(_) => Some(Scalar::Text),
        YamlValue::Tagged(tagged) => scalar_of(&tagged.value),
        _ => Some(Scalar::Parsed),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: String,
    pub env_name: String,
    /// `None` while only null placeholders (e.g. unset options) were seen
    kind: Option<Kind>,
}

impl Binding {
    /// Adopt a better-informed kind from a later walk.
    fn refine(&mut self, kind: Option<Kind>) {
        match (self.kind, kind) {
            (None, Some(kind)) | (Some(Kind::List(None)), Some(kind @ Kind::List(Some(_)))) => {
                self.kind = Some(kind)
            }
            _ => {}
        }
    }
}

/// An env value bound to a key, ready to layer over the merged files.
#[derive(Debug, Clone)]
pub struct Override {
    pub key: String,
    value: Value,
    /// Verbatim reading, kept while the key's type is only a guess
    text: Option<Value>,
}

impl Override {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value nested under its dotted key.
    pub fn layer(&self) -> Value {
        nest(&self.key, self.value.clone())
    }

    /// Switch to the verbatim reading when `path` lies under this key and the
    /// type was guessed. Returns whether the value changed.
    pub fn fall_back_to_text(&mut self, path: &[String]) -> bool {
        if !self.covers(path) {
            return false;
        }
        match self.text.take() {
            Some(text) => {
                self.value = text;
                true
            }
            None => false,
        }
    }

    fn covers(&self, path: &[String]) -> bool {
        let segments: Vec<&str> = self.key.split('.').collect();
        path.len() >= segments.len()
            && segments.iter().zip(path).all(|(seg, part)| seg.eq_ignore_ascii_case(part))
    }
}

/// Registered bindings, keyed by dotted path.
#[derive(Debug, Default)]
pub struct Bindings {
    by_key: BTreeMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.by_key.values()
    }

    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.by_key.get(key)
    }

    /// Walk a target's serialized fields.
    ///
    /// The target must serialize to a mapping (a struct or map).
    pub fn bind_target(&mut self, shape: &YamlValue) -> ConfigResult<()> {
        match shape {
            YamlValue::Mapping(_) => self.walk(shape, &mut Vec::new()),
            YamlValue::Tagged(tagged) => self.bind_target(&tagged.value),
            _ => Err(ConfigError::Bind {
                key: String::new(),
                reason: "target must serialize to a struct or map".to_string(),
            }),
        }
    }

    /// Walk the leaves of a merged tree. Non-mapping trees bind nothing.
    pub fn bind_tree(&mut self, tree: &YamlValue) -> ConfigResult<()> {
        if tree.is_mapping() {
            self.walk(tree, &mut Vec::new())?;
        }
        Ok(())
    }

    fn walk(&mut self, node: &YamlValue, parts: &mut Vec<String>) -> ConfigResult<()> {
        match node {
            // An empty map field has no keys to bind yet
            YamlValue::Mapping(map) if map.is_empty() && !parts.is_empty() => Ok(()),
            YamlValue::Mapping(map) => {
                for (key, value) in map {
                    let segment = key_segment(key).ok_or_else(|| ConfigError::Bind {
                        key: parts.join("."),
                        reason: format!("field key {key:?} is not a string"),
                    })?;
                    parts.push(segment);
                    self.walk(value, parts)?;
                    parts.pop();
                }
                Ok(())
            }
            YamlValue::Tagged(tagged) => self.walk(&tagged.value, parts),
            leaf => {
                self.register(parts.join("."), leaf);
                Ok(())
            }
        }
    }

    fn register(&mut self, key: String, leaf: &YamlValue) {
        let kind = Kind::of(leaf);
        match self.by_key.get_mut(&key) {
            Some(existing) => existing.refine(kind),
            None => {
                trace!("Binding {} to ${}", key, env_name(&key));
                let binding = Binding { env_name: env_name(&key), key: key.clone(), kind };
                self.by_key.insert(key, binding);
            }
        }
    }

    /// Look every binding up in `vars` and build the override values, in key
    /// order.
    pub fn overrides(&self, vars: &EnvSnapshot) -> Vec<Override> {
        let mut out = Vec::new();
        for binding in self.by_key.values() {
            let Some(raw) = vars.get(&binding.env_name) else {
                continue;
            };
            debug!("Overriding {} from ${}", binding.key, binding.env_name);
            let (value, text) = match binding.kind {
                Some(Kind::Scalar(scalar)) => (typed(raw, scalar), None),
                Some(Kind::List(Some(scalar))) => (list(raw, |item| typed(item, scalar)), None),
                Some(Kind::List(None)) => {
                    (list(raw, parse_env_value), Some(list(raw, text_value)))
                }
                None => (parse_env_value(raw), Some(text_value(raw))),
            };
            out.push(Override { key: binding.key.clone(), value, text });
        }
        out
    }
}

fn key_segment(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn typed(raw: &str, scalar: Scalar) -> Value {
    match scalar {
        Scalar::Text => text_value(raw),
        Scalar::Parsed => parse_env_value(raw),
    }
}

fn list(raw: &str, item: impl Fn(&str) -> Value) -> Value {
    Value::from(raw.split(',').map(item).collect::<Vec<Value>>())
}

fn text_value(raw: &str) -> Value {
    Value::from(raw.to_string())
}

fn parse_env_value(raw: &str) -> Value {
    Value::from_str(raw).unwrap_or_else(|never| match never {})
}

/// Upper-cased view of the process environment.
///
/// Lookups are case-insensitive; empty values count as unset. When several
/// spellings of one name are set, the all-upper-case one wins.
#[derive(Debug, Default, Clone)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self::from_pairs(
            Env::raw().lowercase(false).iter().map(|(name, value)| (name.as_str().to_string(), value)),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut vars = BTreeMap::new();
        for (name, value) in pairs {
            let value = value.into();
            if value.is_empty() {
                continue;
            }
            let name = name.as_ref();
            let upper = name.to_ascii_uppercase();
            if name == upper || !vars.contains_key(&upper) {
                vars.insert(upper, value);
            }
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(&name.to_ascii_uppercase()).map(String::as_str)
    }
}
