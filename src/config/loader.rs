//! Config loading: typed targets and flat string maps
//!
//! [`ConfigLoader`] carries the search location and environment; each
//! operation builds a fresh [`MergeContext`]. The free functions mirror the
//! builder for callers that pass everything positionally, and each has a
//! `must_` twin that panics instead of returning an error.

use crate::config::binding::{Bindings, EnvSnapshot, Override};
use crate::config::keys::{fold_keys, recase_keys};
use crate::config::merge::MergeContext;
use crate::config::search::{Environment, SearchPath};
use crate::error::{ConfigError, ConfigResult};
use figment::providers::Serialized;
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, error};

/// Loader settings: where to look and which environment to overlay.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    parent_path: String,
    directory: String,
    environment: Option<Environment>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader rooted at the working directory with no environment.
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            parent_path: String::new(),
            directory: String::new(),
            environment: None,
        }
    }

    /// Loader whose environment comes from the `ENV` process variable.
    pub fn from_env() -> Self {
        Self { environment: Environment::from_process(), ..Self::new() }
    }

    /// Directory the search path is resolved under
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Fallback directory searched after `directory`
    pub fn parent_path(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = parent_path.into();
        self
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the environment name; blank clears it.
    pub fn environment(mut self, env: &str) -> Self {
        self.environment = Environment::parse(env);
        self
    }

    pub fn active_environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn search_path(&self) -> SearchPath {
        SearchPath::new(&self.root, &self.parent_path, &self.directory)
    }

    /// Merge the files for `stems` without binding or unmarshalling.
    pub fn merge<S: AsRef<str>>(&self, stems: &[S]) -> ConfigResult<MergeContext> {
        let mut ctx = MergeContext::new(self.search_path());
        ctx.merge_stems(stems, self.environment.as_ref())?;
        Ok(ctx)
    }

    /// Load `stems` into `target`.
    ///
    /// The target's current values are the lowest layer, files merge on top,
    /// and bound environment variables win over everything. File keys match
    /// the target's field names case-insensitively.
    pub fn load_into<T, S>(&self, target: &mut T, stems: &[S]) -> ConfigResult<()>
    where
        T: Serialize + DeserializeOwned,
        S: AsRef<str>,
    {
        let shape = serde_yaml::to_value(&*target)
            .map_err(|e| ConfigError::Bind { key: String::new(), reason: e.to_string() })?;
        let folded = fold_keys(shape.clone());

        let mut bindings = Bindings::new();
        bindings.bind_target(&folded)?;

        let mut ctx = MergeContext::new(self.search_path()).with_defaults(folded);
        ctx.merge_stems(stems, self.environment.as_ref())?;
        let merged = ctx.tree()?;
        bindings.bind_tree(&merged)?;

        let mut overrides = bindings.overrides(&EnvSnapshot::capture());
        *target = extract(&merged, &shape, &mut overrides)?;
        debug!("Configuration loaded from {} file(s)", ctx.sources().len());
        Ok(())
    }

    /// Load `stems` into a fresh `T::default()`.
    pub fn load<T, S>(&self, stems: &[S]) -> ConfigResult<T>
    where
        T: Serialize + DeserializeOwned + Default,
        S: AsRef<str>,
    {
        let mut target = T::default();
        self.load_into(&mut target, stems)?;
        Ok(target)
    }

    /// Load `stems` as a flat map with dotted keys.
    pub fn load_map<S: AsRef<str>>(&self, stems: &[S]) -> ConfigResult<BTreeMap<String, String>> {
        let mut ctx = self.merge(stems)?;

        let mut bindings = Bindings::new();
        bindings.bind_tree(&ctx.tree()?)?;
        apply_env(&mut ctx, &bindings, &EnvSnapshot::capture());

        let mut out = BTreeMap::new();
        flatten(&ctx.tree()?, &mut Vec::new(), &mut out);
        Ok(out)
    }

    pub fn must_load_into<T, S>(&self, target: &mut T, stems: &[S])
    where
        T: Serialize + DeserializeOwned,
        S: AsRef<str>,
    {
        or_panic(self.load_into(target, stems))
    }

    pub fn must_load<T, S>(&self, stems: &[S]) -> T
    where
        T: Serialize + DeserializeOwned + Default,
        S: AsRef<str>,
    {
        or_panic(self.load(stems))
    }

    pub fn must_load_map<S: AsRef<str>>(&self, stems: &[S]) -> BTreeMap<String, String> {
        or_panic(self.load_map(stems))
    }
}

fn apply_env(ctx: &mut MergeContext, bindings: &Bindings, vars: &EnvSnapshot) {
    for item in bindings.overrides(vars) {
        ctx.merge_layer(item.layer());
    }
}

/// Layer `overrides` over `merged`, restore the target's key spelling and
/// unmarshal.
///
/// An override whose type was guessed and fails to unmarshal is retried as
/// plain text, one key at a time.
fn extract<T: DeserializeOwned>(
    merged: &YamlValue,
    shape: &YamlValue,
    overrides: &mut [Override],
) -> ConfigResult<T> {
    loop {
        let layered = overrides.iter().fold(
            Figment::new().merge(Serialized::defaults(merged.clone())),
            |figment, item| figment.merge(Serialized::defaults(item.layer())),
        );
        let tree = recase_keys(layered.extract::<YamlValue>()?, shape);

        let err = match Figment::new().merge(Serialized::defaults(tree)).extract::<T>() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        match overrides.iter_mut().find_map(|item| item.fall_back_to_text(&err.path).then_some(item)) {
            Some(item) => debug!("Retrying {} as text", item.key),
            None => return Err(err.into()),
        }
    }
}

/// Flatten a tree into dotted keys. Sequences join with `,`; null is empty.
fn flatten(node: &YamlValue, parts: &mut Vec<String>, out: &mut BTreeMap<String, String>) {
    match node {
        YamlValue::Mapping(map) => {
            for (key, value) in map {
                parts.push(scalar_text(key));
                flatten(value, parts, out);
                parts.pop();
            }
        }
        YamlValue::Tagged(tagged) => flatten(&tagged.value, parts, out),
        leaf => {
            out.insert(parts.join("."), scalar_text(leaf));
        }
    }
}

fn scalar_text(value: &YamlValue) -> String {
    match value {
        YamlValue::Null => String::new(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::String(s) => s.clone(),
        YamlValue::Sequence(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        YamlValue::Tagged(tagged) => scalar_text(&tagged.value),
        YamlValue::Mapping(_) => {
            serde_yaml::to_string(value).map(|s| s.trim_end().to_string()).unwrap_or_default()
        }
    }
}

fn or_panic<T>(result: ConfigResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!("Failed to load configuration: {}", err);
            panic!("failed to load configuration: {err}");
        }
    }
}

fn positional(parent_path: &str, directory: &str, env: Option<&str>) -> ConfigLoader {
    let loader = ConfigLoader::new().parent_path(parent_path).directory(directory);
    match env {
        Some(env) => loader.environment(env),
        None => ConfigLoader { environment: Environment::from_process(), ..loader },
    }
}

/// Load `stems` from the working directory; environment from `ENV`.
pub fn load<T, S>(target: &mut T, stems: &[S]) -> ConfigResult<()>
where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    load_config("", "", target, stems)
}

/// Load `stems` from `./directory`, falling back to `./parent_path/directory`.
/// The environment comes from `ENV`.
pub fn load_config<T, S>(
    parent_path: &str,
    directory: &str,
    target: &mut T,
    stems: &[S],
) -> ConfigResult<()>
where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    positional(parent_path, directory, None).load_into(target, stems)
}

pub fn load_config_with_env<T, S>(
    parent_path: &str,
    directory: &str,
    env: &str,
    target: &mut T,
    stems: &[S],
) -> ConfigResult<()>
where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    positional(parent_path, directory, Some(env)).load_into(target, stems)
}

pub fn load_map<S: AsRef<str>>(
    parent_path: &str,
    directory: &str,
    env: &str,
    stems: &[S],
) -> ConfigResult<BTreeMap<String, String>> {
    positional(parent_path, directory, Some(env)).load_map(stems)
}

pub fn must_load<T, S>(target: &mut T, stems: &[S])
where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    or_panic(load(target, stems))
}

pub fn must_load_config<T, S>(parent_path: &str, directory: &str, target: &mut T, stems: &[S])
where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    or_panic(load_config(parent_path, directory, target, stems))
}

pub fn must_load_config_with_env<T, S>(
    parent_path: &str,
    directory: &str,
    env: &str,
    target: &mut T,
    stems: &[S],
) where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    or_panic(load_config_with_env(parent_path, directory, env, target, stems))
}

pub fn must_load_map<S: AsRef<str>>(
    parent_path: &str,
    directory: &str,
    env: &str,
    stems: &[S],
) -> BTreeMap<String, String> {
    or_panic(load_map(parent_path, directory, env, stems))
}
