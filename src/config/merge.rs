//! Per-call merge context: base file plus additive and environment overrides
//!
//! Every load builds its own [`MergeContext`]; nothing is shared between
//! calls, so loaders can run repeatedly and from many threads.

use crate::config::keys::fold_keys;
use crate::config::search::{Environment, SearchPath};
use crate::error::{ConfigError, ConfigResult};
use figment::providers::{Format, Serialized, Yaml};
use figment::{Figment, Provider};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a missing file is reported during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Missing {
    /// Primary base file: warn and continue with an empty base
    Warn,
    /// Merge pass: skip quietly
    Skip,
}

/// Accumulates configuration layers for a single load.
pub struct MergeContext {
    search: SearchPath,
    figment: Figment,
    sources: Vec<PathBuf>,
}

impl MergeContext {
    pub fn new(search: SearchPath) -> Self {
        Self { search, figment: Figment::new(), sources: Vec::new() }
    }

    /// Seed the lowest-precedence layer from an existing value.
    pub fn with_defaults<T: Serialize>(mut self, defaults: T) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(defaults));
        self
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search
    }

    /// Files that were merged, in merge order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Run the full merge for `stems`.
    ///
    /// The first stem is the base file (a missing base only warns). Remaining
    /// stems merge additively. With an environment, every stem is then
    /// overridden by `<stem>.<env>` and `<stem>-<env>`. Missing overrides are
    /// skipped; any other read or parse failure aborts.
    pub fn merge_stems<S: AsRef<str>>(
        &mut self,
        stems: &[S],
        env: Option<&Environment>,
    ) -> ConfigResult<()> {
        let Some((base, rest)) = stems.split_first() else {
            return Err(ConfigError::NoConfigFiles);
        };

        self.pass(base.as_ref(), Missing::Warn)?;
        for stem in rest {
            self.pass(stem.as_ref(), Missing::Skip)?;
        }

        if let Some(env) = env {
            for stem in stems {
                for qualified in env.override_stems(stem.as_ref()) {
                    self.pass(&qualified, Missing::Skip)?;
                }
            }
        }

        Ok(())
    }

    /// Attempt one stem. Returns whether a file was merged.
    pub fn merge_stem(&mut self, stem: &str) -> ConfigResult<bool> {
        self.pass(stem, Missing::Skip)
    }

    fn pass(&mut self, stem: &str, missing: Missing) -> ConfigResult<bool> {
        let Some(path) = self.search.find_stem(stem) else {
            match missing {
                Missing::Warn => warn!("config file not found: {}", stem),
                Missing::Skip => debug!("Skipping missing config file: {}", stem),
            }
            return Ok(false);
        };

        match read_yaml_document(&path) {
            Ok(Some(content)) => {
                debug!("Merging config file: {}", path.display());
                self.push(Yaml::string(&content));
                self.sources.push(path);
                Ok(true)
            }
            Ok(None) => {
                debug!("Config file is empty: {}", path.display());
                self.sources.push(path);
                Ok(true)
            }
            // Removed between lookup and read
            Err(err) if err.is_not_found() && missing == Missing::Skip => Ok(false),
            Err(err) if err.is_not_found() => {
                warn!("config file not found: {}", path.display());
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Apply a further layer on top of everything merged so far.
    pub fn merge_layer<T: Serialize>(&mut self, layer: T) {
        self.push(Serialized::defaults(layer));
    }

    fn push<P: Provider>(&mut self, provider: P) {
        let figment = std::mem::replace(&mut self.figment, Figment::new());
        self.figment = figment.merge(provider);
    }

    /// Snapshot of the merged tree.
    pub fn tree(&self) -> ConfigResult<serde_yaml::Value> {
        Ok(self.figment.extract::<serde_yaml::Value>()?)
    }

    pub fn figment(&self) -> &Figment {
        &self.figment
    }

    pub fn into_figment(self) -> Figment {
        self.figment
    }
}

/// Read and validate one YAML file.
///
/// Returns `None` for an empty document, otherwise the document with every
/// key lower-cased. A top-level value that is not a mapping is rejected as a
/// parse error.
fn read_yaml_document(path: &Path) -> ConfigResult<Option<String>> {
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::from_io(path.to_path_buf(), e))?;
    let parse_error = |source| ConfigError::ParseYaml { path: path.to_path_buf(), source };

    let parsed: serde_yaml::Value = serde_yaml::from_str(&content).map_err(parse_error)?;

    match parsed {
        serde_yaml::Value::Null => Ok(None),
        mapping @ serde_yaml::Value::Mapping(_) => {
            serde_yaml::to_string(&fold_keys(mapping)).map(Some).map_err(parse_error)
        }
        other => Err(parse_error(<serde_yaml::Error as serde::de::Error>::custom(format!(
            "top-level document must be a mapping, found {}",
            yaml_kind(&other)
        )))),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(root: &Path) -> MergeContext {
        MergeContext::new(SearchPath::new(root, "", ""))
    }

    fn get<'a>(tree: &'a serde_yaml::Value, key: &str) -> Option<&'a serde_yaml::Value> {
        key.split('.').try_fold(tree, |node, part| node.get(part))
    }

    #[test]
    fn empty_stem_list_is_an_error() {
        let tmp = TempDir::new().expect("tmp");
        let err = context(tmp.path()).merge_stems::<&str>(&[], None).expect_err("no stems");
        assert!(matches!(err, ConfigError::NoConfigFiles));
    }

    #[test]
    fn missing_base_is_tolerated() {
        let tmp = TempDir::new().expect("tmp");
        let mut ctx = context(tmp.path());
        ctx.merge_stems(&["app"], None).expect("merge");
        assert!(ctx.sources().is_empty());
        let tree = ctx.tree().expect("tree");
        assert!(tree.as_mapping().map(|m| m.is_empty()).unwrap_or(false));
    }

    #[test]
    fn later_stems_merge_additively_and_win() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "server:\n  port: 80\n  host: a\n").expect("write");
        fs::write(tmp.path().join("extra.yaml"), "server:\n  port: 81\nfeature: on\n")
            .expect("write");

        let mut ctx = context(tmp.path());
        ctx.merge_stems(&["app", "extra"], None).expect("merge");
        let tree = ctx.tree().expect("tree");

        assert_eq!(get(&tree, "server.port").and_then(|v| v.as_u64()), Some(81));
        assert_eq!(get(&tree, "server.host").and_then(|v| v.as_str()), Some("a"));
        assert_eq!(ctx.sources().len(), 2);
    }

    #[test]
    fn dashed_override_beats_dotted_override() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "level: base\n").expect("write");
        fs::write(tmp.path().join("app.qa.yaml"), "level: dotted\n").expect("write");
        fs::write(tmp.path().join("app-qa.yaml"), "level: dashed\n").expect("write");

        let mut ctx = context(tmp.path());
        let env = Environment::parse("QA");
        ctx.merge_stems(&["app"], env.as_ref()).expect("merge");
        let tree = ctx.tree().expect("tree");
        assert_eq!(get(&tree, "level").and_then(|v| v.as_str()), Some("dashed"));
    }

    #[test]
    fn invalid_yaml_aborts_with_parse_error() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "ok: 1\n").expect("write");
        fs::write(tmp.path().join("app-prod.yaml"), "broken: [1, 2\n").expect("write");

        let mut ctx = context(tmp.path());
        let env = Environment::parse("prod");
        let err = ctx.merge_stems(&["app"], env.as_ref()).expect_err("parse error");
        match err {
            ConfigError::ParseYaml { path, .. } => {
                assert_eq!(path, tmp.path().join("app-prod.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scalar_document_is_rejected() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "just a string\n").expect("write");

        let err = context(tmp.path()).merge_stems(&["app"], None).expect_err("not a mapping");
        assert!(err.to_string().contains("must be a mapping"));
    }

    #[test]
    fn empty_file_counts_as_merged() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "").expect("write");

        let mut ctx = context(tmp.path());
        assert!(ctx.merge_stem("app").expect("merge"));
        assert_eq!(ctx.sources(), &[tmp.path().join("app.yaml")]);
    }

    #[test]
    fn file_keys_are_folded_to_lower_case() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "Server:\n  Port: 81\n").expect("write");
        fs::write(tmp.path().join("app-qa.yaml"), "SERVER:\n  port: 82\n").expect("write");

        let mut ctx = context(tmp.path());
        let env = Environment::parse("qa");
        ctx.merge_stems(&["app"], env.as_ref()).expect("merge");
        let tree = ctx.tree().expect("tree");
        assert_eq!(get(&tree, "server.port").and_then(|v| v.as_u64()), Some(82));
        assert!(tree.get("Server").is_none());
    }

    #[test]
    fn defaults_are_lowest_layer() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("app.yaml"), "retries: 5\n").expect("write");

        let mut defaults = serde_yaml::Mapping::new();
        defaults.insert("retries".into(), 1.into());
        defaults.insert("timeout".into(), 30.into());

        let mut ctx = context(tmp.path()).with_defaults(serde_yaml::Value::Mapping(defaults));
        ctx.merge_stems(&["app"], None).expect("merge");
        let tree = ctx.tree().expect("tree");
        assert_eq!(get(&tree, "retries").and_then(|v| v.as_u64()), Some(5));
        assert_eq!(get(&tree, "timeout").and_then(|v| v.as_u64()), Some(30));
    }
}
