//! Search directories, environment names and candidate file resolution

use crate::error::{ConfigError, ConfigResult};
use crate::utils::with_env_suffix;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Process variable naming the active environment.
pub const ENV_VAR: &str = "ENV";

/// Extensions tried, in order, when a stem is looked up. The bare stem is
/// tried after these.
const STEM_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Active environment name, lower-cased and never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    /// Normalize a raw name. Blank input means "no environment".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    /// Read the environment name from the `ENV` process variable.
    pub fn from_process() -> Option<Self> {
        std::env::var(ENV_VAR).ok().as_deref().and_then(Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Override stems for a base stem, in merge order: `<stem>.<env>`, `<stem>-<env>`.
    pub fn override_stems(&self, stem: &str) -> [String; 2] {
        [format!("{stem}.{}", self.0), format!("{stem}-{}", self.0)]
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered candidate directories for configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Build the search path under `root`.
    ///
    /// - both `parent_path` and `directory` empty: just `root`
    /// - otherwise `root/directory`, then `root/parent_path/directory`
    pub fn new(root: &Path, parent_path: &str, directory: &str) -> Self {
        let mut dirs = Vec::with_capacity(2);
        if parent_path.is_empty() && directory.is_empty() {
            dirs.push(root.to_path_buf());
        } else {
            dirs.push(join_non_empty(root, directory));
            if !parent_path.is_empty() {
                dirs.push(join_non_empty(&root.join(parent_path), directory));
            }
        }
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find the first file matching `stem` across the search directories.
    ///
    /// Within a directory `<stem>.yaml`, `<stem>.yml` and the bare `<stem>`
    /// are tried in that order; earlier directories win.
    pub fn find_stem(&self, stem: &str) -> Option<PathBuf> {
        for dir in &self.dirs {
            let candidates = STEM_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{stem}.{ext}")))
                .chain(std::iter::once(dir.join(stem)));
            for candidate in candidates {
                trace!("Checking config candidate {}", candidate.display());
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Find `filename` exactly as given across the search directories.
    pub fn find_file(&self, filename: &str) -> Option<PathBuf> {
        self.dirs.iter().map(|dir| dir.join(filename)).find(|candidate| candidate.is_file())
    }

    /// Resolve a raw file, preferring the environment-qualified name.
    ///
    /// With an environment, `<name>-<env><.ext>` is looked up in every
    /// directory before the unqualified name is. Fails with
    /// [`ConfigError::FileNotFound`] naming the last candidate tried.
    pub fn resolve_file(&self, filename: &str, env: Option<&Environment>) -> ConfigResult<PathBuf> {
        if let Some(env) = env {
            let qualified = with_env_suffix(filename, env.as_str());
            if let Some(path) = self.find_file(&qualified) {
                debug!("Resolved {} for environment {} to {}", filename, env, path.display());
                return Ok(path);
            }
        }

        if let Some(path) = self.find_file(filename) {
            debug!("Resolved {} to {}", filename, path.display());
            return Ok(path);
        }

        let last_dir = self.dirs.last().cloned().unwrap_or_default();
        Err(ConfigError::FileNotFound { path: last_dir.join(filename) })
    }
}

fn join_non_empty(base: &Path, segment: &str) -> PathBuf {
    if segment.is_empty() {
        base.to_path_buf()
    } else {
        base.join(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "x: 1\n").expect("write");
    }

    #[test]
    fn environment_is_lowercased_and_blank_is_none() {
        assert_eq!(Environment::parse(" PROD ").map(|e| e.to_string()), Some("prod".to_string()));
        assert!(Environment::parse("").is_none());
        assert!(Environment::parse("   ").is_none());
    }

    #[test]
    fn override_stems_are_dotted_then_dashed() {
        let env = Environment::parse("Staging").expect("env");
        assert_eq!(env.override_stems("app"), ["app.staging".to_string(), "app-staging".to_string()]);
    }

    #[test]
    fn empty_parent_and_directory_search_root_only() {
        let search = SearchPath::new(Path::new("."), "", "");
        assert_eq!(search.dirs(), &[PathBuf::from(".")]);
    }

    #[test]
    fn directory_then_parent_directory() {
        let search = SearchPath::new(Path::new("."), "services/api", "config");
        assert_eq!(
            search.dirs(),
            &[PathBuf::from("./config"), PathBuf::from("./services/api/config")]
        );
    }

    #[test]
    fn parent_without_directory() {
        let search = SearchPath::new(Path::new("/srv"), "shared", "");
        assert_eq!(search.dirs(), &[PathBuf::from("/srv"), PathBuf::from("/srv/shared")]);
    }

    #[test]
    fn find_stem_prefers_yaml_then_yml_then_bare() {
        let tmp = TempDir::new().expect("tmp");
        let search = SearchPath::new(tmp.path(), "", "");
        touch(&tmp.path().join("app"));
        assert_eq!(search.find_stem("app"), Some(tmp.path().join("app")));
        touch(&tmp.path().join("app.yml"));
        assert_eq!(search.find_stem("app"), Some(tmp.path().join("app.yml")));
        touch(&tmp.path().join("app.yaml"));
        assert_eq!(search.find_stem("app"), Some(tmp.path().join("app.yaml")));
    }

    #[test]
    fn find_stem_ignores_directories_named_like_stem() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir(tmp.path().join("app")).expect("mkdir");
        let search = SearchPath::new(tmp.path(), "", "");
        assert_eq!(search.find_stem("app"), None);
    }

    #[test]
    fn resolve_prefers_directory_over_parent_directory() {
        let tmp = TempDir::new().expect("tmp");
        touch(&tmp.path().join("config/app.yaml"));
        touch(&tmp.path().join("svc/config/app.yaml"));

        let search = SearchPath::new(tmp.path(), "svc", "config");
        let path = search.resolve_file("app.yaml", None).expect("resolve");
        assert_eq!(path, tmp.path().join("config/app.yaml"));
    }

    #[test]
    fn resolve_falls_back_to_parent_directory() {
        let tmp = TempDir::new().expect("tmp");
        touch(&tmp.path().join("svc/config/app.yaml"));

        let search = SearchPath::new(tmp.path(), "svc", "config");
        let path = search.resolve_file("app.yaml", None).expect("resolve");
        assert_eq!(path, tmp.path().join("svc/config/app.yaml"));
    }

    #[test]
    fn resolve_prefers_qualified_name_in_any_directory() {
        let tmp = TempDir::new().expect("tmp");
        touch(&tmp.path().join("config/key.pem"));
        touch(&tmp.path().join("svc/config/key-prod.pem"));

        let search = SearchPath::new(tmp.path(), "svc", "config");
        let env = Environment::parse("prod");
        let path = search.resolve_file("key.pem", env.as_ref()).expect("resolve");
        assert_eq!(path, tmp.path().join("svc/config/key-prod.pem"));
    }

    #[test]
    fn resolve_falls_back_to_unqualified_name() {
        let tmp = TempDir::new().expect("tmp");
        touch(&tmp.path().join("config/key.pem"));

        let search = SearchPath::new(tmp.path(), "", "config");
        let env = Environment::parse("prod");
        let path = search.resolve_file("key.pem", env.as_ref()).expect("resolve");
        assert_eq!(path, tmp.path().join("config/key.pem"));
    }

    #[test]
    fn resolve_missing_reports_last_candidate() {
        let tmp = TempDir::new().expect("tmp");
        let search = SearchPath::new(tmp.path(), "svc", "config");
        let err = search.resolve_file("missing.txt", None).expect_err("missing");
        match err {
            ConfigError::FileNotFound { path } => {
                assert_eq!(path, tmp.path().join("svc/config/missing.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
