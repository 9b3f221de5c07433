//! Configuration discovery, merging and environment binding
//!
//! Files are found by stem in `./<directory>` then `./<parent>/<directory>`,
//! merged base-first with `<stem>.<env>` / `<stem>-<env>` overrides on top,
//! and finally overridden by environment variables named after each key.
//! File keys are matched case-insensitively.

pub mod binding;
pub mod files;
pub mod keys;
pub mod loader;
pub mod merge;
pub mod search;

pub use binding::{env_name, Binding, Bindings, EnvSnapshot, Override};
pub use files::{load_credentials, load_file, load_text};
pub use loader::{
    load, load_config, load_config_with_env, load_map, must_load, must_load_config,
    must_load_config_with_env, must_load_map, ConfigLoader,
};
pub use merge::MergeContext;
pub use search::{Environment, SearchPath, ENV_VAR};
