//! layered-config: YAML configuration with environment overrides
//!
//! Loads one or more YAML files by stem, overlays `<stem>.<env>` and
//! `<stem>-<env>` files for the active environment, lets environment
//! variables override any key, and deserializes the result into your type.
//!
//! # Example
//!
//! ```no_run
//! use layered_config::ConfigLoader;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Database {
//!     url: String,
//!     pool_size: u32,
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Settings {
//!     database: Database,
//! }
//!
//! // ./config/app.yaml, then ./config/app.prod.yaml and ./config/app-prod.yaml
//! // when ENV=prod; DATABASE_POOL_SIZE=20 overrides database.pool_size.
//! let settings: Settings = ConfigLoader::from_env().directory("config").load(&["app"])?;
//! # Ok::<(), layered_config::ConfigError>(())
//! ```

pub mod config;
pub mod error;
pub mod utils;

pub use config::{
    load, load_config, load_config_with_env, load_credentials, load_file, load_map, load_text,
    must_load, must_load_config, must_load_config_with_env, must_load_map, ConfigLoader,
    Environment, MergeContext, SearchPath,
};
pub use error::{ConfigError, ConfigResult};
pub use utils::{trim, trim_all};
