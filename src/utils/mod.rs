//! Shared helpers: text decoding, path naming, whitespace trimming

pub mod encoding;
pub mod paths;
pub mod trim;

pub use encoding::decode_text;
pub use paths::{display_path, normalize_path, with_env_suffix};
pub use trim::{trim, trim_all};
