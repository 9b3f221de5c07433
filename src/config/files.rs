//! Raw file, text and credentials loaders
//!
//! Files are resolved like config stems but by exact name, with the
//! environment inserted before the extension (`key.pem` → `key-prod.pem`).
//! A file missing from every candidate directory is an error here.

use crate::config::loader::ConfigLoader;
use crate::error::{ConfigError, ConfigResult};
use crate::utils::decode_text;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

impl ConfigLoader {
    /// Path a raw file name resolves to.
    pub fn resolve_file(&self, filename: &str) -> ConfigResult<PathBuf> {
        self.search_path().resolve_file(filename, self.active_environment())
    }

    /// Read the full contents of a resolved file.
    pub fn load_file(&self, filename: &str) -> ConfigResult<Vec<u8>> {
        let path = self.resolve_file(filename)?;
        let bytes = fs::read(&path).map_err(|e| ConfigError::from_io(path.clone(), e))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }

    /// Read a resolved file as text, stripping any BOM.
    pub fn load_text(&self, filename: &str) -> ConfigResult<String> {
        let bytes = self.load_file(filename)?;
        let (text, encoding) = decode_text(&bytes);
        if encoding != "utf-8" {
            debug!("Decoded {} as {}", filename, encoding);
        }
        Ok(text)
    }

    /// Same as [`ConfigLoader::load_file`]; the bytes are returned untouched.
    pub fn load_credentials(&self, filename: &str) -> ConfigResult<Vec<u8>> {
        self.load_file(filename)
    }
}

fn positional(parent_path: &str, directory: &str, env: &str) -> ConfigLoader {
    ConfigLoader::new().parent_path(parent_path).directory(directory).environment(env)
}

pub fn load_file(
    parent_path: &str,
    directory: &str,
    env: &str,
    filename: &str,
) -> ConfigResult<Vec<u8>> {
    positional(parent_path, directory, env).load_file(filename)
}

pub fn load_text(parent_path: &str, directory: &str, env: &str, filename: &str) -> ConfigResult<String> {
    positional(parent_path, directory, env).load_text(filename)
}

pub fn load_credentials(
    parent_path: &str,
    directory: &str,
    env: &str,
    filename: &str,
) -> ConfigResult<Vec<u8>> {
    positional(parent_path, directory, env).load_credentials(filename)
}
