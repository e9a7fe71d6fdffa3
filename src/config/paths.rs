//! Path management for tokencrypt
//!
//! ## Path Resolution Order
//!
//! 1. `TOKENCRYPT_CONFIG_DIR` environment variable (if set)
//! 2. The platform config directory from [`directories::ProjectDirs`]
//!    (`~/.config/tokencrypt` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{TokenCryptError, TokenCryptResult};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "TOKENCRYPT_CONFIG_DIR";

/// Manages all paths used by tokencrypt
#[derive(Debug, Clone)]
pub struct TokenCryptPaths {
    base_dir: PathBuf,
}

impl TokenCryptPaths {
    /// Resolve the config directory
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the home directory cannot
    /// be determined.
    pub fn new() -> TokenCryptResult<Self> {
        let base_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => ProjectDirs::from("org", "3ncr", "tokencrypt")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    TokenCryptError::Config("Could not determine home directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Default location of a secret line file
    pub fn default_secret_file(&self) -> PathBuf {
        self.base_dir.join("secret")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> TokenCryptResult<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            TokenCryptError::Io(format!("Failed to create config directory: {}", e))
        })
    }
}
