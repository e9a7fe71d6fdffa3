//! User settings for tokencrypt
//!
//! Settings never hold secret material. They may point at a file that does.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::TokenCryptPaths;
use crate::error::{TokenCryptError, TokenCryptResult};

/// Format of structured documents read and written by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

/// User settings for tokencrypt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// File holding a `secret-@@-salt-@@-iterations` line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_file: Option<PathBuf>,

    /// Document format used when none is given on the command line
    #[serde(default)]
    pub default_format: DocumentFormat,

    /// Pretty-print JSON output
    #[serde(default = "default_pretty_output")]
    pub pretty_output: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_pretty_output() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            secret_file: None,
            default_format: DocumentFormat::default(),
            pretty_output: default_pretty_output(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &TokenCryptPaths) -> TokenCryptResult<Self> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            tracing::debug!(path = %settings_path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }

        tracing::debug!(path = %settings_path.display(), "loading settings");
        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| TokenCryptError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| TokenCryptError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TokenCryptPaths) -> TokenCryptResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TokenCryptError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TokenCryptError::Io(format!("Failed to write settings file: {}", e)))
    }
}

/// Settings read from disk on first use
///
/// Commands that never consult settings never open the settings file, so a
/// broken file only fails the commands that need it.
#[derive(Debug)]
pub struct LazySettings<'a> {
    paths: &'a TokenCryptPaths,
    settings: Option<Settings>,
}

impl<'a> LazySettings<'a> {
    pub fn new(paths: &'a TokenCryptPaths) -> Self {
        Self {
            paths,
            settings: None,
        }
    }

    /// Load the settings if this is the first call, then return them
    pub fn get(&mut self) -> TokenCryptResult<&Settings> {
        let settings = match self.settings.take() {
            Some(settings) => settings,
            None => Settings::load_or_create(self.paths)?,
        };
        Ok(self.settings.insert(settings))
    }

    pub fn is_loaded(&self) -> bool {
        self.settings.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.secret_file.is_none());
        assert_eq!(settings.default_format, DocumentFormat::Json);
        assert!(settings.pretty_output);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TokenCryptPaths::with_base_dir(temp_dir.path().join("nope"));

        let settings = Settings::load_or_create(&paths).unwrap();
        assert!(settings.secret_file.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TokenCryptPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings {
            secret_file: Some(PathBuf::from("/etc/tokencrypt/secret")),
            default_format: DocumentFormat::Yaml,
            pretty_output: false,
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(
            loaded.secret_file,
            Some(PathBuf::from("/etc/tokencrypt/secret"))
        );
        assert_eq!(loaded.default_format, DocumentFormat::Yaml);
        assert!(!loaded.pretty_output);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TokenCryptPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"default_format": "yaml"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.schema_version, 1);
        assert_eq!(loaded.default_format, DocumentFormat::Yaml);
        assert!(loaded.pretty_output);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TokenCryptPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, TokenCryptError::Config(_)));
    }

    #[test]
    fn test_lazy_settings_load_on_first_use() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TokenCryptPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"pretty_output": false}"#).unwrap();

        let mut lazy = LazySettings::new(&paths);
        assert!(!lazy.is_loaded());

        // later edits are not picked up once loaded
        assert!(!lazy.get().unwrap().pretty_output);
        std::fs::write(paths.settings_file(), "not json").unwrap();
        assert!(lazy.is_loaded());
        assert!(!lazy.get().unwrap().pretty_output);
    }

    #[test]
    fn test_lazy_settings_error_only_on_get() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TokenCryptPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let mut lazy = LazySettings::new(&paths);
        assert!(matches!(lazy.get().unwrap_err(), TokenCryptError::Config(_)));
        assert!(!lazy.is_loaded());
    }
}
