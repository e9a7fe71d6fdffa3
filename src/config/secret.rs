//! Where the secret line comes from
//!
//! The first available source wins: an explicit line (flag or
//! `TOKENCRYPT_SECRET`), an explicit file, the file named in the settings,
//! the default secret file in the config directory, and finally an
//! interactive prompt.

use std::fmt;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use super::paths::TokenCryptPaths;
use super::settings::{LazySettings, Settings};
use crate::crypto::TokenCrypt;
use crate::error::{TokenCryptError, TokenCryptResult};

/// Environment variable holding a secret line
pub const SECRET_ENV: &str = "TOKENCRYPT_SECRET";

/// A place to read the secret line from
pub enum SecretSource {
    /// Given directly on the command line or in the environment
    Line(Zeroizing<String>),
    /// Read from a file; one trailing line ending is ignored
    File(PathBuf),
    /// Asked for on the terminal without echo
    Prompt,
}

impl SecretSource {
    /// Source named by a flag or the environment, if any
    pub fn from_flags(line: Option<String>, file: Option<PathBuf>) -> Option<Self> {
        match (line, file) {
            (Some(line), _) => Some(SecretSource::Line(Zeroizing::new(line))),
            (None, Some(file)) => Some(SecretSource::File(file)),
            (None, None) => None,
        }
    }

    /// Source to use when no flag names one
    pub fn from_settings(settings: &Settings, paths: &TokenCryptPaths) -> Self {
        if let Some(file) = &settings.secret_file {
            return SecretSource::File(file.clone());
        }

        let default_file = paths.default_secret_file();
        if default_file.is_file() {
            SecretSource::File(default_file)
        } else {
            SecretSource::Prompt
        }
    }

    /// Pick the source to use, reading settings only when no flag names one
    pub fn resolve(
        line: Option<String>,
        file: Option<PathBuf>,
        settings: &mut LazySettings<'_>,
        paths: &TokenCryptPaths,
    ) -> TokenCryptResult<Self> {
        match Self::from_flags(line, file) {
            Some(source) => Ok(source),
            None => Ok(Self::from_settings(settings.get()?, paths)),
        }
    }

    /// Short name of the source, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            SecretSource::Line(_) => "line",
            SecretSource::File(_) => "file",
            SecretSource::Prompt => "prompt",
        }
    }

    /// Read the secret line
    pub fn read_line(&self) -> TokenCryptResult<Zeroizing<String>> {
        match self {
            SecretSource::Line(line) => Ok(line.clone()),
            SecretSource::File(path) => read_secret_file(path),
            SecretSource::Prompt => {
                rpassword::prompt_password("Secret line (secret-@@-salt-@@-iterations): ")
                    .map(Zeroizing::new)
                    .map_err(|e| TokenCryptError::Io(format!("Failed to read secret: {}", e)))
            }
        }
    }

    /// Read the secret line and build a codec from it
    pub fn load(&self) -> TokenCryptResult<TokenCrypt> {
        let line = self.read_line()?;
        TokenCrypt::from_secret_line(&line)
    }
}

// Never print the secret line itself
impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::Line(_) => f.write_str("Line([REDACTED])"),
            SecretSource::File(path) => f.debug_tuple("File").field(path).finish(),
            SecretSource::Prompt => f.write_str("Prompt"),
        }
    }
}

fn read_secret_file(path: &Path) -> TokenCryptResult<Zeroizing<String>> {
    std::fs::read_to_string(path)
        .map(Zeroizing::new)
        .map_err(|e| {
            TokenCryptError::Io(format!(
                "Failed to read secret file {}: {}",
                path.display(),
                e
            ))
        })
}
