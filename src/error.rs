//! Custom error types for tokencrypt
//!
//! This module defines the error hierarchy for the library and the binary
//! using thiserror for ergonomic error definitions.

use thiserror::Error;

/// Why a token body could not be opened
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The body is not valid standard base64
    #[error("body is not valid base64")]
    Base64,

    /// The decoded body cannot hold an IV and an authentication tag
    #[error("envelope too short: {len} bytes, need at least 28")]
    Truncated { len: usize },

    /// Tag verification failed (wrong key, corrupted or tampered data)
    #[error("authentication failed")]
    Authentication,

    /// The authenticated plaintext is not valid UTF-8
    #[error("plaintext is not valid UTF-8")]
    NotUtf8,
}

/// The main error type for tokencrypt operations
#[derive(Error, Debug)]
pub enum TokenCryptError {
    /// Invalid secret, salt, iteration count or secret line
    #[error("Construction error: {0}")]
    Construction(String),

    /// The platform could not supply secure random bytes
    #[error("Randomness failure: {0}")]
    Randomness(String),

    /// The AEAD cipher refused to seal the plaintext
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A value carrying the token header could not be decrypted
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeFailure),

    /// One or more tokens inside a structured document failed to decode
    #[error("{count} token(s) failed to decode, first at '{first_pointer}': {first}")]
    Deep {
        count: usize,
        first_pointer: String,
        first: DecodeFailure,
    },

    /// A JSON pointer did not address a string value
    #[error("Path error: {0}")]
    Path(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(String),
}

impl TokenCryptError {
    /// Create a construction error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Check if this is a decode failure, single or from a document walk
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Deep { .. })
    }

    /// Check if this is a construction error
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }
}

impl From<std::io::Error> for TokenCryptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TokenCryptError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for TokenCryptError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err.to_string())
    }
}

/// Result type alias for tokencrypt operations
pub type TokenCryptResult<T> = Result<T, TokenCryptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TokenCryptError::construction("secret must not be empty");
        assert_eq!(
            err.to_string(),
            "Construction error: secret must not be empty"
        );
        assert!(err.is_construction());
        assert!(!err.is_decode());
    }

    #[test]
    fn test_decode_error_display() {
        let err: TokenCryptError = DecodeFailure::Truncated { len: 5 }.into();
        assert_eq!(
            err.to_string(),
            "Decode error: envelope too short: 5 bytes, need at least 28"
        );
        assert!(err.is_decode());
    }

    #[test]
    fn test_deep_error_display() {
        let err = TokenCryptError::Deep {
            count: 2,
            first_pointer: "/db/password".into(),
            first: DecodeFailure::Authentication,
        };
        assert_eq!(
            err.to_string(),
            "2 token(s) failed to decode, first at '/db/password': authentication failed"
        );
        assert!(err.is_decode());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TokenCryptError = io_err.into();
        assert!(matches!(err, TokenCryptError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TokenCryptError = json_err.into();
        assert!(matches!(err, TokenCryptError::Json(_)));
    }
}
