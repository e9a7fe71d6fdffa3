//! Cryptographic core of tokencrypt
//!
//! Provides AES-256-GCM token envelopes with PBKDF2-HMAC-SHA3-256 key
//! derivation, plus decryption of tokens embedded in nested JSON and YAML
//! documents. Nothing in this module performs I/O or logging.

pub mod deep;
pub mod envelope;
pub mod key_derivation;
pub mod yaml;

pub use deep::{DeepDecryption, FieldFailure};
pub use envelope::{is_token, Opened, TokenCrypt, HEADER_V1, IV_LEN, MIN_ENVELOPE_LEN, TAG_LEN};
pub use key_derivation::{
    derive_key, DerivedKey, KeyDerivationParams, DEFAULT_ITERATIONS, KEY_LEN,
    SECRET_LINE_DELIMITER,
};
