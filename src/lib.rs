//! tokencrypt - versioned authenticated-encryption tokens
//!
//! Turns plaintext strings into self-describing `3ncr.org/1#` tokens and
//! back. Strings that are not tokens pass through decryption unchanged, which
//! makes it safe to run over whole configuration documents where only some
//! values are encrypted.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `crypto`: key derivation, the token envelope and document traversal
//! - `error`: Custom error types
//! - `config`: Configuration paths, settings and secret sources
//! - `cli`: Command handlers for the `tokencrypt` binary
//!
//! # Example
//!
//! ```rust
//! use tokencrypt::crypto::TokenCrypt;
//!
//! let codec = TokenCrypt::new("a", "b", 1000)?;
//!
//! let token = codec.encrypt("s3cr3t")?;
//! assert!(token.starts_with("3ncr.org/1#"));
//! assert_eq!(codec.decrypt(&token)?, "s3cr3t");
//! assert_eq!(codec.decrypt("not a token")?, "not a token");
//! # Ok::<(), tokencrypt::TokenCryptError>(())
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;

pub use crypto::{is_token, DeepDecryption, FieldFailure, Opened, TokenCrypt, HEADER_V1};
pub use error::{DecodeFailure, TokenCryptError, TokenCryptResult};
