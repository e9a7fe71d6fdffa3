//! Configuration module for tokencrypt
//!
//! This module provides configuration management including:
//! - Config directory resolution
//! - User settings persistence
//! - Secret line source selection

pub mod paths;
pub mod secret;
pub mod settings;

pub use paths::TokenCryptPaths;
pub use secret::{SecretSource, SECRET_ENV};
pub use settings::{DocumentFormat, LazySettings, Settings};
