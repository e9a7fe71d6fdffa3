//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the token codec.

pub mod config;
pub mod document;
pub mod token;

use std::io::Read;
use std::path::Path;

use crate::error::{TokenCryptError, TokenCryptResult};

pub use config::handle_config_command;
pub use document::{
    handle_decrypt_doc_command, handle_encrypt_doc_command, DecryptDocArgs, DocumentArgs,
    EncryptDocArgs,
};
pub use token::{handle_check_command, handle_decrypt_command, handle_encrypt_command};

/// Read a whole file, or stdin when no file is given
pub fn read_input(file: Option<&Path>) -> TokenCryptResult<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            TokenCryptError::Io(format!("Failed to read {}: {}", path.display(), e))
        }),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| TokenCryptError::Io(format!("Failed to read stdin: {}", e)))?;
            Ok(input)
        }
    }
}
