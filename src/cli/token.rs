//! Single-value CLI commands
//!
//! Encrypt, decrypt and inspect one value at a time.

use std::io::Write;

use crate::crypto::{Opened, TokenCrypt};
use crate::error::TokenCryptResult;

use super::read_input;

/// Drop one trailing line ending, as left by `echo` or a heredoc
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

/// Take the value from the argument, or from stdin without its line ending
fn value_or_stdin(value: Option<String>) -> TokenCryptResult<String> {
    match value {
        Some(value) => Ok(value),
        None => read_input(None).map(strip_line_ending),
    }
}

/// Handle `encrypt`
pub fn handle_encrypt_command<W: Write>(
    codec: &TokenCrypt,
    text: Option<String>,
    out: &mut W,
) -> TokenCryptResult<()> {
    let plaintext = value_or_stdin(text)?;
    let token = codec.encrypt(&plaintext)?;
    writeln!(out, "{}", token)?;
    Ok(())
}

/// Handle `decrypt`
///
/// Non-token input is echoed back. A token that fails to decode is an error
/// and nothing is written.
pub fn handle_decrypt_command<W: Write>(
    codec: &TokenCrypt,
    token: Option<String>,
    out: &mut W,
) -> TokenCryptResult<()> {
    let input = value_or_stdin(token)?;
    let opened = codec.open(&input)?;
    if !opened.was_token() {
        tracing::info!("input is not a token, passing it through");
    }
    writeln!(out, "{}", opened.into_string())?;
    Ok(())
}

/// Handle `check`: report what the value is without printing plaintext
pub fn handle_check_command<W: Write>(
    codec: &TokenCrypt,
    value: &str,
    out: &mut W,
) -> TokenCryptResult<()> {
    match codec.open(value) {
        Ok(Opened::PassThrough(_)) => writeln!(out, "not a token")?,
        Ok(Opened::Plaintext(plaintext)) => writeln!(
            out,
            "valid token ({} bytes of plaintext)",
            plaintext.len()
        )?,
        Err(e) => {
            writeln!(out, "invalid token")?;
            return Err(e);
        }
    }
    Ok(())
}
