//! `config` command: show resolved paths and settings
//!
//! Never prints secret material, only where it would be read from.

use std::io::Write;

use crate::config::{SecretSource, Settings, TokenCryptPaths};
use crate::error::TokenCryptResult;

/// Handle `config`
pub fn handle_config_command<W: Write>(
    paths: &TokenCryptPaths,
    settings: &Settings,
    source: &SecretSource,
    out: &mut W,
) -> TokenCryptResult<()> {
    let settings_file = paths.settings_file();

    writeln!(out, "tokencrypt Configuration")?;
    writeln!(out, "========================")?;
    writeln!(out, "Config directory: {}", paths.base_dir().display())?;
    writeln!(
        out,
        "Settings file:    {}{}",
        settings_file.display(),
        if settings_file.exists() { "" } else { " (not found, using defaults)" }
    )?;
    writeln!(out)?;
    writeln!(out, "Settings:")?;
    writeln!(out, "  Default format: {:?}", settings.default_format)?;
    writeln!(out, "  Pretty output:  {}", settings.pretty_output)?;
    match &settings.secret_file {
        Some(path) => writeln!(out, "  Secret file:    {}", path.display())?,
        None => writeln!(out, "  Secret file:    (none)")?,
    }
    writeln!(out)?;
    match source {
        SecretSource::File(path) => writeln!(out, "Secret source: file {}", path.display())?,
        other => writeln!(out, "Secret source: {}", other.kind())?,
    }

    Ok(())
}
