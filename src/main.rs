use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tokencrypt::cli::{
    handle_check_command, handle_config_command, handle_decrypt_command,
    handle_decrypt_doc_command, handle_encrypt_command, handle_encrypt_doc_command,
    DecryptDocArgs, EncryptDocArgs,
};
use tokencrypt::config::{LazySettings, SecretSource, TokenCryptPaths};
use tokencrypt::TokenCrypt;

#[derive(Parser)]
#[command(
    name = "tokencrypt",
    version,
    about = "Encrypt and decrypt 3ncr.org/1 tokens",
    long_about = "tokencrypt turns secrets into self-describing AES-256-GCM tokens \
                  and back. Values that are not tokens pass through decryption \
                  unchanged, so whole JSON or YAML documents can be decrypted in place."
)]
struct Cli {
    /// Secret line: secret-@@-salt-@@-iterations
    #[arg(long, global = true, env = "TOKENCRYPT_SECRET", hide_env_values = true)]
    secret_line: Option<String>,

    /// File holding the secret line
    #[arg(long, global = true)]
    secret_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt text into a token
    #[command(alias = "enc")]
    Encrypt {
        /// Text to encrypt (stdin if omitted)
        text: Option<String>,
    },

    /// Decrypt a token; other input is printed unchanged
    #[command(alias = "dec")]
    Decrypt {
        /// Token to decrypt (stdin if omitted)
        token: Option<String>,
    },

    /// Decrypt every token in a JSON or YAML document
    DecryptDoc(DecryptDocArgs),

    /// Encrypt selected string fields of a JSON or YAML document
    EncryptDoc(EncryptDocArgs),

    /// Report whether a value is a token that decodes, without printing it
    Check {
        /// Value to inspect
        value: String,
    },

    /// Show current configuration and paths
    Config,
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {}", e))
}

fn load_codec(source: &SecretSource) -> Result<TokenCrypt> {
    tracing::debug!(source = source.kind(), "deriving key");
    source.load().context("failed to load secret")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let paths = TokenCryptPaths::new()?;
    let mut settings = LazySettings::new(&paths);
    let source = SecretSource::resolve(cli.secret_line, cli.secret_file, &mut settings, &paths)
        .context("failed to load settings")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Encrypt { text } => {
            handle_encrypt_command(&load_codec(&source)?, text, &mut out)?;
        }
        Commands::Decrypt { token } => {
            handle_decrypt_command(&load_codec(&source)?, token, &mut out)?;
        }
        Commands::DecryptDoc(args) => {
            let codec = load_codec(&source)?;
            let settings = settings.get().context("failed to load settings")?;
            handle_decrypt_doc_command(&codec, settings, &args, &mut out, &mut io::stderr())?;
        }
        Commands::EncryptDoc(args) => {
            let codec = load_codec(&source)?;
            let settings = settings.get().context("failed to load settings")?;
            handle_encrypt_doc_command(&codec, settings, &args, &mut out)?;
        }
        Commands::Check { value } => {
            handle_check_command(&load_codec(&source)?, &value, &mut out)?;
        }
        Commands::Config => {
            let settings = settings.get().context("failed to load settings")?;
            handle_config_command(&paths, settings, &source, &mut out)?;
        }
    }

    Ok(())
}
