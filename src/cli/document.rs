//! Structured document CLI commands
//!
//! Reads a JSON or YAML document, decrypts every token in it (or encrypts the
//! strings at given JSON pointers) and writes it back in the same format.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::config::{DocumentFormat, Settings};
use crate::crypto::{DeepDecryption, TokenCrypt};
use crate::error::TokenCryptResult;

use super::read_input;

/// Arguments shared by the document commands
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Input file (stdin if omitted)
    pub file: Option<PathBuf>,

    /// Document format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<DocumentFormat>,
}

/// Arguments for `decrypt-doc`
#[derive(Args, Debug, Clone)]
pub struct DecryptDocArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Fail if any token in the document does not decode
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `encrypt-doc`
#[derive(Args, Debug, Clone)]
pub struct EncryptDocArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// JSON pointer of a string to encrypt (repeatable), e.g. /db/password
    #[arg(short, long = "path", required = true)]
    pub paths: Vec<String>,
}

/// A parsed document, kept in its own format's value type
///
/// YAML is never converted to JSON: non-string keys, tags and non-finite
/// floats only exist on the YAML side. JSON numbers keep their original text.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Json(serde_json::Value),
    Yaml(serde_yaml::Value),
}

/// Parse a document in the given format
pub fn parse_document(input: &str, format: DocumentFormat) -> TokenCryptResult<Document> {
    match format {
        DocumentFormat::Json => Ok(Document::Json(serde_json::from_str(input)?)),
        DocumentFormat::Yaml => Ok(Document::Yaml(serde_yaml::from_str(input)?)),
    }
}

/// Render a document in its format, always ending with a newline
pub fn render_document(document: &Document, pretty: bool) -> TokenCryptResult<String> {
    match document {
        Document::Json(value) => {
            let mut rendered = if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            };
            rendered.push('\n');
            Ok(rendered)
        }
        Document::Yaml(value) => Ok(serde_yaml::to_string(value)?),
    }
}

fn report_failures<V, E: Write>(
    result: &DeepDecryption<V>,
    warnings: &mut E,
) -> TokenCryptResult<()> {
    for failure in result.failures() {
        writeln!(
            warnings,
            "warning: token at '{}' not decrypted: {}",
            failure.pointer, failure.error
        )?;
    }
    if !result.is_clean() {
        tracing::warn!(count = result.failures().len(), "tokens left undecrypted");
    }
    Ok(())
}

fn finish<V>(result: DeepDecryption<V>, strict: bool) -> TokenCryptResult<V> {
    if strict {
        result.into_result()
    } else {
        Ok(result.into_value())
    }
}

/// Decrypt every token in a document
///
/// Failures are written to `warnings` with their JSON pointers. With `strict`
/// any failure turns into an error instead of a rendered document.
pub fn decrypt_document<E: Write>(
    codec: &TokenCrypt,
    input: &str,
    format: DocumentFormat,
    pretty: bool,
    strict: bool,
    warnings: &mut E,
) -> TokenCryptResult<String> {
    let opened = match parse_document(input, format)? {
        Document::Json(value) => {
            let result = codec.decrypt_deep(&value);
            report_failures(&result, warnings)?;
            Document::Json(finish(result, strict)?)
        }
        Document::Yaml(value) => {
            let result = codec.decrypt_deep_yaml(&value);
            report_failures(&result, warnings)?;
            Document::Yaml(finish(result, strict)?)
        }
    };
    render_document(&opened, pretty)
}

/// Encrypt the strings at the given pointers of a document
pub fn encrypt_document(
    codec: &TokenCrypt,
    input: &str,
    format: DocumentFormat,
    pretty: bool,
    paths: &[String],
) -> TokenCryptResult<String> {
    let sealed = match parse_document(input, format)? {
        Document::Json(value) => Document::Json(codec.encrypt_paths(&value, paths)?),
        Document::Yaml(value) => Document::Yaml(codec.encrypt_paths_yaml(&value, paths)?),
    };
    render_document(&sealed, pretty)
}

/// Handle `decrypt-doc`
pub fn handle_decrypt_doc_command<W: Write, E: Write>(
    codec: &TokenCrypt,
    settings: &Settings,
    args: &DecryptDocArgs,
    out: &mut W,
    warnings: &mut E,
) -> TokenCryptResult<()> {
    let format = args.document.format.unwrap_or(settings.default_format);
    let input = read_input(args.document.file.as_deref())?;
    tracing::debug!(?format, strict = args.strict, "decrypting document");

    let rendered = decrypt_document(
        codec,
        &input,
        format,
        settings.pretty_output,
        args.strict,
        warnings,
    )?;
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

/// Handle `encrypt-doc`
pub fn handle_encrypt_doc_command<W: Write>(
    codec: &TokenCrypt,
    settings: &Settings,
    args: &EncryptDocArgs,
    out: &mut W,
) -> TokenCryptResult<()> {
    let format = args.document.format.unwrap_or(settings.default_format);
    let input = read_input(args.document.file.as_deref())?;
    tracing::debug!(?format, paths = args.paths.len(), "encrypting document fields");

    let rendered = encrypt_document(codec, &input, format, settings.pretty_output, &args.paths)?;
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenCryptError;
    use serde_json::{json, Value};

    const TOKEN_A: &str = "3ncr.org/1#I09Dwt6q05ZrH8GQ0cp+g9Jm0hD0BmCwEdylCh8";

    fn test_codec() -> TokenCrypt {
        TokenCrypt::new("a", "b", 1000).unwrap()
    }

    #[test]
    fn test_decrypt_json_document() {
        let codec = test_codec();
        let input = format!(r#"{{"user": "admin", "password": "{}", "port": 5432}}"#, TOKEN_A);
        let mut warnings = Vec::new();

        let rendered =
            decrypt_document(&codec, &input, DocumentFormat::Json, false, false, &mut warnings)
                .unwrap();
        assert_eq!(
            rendered,
            "{\"user\":\"admin\",\"password\":\"a\",\"port\":5432}\n"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_decrypt_yaml_document() {
        let codec = test_codec();
        let input = format!("db:\n  password: \"{}\"\n  port: 5432\nflags: [true, false]\n", TOKEN_A);
        let mut warnings = Vec::new();

        let rendered =
            decrypt_document(&codec, &input, DocumentFormat::Yaml, true, false, &mut warnings)
                .unwrap();
        assert_eq!(
            rendered,
            "db:\n  password: a\n  port: 5432\nflags:\n- true\n- false\n"
        );
    }

    #[test]
    fn test_json_scalars_unchanged() {
        let codec = test_codec();
        let input = r#"{"id":123456789012345678901234567890,"f":0.1000000000000000055511151231257827,"e":1e+400,"neg":-0.0,"s":"x"}"#;
        let mut warnings = Vec::new();

        let rendered =
            decrypt_document(&codec, input, DocumentFormat::Json, false, false, &mut warnings)
                .unwrap();
        assert_eq!(rendered, format!("{}\n", input));
    }

    #[test]
    fn test_yaml_scalars_unchanged() {
        let codec = test_codec();
        let input = "1: one\ntrue: false\nlimit: .inf\nfloor: -.inf\nmissing: .nan\nx: !secret plain\n";
        let mut warnings = Vec::new();

        let rendered =
            decrypt_document(&codec, input, DocumentFormat::Yaml, false, false, &mut warnings)
                .unwrap();
        assert_eq!(rendered, input);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_tagged_yaml_token() {
        let codec = test_codec();
        let input = format!("1: one\nx: !secret {}\n", TOKEN_A);
        let mut warnings = Vec::new();

        let rendered =
            decrypt_document(&codec, &input, DocumentFormat::Yaml, false, true, &mut warnings)
                .unwrap();
        assert_eq!(rendered, "1: one\nx: !secret a\n");
    }

    #[test]
    fn test_encrypt_yaml_document() {
        let codec = test_codec();
        let input = "5432: hunter2\nlimit: .inf\n";

        let rendered = encrypt_document(
            &codec,
            input,
            DocumentFormat::Yaml,
            false,
            &["/5432".to_string()],
        )
        .unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("limit: .inf"));

        let mut warnings = Vec::new();
        let opened =
            decrypt_document(&codec, &rendered, DocumentFormat::Yaml, false, true, &mut warnings)
                .unwrap();
        assert_eq!(opened, input);
    }

    #[test]
    fn test_decrypt_document_warnings() {
        let codec = test_codec();
        let input = r#"{"ok": "3ncr.org/1#I09Dwt6q05ZrH8GQ0cp+g9Jm0hD0BmCwEdylCh8", "bad": "3ncr.org/1#AAAA"}"#;

        let mut warnings = Vec::new();
        let rendered =
            decrypt_document(&codec, input, DocumentFormat::Json, false, false, &mut warnings)
                .unwrap();
        assert_eq!(rendered, "{\"ok\":\"a\",\"bad\":\"3ncr.org/1#AAAA\"}\n");
        let warnings = String::from_utf8(warnings).unwrap();
        assert!(warnings.contains("'/bad'"));

        let mut warnings = Vec::new();
        let err =
            decrypt_document(&codec, input, DocumentFormat::Json, false, true, &mut warnings)
                .unwrap_err();
        assert!(matches!(err, TokenCryptError::Deep { count: 1, .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_document("{", DocumentFormat::Json).unwrap_err(),
            TokenCryptError::Json(_)
        ));
        assert!(matches!(
            parse_document("a: [", DocumentFormat::Yaml).unwrap_err(),
            TokenCryptError::Yaml(_)
        ));
    }

    #[test]
    fn test_encrypt_document() {
        let codec = test_codec();
        let input = r#"{"user": "admin", "password": "hunter2"}"#;

        let rendered = encrypt_document(
            &codec,
            input,
            DocumentFormat::Json,
            true,
            &["/password".to_string()],
        )
        .unwrap();
        let sealed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(sealed["user"], "admin");
        assert_ne!(sealed["password"], "hunter2");

        let opened = codec.decrypt_deep_strict(&sealed).unwrap();
        assert_eq!(opened, json!({"user": "admin", "password": "hunter2"}));
    }
}
