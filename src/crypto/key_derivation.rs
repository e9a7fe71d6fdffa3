//! Key derivation using PBKDF2-HMAC-SHA3-256
//!
//! Stretches a secret and a salt into the 32-byte AES-256 key used by the
//! token codec. The same secret, salt and iteration count always produce the
//! same key; none of the three is embedded in tokens.

use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use sha3::Sha3_256;
use zeroize::ZeroizeOnDrop;

use crate::error::{TokenCryptError, TokenCryptResult};

/// Length of the derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Iteration count used when the caller does not pick one
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Delimiter between secret, salt and iterations in a secret line
pub const SECRET_LINE_DELIMITER: &str = "-@@-";

/// Parameters for key derivation
///
/// Secret and salt are wiped from memory when the params are dropped. There
/// is no way to clear them earlier, so a value of this type always holds what
/// [`KeyDerivationParams::new`] accepted.
///
/// ```compile_fail
/// use zeroize::Zeroize;
///
/// let mut params = tokencrypt::crypto::KeyDerivationParams::new("a", "b", 1000).unwrap();
/// params.zeroize();
/// ```
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct KeyDerivationParams {
    secret: Vec<u8>,
    salt: Vec<u8>,
    iterations: u32,
}

impl KeyDerivationParams {
    /// Create params, rejecting an empty secret, an empty salt or zero iterations
    pub fn new(
        secret: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
        iterations: u32,
    ) -> TokenCryptResult<Self> {
        let secret = secret.as_ref();
        let salt = salt.as_ref();

        if secret.is_empty() {
            return Err(TokenCryptError::construction("secret must not be empty"));
        }
        if salt.is_empty() {
            return Err(TokenCryptError::construction("salt must not be empty"));
        }
        if iterations == 0 {
            return Err(TokenCryptError::construction(
                "iteration count must be positive",
            ));
        }

        Ok(Self {
            secret: secret.to_vec(),
            salt: salt.to_vec(),
            iterations,
        })
    }

    /// Create params with [`DEFAULT_ITERATIONS`]
    pub fn with_default_iterations(
        secret: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
    ) -> TokenCryptResult<Self> {
        Self::new(secret, salt, DEFAULT_ITERATIONS)
    }

    /// Parse a `secret-@@-salt-@@-iterations` line
    ///
    /// A single trailing `\n` or `\r\n` is dropped so a key file may end with
    /// a newline. Other whitespace belongs to the secret or salt. Anything but
    /// exactly three parts is rejected.
    pub fn from_secret_line(line: &str) -> TokenCryptResult<Self> {
        let line = strip_line_ending(line);
        let parts: Vec<&str> = line.split(SECRET_LINE_DELIMITER).collect();
        if parts.len() != 3 {
            return Err(TokenCryptError::Construction(format!(
                "secret line must have 3 parts separated by '{}', got {}",
                SECRET_LINE_DELIMITER,
                parts.len()
            )));
        }

        let iterations = parse_iterations(parts[2])?;
        Self::new(parts[0], parts[1], iterations)
    }

    /// Number of PBKDF2 rounds
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl FromStr for KeyDerivationParams {
    type Err = TokenCryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_secret_line(s)
    }
}

// Secret and salt never show up in Debug output
impl fmt::Debug for KeyDerivationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDerivationParams")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

fn strip_line_ending(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

fn parse_iterations(raw: &str) -> TokenCryptResult<u32> {
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(TokenCryptError::Construction(format!(
            "iteration count must be a positive integer, got '{}'",
            raw
        ))),
        Ok(n) => Ok(n),
    }
}

/// A derived encryption key
///
/// Only the codec inside this crate can read the bytes.
#[derive(ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive a 32-byte key from the params
pub fn derive_key(params: &KeyDerivationParams) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha3_256>(&params.secret, &params.salt, params.iterations, &mut key);
    DerivedKey { key }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_known_key() {
        let params = KeyDerivationParams::new("a", "b", 1000).unwrap();
        let key = derive_key(&params);
        assert_eq!(
            hex(key.as_bytes()),
            "2f84151869d7d2255d62b3320e97429bde5aac04a0573b2468529a7417515f87"
        );
    }

    #[test]
    fn test_same_params_same_key() {
        let params = KeyDerivationParams::new("secret", "salt", 10).unwrap();
        let key1 = derive_key(&params);
        let key2 = derive_key(&params);
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_inputs_different_key() {
        let base = derive_key(&KeyDerivationParams::new("secret", "salt", 10).unwrap());
        let other_secret = derive_key(&KeyDerivationParams::new("secret2", "salt", 10).unwrap());
        let other_salt = derive_key(&KeyDerivationParams::new("secret", "salt2", 10).unwrap());
        let other_iter = derive_key(&KeyDerivationParams::new("secret", "salt", 11).unwrap());

        assert_ne!(base.as_bytes(), other_secret.as_bytes());
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_iter.as_bytes());
    }

    #[test]
    fn test_rejects_empty_and_zero() {
        assert!(KeyDerivationParams::new("", "salt", 1)
            .unwrap_err()
            .is_construction());
        assert!(KeyDerivationParams::new("secret", "", 1)
            .unwrap_err()
            .is_construction());
        assert!(KeyDerivationParams::new("secret", "salt", 0)
            .unwrap_err()
            .is_construction());
    }

    #[test]
    fn test_default_iterations() {
        let params = KeyDerivationParams::with_default_iterations("a", "b").unwrap();
        assert_eq!(params.iterations(), DEFAULT_ITERATIONS);
    }

    #[test]
    fn test_secret_line() {
        let params = KeyDerivationParams::from_secret_line("a-@@-b-@@-1000\n").unwrap();
        assert_eq!(params, KeyDerivationParams::new("a", "b", 1000).unwrap());

        let parsed: KeyDerivationParams = "a-@@-b-@@-1000".parse().unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_secret_line_keeps_whitespace() {
        let params = KeyDerivationParams::from_secret_line(" s-@@-t -@@-1000").unwrap();
        assert_eq!(params, KeyDerivationParams::new(" s", "t ", 1000).unwrap());
        assert_ne!(params, KeyDerivationParams::new("s", "t", 1000).unwrap());

        let crlf = KeyDerivationParams::from_secret_line("a-@@-b-@@-1000\r\n").unwrap();
        assert_eq!(crlf, KeyDerivationParams::new("a", "b", 1000).unwrap());

        // only one line ending is dropped
        assert!(KeyDerivationParams::from_secret_line("a-@@-b-@@-1000\n\n").is_err());
    }

    #[test]
    fn test_malformed_secret_lines() {
        for line in [
            "",
            "a-@@-b",
            "a-@@-b-@@-1000-@@-x",
            "-@@-b-@@-1000",
            "a-@@--@@-1000",
            "a-@@-b-@@-0",
            "a-@@-b-@@--5",
            "a-@@-b-@@-many",
            "a-@@-b-@@-",
            "a-@@-b-@@- 1000",
            "a-@@-b-@@-1000 ",
        ] {
            let err = KeyDerivationParams::from_secret_line(line).unwrap_err();
            assert!(err.is_construction(), "line {:?} gave {:?}", line, err);
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let params = KeyDerivationParams::new("hunter2", "pepper", 7).unwrap();
        let debug = format!("{:?}", params);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("pepper"));
        assert!(debug.contains("iterations: 7"));

        let key = derive_key(&params);
        assert_eq!(format!("{:?}", key), "DerivedKey(..)");
    }
}
