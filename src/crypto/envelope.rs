//! AES-256-GCM token envelope
//!
//! A token is the version header followed by unpadded standard base64 of
//! `IV (12 bytes) || ciphertext || tag (16 bytes)`. Ciphertext is as long as
//! the plaintext and no associated data is authenticated.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{DecodeFailure, TokenCryptError, TokenCryptResult};

use super::key_derivation::{derive_key, DerivedKey, KeyDerivationParams};

/// Header identifying a version 1 token
pub const HEADER_V1: &str = "3ncr.org/1#";

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const IV_LEN: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_LEN: usize = 16;

/// Smallest decoded body: an IV and a tag around an empty ciphertext
pub const MIN_ENVELOPE_LEN: usize = IV_LEN + TAG_LEN;

/// Standard alphabet; never pads on encode, accepts bodies with or without padding
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Check whether a string starts with the exact version header
pub fn is_token(input: &str) -> bool {
    input.starts_with(HEADER_V1)
}

/// Outcome of opening a value that may or may not be a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened<'a> {
    /// The input was a token and decrypted to this plaintext
    Plaintext(String),
    /// The input does not carry the header and is returned as is
    PassThrough(&'a str),
}

impl Opened<'_> {
    /// Collapse into the resulting string
    pub fn into_string(self) -> String {
        match self {
            Opened::Plaintext(plaintext) => plaintext,
            Opened::PassThrough(input) => input.to_string(),
        }
    }

    /// True if a token was decrypted
    pub fn was_token(&self) -> bool {
        matches!(self, Opened::Plaintext(_))
    }
}

/// Encrypts and decrypts version 1 tokens with one derived key
///
/// The key is derived once on construction and held for the lifetime of the
/// value. The codec is immutable, so a shared reference (or an `Arc`) can be
/// used from many threads at once.
///
/// `Debug` prints no fields and `Serialize` produces an empty map, so the key
/// cannot leak through logging or serialization.
pub struct TokenCrypt {
    key: DerivedKey,
}

impl TokenCrypt {
    /// Derive the key from a secret, a salt and a PBKDF2 iteration count
    pub fn new(
        secret: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
        iterations: u32,
    ) -> TokenCryptResult<Self> {
        let params = KeyDerivationParams::new(secret, salt, iterations)?;
        Ok(Self::from_params(&params))
    }

    /// Derive the key from already validated params
    pub fn from_params(params: &KeyDerivationParams) -> Self {
        Self {
            key: derive_key(params),
        }
    }

    /// Derive the key from a `secret-@@-salt-@@-iterations` line
    pub fn from_secret_line(line: &str) -> TokenCryptResult<Self> {
        let params = KeyDerivationParams::from_secret_line(line)?;
        Ok(Self::from_params(&params))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(self.key.as_bytes().into())
    }

    /// Encrypt a string into a token
    pub fn encrypt(&self, plaintext: &str) -> TokenCryptResult<String> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Encrypt arbitrary bytes into a token
    ///
    /// Each call draws a fresh IV from the OS random source, so encrypting
    /// the same input twice gives two different tokens.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> TokenCryptResult<String> {
        let mut iv = [0u8; IV_LEN];
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| TokenCryptError::Randomness(e.to_string()))?;

        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|e| TokenCryptError::Encryption(e.to_string()))?;

        let mut envelope = Vec::with_capacity(IV_LEN + sealed.len());
        envelope.extend_from_slice(&iv);
        envelope.extend_from_slice(&sealed);

        let mut token = String::from(HEADER_V1);
        BODY_ENGINE.encode_string(&envelope, &mut token);
        Ok(token)
    }

    fn unseal(&self, body: &str) -> Result<Vec<u8>, DecodeFailure> {
        let envelope = BODY_ENGINE
            .decode(body.as_bytes())
            .map_err(|_| DecodeFailure::Base64)?;

        if envelope.len() < MIN_ENVELOPE_LEN {
            return Err(DecodeFailure::Truncated {
                len: envelope.len(),
            });
        }

        let (iv, sealed) = envelope.split_at(IV_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(iv), sealed)
            .map_err(|_| DecodeFailure::Authentication)
    }

    pub(crate) fn unseal_str(&self, body: &str) -> Result<String, DecodeFailure> {
        String::from_utf8(self.unseal(body)?).map_err(|_| DecodeFailure::NotUtf8)
    }

    /// Decrypt a token body (the part after the header) into bytes
    pub fn decrypt_raw_bytes(&self, body: &str) -> TokenCryptResult<Vec<u8>> {
        Ok(self.unseal(body)?)
    }

    /// Decrypt a token body (the part after the header) into a string
    pub fn decrypt_raw(&self, body: &str) -> TokenCryptResult<String> {
        Ok(self.unseal_str(body)?)
    }

    /// Open a value that may be a token
    ///
    /// Input without the header is passed through. Input with the header must
    /// decrypt, otherwise the decode failure is returned.
    pub fn open<'a>(&self, input: &'a str) -> TokenCryptResult<Opened<'a>> {
        match input.strip_prefix(HEADER_V1) {
            Some(body) => self.decrypt_raw(body).map(Opened::Plaintext),
            None => Ok(Opened::PassThrough(input)),
        }
    }

    /// Decrypt a token, or return non-token input unchanged
    pub fn decrypt(&self, input: &str) -> TokenCryptResult<String> {
        self.open(input).map(Opened::into_string)
    }
}

impl FromStr for TokenCrypt {
    type Err = TokenCryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_secret_line(s)
    }
}

impl fmt::Debug for TokenCrypt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCrypt").finish_non_exhaustive()
    }
}

impl Serialize for TokenCrypt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}
