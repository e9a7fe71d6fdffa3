//! Token decryption over nested JSON-like documents
//!
//! Walks a [`serde_json::Value`] and opens every string that carries the
//! token header, rebuilding arrays and objects with the same shape and key
//! order. A token that fails to decode does not stop the walk: its slot keeps
//! the original token text and the failure is reported with the JSON pointer
//! of the slot.

use serde_json::{Map, Value};

use crate::error::{DecodeFailure, TokenCryptError, TokenCryptResult};

use super::envelope::{is_token, TokenCrypt, HEADER_V1};

/// A token inside a document that could not be decrypted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// RFC 6901 pointer to the failing value (`""` is the document root)
    pub pointer: String,
    /// Why the token did not decode
    pub error: DecodeFailure,
}

/// Result of [`TokenCrypt::decrypt_deep`] and [`TokenCrypt::decrypt_deep_yaml`]
#[derive(Debug, Clone, PartialEq)]
pub struct DeepDecryption<V = Value> {
    pub(super) value: V,
    pub(super) failures: Vec<FieldFailure>,
}

impl<V> DeepDecryption<V> {
    /// The rebuilt document
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Tokens that failed to decode, in document order
    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    /// True if every token in the document decoded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Take the document, keeping undecodable tokens as they were
    pub fn into_value(self) -> V {
        self.value
    }

    /// Take the document, or an error if any token failed to decode
    pub fn into_result(self) -> TokenCryptResult<V> {
        match self.failures.first() {
            None => Ok(self.value),
            Some(first) => Err(TokenCryptError::Deep {
                count: self.failures.len(),
                first_pointer: first.pointer.clone(),
                first: first.error,
            }),
        }
    }
}

impl TokenCrypt {
    /// Decrypt every token string in a document
    ///
    /// The input is left untouched. Numbers, booleans, null and strings
    /// without the header are copied as they are.
    pub fn decrypt_deep(&self, node: &Value) -> DeepDecryption {
        let mut pointer = String::new();
        let mut failures = Vec::new();
        let value = self.walk(node, &mut pointer, &mut failures);
        DeepDecryption { value, failures }
    }

    /// Decrypt every token string in a document, failing on the first bad token
    pub fn decrypt_deep_strict(&self, node: &Value) -> TokenCryptResult<Value> {
        self.decrypt_deep(node).into_result()
    }

    fn walk(&self, node: &Value, pointer: &mut String, failures: &mut Vec<FieldFailure>) -> Value {
        match node {
            Value::String(s) => Value::String(self.open_slot(s, pointer, failures)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let mark = push_segment(pointer, &index.to_string());
                        let value = self.walk(item, pointer, failures);
                        pointer.truncate(mark);
                        value
                    })
                    .collect(),
            ),
            Value::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| {
                        let mark = push_segment(pointer, key);
                        let value = self.walk(item, pointer, failures);
                        pointer.truncate(mark);
                        (key.clone(), value)
                    })
                    .collect::<Map<String, Value>>(),
            ),
            Value::Null | Value::Bool(_) | Value::Number(_) => node.clone(),
        }
    }

    /// Open one string slot, recording a failure and keeping the token text if it does not decode
    pub(super) fn open_slot(
        &self,
        s: &str,
        pointer: &str,
        failures: &mut Vec<FieldFailure>,
    ) -> String {
        match s.strip_prefix(HEADER_V1) {
            None => s.to_string(),
            Some(body) => match self.unseal_str(body) {
                Ok(plaintext) => plaintext,
                Err(error) => {
                    failures.push(FieldFailure {
                        pointer: pointer.to_string(),
                        error,
                    });
                    s.to_string()
                }
            },
        }
    }

    /// Encrypt the strings at the given JSON pointers
    ///
    /// Returns a new document. Targets that already hold a token are left as
    /// they are. A pointer that does not resolve, or resolves to something
    /// other than a string, is an error.
    pub fn encrypt_paths<P: AsRef<str>>(
        &self,
        node: &Value,
        pointers: &[P],
    ) -> TokenCryptResult<Value> {
        let mut sealed = node.clone();

        for pointer in pointers {
            let pointer = pointer.as_ref();
            match sealed.pointer_mut(pointer) {
                Some(Value::String(s)) => {
                    if !is_token(s) {
                        let token = self.encrypt(s)?;
                        *s = token;
                    }
                }
                Some(_) => {
                    return Err(TokenCryptError::Path(format!(
                        "'{}' does not point to a string",
                        pointer
                    )))
                }
                None => {
                    return Err(TokenCryptError::Path(format!(
                        "'{}' not found",
                        pointer
                    )))
                }
            }
        }

        Ok(sealed)
    }
}

/// Append an escaped pointer segment, returning the length to truncate back to
pub(super) fn push_segment(pointer: &mut String, segment: &str) -> usize {
    let mark = pointer.len();
    pointer.push('/');
    pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    mark
}
