//! Token decryption over YAML documents
//!
//! YAML mappings may have keys that are not strings, values may carry tags,
//! and floats may be infinite or NaN. None of that survives a trip through
//! [`serde_json::Value`], so these walks run on [`serde_yaml::Value`] directly
//! and hand back everything except token strings as it came in. Pointers use
//! the JSON pointer syntax, with a non-string key written as its YAML scalar
//! (`/1/name` for `{1: {name: ...}}`). Tags are transparent to pointers.

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::error::{TokenCryptError, TokenCryptResult};

use super::deep::{push_segment, DeepDecryption, FieldFailure};
use super::envelope::{is_token, TokenCrypt};

impl TokenCrypt {
    /// Decrypt every token string in a YAML document
    ///
    /// Same contract as [`TokenCrypt::decrypt_deep`]. Tagged values keep
    /// their tag; mapping keys are copied untouched.
    pub fn decrypt_deep_yaml(&self, node: &Value) -> DeepDecryption<Value> {
        let mut pointer = String::new();
        let mut failures = Vec::new();
        let value = self.walk_yaml(node, &mut pointer, &mut failures);
        DeepDecryption { value, failures }
    }

    /// Decrypt every token string in a YAML document, failing on the first bad token
    pub fn decrypt_deep_yaml_strict(&self, node: &Value) -> TokenCryptResult<Value> {
        self.decrypt_deep_yaml(node).into_result()
    }

    fn walk_yaml(
        &self,
        node: &Value,
        pointer: &mut String,
        failures: &mut Vec<FieldFailure>,
    ) -> Value {
        match node {
            Value::String(s) => Value::String(self.open_slot(s, pointer, failures)),
            Value::Sequence(items) => Value::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let mark = push_segment(pointer, &index.to_string());
                        let value = self.walk_yaml(item, pointer, failures);
                        pointer.truncate(mark);
                        value
                    })
                    .collect(),
            ),
            Value::Mapping(entries) => Value::Mapping(
                entries
                    .iter()
                    .map(|(key, item)| {
                        let mark = push_segment(pointer, &key_segment(key));
                        let value = self.walk_yaml(item, pointer, failures);
                        pointer.truncate(mark);
                        (key.clone(), value)
                    })
                    .collect::<Mapping>(),
            ),
            Value::Tagged(tagged) => Value::Tagged(Box::new(TaggedValue {
                tag: tagged.tag.clone(),
                value: self.walk_yaml(&tagged.value, pointer, failures),
            })),
            Value::Null | Value::Bool(_) | Value::Number(_) => node.clone(),
        }
    }

    /// Encrypt the strings at the given pointers of a YAML document
    ///
    /// Same contract as [`TokenCrypt::encrypt_paths`]. A tagged string stays
    /// tagged, with the token in place of its text.
    pub fn encrypt_paths_yaml<P: AsRef<str>>(
        &self,
        node: &Value,
        pointers: &[P],
    ) -> TokenCryptResult<Value> {
        let mut sealed = node.clone();

        for pointer in pointers {
            let pointer = pointer.as_ref();
            match pointer_mut(&mut sealed, pointer).map(untag_mut) {
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

/// Pointer segment for a mapping key
fn key_segment(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn untag_mut(node: &mut Value) -> &mut Value {
    match node {
        Value::Tagged(tagged) => untag_mut(&mut tagged.value),
        other => other,
    }
}

fn pointer_mut<'a>(node: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    if pointer.is_empty() {
        return Some(node);
    }
    pointer
        .strip_prefix('/')?
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .try_fold(node, |target, segment| match untag_mut(target) {
            Value::Mapping(entries) => entries
                .iter_mut()
                .find(|(key, _)| key_segment(key) == segment)
                .map(|(_, value)| value),
            Value::Sequence(items) => match segment.parse::<usize>() {
                Ok(index) => items.get_mut(index),
                Err(_) => None,
            },
            _ => None,
        })
}
