//! Environment assignment parsing.
//!
//! Accepts `KEY=VALUE` tokens in input order; a later duplicate key
//! overwrites the earlier value and the overwrite is reported to the
//! caller, not treated as fatal.

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// An ordered mapping of environment keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment(Vec<(String, String)>);

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, preserving first-insertion order.
    ///
    /// Returns `true` when an earlier value for `key` was overwritten.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return true;
        }
        self.0.push((key, value));
        false
    }

    /// Returns the value for `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Whether `token` has environment-assignment syntax (`KEY=VALUE` with a
/// well-formed key).
#[must_use]
pub fn is_environment_argument(token: &str) -> bool {
    token.split_once('=').is_some_and(|(key, _)| is_valid_key(key))
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parses environment tokens into an ordered [`Environment`].
///
/// Returns the environment, the keys whose earlier values were
/// overwritten (in overwrite order), and the per-token syntax errors.
/// Parsing is best-effort: one malformed token never blocks the rest.
#[must_use]
pub fn parse_environment(
    tokens: &[String],
) -> (Environment, Vec<String>, Vec<GenerateError>) {
    let mut env = Environment::new();
    let mut overwritten = Vec::new();
    let mut errors = Vec::new();
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) if is_valid_key(key) => {
                if env.set(key, value) {
                    overwritten.push(key.to_string());
                }
            }
            _ => errors.push(GenerateError::EnvironmentSyntax {
                token: token.clone(),
            }),
        }
    }
    (env, overwritten, errors)
}
