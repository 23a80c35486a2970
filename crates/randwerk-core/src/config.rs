// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::mutf8;

/// What `signal_failure` does when the exception class cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMissPolicy {
    /// Log the miss and raise the fallback exception class instead.
    #[default]
    Escalate,
    /// Leave the runtime as the lookup left it and carry on.
    Ignore,
}

/// Settings that shape how failures cross the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Binary name (slash separated) of the exception raised for native failures.
    pub exception_class: String,
    /// Raised when `exception_class` cannot be resolved and the policy escalates.
    pub fallback_exception_class: String,
    /// Behaviour on an exception class lookup miss.
    pub on_lookup_miss: LookupMissPolicy,
    /// Limit on a diagnostic message's modified UTF-8 length, the bytes
    /// ThrowNew receives. Longer messages are cut on a character boundary.
    pub max_message_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            exception_class: "java/lang/RuntimeException".into(),
            fallback_exception_class: "java/lang/Error".into(),
            on_lookup_miss: LookupMissPolicy::Escalate,
            max_message_bytes: 4096,
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Reject settings the runtime could never honour.
    pub fn validate(&self) -> Result<()> {
        validate_class_name("exception_class", &self.exception_class)?;
        validate_class_name("fallback_exception_class", &self.fallback_exception_class)?;
        if self.max_message_bytes == 0 {
            return Err(BridgeError::Config(
                "max_message_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Cut `message` so its modified UTF-8 encoding fits `max_message_bytes`,
    /// without splitting a character.
    pub fn truncate_message<'a>(&self, message: &'a str) -> &'a str {
        let mut encoded = 0;
        for (at, ch) in message.char_indices() {
            encoded += mutf8::char_len(ch);
            if encoded > self.max_message_bytes {
                return &message[..at];
            }
        }
        message
    }
}

/// FindClass takes binary names with `/` separators, never `.`.
fn validate_class_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BridgeError::Config(format!("{field} must not be empty")));
    }
    if name.contains('.') {
        return Err(BridgeError::Config(format!(
            "{field} `{name}` must use `/` separators, e.g. java/lang/RuntimeException"
        )));
    }
    if name.contains('\0') || name.starts_with('/') || name.ends_with('/') {
        return Err(BridgeError::Config(format!("{field} `{name}` is not a class name")));
    }
    Ok(())
}
