// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Library-wide configuration installed by `TextBridge.initialize`.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use randwerk_core::config::BridgeConfig;
use randwerk_core::error::Result;

/// Settings accepted by `initialize`: the boundary settings plus output style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    #[serde(flatten)]
    pub bridge: BridgeConfig,
    /// Indent the output of `canonicalizeJson`.
    pub pretty_json: bool,
}

impl NativeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.bridge.validate()?;
        Ok(config)
    }
}

/// Holder for the installed configuration.
pub struct NativeState {
    config: RwLock<Option<NativeConfig>>,
}

impl Default for NativeState {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeState {
    pub const fn new() -> Self {
        Self {
            config: RwLock::new(None),
        }
    }

    /// Replace the installed configuration.
    pub fn install(&self, config: NativeConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
    }

    /// The installed configuration, if `initialize` has succeeded.
    pub fn current(&self) -> Option<NativeConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Settings used when reporting failures; defaults before `initialize`.
    pub fn failure_config(&self) -> BridgeConfig {
        self.current().map(|c| c.bridge).unwrap_or_default()
    }
}

/// The state shared by every exported native.
pub static STATE: NativeState = NativeState::new();
