// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Randwerk — Core types, errors, and text encoding shared across all crates.

pub mod config;
pub mod error;
pub mod mutf8;

pub use config::{BridgeConfig, LookupMissPolicy};
pub use error::{BridgeError, Result};
pub use mutf8::Mutf8Error;
