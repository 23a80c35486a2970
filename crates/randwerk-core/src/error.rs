// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Randwerk.

use thiserror::Error;

use crate::mutf8::Mutf8Error;

/// Top-level error type for all Randwerk operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Handle / buffer errors --
    #[error("null {0} handle")]
    NullHandle(&'static str),

    #[error("runtime returned no buffer for string extraction")]
    ExtractionFailed,

    #[error("managed string allocation failed")]
    AllocationFailed,

    // -- Exception signalling --
    #[error("a managed exception is already pending")]
    PendingException,

    // -- Text encoding --
    #[error("invalid modified UTF-8: {0}")]
    Encoding(#[from] Mutf8Error),

    // -- Runtime attachment --
    #[error("thread is already attached to the runtime")]
    AlreadyAttached,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure raised by native code behind the boundary.
    #[error("{0}")]
    Native(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
