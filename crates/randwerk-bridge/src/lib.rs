// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Randwerk — the native side of a managed/unmanaged boundary.
//
// `traits` describes the slice of the runtime's native-bridge API we consume.
// `adapter` and `failure` build the boundary operations on top of it, and
// work the same against the real JVM (`jni_env`) or the in-process
// simulation used by tests and JVM-less builds (`sim`).

pub mod adapter;
pub mod failure;
pub mod jni_env;
pub mod sim;
pub mod traits;

pub use adapter::{
    NativeText, borrow_native_text, construct_managed_text, ensure_no_pending_fault,
    extract_native_text, native_to_string, new_managed_string, pending_fault,
    release_native_text,
};
pub use failure::{FaultOutcome, signal_failure, signal_failure_c, signal_failure_with};
pub use jni_env::JniBridge;
pub use traits::NativeBridge;
