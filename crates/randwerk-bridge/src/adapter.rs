// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary adapter: moving text between native buffers and managed strings.
//
// Every operation takes the execution context explicitly as its first
// argument. Runtime failures (null returns) become `BridgeError`s, but any
// exception the runtime armed is left pending for the caller to see via
// `pending_fault`.

use std::ffi::{CStr, c_char};
use std::ptr::NonNull;

use tracing::debug;

use randwerk_core::error::{BridgeError, Result};
use randwerk_core::mutf8;

use crate::traits::NativeBridge;

/// Extract a modified UTF-8 view of a managed string.
///
/// The returned buffer must be passed to [`release_native_text`] exactly once
/// before the native call returns. Prefer [`borrow_native_text`], which does
/// that on drop.
pub fn extract_native_text<B: NativeBridge>(
    env: &B,
    string: B::Ref,
    is_copy: Option<&mut bool>,
) -> Result<NonNull<c_char>> {
    if env.is_null(string) {
        return Err(BridgeError::NullHandle("string"));
    }
    let chars = env.get_string_utf_chars(string, is_copy);
    NonNull::new(chars.cast_mut()).ok_or(BridgeError::ExtractionFailed)
}

/// Give a buffer from [`extract_native_text`] back to the runtime.
///
/// # Safety
///
/// `chars` must have been extracted from `string` on this same context and
/// not released since.
pub unsafe fn release_native_text<B: NativeBridge>(env: &B, string: B::Ref, chars: NonNull<c_char>) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { env.release_string_utf_chars(string, chars.as_ptr()) };
}

/// A borrowed native text buffer, released when dropped.
pub struct NativeText<'e, B: NativeBridge> {
    env: &'e B,
    string: B::Ref,
    chars: NonNull<c_char>,
    is_copy: bool,
}

impl<B: NativeBridge> NativeText<'_, B> {
    /// The buffer, terminator included.
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: `NativeBridge` guarantees a NUL-terminated buffer that
        // stays valid until release, and release only happens in `Drop`.
        unsafe { CStr::from_ptr(self.chars.as_ptr()) }
    }

    /// Modified UTF-8 bytes, terminator excluded.
    pub fn as_bytes(&self) -> &[u8] {
        self.as_c_str().to_bytes()
    }

    /// Whether the runtime made a copy rather than exposing its own storage.
    pub fn is_copy(&self) -> bool {
        self.is_copy
    }

    /// Decode into an owned Rust string.
    pub fn to_rust_string(&self) -> Result<String> {
        Ok(mutf8::decode(self.as_bytes())?)
    }
}

impl<B: NativeBridge> Drop for NativeText<'_, B> {
    fn drop(&mut self) {
        // SAFETY: `chars` came from `extract_native_text(self.string)` on
        // `self.env` and this is the only place it is released.
        unsafe { release_native_text(self.env, self.string, self.chars) };
    }
}

/// Extract `string` into a guard that releases the buffer on every exit path.
pub fn borrow_native_text<B: NativeBridge>(env: &B, string: B::Ref) -> Result<NativeText<'_, B>> {
    let mut is_copy = false;
    let chars = extract_native_text(env, string, Some(&mut is_copy))?;
    debug!(is_copy, "native text borrowed");
    Ok(NativeText {
        env,
        string,
        chars,
        is_copy,
    })
}

/// Copy a managed string into a Rust `String`, releasing the buffer.
pub fn native_to_string<B: NativeBridge>(env: &B, string: B::Ref) -> Result<String> {
    borrow_native_text(env, string)?.to_rust_string()
}

/// Construct a managed string from NUL-terminated modified UTF-8 bytes.
///
/// A null result means the runtime could not allocate; the exception it
/// armed is left pending.
pub fn construct_managed_text<B: NativeBridge>(env: &B, text: &CStr) -> Result<B::Ref> {
    let string = env.new_string_utf(text);
    if env.is_null(string) {
        debug!(len = text.to_bytes().len(), "NewStringUTF returned null");
        return Err(BridgeError::AllocationFailed);
    }
    Ok(string)
}

/// Construct a managed string from Rust text, NULs included.
pub fn new_managed_string<B: NativeBridge>(env: &B, text: &str) -> Result<B::Ref> {
    construct_managed_text(env, &mutf8::encode_c(text))
}

/// Whether the context has an exception armed. Check after every call into
/// the runtime whose result alone cannot tell you.
pub fn pending_fault<B: NativeBridge>(env: &B) -> bool {
    env.exception_check()
}

/// `Err(PendingException)` when an exception is armed.
pub fn ensure_no_pending_fault<B: NativeBridge>(env: &B) -> Result<()> {
    if pending_fault(env) {
        return Err(BridgeError::PendingException);
    }
    Ok(())
}
