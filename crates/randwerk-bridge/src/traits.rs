// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The native-bridge entry points the boundary adapter consumes.
//
// Each method maps one-to-one onto a JNI function-table entry. Failure is
// reported the way the runtime reports it: a null return and/or an armed
// pending exception. Nothing here converts those into `Result`; that is the
// adapter's job.

use std::ffi::{CStr, c_char};
use std::fmt;

/// One execution context (a thread's attachment to the managed runtime).
///
/// Implementations are per-thread handles and should not be `Send`.
///
/// # Safety
///
/// A non-null pointer returned by [`get_string_utf_chars`] must point to a
/// NUL-terminated buffer that stays valid and unchanged until it is handed
/// back to [`release_string_utf_chars`] on the same context.
///
/// [`get_string_utf_chars`]: NativeBridge::get_string_utf_chars
/// [`release_string_utf_chars`]: NativeBridge::release_string_utf_chars
pub unsafe trait NativeBridge {
    /// Local reference to a managed object.
    type Ref: Copy + Eq + fmt::Debug;

    /// The null reference.
    const NULL: Self::Ref;

    fn is_null(&self, obj: Self::Ref) -> bool {
        obj == Self::NULL
    }

    /// `GetStringUTFChars`: modified UTF-8 view of `string`, or null on failure.
    ///
    /// When `is_copy` is supplied it receives whether the buffer is a copy.
    fn get_string_utf_chars(&self, string: Self::Ref, is_copy: Option<&mut bool>) -> *const c_char;

    /// `ReleaseStringUTFChars`.
    ///
    /// # Safety
    ///
    /// `chars` must come from `get_string_utf_chars(string, ..)` on this
    /// context and must not have been released already.
    unsafe fn release_string_utf_chars(&self, string: Self::Ref, chars: *const c_char);

    /// `NewStringUTF`: a new local string reference, or null with a pending
    /// `OutOfMemoryError`.
    fn new_string_utf(&self, bytes: &CStr) -> Self::Ref;

    /// `FindClass`: null (usually with a pending exception) on a miss.
    fn find_class(&self, name: &CStr) -> Self::Ref;

    /// `ThrowNew`: arms the pending exception; zero on success.
    fn throw_new(&self, class: Self::Ref, message: &CStr) -> i32;

    /// `DeleteLocalRef`. Deleting the null reference is a no-op.
    fn delete_local_ref(&self, obj: Self::Ref);

    /// `ExceptionCheck`.
    fn exception_check(&self) -> bool;

    /// `ExceptionClear`.
    fn exception_clear(&self);
}
