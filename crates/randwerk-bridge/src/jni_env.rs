// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JVM implementation of `NativeBridge`.
//
// Calls go straight through the raw JNI function table rather than the
// higher-level `jni::JNIEnv` helpers: the boundary needs the copy flag from
// GetStringUTFChars and must leave pending exceptions exactly as the runtime
// armed them, and the wrappers hide both.

use std::ffi::{CStr, c_char};
use std::marker::PhantomData;
use std::ptr;

use jni::sys::{self, JNI_ERR, JNI_FALSE, jboolean, jobject};
use jni::JNIEnv;

use randwerk_core::error::{BridgeError, Result};

use crate::traits::NativeBridge;

/// Convert a JNI boolean into a Rust one. Any non-zero value is true.
fn jboolean_to_bool(value: jboolean) -> bool {
    value != JNI_FALSE
}

/// Invoke one entry of the JNI function table; `None` if the slot is empty.
macro_rules! jni_call {
    ($raw:expr, $name:ident $(, $arg:expr)* $(,)?) => {{
        let raw: *mut sys::JNIEnv = $raw;
        // SAFETY: `raw` is a live JNIEnv for the current thread (guaranteed
        // by `JniBridge::new` / `from_raw`), so its function table is valid.
        unsafe { (**raw).$name.map(|f| f(raw $(, $arg)*)) }
    }};
}

/// Execution context backed by a real `JNIEnv`.
///
/// Holds the raw pointer only; the lifetime ties it to the `JNIEnv` (and so
/// the native frame) it was created from. Not `Send`: a `JNIEnv` belongs to
/// exactly one thread.
pub struct JniBridge<'local> {
    raw: *mut sys::JNIEnv,
    _env: PhantomData<&'local ()>,
}

impl<'local> JniBridge<'local> {
    /// Wrap the environment handed to a native method.
    pub fn new(env: &JNIEnv<'local>) -> Self {
        Self {
            raw: env.get_raw(),
            _env: PhantomData,
        }
    }

    /// Wrap a raw `JNIEnv*`.
    ///
    /// # Safety
    ///
    /// `raw` must be a valid `JNIEnv*` attached to the current thread for at
    /// least `'local`.
    pub unsafe fn from_raw(raw: *mut sys::JNIEnv) -> Result<Self> {
        if raw.is_null() {
            return Err(BridgeError::NullHandle("JNIEnv"));
        }
        Ok(Self {
            raw,
            _env: PhantomData,
        })
    }

    pub fn as_raw(&self) -> *mut sys::JNIEnv {
        self.raw
    }
}

// SAFETY: the JVM keeps GetStringUTFChars buffers valid until the matching
// ReleaseStringUTFChars.
unsafe impl NativeBridge for JniBridge<'_> {
    type Ref = jobject;

    const NULL: jobject = ptr::null_mut();

    fn get_string_utf_chars(&self, string: jobject, is_copy: Option<&mut bool>) -> *const c_char {
        let mut flag: jboolean = JNI_FALSE;
        let chars = jni_call!(self.raw, GetStringUTFChars, string, &mut flag).unwrap_or(ptr::null());
        if let Some(out) = is_copy {
            *out = jboolean_to_bool(flag);
        }
        chars
    }

    unsafe fn release_string_utf_chars(&self, string: jobject, chars: *const c_char) {
        jni_call!(self.raw, ReleaseStringUTFChars, string, chars);
    }

    fn new_string_utf(&self, bytes: &CStr) -> jobject {
        jni_call!(self.raw, NewStringUTF, bytes.as_ptr()).unwrap_or(ptr::null_mut())
    }

    fn find_class(&self, name: &CStr) -> jobject {
        jni_call!(self.raw, FindClass, name.as_ptr()).unwrap_or(ptr::null_mut())
    }

    fn throw_new(&self, class: jobject, message: &CStr) -> i32 {
        jni_call!(self.raw, ThrowNew, class, message.as_ptr()).unwrap_or(JNI_ERR)
    }

    fn delete_local_ref(&self, obj: jobject) {
        if !obj.is_null() {
            jni_call!(self.raw, DeleteLocalRef, obj);
        }
    }

    fn exception_check(&self) -> bool {
        jni_call!(self.raw, ExceptionCheck).is_some_and(jboolean_to_bool)
    }

    fn exception_clear(&self) {
        jni_call!(self.raw, ExceptionClear);
    }
}
