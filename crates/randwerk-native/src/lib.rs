// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Randwerk — JNI entry points for `dev.randwerk.TextBridge`.
//
// Each export wraps the JVM's `JNIEnv` in a `JniBridge`, runs the matching
// body from `natives` under `entry::guarded`, and returns null when the body
// failed (the managed caller receives the armed exception instead).

pub mod entry;
pub mod logging;
pub mod natives;
pub mod state;

use std::ptr;

use jni::JNIEnv;
use jni::objects::{JClass, JString};
use jni::sys::jstring;

use randwerk_bridge::JniBridge;

use crate::state::STATE;

#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_randwerk_TextBridge_initialize<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    config_json: JString<'local>,
) {
    logging::init();
    let bridge = JniBridge::new(&env);
    entry::guarded(&bridge, &STATE.failure_config(), "initialize", |b| {
        natives::initialize(b, &STATE, config_json.as_raw())
    });
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_randwerk_TextBridge_roundTrip<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    input: JString<'local>,
) -> jstring {
    logging::init();
    let bridge = JniBridge::new(&env);
    entry::guarded(&bridge, &STATE.failure_config(), "roundTrip", |b| {
        natives::round_trip(b, input.as_raw())
    })
    .unwrap_or(ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_randwerk_TextBridge_canonicalizeJson<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    input: JString<'local>,
) -> jstring {
    logging::init();
    let bridge = JniBridge::new(&env);
    entry::guarded(&bridge, &STATE.failure_config(), "canonicalizeJson", |b| {
        natives::canonicalize_json(b, &STATE, input.as_raw())
    })
    .unwrap_or(ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_randwerk_TextBridge_raise<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    message: JString<'local>,
) {
    logging::init();
    let bridge = JniBridge::new(&env);
    entry::guarded(&bridge, &STATE.failure_config(), "raise", |b| {
        natives::raise(b, message.as_raw())
    });
}
