// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bodies of the `TextBridge` natives, independent of the concrete runtime.

use tracing::info;

use randwerk_bridge::{NativeBridge, native_to_string, new_managed_string};
use randwerk_core::error::{BridgeError, Result};

use crate::state::{NativeConfig, NativeState};

/// `initialize(String configJson)`.
pub fn initialize<B: NativeBridge>(env: &B, state: &NativeState, config_json: B::Ref) -> Result<()> {
    let json = native_to_string(env, config_json)?;
    let config = NativeConfig::from_json(&json)
        .map_err(|e| BridgeError::Native(format!("unable to parse bridge config: {e}")))?;
    info!(
        exception_class = %config.bridge.exception_class,
        pretty_json = config.pretty_json,
        "native bridge initialised"
    );
    state.install(config);
    Ok(())
}

/// `roundTrip(String) -> String`.
pub fn round_trip<B: NativeBridge>(env: &B, input: B::Ref) -> Result<B::Ref> {
    let text = native_to_string(env, input)?;
    new_managed_string(env, &text)
}

/// `canonicalizeJson(String) -> String`.
pub fn canonicalize_json<B: NativeBridge>(env: &B, state: &NativeState, input: B::Ref) -> Result<B::Ref> {
    let config = state.current().ok_or_else(|| {
        BridgeError::Native("native bridge has not been initialized yet".into())
    })?;
    let text = native_to_string(env, input)?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| BridgeError::Native(format!("unable to unmarshal JSON: {e}")))?;
    let out = if config.pretty_json {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|e| BridgeError::Native(format!("unable to marshal result: {e}")))?;
    new_managed_string(env, &out)
}

/// `raise(String message)`: always fails with `message`.
pub fn raise<B: NativeBridge>(env: &B, message: B::Ref) -> Result<()> {
    let message = native_to_string(env, message)?;
    Err(BridgeError::Native(message))
}

#[cfg(test)]
mod tests {
    use randwerk_bridge::sim::{SimEnv, SimVm};
    use randwerk_core::config::BridgeConfig;

    use super::*;
    use crate::entry::guarded;

    fn call<T>(env: &SimEnv, state: &NativeState, body: impl FnOnce(&SimEnv) -> Result<T>) -> Option<T> {
        guarded(env, &state.failure_config(), "test", body)
    }

    #[test]
    fn round_trip_preserves_content() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        let input = env.managed_string("h\u{e9}llo \u{1F600}\0end");
        let out = call(&env, &state, |e| round_trip(e, input)).unwrap();
        assert_eq!(env.string_content(out).as_deref(), Some("h\u{e9}llo \u{1F600}\0end"));
        assert_eq!(vm.outstanding_buffers(), 0);
    }

    #[test]
    fn canonicalize_requires_initialize() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        let input = env.managed_string("{}");
        assert!(call(&env, &state, |e| canonicalize_json(e, &state, input)).is_none());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.message, "native bridge has not been initialized yet");
    }

    #[test]
    fn canonicalize_compacts_after_initialize() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        let config = env.managed_string("{}");
        call(&env, &state, |e| initialize(e, &state, config)).unwrap();

        let input = env.managed_string("{ \"b\" : [1, 2],\n \"a\": \"x\" }");
        let out = call(&env, &state, |e| canonicalize_json(e, &state, input)).unwrap();
        assert_eq!(
            env.string_content(out).as_deref(),
            Some(r#"{"a":"x","b":[1,2]}"#)
        );
    }

    #[test]
    fn canonicalize_pretty() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        let config = env.managed_string(r#"{"pretty_json": true}"#);
        call(&env, &state, |e| initialize(e, &state, config)).unwrap();

        let input = env.managed_string(r#"{"a":1}"#);
        let out = call(&env, &state, |e| canonicalize_json(e, &state, input)).unwrap();
        assert_eq!(env.string_content(out).as_deref(), Some("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn bad_json_raises_with_context() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        state.install(NativeConfig::default());
        let input = env.managed_string("{oops");
        assert!(call(&env, &state, |e| canonicalize_json(e, &state, input)).is_none());
        let thrown = env.return_to_managed().unwrap();
        assert!(thrown.message.starts_with("unable to unmarshal JSON: "), "{thrown}");
    }

    #[test]
    fn bad_config_is_rejected_and_not_installed() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        let config = env.managed_string(r#"{"exception_class": "java.lang.Oops"}"#);
        assert!(call(&env, &state, |e| initialize(e, &state, config)).is_none());
        assert!(state.current().is_none());
        let thrown = env.return_to_managed().unwrap();
        assert!(thrown.message.starts_with("unable to parse bridge config: "));
    }

    #[test]
    fn installed_config_shapes_failures() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        let config =
            env.managed_string(r#"{"exception_class": "java/lang/IllegalStateException"}"#);
        call(&env, &state, |e| initialize(e, &state, config)).unwrap();

        let message = env.managed_string("boom");
        assert!(call(&env, &state, |e| raise(e, message)).is_none());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.class, "java/lang/IllegalStateException");
        assert_eq!(thrown.message, "boom");
    }

    #[test]
    fn raise_delivers_message_verbatim() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        assert_eq!(state.failure_config(), BridgeConfig::default());
        let message = env.managed_string("boom");
        assert!(call(&env, &state, |e| raise(e, message)).is_none());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.class, "java/lang/RuntimeException");
        assert_eq!(thrown.message, "boom");
    }

    #[test]
    fn null_input_raises() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let state = NativeState::new();
        assert!(call(&env, &state, |e| round_trip(e, SimEnv::NULL)).is_none());
        assert_eq!(env.return_to_managed().unwrap().message, "null string handle");
    }
}
