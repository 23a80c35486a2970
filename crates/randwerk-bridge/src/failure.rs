// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reporting native failures to the managed caller.
//
// The only channel back is the context's pending-exception slot. Arming it
// does not unwind anything: the native function must still return, and the
// runtime delivers the exception once control is back in managed code.

use std::ffi::{CStr, CString};

use tracing::{debug, error, warn};

use randwerk_core::config::{BridgeConfig, LookupMissPolicy};
use randwerk_core::mutf8;

use crate::traits::NativeBridge;

/// What `signal_failure` actually managed to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultOutcome {
    /// The configured exception class was raised.
    Raised { class: String },
    /// The configured class was missing; the fallback class was raised.
    Escalated { class: String },
    /// Something was already pending, so nothing new was raised.
    AlreadyPending,
    /// ThrowNew returned a non-zero status.
    ThrowRejected { class: String, status: i32 },
    /// Our message was not raised, but the failed class lookup left its own
    /// exception (usually `NoClassDefFoundError`) pending.
    LookupFaultPending,
    /// Nothing was raised and nothing is pending.
    Unreported,
}

impl FaultOutcome {
    /// True when the managed caller will see an exception.
    pub fn is_armed(&self) -> bool {
        matches!(
            self,
            FaultOutcome::Raised { .. }
                | FaultOutcome::Escalated { .. }
                | FaultOutcome::AlreadyPending
                | FaultOutcome::LookupFaultPending
        )
    }
}

/// Outcome for a message that could not be raised: whatever the lookup
/// left behind is what the caller will see.
fn unraised<B: NativeBridge>(env: &B) -> FaultOutcome {
    if env.exception_check() {
        FaultOutcome::LookupFaultPending
    } else {
        FaultOutcome::Unreported
    }
}

enum RaiseError {
    Missing,
    Rejected(i32),
}

/// FindClass + ThrowNew + DeleteLocalRef. The local reference is released
/// unconditionally; releasing null is a no-op.
fn raise<B: NativeBridge>(env: &B, class_name: &str, message: &CStr) -> Result<(), RaiseError> {
    let Ok(name) = CString::new(class_name) else {
        return Err(RaiseError::Missing);
    };
    let class = env.find_class(&name);
    if env.is_null(class) {
        env.delete_local_ref(class);
        return Err(RaiseError::Missing);
    }
    let status = env.throw_new(class, message);
    env.delete_local_ref(class);
    match status {
        0 => Ok(()),
        status => Err(RaiseError::Rejected(status)),
    }
}

/// Raise a generic runtime exception carrying `message`, default settings.
pub fn signal_failure<B: NativeBridge>(env: &B, message: &str) -> FaultOutcome {
    signal_failure_with(env, &BridgeConfig::default(), message)
}

/// Raise the configured exception carrying `message`.
///
/// The message is cut to `max_message_bytes` and encoded as modified UTF-8,
/// so embedded NULs are carried rather than truncating it.
pub fn signal_failure_with<B: NativeBridge>(
    env: &B,
    config: &BridgeConfig,
    message: &str,
) -> FaultOutcome {
    let message = mutf8::encode_c(config.truncate_message(message));
    signal_failure_c(env, config, &message)
}

/// Raise the configured exception with an already-encoded message.
pub fn signal_failure_c<B: NativeBridge>(
    env: &B,
    config: &BridgeConfig,
    message: &CStr,
) -> FaultOutcome {
    if env.exception_check() {
        warn!("exception already pending; not raising another");
        return FaultOutcome::AlreadyPending;
    }

    let class = &config.exception_class;
    match raise(env, class, message) {
        Ok(()) => {
            debug!(%class, "failure signalled");
            FaultOutcome::Raised { class: class.clone() }
        }
        Err(RaiseError::Rejected(status)) => {
            error!(%class, status, "ThrowNew rejected the exception");
            FaultOutcome::ThrowRejected {
                class: class.clone(),
                status,
            }
        }
        Err(RaiseError::Missing) => match config.on_lookup_miss {
            LookupMissPolicy::Ignore => {
                debug!(%class, "exception class lookup failed; ignoring");
                unraised(env)
            }
            LookupMissPolicy::Escalate => escalate(env, config, message),
        },
    }
}

fn escalate<B: NativeBridge>(env: &B, config: &BridgeConfig, message: &CStr) -> FaultOutcome {
    let fallback = &config.fallback_exception_class;
    error!(
        class = %config.exception_class,
        %fallback,
        "exception class lookup failed; raising fallback"
    );
    // The failed lookup usually armed NoClassDefFoundError. Replace it so
    // the managed caller sees the original message.
    if env.exception_check() {
        env.exception_clear();
    }
    match raise(env, fallback, message) {
        Ok(()) => FaultOutcome::Escalated {
            class: fallback.clone(),
        },
        Err(RaiseError::Rejected(status)) => {
            error!(%fallback, status, "ThrowNew rejected the fallback exception");
            FaultOutcome::ThrowRejected {
                class: fallback.clone(),
                status,
            }
        }
        Err(RaiseError::Missing) => {
            let outcome = unraised(env);
            error!(
                %fallback,
                message = %message.to_string_lossy(),
                ?outcome,
                "fallback exception class lookup failed; message is lost"
            );
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimVm, c_text};

    #[test]
    fn raises_runtime_exception() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let outcome = signal_failure(&env, "boom");
        assert_eq!(
            outcome,
            FaultOutcome::Raised {
                class: "java/lang/RuntimeException".into()
            }
        );
        assert!(outcome.is_armed());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.class, "java/lang/RuntimeException");
        assert_eq!(thrown.message, "boom");
    }

    #[test]
    fn class_reference_is_released() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        signal_failure(&env, "boom");
        assert_eq!(env.live_local_refs(), 0);
    }

    #[test]
    fn does_not_overwrite_pending_exception() {
        let vm = SimVm::builder().heap_limit(0).build();
        let env = vm.attach_current_thread().unwrap();
        env.new_string_utf(&c_text("x"));
        assert_eq!(signal_failure(&env, "boom"), FaultOutcome::AlreadyPending);
        assert_eq!(
            env.return_to_managed().unwrap().class,
            "java/lang/OutOfMemoryError"
        );
    }

    #[test]
    fn escalates_to_fallback_on_lookup_miss() {
        let vm = SimVm::builder()
            .without_class("java/lang/RuntimeException")
            .build();
        let env = vm.attach_current_thread().unwrap();
        let outcome = signal_failure(&env, "boom");
        assert_eq!(
            outcome,
            FaultOutcome::Escalated {
                class: "java/lang/Error".into()
            }
        );
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.class, "java/lang/Error");
        assert_eq!(thrown.message, "boom");
    }

    #[test]
    fn ignore_policy_reproduces_silent_miss() {
        let vm = SimVm::builder()
            .without_class("java/lang/RuntimeException")
            .silent_lookup_miss(true)
            .build();
        let env = vm.attach_current_thread().unwrap();
        let config = BridgeConfig {
            on_lookup_miss: LookupMissPolicy::Ignore,
            ..BridgeConfig::default()
        };
        let outcome = signal_failure_with(&env, &config, "boom");
        assert_eq!(outcome, FaultOutcome::Unreported);
        assert!(!outcome.is_armed());
        assert!(env.return_to_managed().is_none());
    }

    #[test]
    fn ignore_policy_keeps_lookup_exception() {
        let vm = SimVm::builder()
            .without_class("java/lang/RuntimeException")
            .build();
        let env = vm.attach_current_thread().unwrap();
        let config = BridgeConfig {
            on_lookup_miss: LookupMissPolicy::Ignore,
            ..BridgeConfig::default()
        };
        let outcome = signal_failure_with(&env, &config, "boom");
        assert_eq!(outcome, FaultOutcome::LookupFaultPending);
        assert!(outcome.is_armed());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.class, "java/lang/NoClassDefFoundError");
    }

    #[test]
    fn unreported_when_fallback_also_missing() {
        let vm = SimVm::builder()
            .without_class("java/lang/RuntimeException")
            .without_class("java/lang/Error")
            .silent_lookup_miss(true)
            .build();
        let env = vm.attach_current_thread().unwrap();
        let outcome = signal_failure(&env, "boom");
        assert_eq!(outcome, FaultOutcome::Unreported);
        assert!(!outcome.is_armed());
        assert!(env.return_to_managed().is_none());
    }

    #[test]
    fn fallback_miss_reports_the_pending_lookup_exception() {
        let vm = SimVm::builder()
            .without_class("java/lang/RuntimeException")
            .without_class("java/lang/Error")
            .build();
        let env = vm.attach_current_thread().unwrap();
        let outcome = signal_failure(&env, "boom");
        assert_eq!(outcome, FaultOutcome::LookupFaultPending);
        assert!(outcome.is_armed());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.class, "java/lang/NoClassDefFoundError");
        assert_eq!(thrown.message, "java/lang/Error");
    }

    #[test]
    fn embedded_nul_reaches_the_managed_message() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        assert!(signal_failure(&env, "a\0b").is_armed());
        let thrown = env.return_to_managed().unwrap();
        assert_eq!(thrown.message, "a\0b");
        assert_eq!(thrown.message.len(), 3);
    }

    #[test]
    fn truncation_counts_encoded_bytes() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let config = BridgeConfig {
            max_message_bytes: 7,
            ..BridgeConfig::default()
        };
        // "a\0" is three encoded bytes and the emoji is six.
        signal_failure_with(&env, &config, "a\0\u{1F600}");
        assert_eq!(env.return_to_managed().unwrap().message, "a\0");
    }

    #[test]
    fn long_messages_are_truncated() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let config = BridgeConfig {
            max_message_bytes: 4,
            ..BridgeConfig::default()
        };
        signal_failure_with(&env, &config, "boom and then some");
        assert_eq!(env.return_to_managed().unwrap().message, "boom");
    }

    #[test]
    fn custom_exception_class() {
        let vm = SimVm::new();
        let env = vm.attach_current_thread().unwrap();
        let config = BridgeConfig {
            exception_class: "java/lang/IllegalStateException".into(),
            ..BridgeConfig::default()
        };
        signal_failure_with(&env, &config, "state");
        assert_eq!(
            env.return_to_managed().unwrap().class,
            "java/lang/IllegalStateException"
        );
    }
}
