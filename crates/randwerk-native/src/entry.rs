// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Guarded native entry: turns errors and panics into managed exceptions.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use randwerk_bridge::{NativeBridge, signal_failure_with};
use randwerk_core::config::BridgeConfig;
use randwerk_core::error::Result;

/// Run a native method body.
///
/// `Some(value)` on success. On error or panic the failure is signalled on
/// `env` and `None` is returned; the caller should hand the runtime a null
/// or zero value, which the managed side never sees because the exception
/// is delivered first.
pub fn guarded<B, T, F>(env: &B, config: &BridgeConfig, name: &str, body: F) -> Option<T>
where
    B: NativeBridge,
    F: FnOnce(&B) -> Result<T>,
{
    let message = match panic::catch_unwind(AssertUnwindSafe(|| body(env))) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("native panic: {}", panic_message(payload.as_ref())),
    };

    warn!(entry = name, error = %message, "native call failed");
    let outcome = signal_failure_with(env, config, &message);
    if !outcome.is_armed() {
        error!(entry = name, ?outcome, "failure could not be reported to the caller");
    }
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
