// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Log subscriber for the loaded library.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Filter variable read on first use, e.g. `RANDWERK_LOG=randwerk_bridge=debug`.
pub const LOG_ENV: &str = "RANDWERK_LOG";

static INIT: Once = Once::new();

/// Install the stderr subscriber once per process. A subscriber the host
/// already installed wins.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok();
        if installed {
            tracing::debug!("randwerk native logging initialised");
        }
    });
}
