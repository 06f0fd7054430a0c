//! Log output for the auth service.
//!
//! Tracing starts at `info` before the configuration is read, and the
//! configured `logging.level` is swapped in afterwards through a reload
//! handle. An explicit `RUST_LOG` always wins over both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

/// Per-statement sqlx logging is noise for a session store; keep it at warn.
const QUIET_DIRECTIVES: &str = "sqlx=warn";

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},{QUIET_DIRECTIVES}"))
}

pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    let filter = match std::env::var_os("RUST_LOG") {
        Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level)),
        None => filter_for(level),
    };

    let (filter_layer, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// Switches to the configured `logging.level` unless `RUST_LOG` is set.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    if let Err(e) = handle.modify(|filter| *filter = filter_for(level)) {
        tracing::warn!(error = %e, level, "failed to apply logging level");
    }
}
