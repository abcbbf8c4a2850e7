use fabric_testing_env as tf_env;
use tracing_subscriber::{EnvFilter, fmt};

fn set_default_env(key: &str, value: &str) {
    if std::env::var_os(key).is_none() {
        // SAFETY: Used as an early-run default. Prefer setting env vars in the
        // shell for multi-threaded runs.
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

pub fn init_logging_defaults() {
    set_default_env("RUST_LOG", "info");
}

/// Shortens the step budgets for the simulated network, which answers
/// without any real round trip.
pub fn init_simulated_timeouts() {
    set_default_env("FABRIC_SHORT_STEP_SECS", "10");
    set_default_env("FABRIC_MED_STEP_SECS", "20");
    set_default_env("FABRIC_LONG_STEP_SECS", "40");
}

pub fn init_tracing() {
    let filter = tf_env::rust_log()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
