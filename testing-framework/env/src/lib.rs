use std::{env, path::PathBuf};

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn fabric_fixtures_dir() -> Option<PathBuf> {
    env::var("FABRIC_TEST_FIXTURES_DIR").ok().map(PathBuf::from)
}

/// `None` when unset; any value other than `false`/`0` keeps de-duplication on.
#[must_use]
pub fn fabric_tracker_in_flight_dedup() -> Option<bool> {
    env::var("FABRIC_TRACKER_IN_FLIGHT_DEDUP")
        .ok()
        .map(|val| !(val.eq_ignore_ascii_case("false") || val == "0"))
}

#[must_use]
pub fn fabric_short_step_secs() -> Option<u64> {
    env_u64("FABRIC_SHORT_STEP_SECS")
}

#[must_use]
pub fn fabric_med_step_secs() -> Option<u64> {
    env_u64("FABRIC_MED_STEP_SECS")
}

#[must_use]
pub fn fabric_long_step_secs() -> Option<u64> {
    env_u64("FABRIC_LONG_STEP_SECS")
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}
