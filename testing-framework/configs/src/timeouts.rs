use std::{ops::Mul as _, time::Duration};

use fabric_testing_env as tf_env;

pub const SHORT_STEP_SECS: u64 = 60;
pub const MED_STEP_SECS: u64 = 120;
pub const LONG_STEP_SECS: u64 = 240;

/// Step budget classes used by the admin steps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepTimeout {
    Short,
    Medium,
    Long,
}

impl StepTimeout {
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::Short => short_step(),
            Self::Medium => med_step(),
            Self::Long => long_step(),
        }
    }
}

fn env_duration(value: Option<u64>, default: u64) -> Duration {
    adjust_timeout(Duration::from_secs(value.unwrap_or(default)))
}

/// In slow test environments, use 2x timeout.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if tf_env::slow_test_env() { d.mul(2) } else { d }
}

pub fn short_step() -> Duration {
    env_duration(tf_env::fabric_short_step_secs(), SHORT_STEP_SECS)
}

pub fn med_step() -> Duration {
    env_duration(tf_env::fabric_med_step_secs(), MED_STEP_SECS)
}

pub fn long_step() -> Duration {
    env_duration(tf_env::fabric_long_step_secs(), LONG_STEP_SECS)
}
