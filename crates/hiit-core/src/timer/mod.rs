mod engine;
mod phase;
mod plan;

pub use engine::{format_clock, IntervalTimer, TimerSession};
pub use phase::{Phase, WARMUP_SECS};
pub use plan::{
    clamp_interval, clamp_rounds, RestPolicy, SessionConfig, Step, TimerSettings, WorkoutPlan,
    MAX_INTERVAL_SECS, MAX_ROUNDS, MIN_INTERVAL_SECS, MIN_ROUNDS,
};
