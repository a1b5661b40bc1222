//! # hiit Core Library
//!
//! Core logic for the hiit interval-training timer. Everything a front end
//! needs to run a work/rest session lives here; the `hiit` CLI is a thin
//! shell over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()` for progress updates
//! - **Cue Scheduler**: Fires countdown and transition cues on its own tokio
//!   timers, independent of the tick
//! - **Cue Mailbox**: Lock-free single-slot hand-off to a real-time audio
//!   callback
//! - **Storage**: TOML configuration and saved workout plans
//!
//! ## Key Components
//!
//! - [`IntervalTimer`]: Core timer state machine
//! - [`CueScheduler`]: Audio/haptic cue timing
//! - [`Config`]: Application configuration management
//! - [`PlanStore`]: Saved workout plans

pub mod clock;
pub mod cue;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cue::{CueHandler, CueKind, CueMailbox, CuePlan, CueScheduler, MailboxCueHandler};
pub use error::{ConfigError, CoreError, PlanError};
pub use events::{Event, StopReason};
pub use storage::{Config, PlanStore};
pub use timer::{IntervalTimer, Phase, RestPolicy, SessionConfig, TimerSettings, WorkoutPlan};
