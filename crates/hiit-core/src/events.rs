use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    Reset,
    Completed,
}

/// Every state change of the timer produces an Event.
/// Commands return the events they emitted; the host dispatches them to
/// display, audio-session and haptic collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        total_rounds: u32,
        total_duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        reason: StopReason,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        round: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// Whole-second boundary inside the countdown window of a phase.
    CountdownTick {
        phase: Phase,
        seconds_left: u32,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        rounds: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        round: u32,
        total_rounds: u32,
        is_running: bool,
        is_paused: bool,
        remaining_ms: u64,
        remaining: String,
        current_exercise: Option<String>,
        next_exercise: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerStopped { .. } => "timer_stopped",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::CountdownTick { .. } => "countdown_tick",
            Event::WorkoutCompleted { .. } => "workout_completed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
