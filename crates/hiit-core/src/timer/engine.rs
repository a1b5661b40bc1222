//! Interval timer engine.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads: the caller invokes `tick()` periodically (about every 100 ms) to
//! refresh the display fields and detect phase ends. Phase boundaries are
//! derived from absolute timestamps, so missed ticks, dropped frames or a
//! suspended process only delay *noticing* a transition, never its timing.
//!
//! ## Phases
//!
//! ```text
//! Ready -> Warmup -> Work -> (Rest -> Work)* -> Complete
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = IntervalTimer::new(config, Arc::new(SystemClock), cues);
//! timer.start();
//! // Every ~100ms:
//! for event in timer.tick() { /* dispatch */ }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::phase::{Phase, WARMUP_SECS};
use super::plan::{RestPolicy, SessionConfig, WorkoutPlan};
use crate::clock::{to_datetime, Clock};
use crate::cue::{CuePlan, CueScheduler, DEFAULT_COUNTDOWN};
use crate::events::{Event, StopReason};

/// Mutable state of one session.
///
/// Exactly one of not-started (`Ready`), running, paused or `Complete`
/// holds at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub phase: Phase,
    /// 1-indexed, never above the session's total rounds.
    pub round: u32,
    pub is_running: bool,
    pub is_paused: bool,
    /// When the current phase began (epoch ms). None while not counting.
    pub phase_started_at_ms: Option<u64>,
    pub phase_duration_secs: u32,
    /// Remaining time captured by `pause()`.
    pub paused_remaining_ms: Option<u64>,
    /// Remaining time as of the last `tick()`, for UI polling.
    pub display_remaining_ms: u64,
    /// Last whole second for which a countdown tick was emitted.
    #[serde(default)]
    last_countdown: Option<u32>,
}

impl Default for TimerSession {
    fn default() -> Self {
        Self {
            phase: Phase::Ready,
            round: 1,
            is_running: false,
            is_paused: false,
            phase_started_at_ms: None,
            phase_duration_secs: 0,
            paused_remaining_ms: None,
            display_remaining_ms: 0,
            last_countdown: None,
        }
    }
}

/// Why cues are being armed.
#[derive(Debug, Clone, Copy)]
enum Arming {
    /// A phase was just entered; `announce` adds the on-entry cue.
    Entry { announce: bool },
    /// A paused phase continues.
    Resume,
}

/// Core interval timer.
pub struct IntervalTimer {
    /// Configuration applied by the next `start()`.
    config: SessionConfig,
    /// Configuration frozen for the session in progress.
    active: SessionConfig,
    session: TimerSession,
    countdown: Vec<u32>,
    announce_on_entry: bool,
    clock: Arc<dyn Clock>,
    cues: CueScheduler,
}

impl IntervalTimer {
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>, cues: CueScheduler) -> Self {
        Self {
            active: config.clone(),
            config,
            session: TimerSession::default(),
            countdown: DEFAULT_COUNTDOWN.to_vec(),
            announce_on_entry: false,
            clock,
            cues,
        }
    }

    /// Seconds before a phase ends at which countdown ticks and cues fire.
    pub fn with_countdown(mut self, mut seconds: Vec<u32>) -> Self {
        seconds.retain(|&s| s > 0);
        seconds.sort_unstable_by(|a, b| b.cmp(a));
        seconds.dedup();
        self.countdown = seconds;
        self
    }

    /// Announce work and rest phases as they begin, in addition to the
    /// end-of-phase transition cue.
    pub fn with_entry_announcements(mut self, enabled: bool) -> Self {
        self.announce_on_entry = enabled;
        self
    }

    // ── Configuration ────────────────────────────────────────────────
    //
    // Changes apply from the next `start()`; a session in progress keeps
    // the values it started with.

    pub fn set_work_secs(&mut self, secs: u32) {
        self.config.settings.set_work_secs(secs);
    }

    pub fn set_rest_secs(&mut self, secs: u32) {
        self.config.settings.set_rest_secs(secs);
    }

    pub fn set_rounds(&mut self, rounds: u32) {
        self.config.settings.set_rounds(rounds);
    }

    pub fn set_rest_policy(&mut self, policy: RestPolicy) {
        self.config.settings.rest_policy = policy;
    }

    pub fn set_plan(&mut self, plan: Option<WorkoutPlan>) {
        self.config.plan = plan;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn round(&self) -> u32 {
        self.session.round
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_paused
    }

    /// The configuration describing what is (or will be) on screen.
    fn shown(&self) -> &SessionConfig {
        if self.session.phase == Phase::Ready {
            &self.config
        } else {
            &self.active
        }
    }

    pub fn total_rounds(&self) -> u32 {
        self.shown().total_rounds()
    }

    /// Planned work and rest time, warmup excluded.
    pub fn total_duration_secs(&self) -> u64 {
        self.shown().total_duration_secs()
    }

    /// Remaining time in the current phase, computed from the clock.
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_at(self.clock.now_ms())
    }

    pub fn time_remaining_secs(&self) -> f64 {
        self.remaining_ms() as f64 / 1000.0
    }

    /// Remaining time as `M:SS`, whole seconds rounded up.
    pub fn formatted_remaining(&self) -> String {
        format_clock(self.remaining_ms())
    }

    /// Remaining time as of the last `tick()`.
    pub fn display_remaining_ms(&self) -> u64 {
        self.session.display_remaining_ms
    }

    /// Exercise being performed, during work intervals of a planned session.
    pub fn current_exercise(&self) -> Option<&str> {
        match self.session.phase {
            Phase::Work => self.shown().exercise(self.session.round),
            _ => None,
        }
    }

    /// Exercise of the next work interval.
    pub fn next_exercise(&self) -> Option<&str> {
        match self.session.phase {
            Phase::Ready | Phase::Warmup => self.shown().exercise(1),
            Phase::Work | Phase::Rest => self.shown().exercise(self.session.round + 1),
            Phase::Complete => None,
        }
    }

    /// Cues armed for the current phase.
    pub fn cues(&self) -> &CueScheduler {
        &self.cues
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let remaining_ms = self.remaining_ms();
        Event::StateSnapshot {
            phase: self.session.phase,
            round: self.session.round,
            total_rounds: self.total_rounds(),
            is_running: self.session.is_running,
            is_paused: self.session.is_paused,
            remaining_ms,
            remaining: format_clock(remaining_ms),
            current_exercise: self.current_exercise().map(str::to_owned),
            next_exercise: self.next_exercise().map(str::to_owned),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. Valid from `Ready` or `Complete`.
    pub fn start(&mut self) -> Vec<Event> {
        if !matches!(self.session.phase, Phase::Ready | Phase::Complete) {
            return Vec::new();
        }
        self.active = self.config.clone();
        let now = self.clock.now_ms();
        self.session = TimerSession {
            round: 1,
            is_running: true,
            ..TimerSession::default()
        };
        self.enter(Phase::Warmup, now);
        info!(
            rounds = self.active.total_rounds(),
            work_secs = self.active.work_secs(),
            rest_secs = self.active.rest_secs(),
            "timer started"
        );

        let events = vec![Event::TimerStarted {
            total_rounds: self.active.total_rounds(),
            total_duration_secs: self.active.total_duration_secs(),
            at: to_datetime(now),
        }];
        self.arm_cues(now, Arming::Entry { announce: false });
        events
    }

    /// Freeze the countdown. Valid only while running.
    pub fn pause(&mut self) -> Vec<Event> {
        // Flush overdue transitions first.
        let mut events = self.tick();
        if !self.session.is_running {
            return events;
        }
        let now = self.clock.now_ms();
        let remaining = self.remaining_at(now);
        self.cues.cancel_all();
        self.session.paused_remaining_ms = Some(remaining);
        self.session.phase_started_at_ms = None;
        self.session.display_remaining_ms = remaining;
        self.session.is_running = false;
        self.session.is_paused = true;
        debug!(phase = %self.session.phase, remaining_ms = remaining, "timer paused");
        events.push(Event::TimerPaused {
            phase: self.session.phase,
            remaining_ms: remaining,
            at: to_datetime(now),
        });
        events
    }

    /// Continue from where `pause()` left off. Valid only while paused.
    pub fn resume(&mut self) -> Vec<Event> {
        if !self.session.is_paused {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let remaining = self.session.paused_remaining_ms.take().unwrap_or(0);
        let elapsed = self.phase_duration_ms().saturating_sub(remaining);
        self.session.phase_started_at_ms = Some(now.saturating_sub(elapsed));
        self.session.is_paused = false;
        self.session.is_running = true;
        debug!(phase = %self.session.phase, remaining_ms = remaining, "timer resumed");
        self.arm_cues(now, Arming::Resume);
        vec![Event::TimerResumed {
            phase: self.session.phase,
            remaining_ms: remaining,
            at: to_datetime(now),
        }]
    }

    /// Return to `Ready` from any state.
    pub fn reset(&mut self) -> Vec<Event> {
        self.cues.cancel_all();
        self.session = TimerSession::default();
        info!("timer reset");
        vec![Event::TimerStopped {
            reason: StopReason::Reset,
            at: self.clock.now(),
        }]
    }

    /// Single-button control: restart when complete, resume when paused,
    /// pause when running, otherwise start.
    pub fn start_or_toggle(&mut self) -> Vec<Event> {
        if self.session.phase == Phase::Complete {
            let mut events = self.reset();
            events.extend(self.start());
            events
        } else if self.session.is_paused {
            self.resume()
        } else if self.session.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Call periodically. Refreshes the display fields, emits countdown
    /// ticks and performs every phase transition the clock has passed.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.session.is_running {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        let mut entered = false;

        while let Some(started) = self.session.phase_started_at_ms {
            let end = started.saturating_add(self.phase_duration_ms());
            if now < end {
                break;
            }
            self.advance(end, &mut events);
            entered = true;
        }

        if !self.session.is_running {
            return events;
        }
        if entered {
            self.arm_cues(
                now,
                Arming::Entry {
                    announce: self.announce_on_entry,
                },
            );
        }
        let remaining = self.remaining_at(now);
        self.session.display_remaining_ms = remaining;
        self.emit_countdown(remaining, now, &mut events);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn phase_duration_ms(&self) -> u64 {
        self.session.phase_duration_secs as u64 * 1000
    }

    fn remaining_at(&self, now: u64) -> u64 {
        if let Some(remaining) = self.session.paused_remaining_ms {
            return remaining;
        }
        match self.session.phase_started_at_ms {
            Some(started) => self
                .phase_duration_ms()
                .saturating_sub(now.saturating_sub(started)),
            None => 0,
        }
    }

    fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Warmup => WARMUP_SECS,
            Phase::Work => self.active.work_secs(),
            Phase::Rest => self.active.rest_secs(),
            Phase::Ready | Phase::Complete => 0,
        }
    }

    /// Phase that follows the current one.
    fn successor(&self) -> Phase {
        let round = self.session.round;
        match self.session.phase {
            Phase::Ready => Phase::Warmup,
            Phase::Warmup => Phase::Work,
            Phase::Work if self.active.has_rest_after(round) => Phase::Rest,
            Phase::Rest if round < self.active.total_rounds() => Phase::Work,
            Phase::Work | Phase::Rest | Phase::Complete => Phase::Complete,
        }
    }

    fn enter(&mut self, phase: Phase, started_at_ms: u64) {
        let duration = self.duration_of(phase);
        self.session.phase = phase;
        self.session.phase_started_at_ms = Some(started_at_ms);
        self.session.phase_duration_secs = duration;
        self.session.display_remaining_ms = duration as u64 * 1000;
        self.session.last_countdown = None;
    }

    /// Leave the current phase, which ended at `ended_at_ms`. The next phase
    /// starts at that instant rather than "now".
    fn advance(&mut self, ended_at_ms: u64, events: &mut Vec<Event>) {
        let from = self.session.phase;
        let to = self.successor();
        if from == Phase::Rest && to == Phase::Work {
            self.session.round += 1;
        }
        let at = to_datetime(ended_at_ms);

        if to == Phase::Complete {
            self.complete(from, ended_at_ms, events);
            return;
        }

        self.enter(to, ended_at_ms);
        debug!(%from, %to, round = self.session.round, "phase changed");
        events.push(Event::PhaseChanged {
            from,
            to,
            round: self.session.round,
            duration_secs: self.session.phase_duration_secs,
            at,
        });
    }

    fn complete(&mut self, from: Phase, ended_at_ms: u64, events: &mut Vec<Event>) {
        let at = to_datetime(ended_at_ms);
        let rounds = self.active.total_rounds();
        self.session.phase = Phase::Complete;
        self.session.is_running = false;
        self.session.is_paused = false;
        self.session.phase_started_at_ms = None;
        self.session.phase_duration_secs = 0;
        self.session.paused_remaining_ms = None;
        self.session.display_remaining_ms = 0;
        self.session.last_countdown = None;
        self.cues.finish(Phase::Complete);
        info!(rounds, "workout complete");

        events.push(Event::PhaseChanged {
            from,
            to: Phase::Complete,
            round: self.session.round,
            duration_secs: 0,
            at,
        });
        events.push(Event::WorkoutCompleted { rounds, at });
        events.push(Event::TimerStopped {
            reason: StopReason::Completed,
            at,
        });
    }

    /// Arm cues for whatever is left of the current phase, measured from
    /// its scheduled end. On entry the whole countdown set is armed and
    /// late offsets clamp to zero; on resume offsets already behind us are
    /// dropped.
    fn arm_cues(&mut self, now: u64, arming: Arming) {
        let remaining = self.remaining_at(now);
        let countdown = match arming {
            Arming::Entry { .. } => self.countdown.clone(),
            Arming::Resume => self
                .countdown
                .iter()
                .copied()
                .filter(|&k| k as u64 * 1000 <= remaining)
                .collect(),
        };
        let announce_on_entry = matches!(arming, Arming::Entry { announce: true });
        let plan = CuePlan {
            duration: Duration::from_millis(remaining),
            countdown,
            entered: self.session.phase,
            next: self.successor(),
            announce_on_entry,
        };
        self.cues.arm(&plan);
    }

    fn emit_countdown(&mut self, remaining_ms: u64, now: u64, events: &mut Vec<Event>) {
        let seconds_left = remaining_ms.div_ceil(1000) as u32;
        if seconds_left == 0
            || !self.countdown.contains(&seconds_left)
            || self.session.last_countdown == Some(seconds_left)
        {
            return;
        }
        self.session.last_countdown = Some(seconds_left);
        events.push(Event::CountdownTick {
            phase: self.session.phase,
            seconds_left,
            at: to_datetime(now),
        });
    }
}

impl std::fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("cues", &self.cues)
            .finish()
    }
}

/// `M:SS`, whole seconds rounded up so a phase never shows `0:00` while
/// time is left.
pub fn format_clock(remaining_ms: u64) -> String {
    let secs = remaining_ms.div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}
