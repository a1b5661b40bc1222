//! Audio/haptic cue scheduling.
//!
//! The [`CueScheduler`] fires countdown pulses and phase-transition cues on
//! its own clock, independent of the timer's polling tick. What a cue sounds
//! or feels like is up to the injected [`CueHandler`]s.

mod mailbox;
mod scheduler;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::timer::Phase;

pub use mailbox::{CueMailbox, MailboxCueHandler};
pub use scheduler::CueScheduler;

/// Default countdown pulses, in seconds before phase end.
pub const DEFAULT_COUNTDOWN: [u32; 3] = [3, 2, 1];

/// Delay before an on-entry announcement, so it lands after the display
/// has switched to the new phase.
pub const DEFAULT_UI_SYNC_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CueKind {
    /// Pulse with this many whole seconds left in the phase.
    Countdown(u32),
    /// Announce the given phase.
    Transition(Phase),
}

/// A pending cue, offset from the moment its set was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCue {
    pub offset: Duration,
    pub kind: CueKind,
}

/// Receives cues when they fire. Implementations play a sound, pulse the
/// haptic engine, or hand the cue to a real-time thread.
///
/// Handlers are called from the scheduler's task with its gate held: they
/// must return quickly and must not call back into the scheduler.
pub trait CueHandler: Send + Sync {
    fn on_cue(&self, cue: CueKind);
}

impl<F> CueHandler for F
where
    F: Fn(CueKind) + Send + Sync,
{
    fn on_cue(&self, cue: CueKind) {
        self(cue)
    }
}

/// What to arm for one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuePlan {
    /// Time from now until the phase ends.
    pub duration: Duration,
    /// Seconds before the end at which to pulse.
    pub countdown: Vec<u32>,
    /// Phase being entered (or resumed).
    pub entered: Phase,
    /// Phase that follows; announced at `duration`.
    pub next: Phase,
    /// Announce `entered` right away (after the UI-sync delay).
    pub announce_on_entry: bool,
}

impl CuePlan {
    /// Expand into concrete cues ordered by offset. Countdown offsets are
    /// clamped at zero for phases shorter than the countdown window.
    pub fn cues(&self, ui_sync_delay: Duration) -> Vec<ScheduledCue> {
        let mut cues = Vec::with_capacity(self.countdown.len() + 2);
        if self.announce_on_entry {
            cues.push(ScheduledCue {
                offset: ui_sync_delay.min(self.duration),
                kind: CueKind::Transition(self.entered),
            });
        }
        for &k in self.countdown.iter().filter(|&&k| k > 0) {
            cues.push(ScheduledCue {
                offset: self.duration.saturating_sub(Duration::from_secs(k as u64)),
                kind: CueKind::Countdown(k),
            });
        }
        cues.push(ScheduledCue {
            offset: self.duration,
            kind: CueKind::Transition(self.next),
        });
        cues.sort_by_key(|c| c.offset);
        cues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(duration_ms: u64, announce: bool) -> CuePlan {
        CuePlan {
            duration: Duration::from_millis(duration_ms),
            countdown: DEFAULT_COUNTDOWN.to_vec(),
            entered: Phase::Work,
            next: Phase::Rest,
            announce_on_entry: announce,
        }
    }

    #[test]
    fn countdown_lands_before_transition() {
        let cues = plan(10_000, false).cues(DEFAULT_UI_SYNC_DELAY);
        let offsets: Vec<u64> = cues.iter().map(|c| c.offset.as_millis() as u64).collect();
        assert_eq!(offsets, vec![7_000, 8_000, 9_000, 10_000]);
        assert_eq!(cues[0].kind, CueKind::Countdown(3));
        assert_eq!(cues[3].kind, CueKind::Transition(Phase::Rest));
    }

    #[test]
    fn announcement_goes_first() {
        let cues = plan(10_000, true).cues(Duration::from_millis(50));
        assert_eq!(cues[0].kind, CueKind::Transition(Phase::Work));
        assert_eq!(cues[0].offset, Duration::from_millis(50));
        assert_eq!(cues.len(), 5);
    }

    #[test]
    fn short_phase_clamps_countdown_to_zero() {
        let cues = plan(1_500, false).cues(DEFAULT_UI_SYNC_DELAY);
        let zeros = cues.iter().filter(|c| c.offset.is_zero()).count();
        assert_eq!(zeros, 2);
        assert_eq!(cues.last().unwrap().offset, Duration::from_millis(1_500));
    }

    #[test]
    fn closures_are_handlers() {
        let seen = std::sync::Mutex::new(Vec::new());
        let handler = |cue: CueKind| seen.lock().unwrap().push(cue);
        handler.on_cue(CueKind::Countdown(2));
        assert_eq!(*seen.lock().unwrap(), vec![CueKind::Countdown(2)]);
    }
}
