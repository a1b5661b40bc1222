use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CueHandler, CueKind, CuePlan, ScheduledCue, DEFAULT_UI_SYNC_DELAY};
use crate::timer::Phase;

/// How early a re-arm may come relative to a pending end-of-phase cue and
/// still count as that phase having ended. Covers tick granularity and the
/// drift between the wall clock and the runtime's monotonic clock.
const CARRY_WINDOW: Duration = Duration::from_millis(250);

/// Fires the cues of at most one phase at a time.
///
/// Each `arm()` spawns one task on the tokio runtime that sleeps until each
/// cue's offset. A generation counter behind `gate` decides whether a woken
/// cue may still fire; `cancel_all()` bumps it under the same lock, so once
/// it returns nothing from the cancelled set can run.
pub struct CueScheduler {
    handlers: Arc<[Arc<dyn CueHandler>]>,
    runtime: Option<Handle>,
    gate: Arc<Mutex<u64>>,
    task: Option<ActiveSet>,
    armed: Vec<ScheduledCue>,
    ui_sync_delay: Duration,
    /// Set once the missing runtime has been reported.
    warned: bool,
}

struct ActiveSet {
    handle: JoinHandle<()>,
    origin: Instant,
    /// Number of cues of this set already delivered; only written with the
    /// gate held.
    fired: Arc<AtomicUsize>,
}

impl CueScheduler {
    /// Uses the tokio runtime of the calling context, if any.
    pub fn new(handlers: Vec<Arc<dyn CueHandler>>) -> Self {
        Self::build(handlers, Handle::try_current().ok())
    }

    /// A scheduler that records what it is asked to arm but never fires.
    pub fn silent() -> Self {
        Self::build(Vec::new(), None)
    }

    fn build(handlers: Vec<Arc<dyn CueHandler>>, runtime: Option<Handle>) -> Self {
        Self {
            handlers: handlers.into(),
            runtime,
            gate: Arc::new(Mutex::new(0)),
            task: None,
            armed: Vec::new(),
            ui_sync_delay: DEFAULT_UI_SYNC_DELAY,
            warned: false,
        }
    }

    pub fn with_ui_sync_delay(mut self, delay: Duration) -> Self {
        self.ui_sync_delay = delay;
        self
    }

    /// The cue set armed by the last `arm()`, empty after `cancel_all()`.
    pub fn armed(&self) -> &[ScheduledCue] {
        &self.armed
    }

    pub fn is_armed(&self) -> bool {
        !self.armed.is_empty()
    }

    /// Replace whatever is armed with the cues of `plan`.
    ///
    /// The timer re-arms when its tick notices a phase has ended, which can
    /// be a few milliseconds before this scheduler's own end-of-phase cue
    /// wakes up. If that cue (announcing the phase now entered) is still
    /// pending it is carried into the new set and fires immediately, so the
    /// transition is announced exactly once.
    pub fn arm(&mut self, plan: &CuePlan) {
        let carried = self.cancel_pending_transition(plan.entered);
        let mut cues = plan.cues(self.ui_sync_delay);
        if carried && !plan.announce_on_entry {
            cues.insert(0, immediate(plan.entered));
        }
        debug!(
            entered = %plan.entered,
            next = %plan.next,
            duration_ms = plan.duration.as_millis() as u64,
            cues = cues.len(),
            carried,
            "armed cues"
        );
        self.dispatch(cues);
    }

    /// Stop scheduling at the end of a session. A still-pending
    /// announcement of `last` is delivered right away instead of dropped.
    pub fn finish(&mut self, last: Phase) {
        if self.cancel_pending_transition(last) {
            self.dispatch(vec![immediate(last)]);
        }
    }

    /// Drop every pending cue. Safe to call when nothing is armed.
    pub fn cancel_all(&mut self) {
        let dropped = self.cancel();
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "cancelled cues");
        }
    }

    fn dispatch(&mut self, cues: Vec<ScheduledCue>) {
        self.armed = cues;
        if self.handlers.is_empty() || self.armed.is_empty() {
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            if !self.warned {
                warn!("no async runtime available, cues will not fire");
                self.warned = true;
            }
            return;
        };

        let generation = *self.gate.lock();
        let gate = Arc::clone(&self.gate);
        let handlers = Arc::clone(&self.handlers);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let cues = self.armed.clone();
        let origin = Instant::now();

        let handle = runtime.spawn(async move {
            for cue in cues {
                tokio::time::sleep_until(origin + cue.offset).await;
                if !fire(&gate, generation, &handlers, &counter, &cue) {
                    return;
                }
            }
        });
        self.task = Some(ActiveSet {
            handle,
            origin,
            fired,
        });
    }

    /// Invalidate the armed set and return the cues that never fired.
    fn cancel(&mut self) -> Vec<ScheduledCue> {
        let fired = {
            let mut generation = self.gate.lock();
            *generation += 1;
            self.task
                .as_ref()
                .map(|set| set.fired.load(Ordering::SeqCst))
        };
        let armed = std::mem::take(&mut self.armed);
        match self.task.take() {
            Some(set) => {
                set.handle.abort();
                armed.into_iter().skip(fired.unwrap_or(0)).collect()
            }
            None => armed,
        }
    }

    /// Cancel, reporting whether a live set still owed a transition cue
    /// for `phase` that was already due.
    fn cancel_pending_transition(&mut self, phase: Phase) -> bool {
        let Some(elapsed) = self.task.as_ref().map(|set| set.origin.elapsed()) else {
            self.cancel();
            return false;
        };
        self.cancel().iter().any(|c| {
            c.kind == CueKind::Transition(phase) && c.offset <= elapsed + CARRY_WINDOW
        })
    }
}

fn immediate(phase: Phase) -> ScheduledCue {
    ScheduledCue {
        offset: Duration::ZERO,
        kind: CueKind::Transition(phase),
    }
}

/// Run the handlers for `cue` unless its set was cancelled. Returns whether
/// the set is still live.
fn fire(
    gate: &Mutex<u64>,
    generation: u64,
    handlers: &[Arc<dyn CueHandler>],
    fired: &AtomicUsize,
    cue: &ScheduledCue,
) -> bool {
    let current = gate.lock();
    if *current != generation {
        return false;
    }
    for handler in handlers {
        handler.on_cue(cue.kind);
    }
    fired.fetch_add(1, Ordering::SeqCst);
    true
}

impl Drop for CueScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for CueScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueScheduler")
            .field("handlers", &self.handlers.len())
            .field("has_runtime", &self.runtime.is_some())
            .field("armed", &self.armed)
            .field("live", &self.task.is_some())
            .finish()
    }
}
