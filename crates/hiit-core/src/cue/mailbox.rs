use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{CueHandler, CueKind};
use crate::timer::Phase;

const EMPTY: u64 = 0;
const TAG_COUNTDOWN: u64 = 1 << 32;
const TAG_TRANSITION: u64 = 2 << 32;
const TAG_MASK: u64 = 0xFFFF_FFFF << 32;
const VALUE_MASK: u64 = 0xFFFF_FFFF;

/// Single-slot hand-off of the latest cue request to a real-time audio
/// callback.
///
/// The writer overwrites whatever is pending; the real-time side reads and
/// clears in one atomic swap. Neither side blocks or allocates, and an
/// unconsumed request is simply superseded by a newer one.
#[derive(Debug, Default)]
pub struct CueMailbox {
    slot: AtomicU64,
}

impl CueMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, cue: CueKind) {
        self.slot.store(encode(cue), Ordering::Release);
    }

    /// Called from the real-time context.
    pub fn take(&self) -> Option<CueKind> {
        decode(self.slot.swap(EMPTY, Ordering::AcqRel))
    }

    pub fn is_empty(&self) -> bool {
        self.slot.load(Ordering::Acquire) == EMPTY
    }
}

/// Forwards every fired cue into a [`CueMailbox`].
#[derive(Debug, Clone)]
pub struct MailboxCueHandler {
    mailbox: Arc<CueMailbox>,
}

impl MailboxCueHandler {
    pub fn new(mailbox: Arc<CueMailbox>) -> Self {
        Self { mailbox }
    }
}

impl CueHandler for MailboxCueHandler {
    fn on_cue(&self, cue: CueKind) {
        self.mailbox.post(cue);
    }
}

fn encode(cue: CueKind) -> u64 {
    match cue {
        CueKind::Countdown(secs) => TAG_COUNTDOWN | secs as u64,
        CueKind::Transition(phase) => TAG_TRANSITION | phase_code(phase),
    }
}

fn decode(raw: u64) -> Option<CueKind> {
    let value = raw & VALUE_MASK;
    match raw & TAG_MASK {
        TAG_COUNTDOWN => Some(CueKind::Countdown(value as u32)),
        TAG_TRANSITION => phase_from_code(value).map(CueKind::Transition),
        _ => None,
    }
}

fn phase_code(phase: Phase) -> u64 {
    match phase {
        Phase::Ready => 0,
        Phase::Warmup => 1,
        Phase::Work => 2,
        Phase::Rest => 3,
        Phase::Complete => 4,
    }
}

fn phase_from_code(code: u64) -> Option<Phase> {
    Some(match code {
        0 => Phase::Ready,
        1 => Phase::Warmup,
        2 => Phase::Work,
        3 => Phase::Rest,
        4 => Phase::Complete,
        _ => return None,
    })
}
