//! Terminal stand-ins for the audio and haptic outputs.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use hiit_core::{CueHandler, CueKind, CueMailbox};

const RENDER_POLL: Duration = Duration::from_millis(5);

/// Render thread that drains the cue mailbox and rings the terminal bell.
///
/// Stands in for an audio callback: it never blocks on the scheduler and
/// only ever sees the newest cue.
pub struct AudioRenderer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AudioRenderer {
    pub fn spawn(mailbox: Arc<CueMailbox>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("hiit-audio".into())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    if let Some(cue) = mailbox.take() {
                        play(cue);
                    }
                    std::thread::sleep(RENDER_POLL);
                }
            });
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "audio thread unavailable, running silent");
                None
            }
        };
        Self { stop, handle }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn play(cue: CueKind) {
    let tone = match cue {
        CueKind::Countdown(_) => "beep",
        CueKind::Transition(_) => "chime",
    };
    tracing::debug!(?cue, tone, "audio cue");
    let mut err = std::io::stderr();
    let _ = err.write_all(b"\x07");
    let _ = err.flush();
}

/// Haptic output for a terminal: the pattern is logged.
pub struct HapticLog;

impl CueHandler for HapticLog {
    fn on_cue(&self, cue: CueKind) {
        let pattern = match cue {
            CueKind::Countdown(_) => "tap",
            CueKind::Transition(_) => "double",
        };
        tracing::debug!(?cue, pattern, "haptic cue");
    }
}
