use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed lead-in before the first work interval.
pub const WARMUP_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Ready,
    Warmup,
    Work,
    Rest,
    Complete,
}

impl Phase {
    /// Phases during which the clock counts down.
    pub fn is_timed(self) -> bool {
        matches!(self, Phase::Warmup | Phase::Work | Phase::Rest)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Ready => "Ready",
            Phase::Warmup => "Get Ready",
            Phase::Work => "Work",
            Phase::Rest => "Rest",
            Phase::Complete => "Complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Ready => "ready",
            Phase::Warmup => "warmup",
            Phase::Work => "work",
            Phase::Rest => "rest",
            Phase::Complete => "complete",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_countdown_phases_are_timed() {
        assert!(!Phase::Ready.is_timed());
        assert!(Phase::Warmup.is_timed());
        assert!(Phase::Work.is_timed());
        assert!(Phase::Rest.is_timed());
        assert!(!Phase::Complete.is_timed());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Warmup).unwrap(), "\"warmup\"");
        assert_eq!(Phase::Complete.to_string(), "complete");
    }
}
