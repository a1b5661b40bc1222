use serde::{Deserialize, Serialize};

use super::phase::{Phase, WARMUP_SECS};

pub const MIN_INTERVAL_SECS: u32 = 5;
pub const MAX_INTERVAL_SECS: u32 = 300;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 50;

pub fn clamp_interval(secs: u32) -> u32 {
    secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
}

pub fn clamp_rounds(rounds: u32) -> u32 {
    rounds.clamp(MIN_ROUNDS, MAX_ROUNDS)
}

/// Whether the final round gets its rest interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestPolicy {
    /// Complete straight from the last work interval.
    #[default]
    SkipTrailingRest,
    /// Run a rest interval after every work interval, including the last.
    RestAfterFinalRound,
}

/// A named, ordered list of exercises. One exercise per round.
///
/// Times are clamped to the supported range on construction and when loaded
/// from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlanRecord", into = "PlanRecord")]
pub struct WorkoutPlan {
    name: String,
    work_secs: u32,
    rest_secs: u32,
    exercises: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct PlanRecord {
    name: String,
    work_secs: u32,
    rest_secs: u32,
    #[serde(default)]
    exercises: Vec<String>,
}

impl From<PlanRecord> for WorkoutPlan {
    fn from(r: PlanRecord) -> Self {
        WorkoutPlan::new(r.name, r.work_secs, r.rest_secs, r.exercises)
    }
}

impl From<WorkoutPlan> for PlanRecord {
    fn from(p: WorkoutPlan) -> Self {
        PlanRecord {
            name: p.name,
            work_secs: p.work_secs,
            rest_secs: p.rest_secs,
            exercises: p.exercises,
        }
    }
}

impl WorkoutPlan {
    pub fn new(
        name: impl Into<String>,
        work_secs: u32,
        rest_secs: u32,
        exercises: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            work_secs: clamp_interval(work_secs),
            rest_secs: clamp_interval(rest_secs),
            exercises,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn work_secs(&self) -> u32 {
        self.work_secs
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest_secs
    }

    pub fn exercises(&self) -> &[String] {
        &self.exercises
    }

    /// One round per exercise. An empty plan still runs a single round.
    pub fn rounds(&self) -> u32 {
        (self.exercises.len() as u32).max(MIN_ROUNDS)
    }
}

/// Standalone "quick timer" settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_secs")]
    pub work_secs: u32,
    #[serde(default = "default_rest_secs")]
    pub rest_secs: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default)]
    pub rest_policy: RestPolicy,
}

fn default_work_secs() -> u32 {
    45
}
fn default_rest_secs() -> u32 {
    15
}
fn default_rounds() -> u32 {
    8
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            rest_secs: default_rest_secs(),
            rounds: default_rounds(),
            rest_policy: RestPolicy::default(),
        }
    }
}

impl TimerSettings {
    pub fn new(work_secs: u32, rest_secs: u32, rounds: u32) -> Self {
        Self {
            work_secs: clamp_interval(work_secs),
            rest_secs: clamp_interval(rest_secs),
            rounds: clamp_rounds(rounds),
            rest_policy: RestPolicy::default(),
        }
    }

    pub fn set_work_secs(&mut self, secs: u32) {
        self.work_secs = clamp_interval(secs);
    }

    pub fn set_rest_secs(&mut self, secs: u32) {
        self.rest_secs = clamp_interval(secs);
    }

    pub fn set_rounds(&mut self, rounds: u32) {
        self.rounds = clamp_rounds(rounds);
    }

    /// Re-apply range limits, e.g. after deserializing hand-edited values.
    pub fn clamped(self) -> Self {
        Self {
            work_secs: clamp_interval(self.work_secs),
            rest_secs: clamp_interval(self.rest_secs),
            rounds: clamp_rounds(self.rounds),
            rest_policy: self.rest_policy,
        }
    }
}

/// Everything a session needs to know before `start()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub settings: TimerSettings,
    pub plan: Option<WorkoutPlan>,
}

/// One timed interval of a session, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub phase: Phase,
    pub round: u32,
    pub duration_secs: u32,
    pub exercise: Option<String>,
}

impl SessionConfig {
    pub fn quick(settings: TimerSettings) -> Self {
        Self {
            settings,
            plan: None,
        }
    }

    pub fn with_plan(settings: TimerSettings, plan: WorkoutPlan) -> Self {
        Self {
            settings,
            plan: Some(plan),
        }
    }

    pub fn work_secs(&self) -> u32 {
        self.plan
            .as_ref()
            .map(|p| p.work_secs())
            .unwrap_or(self.settings.work_secs)
    }

    pub fn rest_secs(&self) -> u32 {
        self.plan
            .as_ref()
            .map(|p| p.rest_secs())
            .unwrap_or(self.settings.rest_secs)
    }

    pub fn total_rounds(&self) -> u32 {
        match &self.plan {
            Some(plan) => plan.rounds(),
            None => clamp_rounds(self.settings.rounds),
        }
    }

    pub fn rest_policy(&self) -> RestPolicy {
        self.settings.rest_policy
    }

    /// Whether a rest interval follows the work interval of `round`.
    pub fn has_rest_after(&self, round: u32) -> bool {
        round < self.total_rounds() || self.rest_policy() == RestPolicy::RestAfterFinalRound
    }

    /// Exercise name for a 1-indexed round, if a plan supplies one.
    pub fn exercise(&self, round: u32) -> Option<&str> {
        let idx = round.checked_sub(1)? as usize;
        self.plan
            .as_ref()?
            .exercises()
            .get(idx)
            .map(String::as_str)
    }

    /// Planned work and rest time in seconds, warmup excluded.
    pub fn total_duration_secs(&self) -> u64 {
        let rounds = self.total_rounds() as u64;
        let rests = match self.rest_policy() {
            RestPolicy::SkipTrailingRest => rounds - 1,
            RestPolicy::RestAfterFinalRound => rounds,
        };
        self.work_secs() as u64 * rounds + self.rest_secs() as u64 * rests
    }

    /// The full phase sequence, warmup included. Mirrors what the engine
    /// runs so the preview and the live session cannot disagree.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = vec![Step {
            phase: Phase::Warmup,
            round: 1,
            duration_secs: WARMUP_SECS,
            exercise: self.exercise(1).map(str::to_owned),
        }];
        for round in 1..=self.total_rounds() {
            let exercise = self.exercise(round).map(str::to_owned);
            steps.push(Step {
                phase: Phase::Work,
                round,
                duration_secs: self.work_secs(),
                exercise: exercise.clone(),
            });
            if self.has_rest_after(round) {
                steps.push(Step {
                    phase: Phase::Rest,
                    round,
                    duration_secs: self.rest_secs(),
                    exercise,
                });
            }
        }
        steps
    }
}
