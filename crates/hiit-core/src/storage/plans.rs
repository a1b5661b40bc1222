//! Saved workout plans.
//!
//! Plans live in `plans.toml` next to the configuration file, as an array
//! of `[[plans]]` tables. Names are matched case-insensitively.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, PlanError};
use crate::timer::WorkoutPlan;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlanFile {
    #[serde(default)]
    plans: Vec<WorkoutPlan>,
}

#[derive(Debug)]
pub struct PlanStore {
    path: PathBuf,
    plans: Vec<WorkoutPlan>,
}

impl PlanStore {
    /// Open the store in the default data directory.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("plans.toml");
        Ok(Self::open_at(path)?)
    }

    /// Open the store backed by `path`. A missing file is an empty store.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self, PlanError> {
        let path = path.into();
        let plans = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let file: PlanFile =
                    toml::from_str(&content).map_err(|e| PlanError::LoadFailed {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                file.plans
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(PlanError::LoadFailed {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(Self { path, plans })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), PlanError> {
        let save_failed = |message: String| PlanError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let file = PlanFile {
            plans: self.plans.clone(),
        };
        let content = toml::to_string_pretty(&file).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| save_failed(e.to_string()))
    }

    pub fn list(&self) -> &[WorkoutPlan] {
        &self.plans
    }

    pub fn get(&self, name: &str) -> Option<&WorkoutPlan> {
        self.position(name).map(|i| &self.plans[i])
    }

    /// Look up a plan, failing with [`PlanError::NotFound`].
    pub fn require(&self, name: &str) -> Result<&WorkoutPlan, PlanError> {
        self.get(name)
            .ok_or_else(|| PlanError::NotFound(name.to_string()))
    }

    /// Insert a plan, replacing any plan of the same name. Returns whether
    /// an existing plan was replaced.
    pub fn upsert(&mut self, plan: WorkoutPlan) -> Result<bool, PlanError> {
        if plan.name().trim().is_empty() {
            return Err(PlanError::EmptyName);
        }
        match self.position(plan.name()) {
            Some(i) => {
                self.plans[i] = plan;
                Ok(true)
            }
            None => {
                self.plans.push(plan);
                Ok(false)
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<WorkoutPlan, PlanError> {
        let i = self
            .position(name)
            .ok_or_else(|| PlanError::NotFound(name.to_string()))?;
        Ok(self.plans.remove(i))
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.plans
            .iter()
            .position(|p| p.name().trim().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str, exercises: &[&str]) -> WorkoutPlan {
        WorkoutPlan::new(
            name,
            40,
            20,
            exercises.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::open_at(dir.path().join("plans.toml")).unwrap();
        assert!(store.list().is_empty());
        assert_eq!(store.path(), dir.path().join("plans.toml"));
    }

    #[test]
    fn upsert_replaces_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlanStore::open_at(dir.path().join("plans.toml")).unwrap();
        assert!(!store.upsert(plan("Legs", &["Squat"])).unwrap());
        assert!(store.upsert(plan("legs", &["Lunge", "Squat"])).unwrap());
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get("LEGS").unwrap().rounds(), 2);
    }

    #[test]
    fn rejects_blank_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlanStore::open_at(dir.path().join("plans.toml")).unwrap();
        assert!(matches!(
            store.upsert(plan("  ", &[])),
            Err(PlanError::EmptyName)
        ));
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans.toml");
        let mut store = PlanStore::open_at(&path).unwrap();
        store.upsert(plan("Core", &["Plank", "Crunch", "V-up"])).unwrap();
        store.upsert(plan("Empty", &[])).unwrap();
        store.save().unwrap();

        let reopened = PlanStore::open_at(&path).unwrap();
        assert_eq!(reopened.list().len(), 2);
        let core = reopened.require("core").unwrap();
        assert_eq!(core.exercises(), &["Plank", "Crunch", "V-up"]);
        assert_eq!(core.work_secs(), 40);
        assert_eq!(reopened.get("empty").unwrap().rounds(), 1);
    }

    #[test]
    fn remove_unknown_plan_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlanStore::open_at(dir.path().join("plans.toml")).unwrap();
        store.upsert(plan("Arms", &["Curl"])).unwrap();
        assert!(matches!(store.remove("Legs"), Err(PlanError::NotFound(_))));
        assert_eq!(store.remove("arms").unwrap().name(), "Arms");
        assert!(store.require("Arms").is_err());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans.toml");
        std::fs::write(&path, "plans = 7").unwrap();
        assert!(matches!(
            PlanStore::open_at(&path),
            Err(PlanError::LoadFailed { .. })
        ));
    }
}
