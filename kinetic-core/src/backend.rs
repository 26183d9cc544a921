//! Persistence collaborator used by the session manager and the app screens.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::session::models::{Routine, SetValues};
use crate::session::WorkoutSession;
use crate::tracking::{FoodEntry, Measurement, Profile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub position: u32,
    pub weight: f64,
    pub reps: u32,
    pub weight_text: String,
    pub reps_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub name: String,
    pub rest_time_seconds: Option<u32>,
    pub sets: Vec<SetRecord>,
}

/// What gets persisted when a workout is saved: completed sets only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub routine_id: Option<String>,
    pub routine_name: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub exercises: Vec<ExerciseRecord>,
}

impl WorkoutRecord {
    pub fn from_session(session: &WorkoutSession) -> Self {
        let exercises = session
            .logged_exercises
            .iter()
            .filter_map(|exercise| {
                let sets: Vec<SetRecord> = exercise
                    .completed_sets()
                    .enumerate()
                    .map(|(position, set)| {
                        let weight_text = match set.logged_weight.as_deref() {
                            Some(w) if !w.trim().is_empty() => w.trim().to_string(),
                            _ => set.planned_weight.trim().to_string(),
                        };
                        let reps_text = match set.logged_reps.as_deref() {
                            Some(r) if !r.trim().is_empty() => r.trim().to_string(),
                            _ => set.planned_reps.trim().to_string(),
                        };
                        SetRecord {
                            position: position as u32,
                            weight: set.effective_weight(),
                            reps: set.effective_reps().max(0.0).round() as u32,
                            weight_text,
                            reps_text,
                        }
                    })
                    .collect();
                (!sets.is_empty()).then(|| ExerciseRecord {
                    name: exercise.name.clone(),
                    rest_time_seconds: exercise.rest_time_seconds,
                    sets,
                })
            })
            .collect();

        Self {
            routine_id: session.active_routine.as_ref().map(|r| r.id.clone()),
            routine_name: session
                .active_routine
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "Workout".to_string()),
            started_at: session.started_at.unwrap_or_else(Utc::now),
            duration_seconds: session.elapsed_seconds,
            exercises,
        }
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .map(|s| s.weight * f64::from(s.reps))
            .sum()
    }
}

/// A saved workout as listed in the history screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub id: i64,
    pub routine_name: String,
    pub performed_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub set_count: u32,
    pub total_volume: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stores a session with its exercises and sets, returning the session id.
    /// Either everything is written or nothing is.
    async fn persist_workout(&self, record: &WorkoutRecord) -> Result<i64, BackendError>;
    async fn list_workouts(&self, limit: u32) -> Result<Vec<WorkoutSummary>, BackendError>;
    /// Sets of the most recent saved session containing this exercise.
    async fn previous_performance(
        &self,
        exercise_name: &str,
    ) -> Result<Vec<SetValues>, BackendError>;

    async fn create_routine(&self, routine: &Routine) -> Result<String, BackendError>;
    async fn update_routine(&self, routine: &Routine) -> Result<(), BackendError>;
    async fn list_routines(&self) -> Result<Vec<Routine>, BackendError>;
    async fn get_routine(&self, id: &str) -> Result<Option<Routine>, BackendError>;
    async fn delete_routine(&self, id: &str) -> Result<bool, BackendError>;

    async fn get_profile(&self) -> Result<Option<Profile>, BackendError>;
    async fn save_profile(&self, profile: &Profile) -> Result<(), BackendError>;

    async fn add_measurement(&self, measurement: &Measurement) -> Result<i64, BackendError>;
    async fn list_measurements(&self, limit: u32) -> Result<Vec<Measurement>, BackendError>;

    async fn add_food_entry(&self, entry: &FoodEntry) -> Result<i64, BackendError>;
    async fn list_food_entries(&self, day: NaiveDate) -> Result<Vec<FoodEntry>, BackendError>;
    async fn delete_food_entry(&self, id: i64) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::{Exercise, WorkoutSet};
    use crate::session::RunningState;

    #[test]
    fn record_keeps_only_completed_sets() {
        let mut bench = Exercise::new(
            "Bench Press",
            vec![WorkoutSet::planned("50", "10"), WorkoutSet::planned("50", "10")],
            Some(90),
        )
        .seeded();
        bench.logged_sets[1].logged_weight = Some("55".into());
        bench.logged_sets[1].logged_reps = Some("8".into());
        bench.logged_sets[1].completed = true;
        let curls = Exercise::new("Curl", vec![WorkoutSet::planned("12", "12")], None).seeded();

        let session = WorkoutSession {
            active_routine: Some(Routine::new("Push", vec![])),
            elapsed_seconds: 1200,
            running_state: RunningState::Running,
            logged_exercises: vec![bench, curls],
            started_at: None,
            rest: None,
        };
        let record = WorkoutRecord::from_session(&session);

        assert_eq!(record.routine_name, "Push");
        assert_eq!(record.duration_seconds, 1200);
        assert_eq!(record.exercises.len(), 1);
        assert_eq!(record.exercises[0].sets.len(), 1);
        assert_eq!(record.exercises[0].sets[0].weight, 55.0);
        assert_eq!(record.exercises[0].sets[0].reps, 8);
        assert_eq!(record.set_count(), 1);
        assert_eq!(record.total_volume(), 440.0);
    }
}
