//! Previous performance used to backfill sets that are completed without values.

use std::collections::HashMap;

use log::{debug, warn};

use crate::backend::Backend;
use crate::session::WorkoutSessionManager;
use crate::session::models::SetValues;

/// Sets recorded the last time each exercise was performed, keyed by
/// case-insensitive exercise name and ordered by set position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousPerformance {
    by_exercise: HashMap<String, Vec<SetValues>>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl PreviousPerformance {
    pub fn insert(&mut self, exercise_name: &str, sets: Vec<SetValues>) {
        if sets.is_empty() {
            return;
        }
        self.by_exercise.insert(key(exercise_name), sets);
    }

    /// Values for the set at `position`, or the last recorded set when the previous
    /// session had fewer sets.
    pub fn lookup(&self, exercise_name: &str, position: usize) -> Option<&SetValues> {
        let sets = self.by_exercise.get(&key(exercise_name))?;
        sets.get(position).or_else(|| sets.last())
    }

    pub fn is_empty(&self) -> bool {
        self.by_exercise.is_empty()
    }
}

impl FromIterator<(String, Vec<SetValues>)> for PreviousPerformance {
    fn from_iter<T: IntoIterator<Item = (String, Vec<SetValues>)>>(iter: T) -> Self {
        let mut previous = Self::default();
        for (name, sets) in iter {
            previous.insert(&name, sets);
        }
        previous
    }
}

impl WorkoutSessionManager {
    pub fn set_previous_performance(&self, previous: PreviousPerformance) {
        self.lock().previous = previous;
    }

    /// Queries the backend for every exercise in the active session. Lookup failures
    /// are logged and leave that exercise without history.
    pub async fn load_previous_performance<B: Backend + ?Sized>(&self, backend: &B) {
        let (names, token) = {
            let state = self.lock();
            let names: Vec<String> = state
                .session
                .logged_exercises
                .iter()
                .map(|e| e.name.clone())
                .collect();
            (names, state.session_token)
        };

        let mut previous = PreviousPerformance::default();
        for name in names {
            match backend.previous_performance(&name).await {
                Ok(sets) => {
                    debug!("Loaded {} previous sets for {}", sets.len(), name);
                    previous.insert(&name, sets);
                }
                Err(e) => warn!("Failed to load previous performance for {}: {}", name, e),
            }
        }

        let mut state = self.lock();
        if state.session_token == token {
            state.previous = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(weight: &str, reps: &str) -> SetValues {
        SetValues {
            weight: weight.into(),
            reps: reps.into(),
        }
    }

    #[test]
    fn lookup_falls_back_to_last_set() {
        let previous: PreviousPerformance = [(
            "Bench Press".to_string(),
            vec![values("60", "8"), values("65", "6")],
        )]
        .into_iter()
        .collect();

        assert_eq!(previous.lookup("bench press", 0), Some(&values("60", "8")));
        assert_eq!(previous.lookup("BENCH PRESS ", 4), Some(&values("65", "6")));
        assert_eq!(previous.lookup("Squat", 0), None);
    }

    #[test]
    fn empty_history_is_not_stored() {
        let mut previous = PreviousPerformance::default();
        previous.insert("Row", vec![]);
        assert!(previous.is_empty());
    }
}
