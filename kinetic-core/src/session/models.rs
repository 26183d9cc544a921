//! Routine, exercise and set values carried through a workout session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a user-entered number, accepting a comma as the decimal separator.
/// Anything that is not a finite number counts as zero.
pub fn parse_amount(text: &str) -> f64 {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// One set, planned ahead of time and optionally logged during a session.
///
/// Weights and reps stay as entered text so partially typed values survive edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct WorkoutSet {
    pub planned_weight: String,
    pub planned_reps: String,
    pub logged_weight: Option<String>,
    pub logged_reps: Option<String>,
    pub completed: bool,
    pub id: String,
}

impl WorkoutSet {
    pub fn planned(weight: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            planned_weight: weight.into(),
            planned_reps: reps.into(),
            logged_weight: None,
            logged_reps: None,
            completed: false,
            id: new_id(),
        }
    }

    /// Working copy of a planned set: blank logged values, not completed, fresh id.
    pub fn seeded_from(planned: &WorkoutSet) -> Self {
        Self {
            planned_weight: planned.planned_weight.clone(),
            planned_reps: planned.planned_reps.clone(),
            logged_weight: Some(String::new()),
            logged_reps: Some(String::new()),
            completed: false,
            id: new_id(),
        }
    }

    pub fn has_logged_weight(&self) -> bool {
        !is_blank(self.logged_weight.as_deref())
    }

    pub fn has_logged_reps(&self) -> bool {
        !is_blank(self.logged_reps.as_deref())
    }

    /// Logged weight when entered, planned weight otherwise.
    pub fn effective_weight(&self) -> f64 {
        match self.logged_weight.as_deref() {
            Some(w) if !w.trim().is_empty() => parse_amount(w),
            _ => parse_amount(&self.planned_weight),
        }
    }

    /// Logged reps when entered, planned reps otherwise.
    pub fn effective_reps(&self) -> f64 {
        match self.logged_reps.as_deref() {
            Some(r) if !r.trim().is_empty() => parse_amount(r),
            _ => parse_amount(&self.planned_reps),
        }
    }

    pub fn volume(&self) -> f64 {
        self.effective_weight() * self.effective_reps()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Exercise {
    pub name: String,
    pub planned_sets: Vec<WorkoutSet>,
    pub logged_sets: Vec<WorkoutSet>,
    pub rest_time_seconds: Option<u32>,
    pub id: String,
}

impl Exercise {
    pub fn new(
        name: impl Into<String>,
        planned_sets: Vec<WorkoutSet>,
        rest_time_seconds: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            planned_sets,
            logged_sets: Vec::new(),
            rest_time_seconds,
            id: new_id(),
        }
    }

    /// Copy of this exercise whose logged sets are seeded from the planned ones.
    pub fn seeded(&self) -> Self {
        Self {
            logged_sets: self.planned_sets.iter().map(WorkoutSet::seeded_from).collect(),
            ..self.clone()
        }
    }

    pub fn rest_seconds(&self) -> u32 {
        self.rest_time_seconds.unwrap_or(0)
    }

    pub fn completed_sets(&self) -> impl Iterator<Item = &WorkoutSet> {
        self.logged_sets.iter().filter(|s| s.completed)
    }
}

/// A reusable template of exercises, owned outside the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl Routine {
    pub fn new(name: impl Into<String>, exercises: Vec<Exercise>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            exercises,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyRoutineName);
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::NoExercises);
        }
        if self.exercises.iter().any(|e| e.name.trim().is_empty()) {
            return Err(ValidationError::EmptyExerciseName);
        }
        Ok(())
    }

    pub fn planned_set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.planned_sets.len()).sum()
    }
}

/// Weight and reps of one previously performed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct SetValues {
    pub weight: String,
    pub reps: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_gives_blank_logged_values_and_new_ids() {
        let planned = WorkoutSet::planned("50", "10");
        let seeded = WorkoutSet::seeded_from(&planned);

        assert_eq!(seeded.logged_weight.as_deref(), Some(""));
        assert_eq!(seeded.logged_reps.as_deref(), Some(""));
        assert!(!seeded.completed);
        assert_ne!(seeded.id, planned.id);
        assert_eq!(seeded.planned_weight, "50");
    }

    #[test]
    fn effective_values_fall_back_to_planned() {
        let mut set = WorkoutSet::seeded_from(&WorkoutSet::planned("40", "8"));
        assert_eq!(set.volume(), 320.0);

        set.logged_weight = Some("42,5".into());
        assert_eq!(set.effective_weight(), 42.5);
        assert_eq!(set.effective_reps(), 8.0);

        set.logged_reps = Some("abc".into());
        assert_eq!(set.volume(), 0.0);
    }

    #[test]
    fn routine_validation() {
        let empty_name = Routine::new("  ", vec![Exercise::new("Squat", vec![], None)]);
        assert_eq!(empty_name.validate(), Err(ValidationError::EmptyRoutineName));

        let no_exercises = Routine::new("Legs", vec![]);
        assert_eq!(no_exercises.validate(), Err(ValidationError::NoExercises));

        let ok = Routine::new("Legs", vec![Exercise::new("Squat", vec![], Some(90))]);
        assert!(ok.validate().is_ok());
    }
}
