//! Edits to the logged exercises and sets of the active workout.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, ValidationError};
use crate::session::WorkoutSessionManager;
use crate::session::models::{Exercise, WorkoutSet};
use crate::session::session::SessionState;

/// Outcome of [`WorkoutSessionManager::toggle_set_completion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct SetToggle {
    pub completed: bool,
    /// Blank values were filled in from the previous performance.
    pub backfilled: bool,
    /// Length of the rest countdown started by this completion.
    pub rest_started: Option<u32>,
}

fn set_not_found(exercise_index: usize, set_index: usize) -> SessionError {
    SessionError::SetNotFound {
        exercise_index,
        set_index,
    }
}

impl WorkoutSessionManager {
    /// Replaces the logged exercises wholesale.
    pub fn update_logged_exercises(&self, exercises: Vec<Exercise>) -> Result<(), SessionError> {
        self.edit(|state| {
            // Keep the countdown only if its exercise is still at the same index.
            let rest_target = state.session.rest.as_ref().and_then(|rest| {
                state
                    .session
                    .logged_exercises
                    .get(rest.exercise_index)
                    .map(|e| (rest.exercise_index, e.id.clone()))
            });
            let keep_rest = rest_target
                .is_some_and(|(index, id)| exercises.get(index).is_some_and(|e| e.id == id));
            state.session.logged_exercises = exercises;
            if state.session.rest.is_some() && !keep_rest {
                state.stop_rest();
            }
            Ok(())
        })
    }

    /// Appends an exercise, seeding its logged sets from its planned sets.
    /// Returns the new exercise index.
    pub fn add_exercise(&self, exercise: Exercise) -> Result<usize, SessionError> {
        self.edit(|state| {
            let exercises = &mut state.session.logged_exercises;
            exercises.push(exercise.seeded());
            Ok(exercises.len() - 1)
        })
    }

    pub fn remove_exercise(&self, exercise_index: usize) -> Result<Exercise, SessionError> {
        self.edit(|state| {
            if exercise_index >= state.session.logged_exercises.len() {
                return Err(SessionError::ExerciseNotFound(exercise_index));
            }
            let removed = state.session.logged_exercises.remove(exercise_index);
            match state.session.rest.as_ref().map(|r| r.exercise_index) {
                Some(i) if i == exercise_index => state.stop_rest(),
                Some(i) if i > exercise_index => {
                    if let Some(rest) = state.session.rest.as_mut() {
                        rest.exercise_index -= 1;
                    }
                }
                _ => {}
            }
            Ok(removed)
        })
    }

    /// Swaps an exercise for another one, e.g. when the machine is taken.
    pub fn replace_exercise(
        &self,
        exercise_index: usize,
        exercise: Exercise,
    ) -> Result<(), SessionError> {
        self.edit(|state| {
            let slot = state
                .session
                .logged_exercises
                .get_mut(exercise_index)
                .ok_or(SessionError::ExerciseNotFound(exercise_index))?;
            *slot = exercise.seeded();
            if state
                .session
                .rest
                .as_ref()
                .is_some_and(|r| r.exercise_index == exercise_index)
            {
                state.stop_rest();
            }
            Ok(())
        })
    }

    /// Adds a set to an exercise, copying the planned values of its last set.
    /// Returns the id of the new set.
    pub fn add_set(&self, exercise_index: usize) -> Result<String, SessionError> {
        self.edit(|state| {
            let exercise = state
                .session
                .logged_exercises
                .get_mut(exercise_index)
                .ok_or(SessionError::ExerciseNotFound(exercise_index))?;
            let template = exercise
                .logged_sets
                .last()
                .or(exercise.planned_sets.last())
                .cloned()
                .unwrap_or_else(|| WorkoutSet::planned("", ""));
            let set = WorkoutSet::seeded_from(&template);
            let id = set.id.clone();
            exercise.logged_sets.push(set);
            Ok(id)
        })
    }

    pub fn remove_set(
        &self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<WorkoutSet, SessionError> {
        self.edit(|state| {
            let sets = &mut state
                .session
                .logged_exercises
                .get_mut(exercise_index)
                .ok_or(SessionError::ExerciseNotFound(exercise_index))?
                .logged_sets;
            if set_index >= sets.len() {
                return Err(set_not_found(exercise_index, set_index));
            }
            Ok(sets.remove(set_index))
        })
    }

    /// Sets the logged weight and/or reps of a set. `None` leaves a field unchanged.
    pub fn update_set_values(
        &self,
        exercise_index: usize,
        set_index: usize,
        weight: Option<String>,
        reps: Option<String>,
    ) -> Result<(), SessionError> {
        self.edit(|state| {
            let set = logged_set_mut(state, exercise_index, set_index)?;
            if let Some(weight) = weight {
                set.logged_weight = Some(weight.trim().to_string());
            }
            if let Some(reps) = reps {
                set.logged_reps = Some(reps.trim().to_string());
            }
            Ok(())
        })
    }

    pub fn set_rest_time(
        &self,
        exercise_index: usize,
        seconds: Option<u32>,
    ) -> Result<(), SessionError> {
        self.edit(|state| {
            let exercise = state
                .session
                .logged_exercises
                .get_mut(exercise_index)
                .ok_or(SessionError::ExerciseNotFound(exercise_index))?;
            exercise.rest_time_seconds = seconds.filter(|s| *s > 0);
            Ok(())
        })
    }

    /// Flips a set's completion flag.
    ///
    /// Completing a set with blank weight or reps fills the blanks from the previous
    /// performance of that exercise. If that leaves a blank, the completion is refused
    /// with [`ValidationError::EmptySetValues`] and nothing changes. Completing a set
    /// of an exercise with a rest time starts the rest countdown.
    pub fn toggle_set_completion(
        &self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<SetToggle, SessionError> {
        let mut state = self.lock();
        state.ensure_editable()?;

        let SessionState {
            session, previous, ..
        } = &mut *state;
        let exercise = session
            .logged_exercises
            .get_mut(exercise_index)
            .ok_or(SessionError::ExerciseNotFound(exercise_index))?;
        let rest_seconds = exercise.rest_seconds();
        let prior = previous.lookup(&exercise.name, set_index).cloned();
        let exercise_name = exercise.name.clone();
        let set = exercise
            .logged_sets
            .get_mut(set_index)
            .ok_or(set_not_found(exercise_index, set_index))?;

        if set.completed {
            set.completed = false;
            return Ok(SetToggle {
                completed: false,
                backfilled: false,
                rest_started: None,
            });
        }

        let mut weight = set.logged_weight.clone();
        let mut reps = set.logged_reps.clone();
        let mut backfilled = false;
        if let Some(prior) = prior {
            if !set.has_logged_weight() && !prior.weight.trim().is_empty() {
                weight = Some(prior.weight.clone());
                backfilled = true;
            }
            if !set.has_logged_reps() && !prior.reps.trim().is_empty() {
                reps = Some(prior.reps.clone());
                backfilled = true;
            }
        }

        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        if blank(&weight) || blank(&reps) {
            warn!(
                "Refusing to complete empty set {} of {}",
                set_index + 1,
                exercise_name
            );
            return Err(ValidationError::EmptySetValues.into());
        }

        set.logged_weight = weight;
        set.logged_reps = reps;
        set.completed = true;
        debug!(
            "Completed set {} of {}{}",
            set_index + 1,
            exercise_name,
            if backfilled { " (backfilled)" } else { "" }
        );

        let rest_started = if rest_seconds > 0 {
            self.start_rest(&mut state, exercise_index, rest_seconds);
            Some(rest_seconds)
        } else {
            None
        };
        drop(state);
        if let Some(seconds) = rest_started {
            self.emit_rest_started(exercise_index, seconds);
        }

        Ok(SetToggle {
            completed: true,
            backfilled,
            rest_started,
        })
    }

    fn edit<T>(
        &self,
        apply: impl FnOnce(&mut SessionState) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut state = self.lock();
        state.ensure_editable()?;
        apply(&mut state)
    }
}

fn logged_set_mut(
    state: &mut SessionState,
    exercise_index: usize,
    set_index: usize,
) -> Result<&mut WorkoutSet, SessionError> {
    state
        .session
        .logged_exercises
        .get_mut(exercise_index)
        .ok_or(SessionError::ExerciseNotFound(exercise_index))?
        .logged_sets
        .get_mut(set_index)
        .ok_or(set_not_found(exercise_index, set_index))
}
