//! Workout lifecycle: start, pause, resume, discard and save.

use chrono::Utc;
use log::{debug, error, info};

use crate::backend::{Backend, WorkoutRecord};
use crate::error::{BackendError, SessionError, ValidationError};
use crate::session::models::{Exercise, Routine};
use crate::session::session::{RunningState, SessionEvent, WorkoutSession};
use crate::session::WorkoutSessionManager;

const FREESTYLE_NAME: &str = "Freestyle Workout";

impl WorkoutSessionManager {
    /// Starts a workout from a routine, replacing any session already in progress.
    pub fn start_workout(&self, routine: Routine) {
        let exercises = routine.exercises.iter().map(Exercise::seeded).collect();
        self.begin(routine, exercises);
    }

    /// Starts a workout that is not based on a saved routine.
    pub fn start_freestyle(&self, name: Option<String>, exercises: Vec<Exercise>) {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FREESTYLE_NAME.to_string());
        self.start_workout(Routine::new(name, exercises));
    }

    fn begin(&self, routine: Routine, logged_exercises: Vec<Exercise>) {
        let mut state = self.lock();
        if state.session.is_active() {
            info!(
                "Replacing active workout {:?}",
                state.session.active_routine.as_ref().map(|r| &r.name)
            );
        }
        state.reset();

        info!(
            "Starting workout '{}' with {} exercises",
            routine.name,
            logged_exercises.len()
        );
        state.session = WorkoutSession {
            active_routine: Some(routine),
            elapsed_seconds: 0,
            running_state: RunningState::Running,
            logged_exercises,
            started_at: Some(Utc::now()),
            rest: None,
        };
        self.start_ticker(&mut state);
        drop(state);
        self.emit(SessionEvent::Started);
    }

    pub fn pause_workout(&self) {
        let mut state = self.lock();
        if state.session.running_state != RunningState::Running || state.saving {
            debug!(
                "Pause ignored in state {:?} (saving: {})",
                state.session.running_state, state.saving
            );
            return;
        }
        state.session.running_state = RunningState::Paused;
        state.stop_ticker();
        debug!("Workout paused at {}s", state.session.elapsed_seconds);
        drop(state);
        self.emit(SessionEvent::Paused);
    }

    pub fn resume_workout(&self) {
        let mut state = self.lock();
        if state.session.running_state != RunningState::Paused || state.saving {
            debug!(
                "Resume ignored in state {:?} (saving: {})",
                state.session.running_state, state.saving
            );
            return;
        }
        state.session.running_state = RunningState::Running;
        self.start_ticker(&mut state);
        debug!("Workout resumed at {}s", state.session.elapsed_seconds);
        drop(state);
        self.emit(SessionEvent::Resumed);
    }

    /// Drops the session without persisting anything.
    pub fn discard_workout(&self) {
        let mut state = self.lock();
        let was_active = state.session.is_active();
        state.reset();
        drop(state);
        if was_active {
            info!("Workout discarded");
        }
        self.emit(SessionEvent::Discarded);
    }

    /// Persists completed sets and ends the session.
    ///
    /// The ticker is frozen while the backend call is in flight. If the call fails
    /// (or the future is dropped) the session is left exactly as it was, including
    /// the running state, so the save can be retried.
    pub async fn save_workout<B: Backend + ?Sized>(
        &self,
        backend: &B,
    ) -> Result<i64, SessionError> {
        let attempt = self.begin_save()?;
        let result = backend.persist_workout(&attempt.record).await;
        attempt.finish(result)
    }

    fn begin_save(&self) -> Result<SaveAttempt<'_>, SessionError> {
        let mut state = self.lock();
        state.ensure_active()?;
        if state.saving {
            return Err(SessionError::SaveInProgress);
        }

        let record = WorkoutRecord::from_session(&state.session);
        if record.exercises.is_empty() {
            return Err(ValidationError::NothingToSave.into());
        }

        let was_running = state.session.running_state == RunningState::Running;
        if was_running {
            state.session.running_state = RunningState::Paused;
            state.stop_ticker();
        }
        state.saving = true;
        debug!(
            "Saving workout '{}': {} sets over {}s",
            record.routine_name,
            record.set_count(),
            record.duration_seconds
        );

        Ok(SaveAttempt {
            manager: self,
            record,
            token: state.session_token,
            was_running,
            settled: false,
        })
    }

    fn restore_after_failed_save(&self, token: u64, was_running: bool) {
        let mut state = self.lock();
        if state.session_token != token {
            return;
        }
        state.saving = false;
        if was_running && state.session.running_state == RunningState::Paused {
            state.session.running_state = RunningState::Running;
            self.start_ticker(&mut state);
        }
    }
}

struct SaveAttempt<'a> {
    manager: &'a WorkoutSessionManager,
    record: WorkoutRecord,
    token: u64,
    was_running: bool,
    settled: bool,
}

impl SaveAttempt<'_> {
    fn finish(
        mut self,
        result: Result<i64, BackendError>,
    ) -> Result<i64, SessionError> {
        self.settled = true;
        match result {
            Ok(id) => {
                let mut state = self.manager.lock();
                // A new workout started while saving is left alone.
                if state.session_token == self.token {
                    state.reset();
                }
                drop(state);
                info!(
                    "Saved workout '{}' as #{} ({} sets)",
                    self.record.routine_name,
                    id,
                    self.record.set_count()
                );
                self.manager.emit(SessionEvent::Saved(id));
                Ok(id)
            }
            Err(e) => {
                error!("Failed to save workout '{}': {}", self.record.routine_name, e);
                self.manager
                    .restore_after_failed_save(self.token, self.was_running);
                Err(e.into())
            }
        }
    }
}

impl Drop for SaveAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.manager
                .restore_after_failed_save(self.token, self.was_running);
        }
    }
}
