//! Rest countdown between sets. At most one countdown runs at a time.

use std::ops::ControlFlow;
use std::sync::Arc;

use log::debug;

use crate::error::SessionError;
use crate::session::WorkoutSessionManager;
use crate::session::session::{RestCountdown, SessionEvent, SessionState, TICK, lock_state};
use crate::session::ticker::Ticker;

impl WorkoutSessionManager {
    /// Replaces any running countdown with a new one.
    pub(super) fn start_rest(&self, state: &mut SessionState, exercise_index: usize, seconds: u32) {
        state.stop_rest();
        state.session.rest = Some(RestCountdown {
            exercise_index,
            total_seconds: seconds,
            remaining_seconds: seconds,
        });

        let generation = state.rest_generation;
        let weak = Arc::downgrade(&self.state);
        let events = self.events.clone();
        state.rest_ticker = Some(Ticker::spawn(&self.runtime, TICK, move || {
            let Some(shared) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let mut state = lock_state(&shared);
            if state.rest_generation != generation {
                return ControlFlow::Break(());
            }
            let Some(rest) = state.session.rest.as_mut() else {
                return ControlFlow::Break(());
            };
            rest.remaining_seconds = rest.remaining_seconds.saturating_sub(1);
            let remaining = rest.remaining_seconds;
            if remaining == 0 {
                state.session.rest = None;
                debug!("Rest finished");
                let _ = events.send(SessionEvent::RestFinished);
                ControlFlow::Break(())
            } else {
                let _ = events.send(SessionEvent::RestTicked(remaining));
                ControlFlow::Continue(())
            }
        }));
    }

    pub(super) fn emit_rest_started(&self, exercise_index: usize, seconds: u32) {
        debug!("Rest started: {}s after exercise {}", seconds, exercise_index);
        self.emit(SessionEvent::RestStarted {
            exercise_index,
            seconds,
        });
    }

    /// Starts a countdown by hand, e.g. from a rest button on an exercise.
    pub fn start_rest_timer(&self, exercise_index: usize, seconds: u32) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.ensure_active()?;
        if exercise_index >= state.session.logged_exercises.len() {
            return Err(SessionError::ExerciseNotFound(exercise_index));
        }
        if seconds == 0 {
            return Ok(());
        }
        self.start_rest(&mut state, exercise_index, seconds);
        drop(state);
        self.emit_rest_started(exercise_index, seconds);
        Ok(())
    }

    /// Cancels the active countdown. Returns false when none was running.
    pub fn skip_rest(&self) -> bool {
        let mut state = self.lock();
        if state.session.rest.is_none() {
            return false;
        }
        state.stop_rest();
        drop(state);
        self.emit(SessionEvent::RestSkipped);
        true
    }

    /// Adds time to the active countdown and returns the new remaining time.
    pub fn extend_rest(&self, seconds: u32) -> Option<u32> {
        let mut state = self.lock();
        let rest = state.session.rest.as_mut()?;
        rest.remaining_seconds = rest.remaining_seconds.saturating_add(seconds);
        rest.total_seconds = rest.total_seconds.saturating_add(seconds);
        Some(rest.remaining_seconds)
    }

    pub fn rest_countdown(&self) -> Option<RestCountdown> {
        self.lock().session.rest.clone()
    }
}
