use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::error::SessionError;
use crate::session::history::PreviousPerformance;
use crate::session::models::{Exercise, Routine};
use crate::session::ticker::Ticker;

pub(super) const TICK: Duration = Duration::from_secs(1);
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum RunningState {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestCountdown {
    pub exercise_index: usize,
    pub total_seconds: u32,
    pub remaining_seconds: u32,
}

/// The workout currently being performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub active_routine: Option<Routine>,
    pub elapsed_seconds: u64,
    pub running_state: RunningState,
    pub logged_exercises: Vec<Exercise>,
    pub started_at: Option<DateTime<Utc>>,
    pub rest: Option<RestCountdown>,
}

impl WorkoutSession {
    pub fn is_active(&self) -> bool {
        self.running_state != RunningState::Idle
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Ticked(u64),
    Paused,
    Resumed,
    Discarded,
    Saved(i64),
    RestStarted { exercise_index: usize, seconds: u32 },
    RestTicked(u32),
    RestFinished,
    RestSkipped,
}

pub(super) struct SessionState {
    pub session: WorkoutSession,
    pub previous: PreviousPerformance,
    pub ticker: Option<Ticker>,
    pub rest_ticker: Option<Ticker>,
    /// Bumped whenever the elapsed ticker is started or stopped.
    pub generation: u64,
    pub rest_generation: u64,
    /// Bumped whenever a session begins or ends.
    pub session_token: u64,
    pub saving: bool,
}

impl SessionState {
    pub fn stop_ticker(&mut self) {
        self.generation += 1;
        self.ticker = None;
    }

    pub fn stop_rest(&mut self) {
        self.rest_generation += 1;
        self.rest_ticker = None;
        self.session.rest = None;
    }

    pub fn ensure_active(&self) -> Result<(), SessionError> {
        if self.session.is_active() {
            Ok(())
        } else {
            Err(SessionError::NoActiveWorkout)
        }
    }

    /// Active and not frozen by an in-flight save.
    pub fn ensure_editable(&self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.saving {
            return Err(SessionError::SaveInProgress);
        }
        Ok(())
    }

    /// Ends the current session without persisting it.
    pub fn reset(&mut self) {
        self.stop_ticker();
        self.stop_rest();
        self.session = WorkoutSession::default();
        self.previous = PreviousPerformance::default();
        self.session_token += 1;
        self.saving = false;
    }
}

pub(super) fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the single active workout and its timers.
///
/// Cloning the manager yields another handle to the same session. Timers run on
/// the runtime passed to [`WorkoutSessionManager::new`].
#[derive(Clone)]
pub struct WorkoutSessionManager {
    pub(super) state: Arc<Mutex<SessionState>>,
    pub(super) events: broadcast::Sender<SessionEvent>,
    pub(super) runtime: Handle,
}

impl WorkoutSessionManager {
    pub fn new(runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            state: Arc::new(Mutex::new(SessionState {
                session: WorkoutSession::default(),
                previous: PreviousPerformance::default(),
                ticker: None,
                rest_ticker: None,
                generation: 0,
                rest_generation: 0,
                session_token: 0,
                saving: false,
            })),
            events,
            runtime,
        }
    }

    pub fn snapshot(&self) -> WorkoutSession {
        self.lock().session.clone()
    }

    pub fn running_state(&self) -> RunningState {
        self.lock().session.running_state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.lock().session.elapsed_seconds
    }

    pub fn logged_exercises(&self) -> Vec<Exercise> {
        self.lock().session.logged_exercises.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.lock().saving
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    /// Starts the one-second elapsed ticker. The caller has already set the state to
    /// `Running`.
    pub(super) fn start_ticker(&self, state: &mut SessionState) {
        state.generation += 1;
        let generation = state.generation;
        let weak = Arc::downgrade(&self.state);
        let events = self.events.clone();

        state.ticker = Some(Ticker::spawn(&self.runtime, TICK, move || {
            let Some(shared) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let mut state = lock_state(&shared);
            if state.generation != generation
                || state.session.running_state != RunningState::Running
            {
                return ControlFlow::Break(());
            }
            state.session.elapsed_seconds += 1;
            let elapsed = state.session.elapsed_seconds;
            trace!("Workout tick: {}s", elapsed);
            let _ = events.send(SessionEvent::Ticked(elapsed));
            ControlFlow::Continue(())
        }));
    }
}
