//! Session module for the workout currently being performed.
//!
//! [`WorkoutSessionManager`] owns the single active session: the routine being
//! followed, the elapsed-time ticker, the logged exercises and sets, and the rest
//! countdown. All mutations go through the manager.

mod history;
pub mod models;
mod rest;
mod session;
mod sets;
mod summary;
mod ticker;
mod workout;

#[cfg(test)]
mod tests;

pub use history::PreviousPerformance;
pub use models::{Exercise, Routine, SetValues, WorkoutSet};
pub use session::{RestCountdown, RunningState, SessionEvent, WorkoutSession, WorkoutSessionManager};
pub use sets::SetToggle;
pub use summary::{SessionMetrics, format_elapsed};
pub use ticker::Ticker;
