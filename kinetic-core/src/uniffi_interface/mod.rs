//! Bindings for the mobile shells.

pub mod controller;
pub mod errors;
pub mod logging;
pub mod objects;

pub use controller::{KineticController, SessionObserver};
pub use errors::KineticError;
