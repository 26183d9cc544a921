pub mod backend;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod food;
pub mod logging;
pub mod nutrition;
pub mod runtime;
pub mod session;
pub mod tracking;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;
