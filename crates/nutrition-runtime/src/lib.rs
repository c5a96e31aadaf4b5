//! Runtime layer for the nutrition dashboard.
//!
//! Keeps the current dashboard snapshot fresh in the background and guards
//! the session behind the optional passcode lock.

pub mod data_manager;
pub mod lock;
pub mod orchestrator;

pub use nutrition_core as core;
pub use nutrition_data as data;
