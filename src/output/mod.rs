//! Output module for reporting on stored data

pub mod stats;

pub use stats::{load_statistics, print_statistics, SyncStatistics};
