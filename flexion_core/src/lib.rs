#![forbid(unsafe_code)]

//! Core domain model and business logic for the Flexion recovery tracker.
//!
//! This crate provides:
//! - Domain types (muscle groups, exercises, sessions, recovery entries)
//! - Muscle taxonomy and exercise inference
//! - Recovery calculation and local/remote reconciliation
//! - Workout session lifecycle
//! - Persistence (journal, CSV archive, local cache)

pub mod types;
pub mod error;
pub mod taxonomy;
pub mod inference;
pub mod recovery;
pub mod reconcile;
pub mod config;
pub mod logging;
pub mod journal;
pub mod rollup;
pub mod store;
pub mod history;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use taxonomy::{build_default_taxonomy, get_default_taxonomy};
pub use inference::infer_muscles;
pub use recovery::{compute_snapshot, snapshot_catalog};
pub use reconcile::merge;
pub use config::Config;
pub use journal::{JsonlSink, WorkoutSink};
pub use store::RecoveryStore;
pub use history::{load_recent_workouts, recovery_entries_from_workouts};
pub use session::{muscles_worked, CompletionOutcome, SessionManager};
pub use stats::summarize;
