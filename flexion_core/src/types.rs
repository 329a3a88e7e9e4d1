//! Core domain types for the Flexion recovery engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Muscle groups and their recovery metadata
//! - Exercise descriptors and configured exercises
//! - Workout sessions and their lifecycle status
//! - Recovery entries and derived snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Muscle Types
// ============================================================================

/// Canonical muscle group key.
///
/// The set of trainable body regions is fixed at build time; the taxonomy
/// (see `taxonomy`) attaches display names, default recovery durations and
/// synonym lists to each variant. `FullBody` is the sentinel group used when
/// an exercise cannot be matched to anything more specific.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
    FullBody,
}

impl MuscleGroup {
    /// All muscle groups, in display order
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Calves,
            MuscleGroup::Abs,
            MuscleGroup::FullBody,
        ]
    }

    /// Canonical lowercase key (matches the serde representation)
    pub fn key(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Calves => "calves",
            MuscleGroup::Abs => "abs",
            MuscleGroup::FullBody => "full_body",
        }
    }

    /// Resolve a canonical key back to its muscle group
    pub fn from_key(key: &str) -> Option<MuscleGroup> {
        MuscleGroup::all().iter().find(|m| m.key() == key).copied()
    }
}

// ============================================================================
// Exercise Types
// ============================================================================

/// Raw exercise data as attached to a workout entry.
///
/// This is the input to muscle inference and is never mutated by the engine.
/// Explicit tags take precedence over the keyword scan of `name` and
/// `description`.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ExerciseDescriptor {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub explicit_muscle_group_id: Option<i64>,
    pub explicit_muscle_groups: Option<Vec<String>>,
}

impl ExerciseDescriptor {
    /// Descriptor with only a free-text name (the common case)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One performed or planned set of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub reps: i32,
    pub weight_kg: Option<f64>,
}

/// An exercise as configured within a workout session, with ordered sets.
///
/// Invariant: `sets` is never empty once the exercise is part of a session
/// (removal of the last set is rejected by the session machine).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub descriptor: ExerciseDescriptor,
    pub sets: Vec<SetEntry>,
}

// ============================================================================
// Recovery Types
// ============================================================================

/// Per-muscle recovery bookkeeping from a single data source.
///
/// A `None` timestamp means "never trained" and reads as fully recovered.
/// `recovery_hours` falls back to the muscle's taxonomy default when unset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecoveryEntry {
    pub muscle: MuscleGroup,
    pub last_workout_at: Option<DateTime<Utc>>,
    pub recovery_hours: Option<f64>,
}

impl RecoveryEntry {
    /// Entry with no training history (fully recovered)
    pub fn untrained(muscle: MuscleGroup) -> Self {
        Self {
            muscle,
            last_workout_at: None,
            recovery_hours: None,
        }
    }
}

/// Recovery state of a muscle at a point in time
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    FullyRecovered,
    Recovering,
}

/// Live recovery reading for one muscle, derived from a `RecoveryEntry`.
///
/// Never persisted: it is a pure function of "now" and goes stale the moment
/// it is computed.
#[derive(Clone, Debug, PartialEq)]
pub struct RecoverySnapshot {
    pub muscle: MuscleGroup,
    pub percentage: f64,
    pub status: RecoveryStatus,
    pub hours_remaining: f64,
    pub ready_at: DateTime<Utc>,
}

// ============================================================================
// Session and Workout Types
// ============================================================================

/// Lifecycle status of a workout session.
///
/// `Idle` is reported when no session exists; a stored `WorkoutSession`
/// is always in one of the later states.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Configuring,
    Active,
    Completing,
    Completed,
}

/// A single in-progress workout, from creation through completion.
///
/// Owned exclusively by the session manager; other components only ever see
/// read-only derived values (`muscles worked`, stats).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<ExerciseConfig>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

/// A finished workout as written to the journal and the history views
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletedWorkout {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<ExerciseConfig>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub notes: Option<String>,
    pub muscles: Vec<MuscleGroup>,
}

/// Volume and duration rollup for one session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutStats {
    pub exercises: usize,
    pub total_sets: usize,
    pub total_reps: i64,
    pub duration_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for muscle in MuscleGroup::all() {
            assert_eq!(MuscleGroup::from_key(muscle.key()), Some(*muscle));
        }
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(MuscleGroup::from_key("spleen"), None);
    }

    #[test]
    fn test_muscle_serde_uses_snake_case() {
        let json = serde_json::to_string(&MuscleGroup::FullBody).unwrap();
        assert_eq!(json, "\"full_body\"");
        let back: MuscleGroup = serde_json::from_str("\"quads\"").unwrap();
        assert_eq!(back, MuscleGroup::Quads);
    }
}
