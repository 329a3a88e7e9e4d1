//! Volume and duration rollups for a workout session.
//!
//! Pure leaf utility: no state, no failure modes. Malformed numeric input
//! (negative reps, clock skew) counts as zero.

use crate::types::{WorkoutSession, WorkoutStats};
use chrono::{DateTime, Utc};

/// Summarize a session's volume and duration.
///
/// Duration runs from `started_at` to `completed_at`, or to `now` for a
/// session still in flight, rounded to whole minutes. A session that never
/// started reports zero duration.
pub fn summarize(session: &WorkoutSession, now: DateTime<Utc>) -> WorkoutStats {
    let total_sets = session.exercises.iter().map(|e| e.sets.len()).sum();
    let total_reps = session
        .exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .map(|s| i64::from(s.reps.max(0)))
        .sum();

    let duration_minutes = session
        .started_at
        .map(|started_at| {
            let end = session.completed_at.unwrap_or(now);
            let seconds = (end - started_at).num_seconds().max(0);
            ((seconds as f64) / 60.0).round() as i64
        })
        .unwrap_or(0);

    WorkoutStats {
        exercises: session.exercises.len(),
        total_sets,
        total_reps,
        duration_minutes,
    }
}
