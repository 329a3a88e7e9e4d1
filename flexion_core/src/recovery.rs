//! Recovery percentage calculation.
//!
//! A snapshot is a pure function of a recovery entry and "now": linear
//! elapsed-time percentage against the muscle's recovery duration, clamped
//! to [0, 100]. Safe to recompute at any tick cadence; nothing here is
//! stored.

use crate::taxonomy::{get_default_taxonomy, Taxonomy};
use crate::types::{MuscleGroup, RecoveryEntry, RecoverySnapshot, RecoveryStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Recovery duration for an entry, falling back to the taxonomy default
pub fn effective_recovery_hours(entry: &RecoveryEntry, taxonomy: &Taxonomy) -> f64 {
    entry
        .recovery_hours
        .filter(|h| *h > 0.0)
        .unwrap_or_else(|| taxonomy.default_recovery_hours(entry.muscle))
}

/// Compute the live recovery snapshot for one entry, using the default
/// taxonomy for duration fallback.
pub fn compute_snapshot(entry: &RecoveryEntry, now: DateTime<Utc>) -> RecoverySnapshot {
    compute_snapshot_with(get_default_taxonomy(), entry, now)
}

/// Compute the live recovery snapshot against an explicit taxonomy
pub fn compute_snapshot_with(
    taxonomy: &Taxonomy,
    entry: &RecoveryEntry,
    now: DateTime<Utc>,
) -> RecoverySnapshot {
    let Some(last_workout_at) = entry.last_workout_at else {
        // Never trained: fully recovered, ready immediately
        return RecoverySnapshot {
            muscle: entry.muscle,
            percentage: 100.0,
            status: RecoveryStatus::FullyRecovered,
            hours_remaining: 0.0,
            ready_at: now,
        };
    };

    let recovery_hours = effective_recovery_hours(entry, taxonomy);
    let elapsed_hours = (now - last_workout_at).num_seconds() as f64 / 3600.0;
    let percentage = (elapsed_hours / recovery_hours * 100.0).clamp(0.0, 100.0);
    let hours_remaining = (recovery_hours - elapsed_hours).max(0.0);
    let status = if percentage >= 100.0 {
        RecoveryStatus::FullyRecovered
    } else {
        RecoveryStatus::Recovering
    };
    let ready_at = last_workout_at + Duration::seconds((recovery_hours * 3600.0) as i64);

    RecoverySnapshot {
        muscle: entry.muscle,
        percentage,
        status,
        hours_remaining,
        ready_at,
    }
}

/// Snapshot every catalog muscle, treating missing entries as untrained.
///
/// Returned in catalog display order; this is what status views render.
pub fn snapshot_catalog(
    entries: &HashMap<MuscleGroup, RecoveryEntry>,
    now: DateTime<Utc>,
) -> Vec<RecoverySnapshot> {
    MuscleGroup::all()
        .iter()
        .map(|muscle| {
            let untrained = RecoveryEntry::untrained(*muscle);
            let entry = entries.get(muscle).unwrap_or(&untrained);
            compute_snapshot(entry, now)
        })
        .collect()
}
