//! Workout history loading and the remote recovery map.
//!
//! Recent workouts are read from both the journal and the CSV archive to
//! build the history views and, per muscle, the remote `RecoveryEntry` map
//! the reconciler merges against the local cache. Reconciliation should be
//! re-run on every fetch, so this module only ever returns fresh data.

use crate::types::{CompletedWorkout, MuscleGroup, RecoveryEntry};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived workouts
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    started_at: String,
    completed_at: String,
    duration: Option<i64>,
    muscles: Option<String>,
    notes: Option<String>,
}

impl TryFrom<CsvRow> for CompletedWorkout {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let started_at = DateTime::parse_from_rfc3339(&row.started_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        // Unknown muscle keys from newer builds are skipped, not fatal
        let muscles = row
            .muscles
            .as_deref()
            .unwrap_or("")
            .split(';')
            .filter(|k| !k.is_empty())
            .filter_map(MuscleGroup::from_key)
            .collect();

        Ok(CompletedWorkout {
            id,
            name: row.name,
            exercises: vec![], // Not stored in CSV
            started_at,
            completed_at,
            duration_minutes: row.duration.unwrap_or(0),
            notes: row.notes,
            muscles,
        })
    }
}

/// Load workouts from the last N days from both journal and CSV
///
/// Returns workouts sorted by completed_at (newest first).
/// Automatically deduplicates workouts that appear in both files.
pub fn load_recent_workouts(
    journal_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<CompletedWorkout>> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut workouts = Vec::new();
    let mut seen_ids = HashSet::new();

    // Load from journal first (most recent)
    if journal_path.exists() {
        let journal_workouts = crate::journal::read_workouts(journal_path)?;
        for workout in journal_workouts {
            if workout.completed_at >= cutoff {
                seen_ids.insert(workout.id);
                workouts.push(workout);
            }
        }
        tracing::debug!("Loaded {} workouts from journal", workouts.len());
    }

    // Load from CSV (archived)
    if csv_path.exists() {
        let csv_workouts = load_workouts_from_csv(csv_path)?;
        let mut csv_count = 0;
        for workout in csv_workouts {
            if workout.completed_at >= cutoff && !seen_ids.contains(&workout.id) {
                seen_ids.insert(workout.id);
                workouts.push(workout);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} workouts from CSV", csv_count);
    }

    // Sort by completed_at, newest first
    workouts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::info!(
        "Loaded {} total workouts from last {} days",
        workouts.len(),
        days
    );

    Ok(workouts)
}

/// Load all workouts from a CSV file
fn load_workouts_from_csv(path: &Path) -> Result<Vec<CompletedWorkout>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut workouts = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match CompletedWorkout::try_from(row) {
                Ok(workout) => workouts.push(workout),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(workouts)
}

/// Build the remote recovery map from tagged workout history.
///
/// Per muscle, the entry carries the most recent completion timestamp seen
/// in the history; recovery hours are left to the taxonomy defaults.
pub fn recovery_entries_from_workouts(
    workouts: &[CompletedWorkout],
) -> HashMap<MuscleGroup, RecoveryEntry> {
    let mut entries: HashMap<MuscleGroup, RecoveryEntry> = HashMap::new();

    for workout in workouts {
        for muscle in &workout.muscles {
            let entry = entries
                .entry(*muscle)
                .or_insert_with(|| RecoveryEntry::untrained(*muscle));
            if entry.last_workout_at.map_or(true, |at| at < workout.completed_at) {
                entry.last_workout_at = Some(workout.completed_at);
            }
        }
    }

    entries
}
