//! CSV rollup functionality for archiving journaled workouts.
//!
//! This module implements atomic journal-to-CSV conversion with proper error
//! handling to prevent data loss.

use crate::{CompletedWorkout, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    name: String,
    started_at: String,
    completed_at: String,
    duration: Option<i64>,
    muscles: Option<String>,
    notes: Option<String>,
}

impl From<&CompletedWorkout> for CsvRow {
    fn from(workout: &CompletedWorkout) -> Self {
        let muscles = if workout.muscles.is_empty() {
            None
        } else {
            Some(
                workout
                    .muscles
                    .iter()
                    .map(|m| m.key())
                    .collect::<Vec<_>>()
                    .join(";"),
            )
        };

        CsvRow {
            id: workout.id.to_string(),
            name: workout.name.clone(),
            started_at: workout.started_at.to_rfc3339(),
            completed_at: workout.completed_at.to_rfc3339(),
            duration: Some(workout.duration_minutes),
            muscles,
            notes: workout.notes.clone(),
        }
    }
}

/// Roll up journaled workouts into CSV and archive the journal atomically
///
/// This function:
/// 1. Reads all workouts from the journal
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the journal to .processed
/// 5. Returns the number of workouts processed
///
/// # Safety
/// - CSV is fsynced before the journal is renamed
/// - The journal is renamed (not deleted) to allow manual recovery if needed
/// - Processed journal files can be cleaned up separately
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    // Read all workouts from the journal
    let workouts = crate::journal::read_workouts(journal_path)?;

    if workouts.is_empty() {
        tracing::info!("No workouts in journal to roll up");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Open CSV file for appending
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is brand new
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    // Write all workouts to CSV
    for workout in &workouts {
        let row = CsvRow::from(workout);
        writer.serialize(row)?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts to CSV", workouts.len());

    // Atomically archive the journal by renaming it
    let processed_path = journal_path.with_extension("jsonl.processed");
    std::fs::rename(journal_path, &processed_path)?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(workouts.len())
}

/// Clean up old processed journal files
///
/// This removes all .jsonl.processed files in the given directory.
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed journal: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{JsonlSink, WorkoutSink};
    use crate::types::MuscleGroup;
    use chrono::Utc;
    use std::fs::File;
    use uuid::Uuid;

    fn create_test_workout(name: &str) -> CompletedWorkout {
        CompletedWorkout {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises: vec![],
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_minutes: 40,
            notes: None,
            muscles: vec![MuscleGroup::Quads, MuscleGroup::Glutes],
        }
    }

    #[test]
    fn test_journal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("workouts.jsonl");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&journal_path);
        for i in 0..3 {
            sink.record(&create_test_workout(&format!("workout_{}", i)))
                .unwrap();
        }

        let count = journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 3);

        assert!(csv_path.exists());
        assert!(!journal_path.exists());
        assert!(journal_path.with_extension("jsonl.processed").exists());
    }

    #[test]
    fn test_journal_to_csv_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("workouts.jsonl");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&journal_path);
        sink.record(&create_test_workout("first")).unwrap();
        assert_eq!(journal_to_csv_and_archive(&journal_path, &csv_path).unwrap(), 1);

        let mut sink = JsonlSink::new(&journal_path);
        sink.record(&create_test_workout("second")).unwrap();
        assert_eq!(journal_to_csv_and_archive(&journal_path, &csv_path).unwrap(), 1);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        let record_count = reader.into_records().count();
        assert_eq!(record_count, 2);
    }

    #[test]
    fn test_muscle_tags_survive_archive_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("workouts.jsonl");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&journal_path);
        sink.record(&create_test_workout("legs")).unwrap();
        journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        let workouts =
            crate::history::load_recent_workouts(&journal_path, &csv_path, 7).unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(
            workouts[0].muscles,
            vec![MuscleGroup::Quads, MuscleGroup::Glutes]
        );
    }

    #[test]
    fn test_empty_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("empty.jsonl");
        let csv_path = temp_dir.path().join("workouts.csv");

        File::create(&journal_path).unwrap();

        let count = journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_processed_journals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("a.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("b.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("keep.jsonl")).unwrap();

        let count = cleanup_processed_journals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        assert!(!temp_dir.path().join("a.jsonl.processed").exists());
        assert!(temp_dir.path().join("keep.jsonl").exists());
    }
}
