//! Local persistent cache with file locking.
//!
//! Two things live here, both as fs2-locked JSON files written via atomic
//! rename:
//! - `RecoveryStore`: the optimistic local recovery map, updated the moment
//!   a workout completes (before any remote write);
//! - the in-progress session checkpoint, so a half-configured workout
//!   survives a process restart.
//!
//! Corrupt or unreadable files degrade to defaults with a warning rather
//! than failing the caller.

use crate::types::{MuscleGroup, RecoveryEntry, WorkoutSession};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Locally cached recovery state, one entry per muscle that has ever been
/// reset on this machine.
///
/// Explicit lifecycle: `new`/`load` to create, `apply_reset`/`set_entry` to
/// update, `save` to persist, `clear` to dispose of the backing file. Never
/// ambient state; the session machine and reconciler receive it by
/// reference.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RecoveryStore {
    #[serde(default)]
    entries: HashMap<MuscleGroup, RecoveryEntry>,
}

impl RecoveryStore {
    /// Fresh store with no recovery history
    pub fn new() -> Self {
        Self::default()
    }

    /// All locally cached entries
    pub fn entries(&self) -> &HashMap<MuscleGroup, RecoveryEntry> {
        &self.entries
    }

    /// The cached entry for one muscle, if any
    pub fn entry(&self, muscle: MuscleGroup) -> Option<&RecoveryEntry> {
        self.entries.get(&muscle)
    }

    /// Overwrite the entry for one muscle
    pub fn set_entry(&mut self, entry: RecoveryEntry) {
        self.entries.insert(entry.muscle, entry);
    }

    /// Reset the recovery timer for every listed muscle to `at`.
    ///
    /// This is the optimistic local update emitted by workout completion;
    /// existing recovery-hour overrides are preserved.
    pub fn apply_reset(&mut self, muscles: &[MuscleGroup], at: DateTime<Utc>) {
        for muscle in muscles {
            let entry = self
                .entries
                .entry(*muscle)
                .or_insert_with(|| RecoveryEntry::untrained(*muscle));
            entry.last_workout_at = Some(at);
        }
        tracing::info!("Reset recovery timers for {} muscles", muscles.len());
    }

    /// Load the store from a file with shared locking
    ///
    /// Returns a default store if the file doesn't exist or is corrupted.
    pub fn load(path: &Path) -> Result<Self> {
        load_json_or_default(path, "recovery store")
    }

    /// Save the store to a file with exclusive locking
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        tracing::debug!("Saved recovery store to {:?}", path);
        Ok(())
    }

    /// Load the store, modify it, and save it back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut RecoveryStore) -> Result<()>,
    {
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.save(path)?;
        Ok(store)
    }

    /// Dispose of the backing file, if present
    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
            tracing::debug!("Cleared recovery store at {:?}", path);
        }
        Ok(())
    }
}

// ============================================================================
// In-progress session checkpoint
// ============================================================================

/// Load the checkpointed in-progress session, if one exists.
///
/// A corrupt checkpoint is treated as no session (logged, not fatal).
pub fn load_pending_session(path: &Path) -> Result<Option<WorkoutSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let store: Option<WorkoutSession> = load_json_or_default(path, "session checkpoint")?;
    Ok(store)
}

/// Checkpoint the in-progress session so it survives restarts
pub fn save_pending_session(session: &WorkoutSession, path: &Path) -> Result<()> {
    write_json_atomic(path, &Some(session.clone()))?;
    tracing::debug!("Checkpointed session {} to {:?}", session.id, path);
    Ok(())
}

/// Remove the session checkpoint (completion or cancellation)
pub fn clear_pending_session(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        tracing::debug!("Cleared session checkpoint at {:?}", path);
    }
    Ok(())
}

// ============================================================================
// Locked JSON file helpers
// ============================================================================

fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<T> {
    if !path.exists() {
        tracing::info!("No {} file found, using default", what);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {} {:?}: {}. Using default.", what, path, e);
            return Ok(T::default());
        }
    };

    // Acquire shared lock for reading
    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {} {:?}: {}. Using default.", what, path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {} {:?}: {}. Using default.", what, path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {} from {:?}", what, path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} {:?}: {}. Using default.", what, path, e);
            Ok(T::default())
        }
    }
}

/// Atomically write a value as JSON by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "cache path missing parent")
    })?)?;

    // Exclusive lock on the temp file to serialize concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionStatus, WorkoutSession};
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_store_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("recovery.json");

        let mut store = RecoveryStore::new();
        let at = Utc::now() - Duration::hours(5);
        store.apply_reset(&[MuscleGroup::Chest, MuscleGroup::Triceps], at);
        store.save(&store_path).unwrap();

        let loaded = RecoveryStore::load(&store_path).unwrap();
        assert_eq!(loaded.entries().len(), 2);
        assert_eq!(
            loaded.entry(MuscleGroup::Chest).unwrap().last_workout_at,
            Some(at)
        );
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecoveryStore::load(&temp_dir.path().join("missing.json")).unwrap();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_corrupted_store_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("corrupted.json");
        std::fs::write(&store_path, "{ invalid json }").unwrap();

        let store = RecoveryStore::load(&store_path).unwrap();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_apply_reset_preserves_override_hours() {
        let mut store = RecoveryStore::new();
        store.set_entry(RecoveryEntry {
            muscle: MuscleGroup::Quads,
            last_workout_at: None,
            recovery_hours: Some(96.0),
        });

        let at = Utc::now();
        store.apply_reset(&[MuscleGroup::Quads], at);

        let entry = store.entry(MuscleGroup::Quads).unwrap();
        assert_eq!(entry.last_workout_at, Some(at));
        assert_eq!(entry.recovery_hours, Some(96.0));
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("recovery.json");

        let at = Utc::now();
        RecoveryStore::update(&store_path, |store| {
            store.apply_reset(&[MuscleGroup::Back], at);
            Ok(())
        })
        .unwrap();

        let loaded = RecoveryStore::load(&store_path).unwrap();
        assert_eq!(
            loaded.entry(MuscleGroup::Back).unwrap().last_workout_at,
            Some(at)
        );
    }

    #[test]
    fn test_clear_removes_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("recovery.json");

        RecoveryStore::new().save(&store_path).unwrap();
        assert!(store_path.exists());

        RecoveryStore::clear(&store_path).unwrap();
        assert!(!store_path.exists());

        // Clearing twice is fine
        RecoveryStore::clear(&store_path).unwrap();
    }

    #[test]
    fn test_session_checkpoint_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session_path = temp_dir.path().join("session.json");

        let session = WorkoutSession {
            id: Uuid::new_v4(),
            name: "Leg Day".into(),
            exercises: vec![],
            started_at: None,
            completed_at: None,
            status: SessionStatus::Configuring,
        };

        save_pending_session(&session, &session_path).unwrap();
        let loaded = load_pending_session(&session_path).unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.status, SessionStatus::Configuring);

        clear_pending_session(&session_path).unwrap();
        assert!(load_pending_session(&session_path).unwrap().is_none());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("recovery.json");

        RecoveryStore::new().save(&store_path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "recovery.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only recovery.json, found extras: {:?}",
            extras
        );
    }
}
