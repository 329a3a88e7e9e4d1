//! Reconciliation of remote and local recovery state.
//!
//! The remote workout history and the optimistic local cache can disagree:
//! the local side is updated the moment a workout completes, while the
//! remote may lag behind (unsynced write) or be ahead of it (fresh install
//! reading old history). Per muscle the rule is freshness-wins: keep the
//! entry with the more recent last-workout timestamp. The merge is
//! deterministic, commutative and idempotent; a divergence is never an
//! error, only a debug log line.

use crate::types::{MuscleGroup, RecoveryEntry};
use std::collections::HashMap;

/// Merge two entries for the same muscle, keeping the fresher timestamp.
///
/// A `None` timestamp loses to any real one; two `None`s merge to an
/// untrained entry.
pub fn merge_entry(remote: &RecoveryEntry, local: &RecoveryEntry) -> RecoveryEntry {
    match (remote.last_workout_at, local.last_workout_at) {
        (Some(remote_at), Some(local_at)) => {
            if remote_at != local_at {
                tracing::debug!(
                    "Recovery divergence for {}: remote {} vs local {}, keeping fresher",
                    remote.muscle.key(),
                    remote_at,
                    local_at
                );
            }
            if local_at > remote_at {
                local.clone()
            } else {
                remote.clone()
            }
        }
        (Some(_), None) => remote.clone(),
        (None, Some(_)) => local.clone(),
        (None, None) => RecoveryEntry::untrained(remote.muscle),
    }
}

/// Merge the remote and local recovery maps over the union of their keys.
///
/// The result is the single authoritative map every other component reads.
pub fn merge(
    remote: &HashMap<MuscleGroup, RecoveryEntry>,
    local: &HashMap<MuscleGroup, RecoveryEntry>,
) -> HashMap<MuscleGroup, RecoveryEntry> {
    let mut merged = HashMap::new();

    for muscle in remote.keys().chain(local.keys()) {
        if merged.contains_key(muscle) {
            continue;
        }
        let entry = match (remote.get(muscle), local.get(muscle)) {
            (Some(r), Some(l)) => merge_entry(r, l),
            (Some(r), None) => r.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => unreachable!("key came from one of the two maps"),
        };
        merged.insert(*muscle, entry);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(muscle: MuscleGroup, days_ago: Option<i64>) -> RecoveryEntry {
        RecoveryEntry {
            muscle,
            last_workout_at: days_ago.map(|d| Utc::now() - Duration::days(d)),
            recovery_hours: None,
        }
    }

    fn map(entries: &[RecoveryEntry]) -> HashMap<MuscleGroup, RecoveryEntry> {
        entries.iter().map(|e| (e.muscle, e.clone())).collect()
    }

    #[test]
    fn test_fresher_local_wins() {
        // remote saw Day1, local optimistically recorded Day3
        let remote = entry(MuscleGroup::Back, Some(3));
        let local = entry(MuscleGroup::Back, Some(1));

        let merged = merge_entry(&remote, &local);
        assert_eq!(merged.last_workout_at, local.last_workout_at);
    }

    #[test]
    fn test_fresher_remote_wins() {
        let remote = entry(MuscleGroup::Back, Some(1));
        let local = entry(MuscleGroup::Back, Some(5));

        let merged = merge_entry(&remote, &local);
        assert_eq!(merged.last_workout_at, remote.last_workout_at);
    }

    #[test]
    fn test_single_sided_timestamp_is_kept() {
        let remote = entry(MuscleGroup::Quads, Some(2));
        let local = entry(MuscleGroup::Quads, None);

        assert_eq!(
            merge_entry(&remote, &local).last_workout_at,
            remote.last_workout_at
        );
        assert_eq!(
            merge_entry(&local, &remote).last_workout_at,
            remote.last_workout_at
        );
    }

    #[test]
    fn test_both_untrained_merge_untrained() {
        let merged = merge_entry(
            &entry(MuscleGroup::Calves, None),
            &entry(MuscleGroup::Calves, None),
        );
        assert_eq!(merged.last_workout_at, None);
    }

    #[test]
    fn test_merge_is_commutative_per_key() {
        let a = map(&[
            entry(MuscleGroup::Chest, Some(1)),
            entry(MuscleGroup::Back, None),
            entry(MuscleGroup::Quads, Some(4)),
        ]);
        let b = map(&[
            entry(MuscleGroup::Chest, Some(3)),
            entry(MuscleGroup::Back, Some(2)),
            entry(MuscleGroup::Abs, Some(1)),
        ]);

        let ab = merge(&a, &b);
        let ba = merge(&b, &a);

        assert_eq!(ab.len(), ba.len());
        for (muscle, merged) in &ab {
            assert_eq!(ba[muscle].last_workout_at, merged.last_workout_at);
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = map(&[
            entry(MuscleGroup::Chest, Some(1)),
            entry(MuscleGroup::Glutes, Some(2)),
        ]);
        let b = map(&[entry(MuscleGroup::Chest, Some(2))]);

        let once = merge(&a, &b);
        let twice = merge(&a, &once);

        assert_eq!(once.len(), twice.len());
        for (muscle, merged) in &once {
            assert_eq!(twice[muscle].last_workout_at, merged.last_workout_at);
        }
    }

    #[test]
    fn test_merge_takes_union_of_keys() {
        let a = map(&[entry(MuscleGroup::Chest, Some(1))]);
        let b = map(&[entry(MuscleGroup::Back, Some(2))]);

        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains_key(&MuscleGroup::Chest));
        assert!(merged.contains_key(&MuscleGroup::Back));
    }
}
