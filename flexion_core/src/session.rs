//! Workout session lifecycle.
//!
//! One session at a time, driven through
//! `Idle -> Configuring -> Active -> Completing -> Idle`, with cancellation
//! from Configuring or Active straight back to Idle. Exercises and sets are
//! edited while Configuring; `begin` starts the clock; `end` runs the
//! completion pipeline:
//! 1. stats rollup
//! 2. muscle inference over every exercise (unmatched exercises fall back
//!    to the `full_body` sentinel)
//! 3. optimistic local recovery reset, applied to the store *before* the
//!    sink write is attempted
//! 4. sink write; a failure is reported in the outcome, never rolled back
//!
//! Cancellation performs no recovery side effects at all.

use crate::inference::infer_muscles;
use crate::journal::WorkoutSink;
use crate::stats::summarize;
use crate::store::RecoveryStore;
use crate::types::{
    CompletedWorkout, ExerciseConfig, ExerciseDescriptor, MuscleGroup, SessionStatus, SetEntry,
    WorkoutSession, WorkoutStats,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Result of a completed session.
///
/// `persist_error` carries a failed sink write; the local recovery reset has
/// already happened by then and stands either way. Retry policy belongs to
/// the caller.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub workout: CompletedWorkout,
    pub stats: WorkoutStats,
    pub persist_error: Option<Error>,
}

/// Owner of the single in-progress workout session.
///
/// All mutation goes through this type; other components only receive
/// derived read-only values.
#[derive(Clone, Debug, Default)]
pub struct SessionManager {
    session: Option<WorkoutSession>,
}

impl SessionManager {
    /// Manager with no session (Idle)
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager resumed from a checkpointed session
    pub fn resume(session: WorkoutSession) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Current lifecycle status; `Idle` when no session exists
    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map_or(SessionStatus::Idle, |s| s.status)
    }

    /// Read-only view of the in-progress session
    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    /// Start configuring a new workout (`Idle -> Configuring`)
    pub fn start(&mut self, name: &str, now: DateTime<Utc>) -> Result<Uuid> {
        if self.session.is_some() {
            return Err(Error::Validation(
                "A workout session is already in progress".into(),
            ));
        }

        let session = WorkoutSession {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises: Vec::new(),
            started_at: None,
            completed_at: None,
            status: SessionStatus::Configuring,
        };
        tracing::info!("Started configuring session '{}' at {}", name, now);

        let id = session.id;
        self.session = Some(session);
        Ok(id)
    }

    /// Add an exercise with its initial sets (`Configuring` self-loop)
    pub fn add_exercise(
        &mut self,
        descriptor: ExerciseDescriptor,
        sets: Vec<SetEntry>,
    ) -> Result<usize> {
        if sets.is_empty() {
            return Err(Error::Validation(
                "An exercise needs at least one set".into(),
            ));
        }

        let session = self.configuring_mut()?;
        session.exercises.push(ExerciseConfig { descriptor, sets });
        Ok(session.exercises.len() - 1)
    }

    /// Remove an exercise by index
    pub fn remove_exercise(&mut self, index: usize) -> Result<ExerciseConfig> {
        let session = self.configuring_mut()?;
        if index >= session.exercises.len() {
            return Err(Error::Validation(format!(
                "No exercise at index {}",
                index
            )));
        }
        Ok(session.exercises.remove(index))
    }

    /// Append a set to an exercise
    pub fn add_set(&mut self, exercise_index: usize, set: SetEntry) -> Result<()> {
        let exercise = self.exercise_mut(exercise_index)?;
        exercise.sets.push(set);
        Ok(())
    }

    /// Replace a set in place
    pub fn update_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        set: SetEntry,
    ) -> Result<()> {
        let exercise = self.exercise_mut(exercise_index)?;
        let slot = exercise.sets.get_mut(set_index).ok_or_else(|| {
            Error::Validation(format!("No set at index {}", set_index))
        })?;
        *slot = set;
        Ok(())
    }

    /// Remove a set; the last set of an exercise cannot be removed
    pub fn remove_set(&mut self, exercise_index: usize, set_index: usize) -> Result<SetEntry> {
        let exercise = self.exercise_mut(exercise_index)?;
        if exercise.sets.len() <= 1 {
            return Err(Error::Validation(
                "An exercise must keep at least one set".into(),
            ));
        }
        if set_index >= exercise.sets.len() {
            return Err(Error::Validation(format!("No set at index {}", set_index)));
        }
        Ok(exercise.sets.remove(set_index))
    }

    /// Begin the workout (`Configuring -> Active`); starts the clock if it
    /// wasn't already running
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<()> {
        let session = self.session.as_mut().ok_or_else(Self::no_session)?;
        if session.status != SessionStatus::Configuring {
            return Err(Error::Validation(format!(
                "Cannot begin a session in state {:?}",
                session.status
            )));
        }

        if session.started_at.is_none() {
            session.started_at = Some(now);
        }
        session.status = SessionStatus::Active;
        tracing::info!("Session '{}' is now active", session.name);
        Ok(())
    }

    /// End the workout (`Active -> Completing -> Idle`).
    ///
    /// Rejected with a validation error (status unchanged) when the session
    /// has no exercises. On success the session is cleared even if the sink
    /// write failed; inspect `CompletionOutcome::persist_error`.
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
        store: &mut RecoveryStore,
        sink: &mut dyn WorkoutSink,
        notes: Option<String>,
    ) -> Result<CompletionOutcome> {
        {
            let session = self.session.as_ref().ok_or_else(Self::no_session)?;
            if session.status != SessionStatus::Active {
                return Err(Error::Validation(format!(
                    "Cannot end a session in state {:?}",
                    session.status
                )));
            }
            if session.exercises.is_empty() {
                return Err(Error::Validation(
                    "Cannot complete a workout with no exercises".into(),
                ));
            }
        }

        let mut session = self
            .session
            .take()
            .ok_or_else(Self::no_session)?;
        session.status = SessionStatus::Completing;
        let started_at = session.started_at.unwrap_or(now);
        let completed_at = now.max(started_at);
        session.completed_at = Some(completed_at);

        // 1. Stats rollup
        let stats = summarize(&session, now);

        // 2. Muscle inference over every exercise
        let muscles: Vec<MuscleGroup> = muscles_worked(&session).into_iter().collect();

        session.status = SessionStatus::Completed;
        let workout = CompletedWorkout {
            id: session.id,
            name: session.name.clone(),
            exercises: session.exercises.clone(),
            started_at,
            completed_at,
            duration_minutes: stats.duration_minutes,
            notes,
            muscles: muscles.clone(),
        };

        // 3. Optimistic local reset, before the sink write is attempted.
        // A sink failure below must not undo this.
        store.apply_reset(&muscles, completed_at);

        // 4. Sink write, best effort
        let persist_error = match sink.record(&workout) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    "Failed to persist workout {}: {}. Local recovery state stands.",
                    workout.id,
                    e
                );
                Some(e)
            }
        };

        tracing::info!(
            "Completed session '{}': {} exercises, {} sets, {} muscles reset",
            workout.name,
            stats.exercises,
            stats.total_sets,
            muscles.len()
        );

        Ok(CompletionOutcome {
            workout,
            stats,
            persist_error,
        })
    }

    /// Discard the session (`Configuring | Active -> Idle`).
    ///
    /// No recovery timers are touched.
    pub fn cancel(&mut self) -> Result<WorkoutSession> {
        let session = self.session.as_ref().ok_or_else(Self::no_session)?;
        match session.status {
            SessionStatus::Configuring | SessionStatus::Active => {
                let session = self.session.take().ok_or_else(Self::no_session)?;
                tracing::info!("Cancelled session '{}'", session.name);
                Ok(session)
            }
            status => Err(Error::Validation(format!(
                "Cannot cancel a session in state {:?}",
                status
            ))),
        }
    }

    fn configuring_mut(&mut self) -> Result<&mut WorkoutSession> {
        let session = self.session.as_mut().ok_or_else(Self::no_session)?;
        if session.status != SessionStatus::Configuring {
            return Err(Error::Validation(format!(
                "Exercises can only be edited while configuring, not in {:?}",
                session.status
            )));
        }
        Ok(session)
    }

    fn exercise_mut(&mut self, index: usize) -> Result<&mut ExerciseConfig> {
        let session = self.configuring_mut()?;
        session
            .exercises
            .get_mut(index)
            .ok_or_else(|| Error::Validation(format!("No exercise at index {}", index)))
    }

    fn no_session() -> Error {
        Error::Validation("No workout session in progress".into())
    }
}

/// Union of muscles trained by a session's exercises.
///
/// An exercise that inference cannot place falls back to the `full_body`
/// sentinel so its training effort is never silently dropped.
pub fn muscles_worked(session: &WorkoutSession) -> BTreeSet<MuscleGroup> {
    let mut muscles = BTreeSet::new();
    for exercise in &session.exercises {
        let inferred = infer_muscles(&exercise.descriptor);
        if inferred.is_empty() {
            tracing::debug!(
                "No muscle match for '{}', falling back to full body",
                exercise.descriptor.name
            );
            muscles.insert(MuscleGroup::FullBody);
        } else {
            muscles.extend(inferred);
        }
    }
    muscles
}
