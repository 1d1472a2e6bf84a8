// store.rs — GoalStore: persistence for Goal records.
//
// Each Goal is stored as a JSON file: `<store_dir>/<goal_id>.json`.
// This keeps goals isolated and makes the store easy to inspect manually.
//
// Records are validated after deserializing: a document whose counters
// violate the Goal invariants is surfaced as CorruptRecord instead of
// being trusted. The store assumes a single active writer per goal, so
// the read-modify-write helpers need no locking.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GoalError;
use crate::goal::{ApprovalDecision, Goal, GoalPhase, SessionOutcome};

/// Persistent store for Goal records.
///
/// Each goal gets its own JSON file in the store directory.
pub struct GoalStore {
    store_dir: PathBuf,
}

impl GoalStore {
    /// Create a new store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, GoalError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| GoalError::Io {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self { store_dir })
    }

    /// Save a Goal to disk (creates or overwrites).
    pub fn save(&self, goal: &Goal) -> Result<(), GoalError> {
        let path = self.goal_file(goal.goal_id);
        let json = serde_json::to_string_pretty(goal)?;
        fs::write(&path, json).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Get a specific Goal by ID.
    ///
    /// The record is validated after deserializing — shape or invariant
    /// mismatch fails loudly rather than flowing into the counters.
    pub fn get(&self, goal_id: Uuid) -> Result<Option<Goal>, GoalError> {
        let path = self.goal_file(goal_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let goal: Goal = serde_json::from_str(&json)?;
        goal.validate()?;
        Ok(Some(goal))
    }

    /// List all Goals, sorted by creation time (newest first).
    ///
    /// Unreadable or invalid records are skipped with a warning rather
    /// than failing the whole listing.
    pub fn list(&self) -> Result<Vec<Goal>, GoalError> {
        let mut goals = Vec::new();

        let entries = fs::read_dir(&self.store_dir).map_err(|source| GoalError::Io {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| GoalError::Io {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                let json = fs::read_to_string(&path).map_err(|source| GoalError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                match serde_json::from_str::<Goal>(&json) {
                    Ok(goal) => match goal.validate() {
                        Ok(()) => goals.push(goal),
                        Err(e) => tracing::warn!("skipping invalid record {}: {}", path.display(), e),
                    },
                    Err(e) => tracing::warn!("skipping unreadable record {}: {}", path.display(), e),
                }
            }
        }

        // Sort by creation time, newest first.
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    /// List Goals filtered by lifecycle phase.
    pub fn list_by_phase(&self, phase: GoalPhase) -> Result<Vec<Goal>, GoalError> {
        let all = self.list()?;
        Ok(all.into_iter().filter(|g| g.phase() == phase).collect())
    }

    /// Log a session on a stored goal and persist the result.
    ///
    /// Single read-modify-write — the store assumes one active writer per
    /// goal, so this needs no locking.
    pub fn log_session(
        &self,
        goal_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Result<(Goal, SessionOutcome), GoalError> {
        let mut goal = self.get(goal_id)?.ok_or(GoalError::NotFound(goal_id))?;
        let outcome = goal.log_session(occurred_at)?;
        self.save(&goal)?;
        tracing::debug!(%goal_id, ?outcome, "session logged");
        Ok((goal, outcome))
    }

    /// Resolve the approval handshake on a stored goal and persist the result.
    pub fn resolve_approval(
        &self,
        goal_id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<Goal, GoalError> {
        let mut goal = self.get(goal_id)?.ok_or(GoalError::NotFound(goal_id))?;
        goal.resolve_approval(decision)?;
        self.save(&goal)?;
        tracing::debug!(%goal_id, status = %goal.approval, "approval resolved");
        Ok(goal)
    }

    /// Mark a completed goal's experience as revealed and persist the result.
    pub fn mark_revealed(&self, goal_id: Uuid) -> Result<Goal, GoalError> {
        let mut goal = self.get(goal_id)?.ok_or(GoalError::NotFound(goal_id))?;
        goal.mark_revealed()?;
        self.save(&goal)?;
        Ok(goal)
    }

    /// Delete a Goal from the store.
    pub fn delete(&self, goal_id: Uuid) -> Result<bool, GoalError> {
        let path = self.goal_file(goal_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| GoalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }

    /// Path to the JSON file for a given Goal.
    fn goal_file(&self, goal_id: Uuid) -> PathBuf {
        self.store_dir.join(format!("{}.json", goal_id))
    }
}
