// error.rs — Error types for the goal progress subsystem.
//
// Every variant signals a rejected transition or a bad record, never a
// crash. Nothing here is retried; retries belong to the network layer of
// the surrounding application.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during goal progress operations.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A session was already logged on this calendar day. Recoverable —
    /// the UI surfaces it as a no-op notice.
    #[error("session already logged on {date} for goal {goal_id}")]
    DuplicateSession { goal_id: Uuid, date: NaiveDate },

    /// Session logging attempted before the giver approved the goal.
    #[error("goal {goal_id} is not approved (approval status: {status})")]
    NotApproved { goal_id: Uuid, status: String },

    /// Operation attempted in a state that forbids it (completed,
    /// inactive, or not yet revealed-eligible). No mutation occurred.
    #[error("invalid operation on goal {goal_id}: {reason}")]
    InvalidState { goal_id: Uuid, reason: String },

    /// The approval handshake was already resolved; resolution is terminal.
    #[error("approval already resolved for goal {goal_id} (status: {status})")]
    ApprovalAlreadyResolved { goal_id: Uuid, status: String },

    /// Creation-time parameter validation failed.
    #[error("invalid goal parameters: {0}")]
    InvalidParams(String),

    /// The requested goal was not found in the store.
    #[error("goal not found: {0}")]
    NotFound(Uuid),

    /// A stored record deserialized but failed invariant validation.
    #[error("corrupt goal record {goal_id}: {reason}")]
    CorruptRecord { goal_id: Uuid, reason: String },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize goal data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
