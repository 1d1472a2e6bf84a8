//! # ks-goal
//!
//! Goal progress tracking and event dispatch for Keepsake.
//!
//! A [`Goal`] is a recipient's weekly commitment gating the reveal of a
//! gifted experience: N weeks of M sessions each, logged against an
//! anchored 7-day window, with a one-time approval handshake from the
//! gift giver.
//!
//! ## Key components
//!
//! - [`Goal`] — the progress state machine (pending_approval →
//!   in_progress → completed, or pending_approval → rejected)
//! - [`GoalStore`] — JSON file-based persistence for Goal records,
//!   validating invariants at the deserialization boundary
//! - [`GoalEvent`] — events emitted at key lifecycle points
//! - [`EventDispatcher`] — dispatches events to notification sinks
//! - [`NotificationSink`] — trait for receiving events (log, webhook, etc.)

pub mod error;
pub mod events;
pub mod goal;
pub mod store;

pub use error::GoalError;
pub use events::{EventDispatcher, GoalEvent, LogSink, NotificationSink};
pub use goal::{
    ApprovalDecision, ApprovalStatus, Goal, GoalParams, GoalPhase, SessionOutcome,
    APPROVAL_WINDOW_HOURS, MAX_SESSIONS_PER_WEEK, MAX_TARGET_WEEKS,
};
pub use store::GoalStore;
