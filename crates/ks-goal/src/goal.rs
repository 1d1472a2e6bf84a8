// goal.rs — Goal: a recipient's weekly commitment gating an experience gift.
//
// A Goal ties together everything needed to unlock one gifted experience:
// - The recipient who committed to it and the gift it unlocks
// - A multi-week target (N weeks of M sessions each)
// - An anchored weekly window with per-day session stamps
// - A one-time approval handshake with the gift giver
//
// The lifecycle:
//   pending_approval → in_progress → completed
//   pending_approval → rejected (terminal)

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;

/// How long the giver has to resolve the approval handshake.
///
/// The deadline is advisory metadata: nothing flips state when it passes.
/// The UI uses it to display urgency, and that is all it is for.
pub const APPROVAL_WINDOW_HOURS: i64 = 24;

/// Hard cap on target weeks at creation time.
pub const MAX_TARGET_WEEKS: u32 = 5;

/// Sessions per week must fit in a calendar week.
pub const MAX_SESSIONS_PER_WEEK: u32 = 7;

/// The giver's stance on the recipient's self-set goal parameters.
///
/// The `#[serde(tag = "status")]` attribute makes this serialize as
/// `{"status": "approved", "approved_by": "..."}` in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting the giver's decision.
    Pending,

    /// The giver accepted the proposed parameters.
    Approved { approved_by: String },

    /// The giver declined — the goal is deactivated and the gift goes
    /// back to an external reassignment flow.
    Rejected { reason: String },
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved { .. } => write!(f, "approved"),
            ApprovalStatus::Rejected { .. } => write!(f, "rejected"),
        }
    }
}

/// A giver's resolution of the approval handshake.
#[derive(Debug, Clone)]
pub enum ApprovalDecision {
    Approve { approved_by: String },
    Reject { reason: String },
}

/// Derived lifecycle phase, computed from the flags.
///
/// The boolean flags on [`Goal`] are the source of truth; this enum exists
/// for display and store filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalPhase {
    PendingApproval,
    InProgress,
    Completed,
    Rejected,
    Inactive,
}

impl fmt::Display for GoalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalPhase::PendingApproval => write!(f, "pending_approval"),
            GoalPhase::InProgress => write!(f, "in_progress"),
            GoalPhase::Completed => write!(f, "completed"),
            GoalPhase::Rejected => write!(f, "rejected"),
            GoalPhase::Inactive => write!(f, "inactive"),
        }
    }
}

/// What a successful [`Goal::log_session`] call accomplished.
///
/// Tells the caller which events to dispatch: a plain session, a finished
/// week, or the finished goal (which also finishes the week).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Session counted toward the current week.
    Logged,

    /// Session met the weekly quota — one more week done.
    WeekCompleted,

    /// The completed week was the last one. Goal done.
    GoalCompleted,
}

/// Validated creation parameters for a Goal.
///
/// The recipient proposes these after redeeming a claim code; the snapshot
/// is preserved on the Goal for the giver's approval step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalParams {
    /// Owning recipient.
    pub user_id: String,

    /// Back-reference to the redeemed experience gift (weak — no ownership).
    pub experience_gift_id: String,

    /// Activity category label (e.g., "yoga"). Free-form, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Total weeks required to complete the goal (1..=5).
    pub target_count: u32,

    /// Required sessions per week (1..=7).
    pub sessions_per_week: u32,
}

impl GoalParams {
    /// Check the parameter ranges enforced at creation time.
    pub fn validate(&self) -> Result<(), GoalError> {
        if self.target_count == 0 || self.target_count > MAX_TARGET_WEEKS {
            return Err(GoalError::InvalidParams(format!(
                "target_count must be 1..={}, got {}",
                MAX_TARGET_WEEKS, self.target_count
            )));
        }
        if self.sessions_per_week == 0 || self.sessions_per_week > MAX_SESSIONS_PER_WEEK {
            return Err(GoalError::InvalidParams(format!(
                "sessions_per_week must be 1..={}, got {}",
                MAX_SESSIONS_PER_WEEK, self.sessions_per_week
            )));
        }
        if self.user_id.is_empty() {
            return Err(GoalError::InvalidParams("user_id must not be empty".into()));
        }
        Ok(())
    }
}

/// A Goal — one recipient's commitment from approval to completion.
///
/// Counters track two nested loops: sessions within the current anchored
/// week (`weekly_count` / `sessions_per_week`) and completed weeks toward
/// the overall target (`current_count` / `target_count`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier for this goal.
    pub goal_id: Uuid,

    /// Owning recipient.
    pub user_id: String,

    /// The experience gift this goal unlocks.
    pub experience_gift_id: String,

    /// Activity category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Total weeks required to complete the goal.
    pub target_count: u32,

    /// Weeks fully completed so far.
    pub current_count: u32,

    /// Required sessions per anchored week.
    pub sessions_per_week: u32,

    /// Sessions logged in the current anchored week.
    pub weekly_count: u32,

    /// One date per calendar day logged in the current week.
    /// Guards against double-counting same-day sessions.
    pub weekly_log_dates: BTreeSet<NaiveDate>,

    /// Anchor of the current weekly window. None until the first session
    /// is ever logged; advances only forward, in exact 7-day steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<NaiveDate>,

    /// Lifecycle flags. `is_completed` holds iff `current_count == target_count`.
    pub is_active: bool,
    pub is_completed: bool,
    pub is_revealed: bool,

    /// The giver-approval handshake state.
    pub approval: ApprovalStatus,

    /// Snapshot of the proposed parameters, preserved for the approval
    /// step even if the goal is later adjusted.
    pub initial_target_count: u32,
    pub initial_sessions_per_week: u32,

    /// Advisory deadline for the approval handshake (created_at + 24h).
    /// Never enforced — no timer flips state when it passes.
    pub approval_deadline: DateTime<Utc>,

    /// When this goal was created.
    pub created_at: DateTime<Utc>,

    /// When this goal was last updated.
    pub updated_at: DateTime<Utc>,

    /// Stamped from the completing session's timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// Create a new Goal in the pending-approval state.
    pub fn new(params: GoalParams) -> Result<Self, GoalError> {
        params.validate()?;
        let now = Utc::now();
        Ok(Self {
            goal_id: Uuid::new_v4(),
            user_id: params.user_id,
            experience_gift_id: params.experience_gift_id,
            category: params.category,
            target_count: params.target_count,
            current_count: 0,
            sessions_per_week: params.sessions_per_week,
            weekly_count: 0,
            weekly_log_dates: BTreeSet::new(),
            week_start: None,
            is_active: true,
            is_completed: false,
            is_revealed: false,
            approval: ApprovalStatus::Pending,
            initial_target_count: params.target_count,
            initial_sessions_per_week: params.sessions_per_week,
            approval_deadline: now + Duration::hours(APPROVAL_WINDOW_HOURS),
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Derived lifecycle phase for display and filtering.
    pub fn phase(&self) -> GoalPhase {
        if self.is_completed {
            GoalPhase::Completed
        } else if matches!(self.approval, ApprovalStatus::Rejected { .. }) {
            GoalPhase::Rejected
        } else if !self.is_active {
            GoalPhase::Inactive
        } else if matches!(self.approval, ApprovalStatus::Pending) {
            GoalPhase::PendingApproval
        } else {
            GoalPhase::InProgress
        }
    }

    /// Whether the approval handshake is still pending past its deadline.
    /// Advisory only — used by the UI to display urgency.
    pub fn approval_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.approval, ApprovalStatus::Pending) && now > self.approval_deadline
    }

    /// Log one session at `occurred_at`.
    ///
    /// At most one session counts per calendar day. When the weekly quota
    /// is met the week rolls over: `current_count` advances, the weekly
    /// counters reset, and the anchor moves exactly 7 days forward from
    /// its previous value — not from `occurred_at`, so the cadence stays
    /// fixed regardless of when during the week sessions happened.
    ///
    /// A session landing more than 7 days past the anchor with the quota
    /// unmet is still counted: missed weeks carry no penalty, the current
    /// week simply stays short until sessions resume.
    pub fn log_session(&mut self, occurred_at: DateTime<Utc>) -> Result<SessionOutcome, GoalError> {
        match &self.approval {
            ApprovalStatus::Approved { .. } => {}
            status => {
                return Err(GoalError::NotApproved {
                    goal_id: self.goal_id,
                    status: status.to_string(),
                })
            }
        }
        if self.is_completed {
            return Err(GoalError::InvalidState {
                goal_id: self.goal_id,
                reason: "goal is already completed".into(),
            });
        }
        if !self.is_active {
            return Err(GoalError::InvalidState {
                goal_id: self.goal_id,
                reason: "goal is not active".into(),
            });
        }

        let day = occurred_at.date_naive();

        // First session ever — anchor the weekly window at its day.
        if self.week_start.is_none() {
            self.week_start = Some(day);
        }

        if self.weekly_log_dates.contains(&day) {
            return Err(GoalError::DuplicateSession {
                goal_id: self.goal_id,
                date: day,
            });
        }

        self.weekly_log_dates.insert(day);
        self.weekly_count += 1;
        self.updated_at = Utc::now();

        if self.weekly_count < self.sessions_per_week {
            return Ok(SessionOutcome::Logged);
        }

        // Weekly quota met: roll the week over.
        self.current_count += 1;
        self.weekly_count = 0;
        self.weekly_log_dates.clear();
        self.week_start = self.week_start.map(|anchor| anchor + Duration::days(7));

        if self.current_count < self.target_count {
            return Ok(SessionOutcome::WeekCompleted);
        }

        self.is_completed = true;
        self.completed_at = Some(occurred_at);
        Ok(SessionOutcome::GoalCompleted)
    }

    /// Resolve the approval handshake. Terminal: once resolved, any further
    /// attempt is rejected.
    pub fn resolve_approval(&mut self, decision: ApprovalDecision) -> Result<(), GoalError> {
        if !matches!(self.approval, ApprovalStatus::Pending) {
            return Err(GoalError::ApprovalAlreadyResolved {
                goal_id: self.goal_id,
                status: self.approval.to_string(),
            });
        }
        match decision {
            ApprovalDecision::Approve { approved_by } => {
                self.approval = ApprovalStatus::Approved { approved_by };
            }
            ApprovalDecision::Reject { reason } => {
                self.approval = ApprovalStatus::Rejected { reason };
                self.is_active = false;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the underlying experience as revealed to the recipient.
    /// Only valid once the goal is completed, and only once.
    pub fn mark_revealed(&mut self) -> Result<(), GoalError> {
        if !self.is_completed {
            return Err(GoalError::InvalidState {
                goal_id: self.goal_id,
                reason: "goal is not completed".into(),
            });
        }
        if self.is_revealed {
            return Err(GoalError::InvalidState {
                goal_id: self.goal_id,
                reason: "experience is already revealed".into(),
            });
        }
        self.is_revealed = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check the record invariants. Run at the persistence boundary after
    /// deserializing, so a malformed document fails loudly instead of
    /// flowing into the counters.
    pub fn validate(&self) -> Result<(), GoalError> {
        let fail = |reason: String| GoalError::CorruptRecord {
            goal_id: self.goal_id,
            reason,
        };

        if self.target_count == 0 || self.target_count > MAX_TARGET_WEEKS {
            return Err(fail(format!("target_count out of range: {}", self.target_count)));
        }
        if self.sessions_per_week == 0 || self.sessions_per_week > MAX_SESSIONS_PER_WEEK {
            return Err(fail(format!(
                "sessions_per_week out of range: {}",
                self.sessions_per_week
            )));
        }
        if self.current_count > self.target_count {
            return Err(fail(format!(
                "current_count {} exceeds target_count {}",
                self.current_count, self.target_count
            )));
        }
        if self.weekly_count > self.sessions_per_week {
            return Err(fail(format!(
                "weekly_count {} exceeds sessions_per_week {}",
                self.weekly_count, self.sessions_per_week
            )));
        }
        if self.weekly_log_dates.len() != self.weekly_count as usize {
            return Err(fail(format!(
                "weekly_log_dates has {} entries but weekly_count is {}",
                self.weekly_log_dates.len(),
                self.weekly_count
            )));
        }
        if self.weekly_count > 0 && self.week_start.is_none() {
            return Err(fail("weekly_count > 0 without a week_start anchor".into()));
        }
        if self.is_completed != (self.current_count == self.target_count) {
            return Err(fail(format!(
                "is_completed={} inconsistent with current_count {} / target_count {}",
                self.is_completed, self.current_count, self.target_count
            )));
        }
        Ok(())
    }
}
