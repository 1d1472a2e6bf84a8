// events.rs — Event model and notification dispatch.
//
// Keepsake emits events at the goal lifecycle points that the rest of the
// application reacts to: alerting the giver when approval is requested,
// nudging progress indicators as sessions land, and triggering the
// reveal/coupon flow on completion.
//
// The tracker only supplies the event and identifiers — delivery (push,
// email, in-app) belongs to the sinks. Dispatch is fire-and-forget: a
// failing sink is logged and never gates the state transition that
// produced the event.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;
use crate::goal::Goal;

/// Events emitted at key goal lifecycle points.
///
/// These are the stable types that notification sinks subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GoalEvent {
    /// A goal was created and its parameters await the giver's approval.
    ApprovalRequested {
        goal_id: Uuid,
        user_id: String,
        experience_gift_id: String,
        target_count: u32,
        sessions_per_week: u32,
        approval_deadline: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// The giver approved or rejected the proposed parameters.
    ApprovalResolved {
        goal_id: Uuid,
        status: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was counted toward the current week.
    SessionLogged {
        goal_id: Uuid,
        date: NaiveDate,
        weekly_count: u32,
        sessions_per_week: u32,
        timestamp: DateTime<Utc>,
    },

    /// The weekly quota was met and the window rolled over.
    WeekCompleted {
        goal_id: Uuid,
        current_count: u32,
        target_count: u32,
        timestamp: DateTime<Utc>,
    },

    /// The final week was completed — the gift is ready to reveal.
    GoalCompleted {
        goal_id: Uuid,
        user_id: String,
        experience_gift_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The experience was revealed to the recipient.
    ExperienceRevealed {
        goal_id: Uuid,
        experience_gift_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl GoalEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            GoalEvent::ApprovalRequested { .. } => "approval_requested",
            GoalEvent::ApprovalResolved { .. } => "approval_resolved",
            GoalEvent::SessionLogged { .. } => "session_logged",
            GoalEvent::WeekCompleted { .. } => "week_completed",
            GoalEvent::GoalCompleted { .. } => "goal_completed",
            GoalEvent::ExperienceRevealed { .. } => "experience_revealed",
        }
    }

    /// Helper to create an ApprovalRequested event from a fresh goal.
    pub fn approval_requested(goal: &Goal) -> Self {
        GoalEvent::ApprovalRequested {
            goal_id: goal.goal_id,
            user_id: goal.user_id.clone(),
            experience_gift_id: goal.experience_gift_id.clone(),
            target_count: goal.initial_target_count,
            sessions_per_week: goal.initial_sessions_per_week,
            approval_deadline: goal.approval_deadline,
            timestamp: Utc::now(),
        }
    }

    /// Helper to create an ApprovalResolved event.
    pub fn approval_resolved(goal: &Goal) -> Self {
        GoalEvent::ApprovalResolved {
            goal_id: goal.goal_id,
            status: goal.approval.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a SessionLogged event.
    pub fn session_logged(goal: &Goal, date: NaiveDate) -> Self {
        GoalEvent::SessionLogged {
            goal_id: goal.goal_id,
            date,
            weekly_count: goal.weekly_count,
            sessions_per_week: goal.sessions_per_week,
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a WeekCompleted event.
    pub fn week_completed(goal: &Goal) -> Self {
        GoalEvent::WeekCompleted {
            goal_id: goal.goal_id,
            current_count: goal.current_count,
            target_count: goal.target_count,
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a GoalCompleted event.
    pub fn goal_completed(goal: &Goal) -> Self {
        GoalEvent::GoalCompleted {
            goal_id: goal.goal_id,
            user_id: goal.user_id.clone(),
            experience_gift_id: goal.experience_gift_id.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Helper to create an ExperienceRevealed event.
    pub fn experience_revealed(goal: &Goal) -> Self {
        GoalEvent::ExperienceRevealed {
            goal_id: goal.goal_id,
            experience_gift_id: goal.experience_gift_id.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for receiving goal events.
///
/// Implementations decide what to do with each event: log to a file,
/// call a webhook, push a mobile notification, etc. Delivery failure
/// never gates the state transition that produced the event.
pub trait NotificationSink: Send {
    /// Handle an event. Errors are logged but don't stop the system.
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError>;
}

/// Logs events as JSONL to a file (always-on sink).
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError> {
        // Ensure parent directory exists.
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| GoalError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| GoalError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| GoalError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Dispatches events to multiple sinks.
///
/// Errors from individual sinks are logged (via tracing) but don't
/// prevent other sinks from receiving the event.
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    /// Create a new dispatcher with no sinks.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a notification sink.
    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    /// Dispatch an event to all sinks.
    pub fn dispatch(&self, event: &GoalEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!("notification sink error: {}", e);
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::GoalParams;
    use tempfile::tempdir;

    fn test_goal() -> Goal {
        Goal::new(GoalParams {
            user_id: "recipient-1".to_string(),
            experience_gift_id: "gift-1".to_string(),
            category: None,
            target_count: 3,
            sessions_per_week: 2,
        })
        .unwrap()
    }

    #[test]
    fn event_serialization_round_trip() {
        let event = GoalEvent::approval_requested(&test_goal());
        let json = serde_json::to_string(&event).unwrap();
        let restored: GoalEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.event_type(), restored.event_type());
        assert!(json.contains("\"approval_requested\""));
    }

    #[test]
    fn log_sink_appends_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = LogSink::new(&path);

        sink.send(&GoalEvent::approval_requested(&test_goal())).unwrap();
        sink.send(&GoalEvent::goal_completed(&test_goal())).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("approval_requested"));
        assert!(lines[1].contains("goal_completed"));
    }

    #[test]
    fn dispatcher_sends_to_all_sinks() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("sink1.jsonl");
        let path2 = dir.path().join("sink2.jsonl");

        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(LogSink::new(&path1)));
        dispatcher.add_sink(Box::new(LogSink::new(&path2)));

        dispatcher.dispatch(&GoalEvent::week_completed(&test_goal()));

        // Both sinks should have received the event.
        assert!(fs::read_to_string(&path1).unwrap().contains("week_completed"));
        assert!(fs::read_to_string(&path2).unwrap().contains("week_completed"));
    }

    #[test]
    fn event_type_names() {
        let goal = test_goal();
        assert_eq!(
            GoalEvent::approval_requested(&goal).event_type(),
            "approval_requested"
        );
        assert_eq!(
            GoalEvent::approval_resolved(&goal).event_type(),
            "approval_resolved"
        );
        assert_eq!(
            GoalEvent::experience_revealed(&goal).event_type(),
            "experience_revealed"
        );
    }
}
