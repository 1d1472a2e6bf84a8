// goal.rs — Goal subcommands: create, approve, reject, log, list, status,
// reveal, delete.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::Subcommand;
use ks_goal::{
    ApprovalDecision, EventDispatcher, Goal, GoalEvent, GoalParams, GoalPhase, GoalStore, LogSink,
    SessionOutcome,
};

use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a goal for a redeemed gift and request the giver's approval.
    Create {
        /// Recipient user id.
        #[arg(long)]
        user: String,
        /// Experience gift id this goal unlocks.
        #[arg(long)]
        gift: String,
        /// Total weeks to complete (1-5).
        #[arg(long)]
        target: u32,
        /// Required sessions per week (1-7).
        #[arg(long)]
        per_week: u32,
        /// Activity category label (e.g., "yoga").
        #[arg(long)]
        category: Option<String>,
    },
    /// Approve a pending goal (giver's side of the handshake).
    Approve {
        /// Goal id.
        id: String,
        /// Name of the approving giver.
        #[arg(long)]
        by: String,
    },
    /// Reject a pending goal; the goal is deactivated.
    Reject {
        /// Goal id.
        id: String,
        /// Why the parameters were declined.
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Log a session toward the current week.
    Log {
        /// Goal id.
        id: String,
        /// Session date (YYYY-MM-DD, defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List all goals.
    List {
        /// Filter by phase (e.g., "in_progress", "completed").
        #[arg(long)]
        phase: Option<String>,
    },
    /// Show details for a specific goal.
    Status {
        /// Goal id.
        id: String,
    },
    /// Reveal the experience behind a completed goal.
    Reveal {
        /// Goal id.
        id: String,
    },
    /// Delete a goal record.
    Delete {
        /// Goal id.
        id: String,
    },
}

pub fn execute(cmd: &GoalCommands, config: &AppConfig) -> anyhow::Result<()> {
    let store = GoalStore::new(&config.goals_dir)?;
    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_sink(Box::new(LogSink::new(&config.events_log)));

    match cmd {
        GoalCommands::Create {
            user,
            gift,
            target,
            per_week,
            category,
        } => create_goal(
            &store,
            &dispatcher,
            user,
            gift,
            *target,
            *per_week,
            category.clone(),
        ),
        GoalCommands::Approve { id, by } => resolve_approval(
            &store,
            &dispatcher,
            id,
            ApprovalDecision::Approve {
                approved_by: by.clone(),
            },
        ),
        GoalCommands::Reject { id, reason } => resolve_approval(
            &store,
            &dispatcher,
            id,
            ApprovalDecision::Reject {
                reason: reason.clone(),
            },
        ),
        GoalCommands::Log { id, date } => log_session(&store, &dispatcher, id, *date),
        GoalCommands::List { phase } => list_goals(&store, phase.as_deref()),
        GoalCommands::Status { id } => show_status(&store, id),
        GoalCommands::Reveal { id } => reveal(&store, &dispatcher, id),
        GoalCommands::Delete { id } => delete_goal(&store, id),
    }
}

fn create_goal(
    store: &GoalStore,
    dispatcher: &EventDispatcher,
    user: &str,
    gift: &str,
    target: u32,
    per_week: u32,
    category: Option<String>,
) -> anyhow::Result<()> {
    let goal = Goal::new(GoalParams {
        user_id: user.to_string(),
        experience_gift_id: gift.to_string(),
        category,
        target_count: target,
        sessions_per_week: per_week,
    })?;
    store.save(&goal)?;
    dispatcher.dispatch(&GoalEvent::approval_requested(&goal));

    println!("Goal created: {}", goal.goal_id);
    println!("  Recipient: {}", goal.user_id);
    println!("  Gift:      {}", goal.experience_gift_id);
    println!(
        "  Target:    {} week(s) x {} session(s)/week",
        goal.target_count, goal.sessions_per_week
    );
    println!(
        "  Awaiting giver approval until {}",
        goal.approval_deadline.to_rfc3339()
    );

    Ok(())
}

fn resolve_approval(
    store: &GoalStore,
    dispatcher: &EventDispatcher,
    id: &str,
    decision: ApprovalDecision,
) -> anyhow::Result<()> {
    let goal_id = uuid::Uuid::parse_str(id)?;
    let goal = store.resolve_approval(goal_id, decision)?;
    dispatcher.dispatch(&GoalEvent::approval_resolved(&goal));

    println!("Goal {}: approval {}", goal.goal_id, goal.approval);
    if goal.phase() == GoalPhase::Rejected {
        println!("  Goal deactivated — the gift goes back to the giver.");
    }

    Ok(())
}

fn log_session(
    store: &GoalStore,
    dispatcher: &EventDispatcher,
    id: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let goal_id = uuid::Uuid::parse_str(id)?;
    let occurred_at = match date {
        Some(d) => NaiveDateTime::new(d, NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };
    let day = occurred_at.date_naive();

    let (goal, outcome) = store.log_session(goal_id, occurred_at)?;

    dispatcher.dispatch(&GoalEvent::session_logged(&goal, day));
    match outcome {
        SessionOutcome::Logged => {
            println!(
                "Session logged for {}: {}/{} this week",
                day, goal.weekly_count, goal.sessions_per_week
            );
        }
        SessionOutcome::WeekCompleted => {
            dispatcher.dispatch(&GoalEvent::week_completed(&goal));
            println!(
                "Week complete! {}/{} weeks done.",
                goal.current_count, goal.target_count
            );
        }
        SessionOutcome::GoalCompleted => {
            dispatcher.dispatch(&GoalEvent::week_completed(&goal));
            dispatcher.dispatch(&GoalEvent::goal_completed(&goal));
            println!("Goal complete! All {} weeks done.", goal.target_count);
            println!("Run `ks goal reveal {}` to unwrap the experience.", goal.goal_id);
        }
    }

    Ok(())
}

fn list_goals(store: &GoalStore, phase: Option<&str>) -> anyhow::Result<()> {
    let goals = if let Some(phase_filter) = phase {
        store.list_by_phase(parse_phase(phase_filter)?)?
    } else {
        store.list()?
    };

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<14} {:<18} {:<10} {:<10}",
        "ID", "RECIPIENT", "PHASE", "WEEKS", "SESSIONS"
    );
    println!("{}", "-".repeat(92));

    for g in &goals {
        println!(
            "{:<38} {:<14} {:<18} {:<10} {:<10}",
            g.goal_id,
            truncate(&g.user_id, 12),
            g.phase().to_string(),
            format!("{}/{}", g.current_count, g.target_count),
            format!("{}/{}", g.weekly_count, g.sessions_per_week),
        );
    }
    println!("\n{} goal(s) total.", goals.len());

    Ok(())
}

fn show_status(store: &GoalStore, id: &str) -> anyhow::Result<()> {
    let goal_id = uuid::Uuid::parse_str(id)?;
    match store.get(goal_id)? {
        Some(g) => {
            println!("Goal:      {}", g.goal_id);
            println!("Recipient: {}", g.user_id);
            println!("Gift:      {}", g.experience_gift_id);
            if let Some(ref category) = g.category {
                println!("Category:  {}", category);
            }
            println!("Phase:     {}", g.phase());
            print!("Approval:  {}", g.approval);
            if g.approval_overdue(Utc::now()) {
                print!("  (overdue since {})", g.approval_deadline.to_rfc3339());
            }
            println!();
            println!("Weeks:     {}/{}", g.current_count, g.target_count);
            println!("This week: {}/{}", g.weekly_count, g.sessions_per_week);
            if let Some(anchor) = g.week_start {
                println!("Anchor:    {}", anchor);
            }
            for d in &g.weekly_log_dates {
                println!("  session: {}", d);
            }
            println!("Created:   {}", g.created_at.to_rfc3339());
            println!("Updated:   {}", g.updated_at.to_rfc3339());
            if let Some(done) = g.completed_at {
                println!("Completed: {}", done.to_rfc3339());
            }
            if g.is_revealed {
                println!("Experience revealed.");
            }
        }
        None => {
            eprintln!("Goal not found: {}", id);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn reveal(store: &GoalStore, dispatcher: &EventDispatcher, id: &str) -> anyhow::Result<()> {
    let goal_id = uuid::Uuid::parse_str(id)?;
    let goal = store.mark_revealed(goal_id)?;
    dispatcher.dispatch(&GoalEvent::experience_revealed(&goal));

    println!("Experience revealed: {}", goal.experience_gift_id);

    Ok(())
}

fn delete_goal(store: &GoalStore, id: &str) -> anyhow::Result<()> {
    let goal_id = uuid::Uuid::parse_str(id)?;
    if store.delete(goal_id)? {
        println!("Deleted goal: {}", goal_id);
    } else {
        eprintln!("Goal not found: {}", id);
        std::process::exit(1);
    }

    Ok(())
}

fn parse_phase(s: &str) -> anyhow::Result<GoalPhase> {
    match s {
        "pending_approval" => Ok(GoalPhase::PendingApproval),
        "in_progress" => Ok(GoalPhase::InProgress),
        "completed" => Ok(GoalPhase::Completed),
        "rejected" => Ok(GoalPhase::Rejected),
        "inactive" => Ok(GoalPhase::Inactive),
        other => anyhow::bail!(
            "unknown phase '{}' (expected pending_approval, in_progress, completed, rejected, or inactive)",
            other
        ),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}...", &s[..max - 3])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, AppConfig) {
        let root = TempDir::new().unwrap();
        let config = AppConfig::for_root(root.path());
        (root, config)
    }

    #[test]
    fn create_goal_persists_and_logs_event() {
        let (_root, config) = setup();
        let store = GoalStore::new(&config.goals_dir).unwrap();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(LogSink::new(&config.events_log)));

        create_goal(
            &store,
            &dispatcher,
            "recipient-1",
            "gift-1",
            3,
            2,
            Some("yoga".to_string()),
        )
        .unwrap();

        let goals = store.list().unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].phase(), GoalPhase::PendingApproval);
        assert_eq!(goals[0].target_count, 3);

        let events = std::fs::read_to_string(&config.events_log).unwrap();
        assert!(events.contains("approval_requested"));
    }

    #[test]
    fn log_session_reports_week_and_goal_completion_events() {
        let (_root, config) = setup();
        let store = GoalStore::new(&config.goals_dir).unwrap();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(LogSink::new(&config.events_log)));

        create_goal(&store, &dispatcher, "recipient-1", "gift-1", 1, 2, None).unwrap();
        let id = store.list().unwrap()[0].goal_id.to_string();

        resolve_approval(
            &store,
            &dispatcher,
            &id,
            ApprovalDecision::Approve {
                approved_by: "giver-1".to_string(),
            },
        )
        .unwrap();

        let day1 = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        log_session(&store, &dispatcher, &id, Some(day1)).unwrap();
        log_session(&store, &dispatcher, &id, Some(day2)).unwrap();

        let events = std::fs::read_to_string(&config.events_log).unwrap();
        assert!(events.contains("session_logged"));
        assert!(events.contains("week_completed"));
        assert!(events.contains("goal_completed"));

        reveal(&store, &dispatcher, &id).unwrap();
        let events = std::fs::read_to_string(&config.events_log).unwrap();
        assert!(events.contains("experience_revealed"));
    }

    #[test]
    fn parse_phase_rejects_unknown() {
        assert!(parse_phase("in_progress").is_ok());
        assert!(parse_phase("bogus").is_err());
    }
}
