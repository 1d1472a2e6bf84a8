// goal_flow.rs — End-to-end lifecycle against a temp data root: create a
// goal, run the approval handshake, log sessions across week boundaries,
// complete, reveal. Exercises the same store + dispatcher plumbing the
// `ks goal` subcommands use.

use chrono::{DateTime, TimeZone, Utc};
use ks_goal::{
    ApprovalDecision, EventDispatcher, Goal, GoalEvent, GoalParams, GoalPhase, GoalStore, LogSink,
    SessionOutcome,
};
use tempfile::TempDir;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, 19, 30, 0).unwrap()
}

#[test]
fn full_goal_lifecycle() {
    let root = TempDir::new().unwrap();
    let ks_dir = root.path().join(".keepsake");
    let store = GoalStore::new(ks_dir.join("goals")).unwrap();
    let events_log = ks_dir.join("events.jsonl");
    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_sink(Box::new(LogSink::new(&events_log)));

    // Recipient redeems a claim code and proposes goal parameters.
    let goal = Goal::new(GoalParams {
        user_id: "maya".to_string(),
        experience_gift_id: "hot-air-balloon-ride".to_string(),
        category: Some("yoga".to_string()),
        target_count: 2,
        sessions_per_week: 2,
    })
    .unwrap();
    let id = goal.goal_id;
    store.save(&goal).unwrap();
    dispatcher.dispatch(&GoalEvent::approval_requested(&goal));

    assert_eq!(goal.phase(), GoalPhase::PendingApproval);

    // Sessions don't count until the giver approves.
    assert!(store.log_session(id, at(1)).is_err());

    // Giver approves.
    let goal = store
        .resolve_approval(
            id,
            ApprovalDecision::Approve {
                approved_by: "dad".to_string(),
            },
        )
        .unwrap();
    dispatcher.dispatch(&GoalEvent::approval_resolved(&goal));
    assert_eq!(goal.phase(), GoalPhase::InProgress);

    // Week 1: two sessions on distinct days.
    let (goal, outcome) = store.log_session(id, at(1)).unwrap();
    assert_eq!(outcome, SessionOutcome::Logged);
    dispatcher.dispatch(&GoalEvent::session_logged(&goal, at(1).date_naive()));

    let (goal, outcome) = store.log_session(id, at(3)).unwrap();
    assert_eq!(outcome, SessionOutcome::WeekCompleted);
    dispatcher.dispatch(&GoalEvent::week_completed(&goal));
    assert_eq!(goal.current_count, 1);
    // Anchor advanced a fixed 7 days from day 1.
    assert_eq!(goal.week_start, Some(at(8).date_naive()));

    // Same-day duplicate in week 2 is rejected and changes nothing.
    store.log_session(id, at(8)).unwrap();
    assert!(store.log_session(id, at(8)).is_err());
    let current = store.get(id).unwrap().unwrap();
    assert_eq!(current.weekly_count, 1);

    // Week 2 completes the goal.
    let (goal, outcome) = store.log_session(id, at(10)).unwrap();
    assert_eq!(outcome, SessionOutcome::GoalCompleted);
    dispatcher.dispatch(&GoalEvent::goal_completed(&goal));
    assert!(goal.is_completed);
    assert_eq!(goal.completed_at, Some(at(10)));

    // No further sessions after completion.
    assert!(store.log_session(id, at(12)).is_err());

    // Reveal the experience, once.
    let goal = store.mark_revealed(id).unwrap();
    dispatcher.dispatch(&GoalEvent::experience_revealed(&goal));
    assert!(goal.is_revealed);
    assert!(store.mark_revealed(id).is_err());

    // The event log saw the whole story.
    let events = std::fs::read_to_string(&events_log).unwrap();
    for expected in [
        "approval_requested",
        "approval_resolved",
        "session_logged",
        "week_completed",
        "goal_completed",
        "experience_revealed",
    ] {
        assert!(events.contains(expected), "missing event: {}", expected);
    }
}

#[test]
fn rejected_goal_stays_terminal_across_reopen() {
    let root = TempDir::new().unwrap();
    let store_path = root.path().join(".keepsake/goals");

    let goal = Goal::new(GoalParams {
        user_id: "maya".to_string(),
        experience_gift_id: "cooking-class".to_string(),
        category: None,
        target_count: 1,
        sessions_per_week: 1,
    })
    .unwrap();
    let id = goal.goal_id;

    {
        let store = GoalStore::new(&store_path).unwrap();
        store.save(&goal).unwrap();
        store
            .resolve_approval(
                id,
                ApprovalDecision::Reject {
                    reason: "let's pick the target together".to_string(),
                },
            )
            .unwrap();
    }

    // A fresh store instance sees the same terminal state.
    let store = GoalStore::new(&store_path).unwrap();
    let reloaded = store.get(id).unwrap().unwrap();
    assert_eq!(reloaded.phase(), GoalPhase::Rejected);
    assert!(store
        .resolve_approval(
            id,
            ApprovalDecision::Approve {
                approved_by: "dad".to_string()
            }
        )
        .is_err());
    assert!(store.log_session(id, at(1)).is_err());
}
