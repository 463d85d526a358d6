//! Integration tests for the focus workspace.
//!
//! Each "restart" drops the workspace and the database handle and reopens
//! the same SQLite file, the way the application would after being closed.

use std::path::Path;

use chrono::{DateTime, Utc};
use zinefocus_core::{
    CompletionSource, Config, Database, Event, FocusWorkspace, ManualClock, SwitchDecision,
    Ticker, TimerError, TimerState,
};

const T0: i64 = 1_750_000_000;

fn at(offset_secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(T0 + offset_secs, 0).unwrap()
}

fn config() -> Config {
    Config {
        user_id: "reader-42".into(),
        ..Config::default()
    }
}

fn open<'a>(db: &'a Database, clock: &ManualClock) -> FocusWorkspace<&'a Database, ManualClock> {
    FocusWorkspace::open(db, clock.clone(), Ticker::detached(), &config())
}

/// Start a 25 minute session on a fresh project at T0 and close the app.
fn start_session_and_close(path: &Path, clock: &ManualClock) -> String {
    let db = Database::open_at(path).unwrap();
    let project = db.create_project("Summer issue").unwrap();
    let mut ws = open(&db, clock);
    ws.select_project(project.clone());
    ws.start().unwrap();
    project.id
}

#[test]
fn reopening_mid_session_resumes_countdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zinefocus.db");
    let clock = ManualClock::new(at(0));
    start_session_and_close(&path, &clock);

    clock.set(at(10 * 60));
    let db = Database::open_at(&path).unwrap();
    let mut ws = open(&db, &clock);

    assert_eq!(ws.state(), TimerState::Running);
    assert_eq!(ws.remaining_secs(), 15 * 60);
    assert_eq!(ws.display(), "15:00");
    assert!(ws.take_events().is_empty());
    assert!(db.list_focus_sessions(None).unwrap().is_empty());
}

#[test]
fn reopening_after_expiry_records_catch_up_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zinefocus.db");
    let clock = ManualClock::new(at(0));
    let project_id = start_session_and_close(&path, &clock);

    clock.set(at(40 * 60));
    {
        let db = Database::open_at(&path).unwrap();
        let mut ws = open(&db, &clock);

        assert_eq!(ws.state(), TimerState::Idle);
        assert_eq!(ws.remaining_secs(), 25 * 60);
        let events = ws.take_events();
        assert!(matches!(
            events.as_slice(),
            [
                Event::TimerCompleted {
                    elapsed_secs: 1500,
                    source: CompletionSource::CatchUp,
                    ..
                },
                Event::SessionRecorded { .. }
            ]
        ));
        assert_eq!(ws.selected().unwrap().total_minutes, 25);
    }

    // A second restart must not record the same interval again.
    clock.set(at(50 * 60));
    let db = Database::open_at(&path).unwrap();
    let ws = open(&db, &clock);
    assert_eq!(ws.state(), TimerState::Idle);

    let sessions = db.list_focus_sessions(None).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_minutes, 25);
    assert_eq!(sessions[0].project_id, project_id);
    assert_eq!(sessions[0].user_id, "reader-42");
    assert_eq!(db.get_project(&project_id).unwrap().unwrap().total_minutes, 25);
}

#[test]
fn short_manual_completion_records_nothing() {
    let db = Database::open_memory().unwrap();
    let clock = ManualClock::new(at(0));
    let project = db.create_project("Flyer").unwrap();
    let mut ws = open(&db, &clock);
    ws.select_project(project);
    ws.start().unwrap();

    clock.advance_secs(45);
    ws.complete_now();

    assert_eq!(ws.state(), TimerState::Idle);
    assert_eq!(ws.remaining_secs(), 25 * 60);
    assert!(db.list_focus_sessions(None).unwrap().is_empty());
    let events = ws.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SessionTooShort { elapsed_secs: 45, .. })));
}

#[test]
fn start_without_project_signals_and_stays_idle() {
    let db = Database::open_memory().unwrap();
    let clock = ManualClock::new(at(0));
    let mut ws = open(&db, &clock);

    assert_eq!(ws.start(), Err(TimerError::NoProjectSelected));
    assert_eq!(ws.state(), TimerState::Idle);
}

#[test]
fn switch_while_running_can_be_cancelled() {
    let db = Database::open_memory().unwrap();
    let clock = ManualClock::new(at(0));
    let a = db.create_project("A").unwrap();
    let b = db.create_project("B").unwrap();
    let mut ws = open(&db, &clock);
    ws.select_project(a.clone());
    ws.start().unwrap();
    clock.advance_secs(120);

    assert!(matches!(ws.select_project(b.clone()), SwitchDecision::Pending(_)));
    assert_eq!(ws.pending_switch().map(|p| p.id.as_str()), Some(b.id.as_str()));

    ws.cancel_switch();
    assert!(ws.pending_switch().is_none());
    assert_eq!(ws.selected().map(|p| p.id.as_str()), Some(a.id.as_str()));
    assert_eq!(ws.state(), TimerState::Running);
    assert_eq!(ws.remaining_secs(), 23 * 60);
}

#[test]
fn confirmed_switch_leaves_countdown_untouched() {
    let db = Database::open_memory().unwrap();
    let clock = ManualClock::new(at(0));
    let a = db.create_project("A").unwrap();
    let b = db.create_project("B").unwrap();
    let mut ws = open(&db, &clock);
    ws.select_project(a);
    ws.start().unwrap();
    clock.advance_secs(300);

    let before = *ws.timer().snapshot();
    ws.select_project(b.clone());
    assert_eq!(ws.confirm_switch().map(|p| p.id.clone()), Some(b.id.clone()));
    assert_eq!(*ws.timer().snapshot(), before);
    assert_eq!(ws.state(), TimerState::Running);

    // The whole interval is credited to the project selected at completion.
    clock.advance_secs(20 * 60);
    ws.tick();
    assert_eq!(db.get_project(&b.id).unwrap().unwrap().total_minutes, 25);
}

#[test]
fn back_to_back_ticks_after_expiry_record_once() {
    let db = Database::open_memory().unwrap();
    let clock = ManualClock::new(at(0));
    let project = db.create_project("Risograph").unwrap();
    let mut ws = open(&db, &clock);
    ws.select_project(project);
    ws.start().unwrap();

    clock.advance_secs(25 * 60);
    ws.tick();
    ws.tick();

    assert_eq!(db.list_focus_sessions(None).unwrap().len(), 1);
}

#[test]
fn duration_edit_keeps_paused_session() {
    let db = Database::open_memory().unwrap();
    let clock = ManualClock::new(at(0));
    let project = db.create_project("Essay").unwrap();
    let mut ws = open(&db, &clock);
    ws.select_project(project);

    ws.set_duration(50).unwrap();
    assert_eq!(ws.remaining_secs(), 50 * 60);

    ws.start().unwrap();
    assert_eq!(ws.set_duration(30), Err(TimerError::DurationLocked));

    clock.advance_secs(10 * 60);
    ws.pause();
    ws.set_duration(45).unwrap();
    assert_eq!(ws.state(), TimerState::Paused);
    assert_eq!(ws.remaining_secs(), 40 * 60);

    ws.reset();
    assert_eq!(ws.remaining_secs(), 45 * 60);
}

#[test]
fn corrupt_store_behaves_like_fresh_timer() {
    let db = Database::open_memory().unwrap();
    db.kv_set("timer-running-reader-42", "true").unwrap();
    db.kv_set("timer-start-time-reader-42", "yesterday").unwrap();
    db.kv_set("timer-time-reader-42", "NaN").unwrap();
    db.kv_set("timer-duration-reader-42", "-3").unwrap();
    db.kv_set("selected-project-reader-42", "[").unwrap();

    let clock = ManualClock::new(at(0));
    let ws = open(&db, &clock);
    assert_eq!(ws.state(), TimerState::Idle);
    assert_eq!(ws.remaining_secs(), 25 * 60);
    assert!(ws.selected().is_none());
}
