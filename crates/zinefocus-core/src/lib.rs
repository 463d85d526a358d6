//! # Zinefocus Core Library
//!
//! Business logic for the focus timer embedded in a user's project workspace.
//! The CLI is a thin layer over this crate; every operation is available here.
//!
//! ## Architecture
//!
//! - **Timer Store**: typed, per-user persistence of the timer snapshot on top
//!   of a key-value collaborator, with safe defaults for anything unreadable
//! - **Timer Controller**: a wall-clock-anchored countdown state machine that
//!   survives restarts and detects completion exactly once per interval
//! - **Session Recorder**: turns a completed interval into a focus session
//!   record and credits the owning project
//! - **Switch Guard**: arbitrates a project change while the timer runs
//!
//! ## Key Components
//!
//! - [`FocusWorkspace`]: per-user context wiring all of the above
//! - [`TimerController`]: core timer state machine
//! - [`Database`]: SQLite stand-in for the hosted project/session service
//! - [`Config`]: application configuration management

pub mod accounting;
pub mod error;
pub mod events;
pub mod project;
pub mod storage;
pub mod timer;
pub mod workspace;

pub use accounting::{FocusSessionSink, ProjectStore, SessionOutcome, SessionRecorder};
pub use error::{AccountingError, ConfigError, CoreError, DatabaseError, TimerError};
pub use events::Event;
pub use project::{FocusSession, NewFocusSession, Project, SessionKind};
pub use storage::{Config, Database, KvStore, TimerStore};
pub use timer::{
    Clock, Completion, CompletionSource, ManualClock, SwitchDecision, SwitchGuard, SystemClock,
    Ticker, TimerController, TimerSnapshot, TimerState,
};
pub use workspace::FocusWorkspace;
