use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::FocusSession;
use crate::timer::{CompletionSource, TimerState};

/// Every state change in the workspace produces an Event.
/// The CLI prints them; a GUI would render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        project_id: String,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    DurationChanged {
        duration_min: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// The countdown ended (or was ended) and the timer is idle again.
    TimerCompleted {
        elapsed_secs: u32,
        source: CompletionSource,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        session: FocusSession,
        project_total_minutes: u32,
        message: String,
    },
    /// Interval shorter than a minute; nothing was recorded.
    SessionTooShort {
        elapsed_secs: u32,
        message: String,
    },
    AccountingFailed {
        message: String,
    },
    ProjectSelected {
        project_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    ProjectCleared {
        project_id: String,
        at: DateTime<Utc>,
    },
    /// A switch away from the running project awaits confirmation.
    SwitchPending {
        current_project_id: String,
        requested_project_id: String,
        at: DateTime<Utc>,
    },
    SwitchCancelled {
        project_id: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        remaining_secs: u32,
        display: String,
        duration_min: u32,
        project_id: Option<String>,
        project_title: Option<String>,
        pending_switch: Option<String>,
        at: DateTime<Utc>,
    },
}
