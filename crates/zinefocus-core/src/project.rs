//! Records owned by the hosted project service.
//!
//! The timer never owns these: it reads a [`Project`] to know whom to credit
//! and asks the service to create a [`FocusSession`] when an interval ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's project, as cached by the workspace for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub total_minutes: u32,
    /// `None` while the project is still active.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Value of the `sessionKind` column. Only focus intervals are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Focus,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "focus" => Some(SessionKind::Focus),
            _ => None,
        }
    }
}

/// Payload of the focus-session creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFocusSession {
    pub project_id: String,
    pub duration_minutes: u32,
    pub session_kind: SessionKind,
    pub user_id: String,
}

/// A created focus session. `completed_at` is assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub duration_minutes: u32,
    pub session_kind: SessionKind,
    pub completed_at: DateTime<Utc>,
}
