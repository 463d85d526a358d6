//! Session recorder.
//!
//! Consumes a [`Completion`] from the timer and turns it into at most one
//! focus session record. The timer has already reset by the time a
//! completion exists, so nothing here can un-complete it: a failed write is
//! reported and the time is simply not accounted.

use tracing::{info, warn};

use super::{FocusSessionSink, ProjectStore};
use crate::error::AccountingError;
use crate::events::Event;
use crate::project::{FocusSession, NewFocusSession, Project, SessionKind};
use crate::timer::Completion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Less than a whole minute; nothing recorded.
    TooShort { elapsed_secs: u32 },
    Recorded {
        session: FocusSession,
        project_total_minutes: u32,
    },
    Failed {
        elapsed_minutes: u32,
        error: AccountingError,
    },
}

impl SessionOutcome {
    /// Notice shown to the user.
    pub fn message(&self) -> String {
        match self {
            SessionOutcome::TooShort { .. } => "Session completed!".to_string(),
            SessionOutcome::Recorded { session, .. } => format!(
                "Great work! You focused for {} minutes.",
                session.duration_minutes
            ),
            SessionOutcome::Failed { error, .. } => error.to_string(),
        }
    }

    pub fn to_event(&self) -> Event {
        match self {
            SessionOutcome::TooShort { elapsed_secs } => Event::SessionTooShort {
                elapsed_secs: *elapsed_secs,
                message: self.message(),
            },
            SessionOutcome::Recorded {
                session,
                project_total_minutes,
            } => Event::SessionRecorded {
                session: session.clone(),
                project_total_minutes: *project_total_minutes,
                message: self.message(),
            },
            SessionOutcome::Failed { .. } => Event::AccountingFailed {
                message: self.message(),
            },
        }
    }
}

#[derive(Debug)]
pub struct SessionRecorder<B> {
    backend: B,
    user_id: String,
}

impl<B: ProjectStore + FocusSessionSink> SessionRecorder<B> {
    pub fn new(backend: B, user_id: impl Into<String>) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Record `completion` against `project`, updating the cached project.
    ///
    /// Makes at most one creation call. On success the cached total is
    /// incremented right away, then the service total is updated.
    pub fn complete_session(
        &self,
        completion: Completion,
        project: &mut Project,
    ) -> SessionOutcome {
        let elapsed_minutes = completion.elapsed_minutes();
        if elapsed_minutes < 1 {
            info!(
                elapsed_secs = completion.elapsed_secs(),
                "session under a minute; not recorded"
            );
            return SessionOutcome::TooShort {
                elapsed_secs: completion.elapsed_secs(),
            };
        }

        let new = NewFocusSession {
            project_id: project.id.clone(),
            duration_minutes: elapsed_minutes,
            session_kind: SessionKind::Focus,
            user_id: self.user_id.clone(),
        };
        let session = match self.backend.create_focus_session(&new) {
            Ok(session) => session,
            Err(error) => {
                warn!(%error, "focus session not recorded");
                return SessionOutcome::Failed {
                    elapsed_minutes,
                    error,
                };
            }
        };

        project.total_minutes += elapsed_minutes;

        match self.backend.add_minutes(&project.id, elapsed_minutes) {
            Ok(updated) => {
                project.total_minutes = updated.total_minutes;
                project.updated_at = updated.updated_at;
                info!(
                    project_id = %project.id,
                    minutes = elapsed_minutes,
                    total = project.total_minutes,
                    "focus session recorded"
                );
                SessionOutcome::Recorded {
                    session,
                    project_total_minutes: project.total_minutes,
                }
            }
            Err(error) => {
                warn!(%error, session_id = %session.id, "project total not updated");
                SessionOutcome::Failed {
                    elapsed_minutes,
                    error,
                }
            }
        }
    }
}
