//! Session accounting against the project service.

mod recorder;

pub use recorder::{SessionOutcome, SessionRecorder};

use crate::error::{AccountingError, DatabaseError};
use crate::project::{FocusSession, NewFocusSession, Project};

/// Project lookup and update.
pub trait ProjectStore {
    fn project(&self, id: &str) -> Result<Option<Project>, DatabaseError>;

    /// Increment the project's cumulative total. Atomic per call.
    fn add_minutes(&self, id: &str, minutes: u32) -> Result<Project, AccountingError>;
}

/// Focus session creation.
pub trait FocusSessionSink {
    fn create_focus_session(&self, new: &NewFocusSession) -> Result<FocusSession, AccountingError>;
}

impl<T: ProjectStore + ?Sized> ProjectStore for &T {
    fn project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        (**self).project(id)
    }
    fn add_minutes(&self, id: &str, minutes: u32) -> Result<Project, AccountingError> {
        (**self).add_minutes(id, minutes)
    }
}

impl<T: FocusSessionSink + ?Sized> FocusSessionSink for &T {
    fn create_focus_session(&self, new: &NewFocusSession) -> Result<FocusSession, AccountingError> {
        (**self).create_focus_session(new)
    }
}
