//! Project switch guard.
//!
//! Changing the selected project while the countdown runs changes who gets
//! credited at the next completion, so it needs an explicit confirmation.
//! The guard only arbitrates; it never touches timer state.

use crate::project::Project;

/// Result of asking to select a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchDecision {
    /// Select this project now.
    Proceed(Project),
    /// A confirmation prompt is now open for this project.
    Pending(Project),
    /// Another prompt is already open; the request was dropped.
    Ignored,
}

#[derive(Debug, Default)]
pub struct SwitchGuard {
    pending: Option<Project>,
}

impl SwitchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arbitrate selecting `requested` given the running state and the
    /// current selection. Nothing is guarded while the timer is stopped, so
    /// a leftover prompt is dropped.
    pub fn request(
        &mut self,
        requested: Project,
        running: bool,
        current: Option<&Project>,
    ) -> SwitchDecision {
        if !running {
            self.pending = None;
            return SwitchDecision::Proceed(requested);
        }
        if self.pending.is_some() {
            return SwitchDecision::Ignored;
        }
        match current {
            Some(current) if running && current.id != requested.id => {
                self.pending = Some(requested.clone());
                SwitchDecision::Pending(requested)
            }
            _ => SwitchDecision::Proceed(requested),
        }
    }

    pub fn pending(&self) -> Option<&Project> {
        self.pending.as_ref()
    }

    /// Accept the pending switch. `None` if no prompt is open.
    pub fn confirm(&mut self) -> Option<Project> {
        self.pending.take()
    }

    /// Dismiss the prompt, keeping the current selection.
    pub fn cancel(&mut self) -> Option<Project> {
        self.pending.take()
    }

    /// Reopen a prompt that was persisted by an earlier process.
    pub fn reopen(&mut self, requested: Project) {
        self.pending = Some(requested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(id: &str) -> Project {
        Project {
            id: id.into(),
            title: format!("Project {id}"),
            total_minutes: 0,
            completed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn idle_switch_is_unguarded() {
        let mut guard = SwitchGuard::new();
        let b = project("b");
        let decision = guard.request(b.clone(), false, Some(&project("a")));
        assert_eq!(decision, SwitchDecision::Proceed(b));
        assert!(guard.pending().is_none());
    }

    #[test]
    fn reselecting_current_project_is_unguarded() {
        let mut guard = SwitchGuard::new();
        let decision = guard.request(project("a"), true, Some(&project("a")));
        assert!(matches!(decision, SwitchDecision::Proceed(_)));
    }

    #[test]
    fn first_selection_while_running_is_unguarded() {
        let mut guard = SwitchGuard::new();
        let decision = guard.request(project("a"), true, None);
        assert!(matches!(decision, SwitchDecision::Proceed(_)));
    }

    #[test]
    fn running_switch_waits_for_confirmation() {
        let mut guard = SwitchGuard::new();
        let b = project("b");
        let decision = guard.request(b.clone(), true, Some(&project("a")));
        assert_eq!(decision, SwitchDecision::Pending(b));
        assert_eq!(guard.pending().map(|p| p.id.as_str()), Some("b"));

        assert_eq!(guard.confirm().map(|p| p.id), Some("b".to_string()));
        assert!(guard.pending().is_none());
        assert!(guard.confirm().is_none());
    }

    #[test]
    fn open_prompt_ignores_further_requests() {
        let mut guard = SwitchGuard::new();
        guard.request(project("b"), true, Some(&project("a")));
        let decision = guard.request(project("c"), true, Some(&project("a")));
        assert_eq!(decision, SwitchDecision::Ignored);

        assert_eq!(guard.cancel().map(|p| p.id), Some("b".to_string()));
        assert!(guard.pending().is_none());
    }

    #[test]
    fn stopped_timer_drops_leftover_prompt() {
        let mut guard = SwitchGuard::new();
        guard.request(project("b"), true, Some(&project("a")));

        let decision = guard.request(project("c"), false, Some(&project("a")));
        assert!(matches!(decision, SwitchDecision::Proceed(p) if p.id == "c"));
        assert!(guard.pending().is_none());
    }
}
