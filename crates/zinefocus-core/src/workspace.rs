//! Per-user focus workspace.
//!
//! Owns the timer controller, the switch guard and the current project
//! selection for one user, and routes every completion through the session
//! recorder. Construct it once per user with [`FocusWorkspace::open`] and
//! hand it by reference to whatever renders it.
//!
//! Operations queue [`Event`]s; callers drain them with
//! [`FocusWorkspace::take_events`].

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::accounting::{FocusSessionSink, ProjectStore, SessionRecorder};
use crate::error::{CoreError, DatabaseError, TimerError};
use crate::events::Event;
use crate::project::Project;
use crate::storage::{Config, KvStore, TimerStore};
use crate::timer::{
    Clock, Completion, SwitchDecision, SwitchGuard, SystemClock, Ticker, TimerController,
    TimerState,
};

#[derive(Debug)]
pub struct FocusWorkspace<B, C = SystemClock> {
    timer: TimerController<B, C>,
    recorder: SessionRecorder<B>,
    guard: SwitchGuard,
    selected: Option<Project>,
    events: Vec<Event>,
}

impl<B, C> FocusWorkspace<B, C>
where
    B: KvStore + ProjectStore + FocusSessionSink + Clone,
    C: Clock,
{
    /// Restore the user's workspace and reconcile the timer.
    ///
    /// A countdown that ran out while the application was closed is
    /// completed and recorded here, before any user action.
    pub fn open(backend: B, clock: C, ticker: Ticker, config: &Config) -> Self {
        let user_id = config.user_id.clone();
        let store = TimerStore::new(
            backend.clone(),
            user_id.clone(),
            config.timer.default_duration_min,
        );
        let mut events = Vec::new();

        let selected = match store.read_selected() {
            Some(cached) => refresh_selection(&backend, &store, cached, clock.now(), &mut events),
            None => None,
        };

        let (timer, catch_up) = TimerController::restore(store, clock, ticker);
        let mut workspace = Self {
            timer,
            recorder: SessionRecorder::new(backend, user_id),
            guard: SwitchGuard::new(),
            selected,
            events,
        };

        if let Some(completion) = catch_up {
            workspace.settle(completion);
        }
        workspace.restore_pending_switch();
        workspace
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        self.timer.display()
    }

    pub fn selected(&self) -> Option<&Project> {
        self.selected.as_ref()
    }

    /// Project awaiting switch confirmation, if a prompt is open.
    pub fn pending_switch(&self) -> Option<&Project> {
        self.guard.pending()
    }

    pub fn timer(&self) -> &TimerController<B, C> {
        &self.timer
    }

    pub fn status(&self) -> Event {
        Event::StateSnapshot {
            state: self.timer.state(),
            remaining_secs: self.timer.remaining_secs(),
            display: self.timer.display(),
            duration_min: self.timer.duration_min(),
            project_id: self.selected.as_ref().map(|p| p.id.clone()),
            project_title: self.selected.as_ref().map(|p| p.title.clone()),
            pending_switch: self.guard.pending().map(|p| p.id.clone()),
            at: self.timer.now(),
        }
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Evaluate the countdown; completes and records it if it ran out.
    pub fn tick(&mut self) {
        if let Some(completion) = self.timer.tick() {
            self.settle(completion);
        }
    }

    pub fn start(&mut self) -> Result<(), TimerError> {
        if let Some(event) = self.timer.start(self.selected.as_ref())? {
            self.events.push(event);
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.tick();
        if let Some(event) = self.timer.pause() {
            self.events.push(event);
        }
        self.close_stale_switch();
    }

    pub fn reset(&mut self) {
        self.tick();
        let event = self.timer.reset();
        self.events.push(event);
        self.close_stale_switch();
    }

    /// End the current session early and record the time used.
    pub fn complete_now(&mut self) {
        if let Some(completion) = self.timer.tick() {
            self.settle(completion);
            return;
        }
        let completion = self.timer.complete_now();
        self.settle(completion);
    }

    pub fn set_duration(&mut self, minutes: u32) -> Result<(), TimerError> {
        self.tick();
        let event = self.timer.set_duration(minutes)?;
        self.events.push(event);
        Ok(())
    }

    /// Ask to credit `project` from now on. While the timer runs on another
    /// project this opens a confirmation prompt instead.
    pub fn select_project(&mut self, project: Project) -> SwitchDecision {
        self.tick();
        let decision = self
            .guard
            .request(project, self.timer.is_running(), self.selected.as_ref());
        match &decision {
            SwitchDecision::Proceed(project) => self.apply_selection(project.clone()),
            SwitchDecision::Pending(requested) => {
                let current = self.selected.as_ref().map(|p| p.id.clone()).unwrap_or_default();
                info!(from = %current, to = %requested.id, "project switch awaiting confirmation");
                self.timer.store().write_pending_switch(Some(&requested.id));
                self.events.push(Event::SwitchPending {
                    current_project_id: current,
                    requested_project_id: requested.id.clone(),
                    at: self.timer.now(),
                });
            }
            SwitchDecision::Ignored => debug!("switch prompt already open; selection ignored"),
        }
        decision
    }

    /// Look the project up by id, then [`select_project`](Self::select_project).
    pub fn select_project_by_id(&mut self, id: &str) -> Result<SwitchDecision, CoreError> {
        let project = self
            .recorder
            .backend()
            .project(id)?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "project",
                id: id.to_string(),
            })?;
        Ok(self.select_project(project))
    }

    /// Accept the pending switch. The countdown is left exactly as it was;
    /// only the project credited at the next completion changes.
    pub fn confirm_switch(&mut self) -> Option<&Project> {
        let project = self.guard.confirm()?;
        self.timer.store().write_pending_switch(None);
        self.apply_selection(project);
        self.selected.as_ref()
    }

    /// Dismiss the pending switch and keep crediting the current project.
    pub fn cancel_switch(&mut self) {
        self.close_switch();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// A prompt only guards a running countdown; once it stops the prompt
    /// closes as if cancelled.
    fn close_stale_switch(&mut self) {
        if !self.timer.is_running() && self.guard.pending().is_some() {
            debug!("timer stopped; closing switch prompt");
            self.close_switch();
        }
    }

    fn close_switch(&mut self) {
        if self.guard.cancel().is_none() {
            return;
        }
        self.timer.store().write_pending_switch(None);
        if let Some(current) = &self.selected {
            self.events.push(Event::SwitchCancelled {
                project_id: current.id.clone(),
                at: self.timer.now(),
            });
        }
    }

    fn apply_selection(&mut self, project: Project) {
        self.timer.store().write_selected(Some(&project));
        self.events.push(Event::ProjectSelected {
            project_id: project.id.clone(),
            title: project.title.clone(),
            at: self.timer.now(),
        });
        self.selected = Some(project);
    }

    /// Credit a completion to whichever project is selected now.
    fn settle(&mut self, completion: Completion) {
        self.events.push(completion.to_event());
        match self.selected.as_mut() {
            Some(project) => {
                let outcome = self.recorder.complete_session(completion, project);
                self.timer.store().write_selected(Some(&*project));
                self.events.push(outcome.to_event());
            }
            None => warn!(
                elapsed_secs = completion.elapsed_secs(),
                "no project selected; completed interval not recorded"
            ),
        }
        self.close_stale_switch();
    }

    fn restore_pending_switch(&mut self) {
        let store = self.timer.store();
        let Some(id) = store.read_pending_switch() else {
            return;
        };
        let requested = match self.recorder.backend().project(&id) {
            Ok(project) => project,
            Err(e) => {
                warn!(error = %e, "failed to look up pending switch target");
                None
            }
        };

        let still_guarded = self.timer.is_running()
            && self.selected.as_ref().is_some_and(|current| current.id != id);
        match requested {
            Some(project) if still_guarded => self.guard.reopen(project),
            _ => store.write_pending_switch(None),
        }
    }
}

/// Replace the cached selection with the service's current record.
fn refresh_selection<B: ProjectStore, K: KvStore>(
    backend: &B,
    store: &TimerStore<K>,
    cached: Project,
    at: DateTime<Utc>,
    events: &mut Vec<Event>,
) -> Option<Project> {
    match backend.project(&cached.id) {
        Ok(Some(current)) => {
            store.write_selected(Some(&current));
            Some(current)
        }
        Ok(None) => {
            warn!(project_id = %cached.id, "selected project no longer exists; clearing selection");
            store.write_selected(None);
            events.push(Event::ProjectCleared {
                project_id: cached.id,
                at,
            });
            None
        }
        Err(e) => {
            warn!(error = %e, "project lookup failed; using cached selection");
            Some(cached)
        }
    }
}
