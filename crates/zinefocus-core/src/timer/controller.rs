//! Timer controller.
//!
//! A wall-clock-anchored countdown. It does not count down in memory: every
//! query derives remaining time from the persisted anchor, so the same code
//! answers a live tick and a reconciliation after the process was closed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Completed -> Idle
//!   ^________________ reset (any state) _______________|
//! ```
//!
//! `Completed` is never a resting state. The controller commits a fresh idle
//! snapshot to the store first and only then hands out a [`Completion`],
//! which is the sole input the session recorder accepts.
//!
//! ## Usage
//!
//! ```ignore
//! let (mut timer, catch_up) = TimerController::restore(store, SystemClock, ticker);
//! timer.start(Some(&project))?;
//! // On every tick:
//! if let Some(done) = timer.tick() { recorder.complete_session(done, &mut project); }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::snapshot::{
    format_remaining, valid_duration, TimerSnapshot, MAX_DURATION_MIN, MIN_DURATION_MIN,
};
use super::ticker::Ticker;
use crate::error::TimerError;
use crate::events::Event;
use crate::project::Project;
use crate::storage::{KvStore, TimerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Not running, full countdown left. A pause before the first whole
    /// second has elapsed lands here too.
    Idle,
    Running,
    /// Not running, part of the countdown used.
    Paused,
}

/// How a completion was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSource {
    /// A live tick saw the countdown reach zero.
    Tick,
    /// The countdown reached zero while the application was closed.
    CatchUp,
    /// The user ended the session early.
    Manual,
}

/// A finished interval. Only the controller can build one, and only after
/// the reset to idle has been written to the store.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a completion must be handed to the session recorder"]
pub struct Completion {
    elapsed_secs: u32,
    source: CompletionSource,
    at: DateTime<Utc>,
}

impl Completion {
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_secs / 60
    }

    pub fn source(&self) -> CompletionSource {
        self.source
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn to_event(&self) -> Event {
        Event::TimerCompleted {
            elapsed_secs: self.elapsed_secs,
            source: self.source,
            at: self.at,
        }
    }
}

/// Core timer state machine for one user.
#[derive(Debug)]
pub struct TimerController<K, C = SystemClock> {
    store: TimerStore<K>,
    clock: C,
    snapshot: TimerSnapshot,
    ticker: Ticker,
}

impl<K: KvStore, C: Clock> TimerController<K, C> {
    /// Load the persisted snapshot and reconcile it against the wall clock.
    ///
    /// This is the one-time startup tick: if the countdown ran out while the
    /// application was closed, the catch-up completion is returned here and
    /// the timer is already idle.
    pub fn restore(store: TimerStore<K>, clock: C, ticker: Ticker) -> (Self, Option<Completion>) {
        let snapshot = store.read();
        let mut timer = Self {
            store,
            clock,
            snapshot,
            ticker,
        };

        if !timer.snapshot.running {
            return (timer, None);
        }

        let now = timer.clock.now();
        if timer.snapshot.anchor_started_at.is_some_and(|anchor| anchor > now) {
            warn!("timer anchor is in the future; re-anchoring to now");
            timer.snapshot.anchor_started_at = Some(now);
            timer.commit();
        }
        if timer.snapshot.remaining_at(now) == 0 {
            let elapsed = timer.snapshot.elapsed_at(now);
            info!(elapsed_secs = elapsed, "countdown expired while closed");
            let completion = timer.finish(elapsed, CompletionSource::CatchUp);
            return (timer, Some(completion));
        }

        debug!(
            remaining_secs = timer.snapshot.remaining_at(now),
            "resuming running timer"
        );
        timer.ticker.schedule();
        (timer, None)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.snapshot.running {
            TimerState::Running
        } else if self.snapshot.is_fresh() {
            TimerState::Idle
        } else {
            TimerState::Paused
        }
    }

    pub fn is_running(&self) -> bool {
        self.snapshot.running
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn duration_min(&self) -> u32 {
        self.snapshot.duration_min
    }

    pub fn remaining_secs(&self) -> u32 {
        self.snapshot.remaining_at(self.clock.now())
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs())
    }

    pub fn user_id(&self) -> &str {
        self.store.user_id()
    }

    pub fn store(&self) -> &TimerStore<K> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn tick_scheduled(&self) -> bool {
        self.ticker.is_scheduled()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the countdown for `project`.
    ///
    /// Keeps whatever remaining time is stored, so a paused session continues.
    /// Returns `Ok(None)` if the timer is already running.
    pub fn start(&mut self, project: Option<&Project>) -> Result<Option<Event>, TimerError> {
        let project = project.ok_or(TimerError::NoProjectSelected)?;
        if self.snapshot.running {
            return Ok(None);
        }

        let now = self.clock.now();
        self.snapshot.running = true;
        self.snapshot.anchor_started_at = Some(now);
        self.commit();
        self.ticker.schedule();

        info!(
            project_id = %project.id,
            remaining_secs = self.snapshot.remaining_secs_at_anchor,
            "timer started"
        );
        Ok(Some(Event::TimerStarted {
            project_id: project.id.clone(),
            remaining_secs: self.snapshot.remaining_secs_at_anchor,
            at: now,
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.snapshot.running {
            return None;
        }

        let now = self.clock.now();
        self.ticker.cancel();
        self.snapshot.remaining_secs_at_anchor = self.snapshot.remaining_at(now);
        self.snapshot.running = false;
        self.snapshot.anchor_started_at = None;
        self.commit();

        info!(remaining_secs = self.snapshot.remaining_secs_at_anchor, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.snapshot.remaining_secs_at_anchor,
            at: now,
        })
    }

    pub fn reset(&mut self) -> Event {
        self.ticker.cancel();
        self.snapshot = TimerSnapshot::fresh(self.snapshot.duration_min);
        self.commit();

        info!("timer reset");
        Event::TimerReset {
            remaining_secs: self.snapshot.remaining_secs_at_anchor,
            at: self.clock.now(),
        }
    }

    /// Change the session length.
    ///
    /// An untouched idle timer picks up the new length immediately; a paused
    /// session keeps its remaining time (clamped to the new length).
    pub fn set_duration(&mut self, minutes: u32) -> Result<Event, TimerError> {
        let minutes = valid_duration(minutes).ok_or(TimerError::DurationOutOfRange {
            minutes,
            min: MIN_DURATION_MIN,
            max: MAX_DURATION_MIN,
        })?;
        if self.snapshot.running {
            return Err(TimerError::DurationLocked);
        }

        let was_fresh = self.snapshot.is_fresh();
        self.snapshot.duration_min = minutes;
        let full = self.snapshot.full_secs();
        if was_fresh {
            self.snapshot.remaining_secs_at_anchor = full;
        } else {
            self.snapshot.remaining_secs_at_anchor =
                self.snapshot.remaining_secs_at_anchor.min(full);
        }
        self.commit();

        debug!(duration_min = minutes, "duration changed");
        Ok(Event::DurationChanged {
            duration_min: minutes,
            remaining_secs: self.snapshot.remaining_secs_at_anchor,
            at: self.clock.now(),
        })
    }

    /// Evaluate the countdown. Returns a completion exactly once per run.
    pub fn tick(&mut self) -> Option<Completion> {
        if !self.snapshot.running {
            return None;
        }

        let now = self.clock.now();
        if self.snapshot.remaining_at(now) > 0 {
            return None;
        }

        let elapsed = self.snapshot.elapsed_at(now);
        Some(self.finish(elapsed, CompletionSource::Tick))
    }

    /// End the session now, crediting the time used so far.
    pub fn complete_now(&mut self) -> Completion {
        let elapsed = self.snapshot.elapsed_at(self.clock.now());
        self.finish(elapsed, CompletionSource::Manual)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Reset to a fresh idle snapshot and persist it before anyone sees
    /// the completion.
    fn finish(&mut self, elapsed_secs: u32, source: CompletionSource) -> Completion {
        self.ticker.cancel();
        self.snapshot = TimerSnapshot::fresh(self.snapshot.duration_min);
        self.commit();

        let completion = Completion {
            elapsed_secs,
            source,
            at: self.clock.now(),
        };
        info!(elapsed_secs, ?source, "timer completed");
        completion
    }

    fn commit(&self) {
        self.store.write(&self.snapshot);
    }
}
