//! Cancellable once-per-interval tick schedule.
//!
//! The spawned task never touches timer state. It only posts a [`Tick`] to
//! the owner's channel, so every evaluation still runs on the owner's event
//! loop. Without a tokio runtime, or for a detached ticker, scheduling is a
//! no-op and the owner evaluates ticks on demand.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

#[derive(Debug)]
pub struct Ticker {
    tx: Option<UnboundedSender<Tick>>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// A ticker wired to a channel; the receiver belongs to the event loop.
    pub fn new(period: Duration) -> (Self, UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            tx: Some(tx),
            period,
            handle: None,
        };
        (ticker, rx)
    }

    /// A ticker that never fires.
    pub fn detached() -> Self {
        Self {
            tx: None,
            period: DEFAULT_TICK_INTERVAL,
            handle: None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start ticking unless already scheduled.
    pub fn schedule(&mut self) {
        if self.is_scheduled() {
            return;
        }
        let Some(tx) = self.tx.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no tokio runtime; ticks are evaluated on demand");
            return;
        };

        let period = self.period;
        self.handle = Some(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Tick).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
