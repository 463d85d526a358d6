mod clock;
mod controller;
mod guard;
mod snapshot;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Completion, CompletionSource, TimerController, TimerState};
pub use guard::{SwitchDecision, SwitchGuard};
pub use snapshot::{
    format_remaining, valid_duration, RawSnapshot, TimerSnapshot, DEFAULT_DURATION_MIN,
    MAX_DURATION_MIN, MIN_DURATION_MIN,
};
pub use ticker::{Tick, Ticker, DEFAULT_TICK_INTERVAL};
