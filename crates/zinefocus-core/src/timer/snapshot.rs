//! Durable timer snapshot.
//!
//! The snapshot never stores a ticking counter. While running it records the
//! wall-clock anchor and the remaining seconds at that anchor; true remaining
//! time is derived on demand, which keeps restarts exact and avoids drift.
//!
//! All "trust the stored bytes" logic lives in [`TimerSnapshot::decode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MIN_DURATION_MIN: u32 = 1;
pub const MAX_DURATION_MIN: u32 = 120;
pub const DEFAULT_DURATION_MIN: u32 = 25;

/// Persisted timer state, sufficient to reconstruct remaining time after a restart.
///
/// Invariant: `remaining_secs_at_anchor <= duration_min * 60`, and
/// `anchor_started_at.is_some() == running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub running: bool,
    pub anchor_started_at: Option<DateTime<Utc>>,
    pub remaining_secs_at_anchor: u32,
    pub duration_min: u32,
}

/// Field values exactly as found in the key-value store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSnapshot {
    pub running: Option<String>,
    pub started_at_ms: Option<String>,
    pub remaining_secs: Option<String>,
    pub duration_min: Option<String>,
}

impl TimerSnapshot {
    /// Idle snapshot with a full countdown of `duration_min`.
    pub fn fresh(duration_min: u32) -> Self {
        let duration_min = valid_duration(duration_min).unwrap_or(DEFAULT_DURATION_MIN);
        Self {
            running: false,
            anchor_started_at: None,
            remaining_secs_at_anchor: duration_min * 60,
            duration_min,
        }
    }

    pub fn full_secs(&self) -> u32 {
        self.duration_min * 60
    }

    /// True remaining seconds at `now`. Never negative, never above the
    /// anchored value even if the wall clock moved backwards.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        match (self.running, self.anchor_started_at) {
            (true, Some(anchor)) => {
                let elapsed = now.signed_duration_since(anchor).num_seconds().max(0);
                let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
                self.remaining_secs_at_anchor.saturating_sub(elapsed)
            }
            _ => self.remaining_secs_at_anchor,
        }
    }

    /// Seconds of the configured duration already used up at `now`.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u32 {
        self.full_secs().saturating_sub(self.remaining_at(now))
    }

    /// Untouched since the last reset: idle with the full countdown left.
    pub fn is_fresh(&self) -> bool {
        !self.running && self.remaining_secs_at_anchor == self.full_secs()
    }

    pub fn encode(&self) -> RawSnapshot {
        RawSnapshot {
            running: Some(self.running.to_string()),
            started_at_ms: self
                .anchor_started_at
                .filter(|_| self.running)
                .map(|at| at.timestamp_millis().to_string()),
            remaining_secs: Some(self.remaining_secs_at_anchor.to_string()),
            duration_min: Some(self.duration_min.to_string()),
        }
    }

    /// Decode stored fields. Never fails: a missing field takes its default,
    /// an unreadable one takes its default and is logged, and inconsistent
    /// combinations are repaired until the invariant holds.
    pub fn decode(raw: &RawSnapshot, default_duration_min: u32) -> Self {
        let default_duration_min =
            valid_duration(default_duration_min).unwrap_or(DEFAULT_DURATION_MIN);

        let duration_min = field(&raw.duration_min, "duration", |s| {
            s.trim().parse::<u32>().ok().and_then(valid_duration)
        })
        .unwrap_or(default_duration_min);
        let full = duration_min * 60;

        let remaining = field(&raw.remaining_secs, "remaining", |s| s.trim().parse::<u32>().ok())
            .map(|secs| secs.min(full))
            .unwrap_or(full);

        let running = field(&raw.running, "running", |s| match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
        .unwrap_or(false);

        let anchor = field(&raw.started_at_ms, "start-time", |s| {
            s.trim()
                .parse::<i64>()
                .ok()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
        });

        match (running, anchor) {
            (true, Some(anchor)) => Self {
                running: true,
                anchor_started_at: Some(anchor),
                remaining_secs_at_anchor: remaining,
                duration_min,
            },
            (true, None) => {
                warn!("timer marked running without an anchor; treating as paused");
                Self {
                    running: false,
                    anchor_started_at: None,
                    remaining_secs_at_anchor: remaining,
                    duration_min,
                }
            }
            (false, _) => Self {
                running: false,
                anchor_started_at: None,
                remaining_secs_at_anchor: remaining,
                duration_min,
            },
        }
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::fresh(DEFAULT_DURATION_MIN)
    }
}

pub fn valid_duration(minutes: u32) -> Option<u32> {
    (MIN_DURATION_MIN..=MAX_DURATION_MIN)
        .contains(&minutes)
        .then_some(minutes)
}

fn field<T>(raw: &Option<String>, name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let value = raw.as_deref()?;
    let parsed = parse(value);
    if parsed.is_none() {
        warn!(field = name, value, "corrupt persisted timer field; using default");
    }
    parsed
}

/// `MM:SS`, minutes unbounded.
pub fn format_remaining(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn raw(running: &str, start: Option<&str>, remaining: &str, duration: &str) -> RawSnapshot {
        RawSnapshot {
            running: Some(running.into()),
            started_at_ms: start.map(Into::into),
            remaining_secs: Some(remaining.into()),
            duration_min: Some(duration.into()),
        }
    }

    #[test]
    fn empty_store_decodes_to_defaults() {
        let snap = TimerSnapshot::decode(&RawSnapshot::default(), 25);
        assert_eq!(snap, TimerSnapshot::fresh(25));
        assert_eq!(snap.remaining_secs_at_anchor, 1500);
    }

    #[test]
    fn running_snapshot_survives_encode_decode() {
        let anchor = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let snap = TimerSnapshot {
            running: true,
            anchor_started_at: Some(anchor),
            remaining_secs_at_anchor: 600,
            duration_min: 30,
        };
        assert_eq!(TimerSnapshot::decode(&snap.encode(), 25), snap);
    }

    #[test]
    fn garbage_fields_fall_back_individually() {
        let snap = TimerSnapshot::decode(&raw("yes", None, "abc", "45"), 25);
        assert!(!snap.running);
        assert_eq!(snap.duration_min, 45);
        assert_eq!(snap.remaining_secs_at_anchor, 45 * 60);
    }

    #[test]
    fn out_of_range_duration_uses_configured_default() {
        let snap = TimerSnapshot::decode(&raw("false", None, "100", "500"), 30);
        assert_eq!(snap.duration_min, 30);
        assert_eq!(snap.remaining_secs_at_anchor, 100);
    }

    #[test]
    fn remaining_is_clamped_to_full_duration() {
        let snap = TimerSnapshot::decode(&raw("false", None, "99999", "10"), 25);
        assert_eq!(snap.remaining_secs_at_anchor, 600);
    }

    #[test]
    fn running_without_anchor_is_paused() {
        let snap = TimerSnapshot::decode(&raw("true", Some("not-a-time"), "300", "25"), 25);
        assert!(!snap.running);
        assert_eq!(snap.anchor_started_at, None);
        assert_eq!(snap.remaining_secs_at_anchor, 300);
    }

    #[test]
    fn remaining_never_goes_negative_or_up() {
        let anchor = Utc::now();
        let snap = TimerSnapshot {
            running: true,
            anchor_started_at: Some(anchor),
            remaining_secs_at_anchor: 120,
            duration_min: 25,
        };
        assert_eq!(snap.remaining_at(anchor + Duration::seconds(30)), 90);
        assert_eq!(snap.remaining_at(anchor + Duration::hours(5)), 0);
        assert_eq!(snap.remaining_at(anchor - Duration::seconds(30)), 120);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(1500), "25:00");
        assert_eq!(format_remaining(61), "01:01");
        assert_eq!(format_remaining(7200), "120:00");
    }
}
