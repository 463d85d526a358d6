//! Per-user persisted timer state.
//!
//! Each snapshot field lives under its own key in the user's namespace.
//! There is no transaction across the keys: a crash between two writes can
//! leave a stale combination, which [`TimerSnapshot::decode`] repairs on the
//! next read. Reads never fail and writes are best-effort.

use tracing::warn;

use crate::error::DatabaseError;
use crate::project::Project;
use crate::timer::{RawSnapshot, TimerSnapshot};

/// Generic string key-value persistence.
pub trait KvStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn kv_remove(&self, key: &str) -> Result<(), DatabaseError>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        (**self).kv_get(key)
    }
    fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        (**self).kv_set(key, value)
    }
    fn kv_remove(&self, key: &str) -> Result<(), DatabaseError> {
        (**self).kv_remove(key)
    }
}

#[derive(Debug)]
pub struct TimerStore<K> {
    kv: K,
    user_id: String,
    default_duration_min: u32,
}

impl<K: KvStore> TimerStore<K> {
    pub fn new(kv: K, user_id: impl Into<String>, default_duration_min: u32) -> Self {
        Self {
            kv,
            user_id: user_id.into(),
            default_duration_min,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn key(&self, name: &str) -> String {
        format!("{name}-{}", self.user_id)
    }

    fn get(&self, name: &str) -> Option<String> {
        let key = self.key(name);
        match self.kv.kv_get(&key) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "failed to read persisted value");
                None
            }
        }
    }

    fn put(&self, name: &str, value: Option<&str>) {
        let key = self.key(name);
        let result = match value {
            Some(value) => self.kv.kv_set(&key, value),
            None => self.kv.kv_remove(&key),
        };
        if let Err(e) = result {
            warn!(%key, error = %e, "failed to persist value");
        }
    }

    /// Read the snapshot; defaults for anything missing or unreadable.
    pub fn read(&self) -> TimerSnapshot {
        let raw = RawSnapshot {
            running: self.get("timer-running"),
            started_at_ms: self.get("timer-start-time"),
            remaining_secs: self.get("timer-time"),
            duration_min: self.get("timer-duration"),
        };
        TimerSnapshot::decode(&raw, self.default_duration_min)
    }

    pub fn write(&self, snapshot: &TimerSnapshot) {
        let raw = snapshot.encode();
        self.put("timer-running", raw.running.as_deref());
        self.put("timer-start-time", raw.started_at_ms.as_deref());
        self.put("timer-time", raw.remaining_secs.as_deref());
        self.put("timer-duration", raw.duration_min.as_deref());
    }

    /// The persisted selection pointer. Unreadable JSON means no selection.
    pub fn read_selected(&self) -> Option<Project> {
        let json = self.get("selected-project")?;
        match serde_json::from_str(&json) {
            Ok(project) => Some(project),
            Err(e) => {
                warn!(error = %e, "corrupt selected project; clearing selection");
                None
            }
        }
    }

    pub fn write_selected(&self, project: Option<&Project>) {
        match project.map(serde_json::to_string).transpose() {
            Ok(json) => self.put("selected-project", json.as_deref()),
            Err(e) => warn!(error = %e, "failed to encode selected project"),
        }
    }

    pub fn read_pending_switch(&self) -> Option<String> {
        self.get("pending-switch")
    }

    pub fn write_pending_switch(&self, project_id: Option<&str>) {
        self.put("pending-switch", project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Utc;

    #[test]
    fn snapshot_is_scoped_per_user() {
        let db = Database::open_memory().unwrap();
        let alice = TimerStore::new(&db, "alice", 25);
        let bob = TimerStore::new(&db, "bob", 25);

        let mut snap = TimerSnapshot::fresh(40);
        snap.remaining_secs_at_anchor = 100;
        alice.write(&snap);

        assert_eq!(alice.read(), snap);
        assert_eq!(bob.read(), TimerSnapshot::fresh(25));
    }

    #[test]
    fn uses_per_field_keys() {
        let db = Database::open_memory().unwrap();
        let store = TimerStore::new(&db, "u1", 25);
        let anchor = Utc::now();
        store.write(&TimerSnapshot {
            running: true,
            anchor_started_at: Some(anchor),
            remaining_secs_at_anchor: 900,
            duration_min: 25,
        });

        assert_eq!(db.kv_get("timer-running-u1").unwrap().as_deref(), Some("true"));
        assert_eq!(db.kv_get("timer-time-u1").unwrap().as_deref(), Some("900"));
        assert_eq!(
            db.kv_get("timer-start-time-u1").unwrap(),
            Some(anchor.timestamp_millis().to_string())
        );
    }

    #[test]
    fn stopping_removes_the_anchor_key() {
        let db = Database::open_memory().unwrap();
        let store = TimerStore::new(&db, "u1", 25);
        store.write(&TimerSnapshot {
            running: true,
            anchor_started_at: Some(Utc::now()),
            remaining_secs_at_anchor: 900,
            duration_min: 25,
        });
        store.write(&TimerSnapshot::fresh(25));
        assert!(db.kv_get("timer-start-time-u1").unwrap().is_none());
    }

    #[test]
    fn corrupt_fields_read_as_defaults() {
        let db = Database::open_memory().unwrap();
        db.kv_set("timer-running-u1", "maybe").unwrap();
        db.kv_set("timer-time-u1", "-5").unwrap();
        db.kv_set("timer-duration-u1", "{}").unwrap();

        let store = TimerStore::new(&db, "u1", 30);
        assert_eq!(store.read(), TimerSnapshot::fresh(30));
    }

    #[test]
    fn selected_project_roundtrips_and_tolerates_garbage() {
        let db = Database::open_memory().unwrap();
        let store = TimerStore::new(&db, "u1", 25);
        assert!(store.read_selected().is_none());

        let project = Project {
            id: "p1".into(),
            title: "Collage".into(),
            total_minutes: 75,
            completed_at: None,
            updated_at: Utc::now(),
        };
        store.write_selected(Some(&project));
        assert_eq!(store.read_selected(), Some(project));

        db.kv_set("selected-project-u1", "{not json").unwrap();
        assert!(store.read_selected().is_none());

        store.write_selected(None);
        assert!(db.kv_get("selected-project-u1").unwrap().is_none());
    }
}
