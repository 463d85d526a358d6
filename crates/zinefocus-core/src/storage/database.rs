//! SQLite-based local storage.
//!
//! Stands in for the hosted service the timer talks to:
//! - Projects and their cumulative focus minutes
//! - Focus session records
//! - Key-value store for per-user application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::data_dir;
use super::timer_store::KvStore;
use crate::accounting::{FocusSessionSink, ProjectStore};
use crate::error::{AccountingError, CoreError, DatabaseError};
use crate::project::{FocusSession, NewFocusSession, Project, SessionKind};

/// SQLite database for projects, focus sessions and key-value state.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database {
    /// Open the database at `~/.config/zinefocus/zinefocus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("zinefocus.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS projects (
                    id            TEXT PRIMARY KEY,
                    title         TEXT NOT NULL,
                    total_minutes INTEGER NOT NULL DEFAULT 0,
                    completed_at  TEXT,
                    created_at    TEXT NOT NULL,
                    updated_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS focus_sessions (
                    id           TEXT PRIMARY KEY,
                    project_id   TEXT NOT NULL REFERENCES projects(id),
                    user_id      TEXT NOT NULL,
                    duration     INTEGER NOT NULL,
                    session_type TEXT NOT NULL,
                    completed_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_focus_sessions_project ON focus_sessions(project_id);
                CREATE INDEX IF NOT EXISTS idx_focus_sessions_completed_at ON focus_sessions(completed_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Projects ─────────────────────────────────────────────────────

    pub fn create_project(&self, title: &str) -> Result<Project, DatabaseError> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            total_minutes: 0,
            completed_at: None,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO projects (id, title, total_minutes, completed_at, created_at, updated_at)
             VALUES (?1, ?2, 0, NULL, ?3, ?3)",
            params![project.id, project.title, now.to_rfc3339()],
        )?;
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        let project = self
            .conn
            .query_row(
                "SELECT id, title, total_minutes, completed_at, updated_at
                 FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()?;
        Ok(project)
    }

    /// All projects, active ones first, most recently updated first.
    pub fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, total_minutes, completed_at, updated_at
             FROM projects
             ORDER BY completed_at IS NOT NULL, updated_at DESC",
        )?;
        let projects = stmt
            .query_map([], row_to_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn finish_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE projects SET completed_at = ?2, updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;
        if changed == 0 {
            return Err(not_found("project", id));
        }
        self.get_project(id)?.ok_or_else(|| not_found("project", id))
    }

    /// Add `minutes` to the project's cumulative total.
    pub fn add_project_minutes(&self, id: &str, minutes: u32) -> Result<Project, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET total_minutes = total_minutes + ?2, updated_at = ?3
             WHERE id = ?1",
            params![id, minutes, Utc::now().to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(not_found("project", id));
        }
        self.get_project(id)?.ok_or_else(|| not_found("project", id))
    }

    // ── Focus sessions ───────────────────────────────────────────────

    pub fn insert_focus_session(
        &self,
        new: &NewFocusSession,
    ) -> Result<FocusSession, DatabaseError> {
        if self.get_project(&new.project_id)?.is_none() {
            return Err(not_found("project", &new.project_id));
        }
        let session = FocusSession {
            id: Uuid::new_v4().to_string(),
            project_id: new.project_id.clone(),
            user_id: new.user_id.clone(),
            duration_minutes: new.duration_minutes,
            session_kind: new.session_kind,
            completed_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO focus_sessions (id, project_id, user_id, duration, session_type, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.project_id,
                session.user_id,
                session.duration_minutes,
                session.session_kind.as_str(),
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(session)
    }

    /// Focus sessions, newest first, optionally for one project.
    pub fn list_focus_sessions(
        &self,
        project_id: Option<&str>,
    ) -> Result<Vec<FocusSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, user_id, duration, session_type, completed_at
             FROM focus_sessions
             WHERE ?1 IS NULL OR project_id = ?1
             ORDER BY completed_at DESC",
        )?;
        let sessions = stmt
            .query_map(params![project_id], row_to_session)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl KvStore for Database {
    fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Database::kv_get(self, key)
    }
    fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        Database::kv_set(self, key, value)
    }
    fn kv_remove(&self, key: &str) -> Result<(), DatabaseError> {
        Database::kv_remove(self, key)
    }
}

impl ProjectStore for Database {
    fn project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        self.get_project(id)
    }

    fn add_minutes(&self, id: &str, minutes: u32) -> Result<Project, AccountingError> {
        self.add_project_minutes(id, minutes)
            .map_err(|e| AccountingError::UpdateTotalFailed {
                project_id: id.to_string(),
                message: e.to_string(),
            })
    }
}

impl FocusSessionSink for Database {
    fn create_focus_session(&self, new: &NewFocusSession) -> Result<FocusSession, AccountingError> {
        self.insert_focus_session(new)
            .map_err(|e| AccountingError::CreateSessionFailed {
                project_id: new.project_id.clone(),
                message: e.to_string(),
            })
    }
}

fn not_found(entity: &'static str, id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    let completed_at = row
        .get::<_, Option<String>>(3)?
        .map(|s| parse_ts(3, &s))
        .transpose()?;
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        total_minutes: row.get(2)?,
        completed_at,
        updated_at: parse_ts(4, &row.get::<_, String>(4)?)?,
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<FocusSession> {
    let kind: String = row.get(4)?;
    let session_kind = SessionKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown session type: {kind}").into(),
        )
    })?;
    Ok(FocusSession {
        id: row.get(0)?,
        project_id: row.get(1)?,
        user_id: row.get(2)?,
        duration_minutes: row.get(3)?,
        session_kind,
        completed_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}
