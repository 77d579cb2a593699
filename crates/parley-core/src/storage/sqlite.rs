//! SQLite snapshot store
//!
//! Normalised tables for patterns, associations, context and events. A save
//! replaces every row inside one transaction, so readers only ever observe a
//! complete snapshot.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::migrations::apply_migrations;
use super::{Result, Snapshot, SnapshotStore, StorageError, SNAPSHOT_VERSION};
use crate::associations::EdgeMap;
use crate::history::{ContextEntry, Event, EventKind};
use crate::patterns::Pattern;

/// Default database file name inside a data directory
pub const DEFAULT_SQLITE_FILE: &str = "parley.db";

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteSnapshotStore {
    /// Apply PRAGMAs to a fresh connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (or create) a database; `None` uses the platform data directory
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let data_dir = super::default_data_dir()?;
                std::fs::create_dir_all(&data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(&data_dir, perms);
                }
                data_dir.join(DEFAULT_SQLITE_FILE)
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        Self::configure_connection(&conn)?;
        apply_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn)?;
        apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write_all(tx: &Transaction<'_>, snapshot: &Snapshot) -> Result<()> {
        tx.execute_batch(
            "DELETE FROM patterns;
             DELETE FROM associations;
             DELETE FROM context_entries;
             DELETE FROM events;
             DELETE FROM snapshot_meta;",
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO patterns (id, sequence, question, signature, responses, confidence,
                    contributors, used_count, success_rate, learned_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for pattern in snapshot.patterns.values() {
                stmt.execute(params![
                    pattern.id,
                    pattern.sequence as i64,
                    pattern.question,
                    serde_json::to_string(&pattern.signature)?,
                    serde_json::to_string(&pattern.responses)?,
                    pattern.confidence,
                    serde_json::to_string(&pattern.contributors)?,
                    pattern.used_count as i64,
                    pattern.success_rate,
                    pattern.learned_at,
                    pattern.updated_at,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO associations (pattern_id, response_id, weight) VALUES (?1, ?2, ?3)",
            )?;
            for (pattern_id, targets) in &snapshot.associations {
                for (response_id, weight) in targets {
                    stmt.execute(params![pattern_id, response_id, weight])?;
                }
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO context_entries (user_id, position, question, response, time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (user_id, entries) in &snapshot.context {
                for (position, entry) in entries.iter().enumerate() {
                    stmt.execute(params![
                        user_id,
                        position as i64,
                        entry.question,
                        entry.response,
                        entry.time,
                    ])?;
                }
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO events (position, kind, question, response, user_id, score, time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, event) in snapshot.events.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    event.kind.as_str(),
                    event.question,
                    event.response,
                    event.user,
                    event.score,
                    event.time,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO snapshot_meta (id, saved_at, layout_version) VALUES (1, ?1, ?2)",
            params![snapshot.saved_at, snapshot.version],
        )?;

        Ok(())
    }

    fn read_patterns(conn: &Connection) -> Result<BTreeMap<String, Pattern>> {
        let mut stmt = conn.prepare(
            "SELECT id, sequence, question, signature, responses, confidence, contributors,
                    used_count, success_rate, learned_at, updated_at
             FROM patterns ORDER BY sequence",
        )?;

        #[allow(clippy::type_complexity)]
        let rows: Vec<(
            String,
            i64,
            String,
            String,
            String,
            f64,
            String,
            i64,
            f64,
            DateTime<Utc>,
            DateTime<Utc>,
        )> =
            stmt.query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        let mut patterns = BTreeMap::new();
        for (id, sequence, question, signature, responses, confidence, contributors, used, success, learned, updated) in rows {
            let pattern = Pattern {
                id: id.clone(),
                question,
                signature: parse_json(&signature, "pattern signature")?,
                responses: parse_json(&responses, "pattern responses")?,
                confidence,
                contributors: parse_json(&contributors, "pattern contributors")?,
                used_count: used.max(0) as u64,
                success_rate: success,
                sequence: sequence.max(0) as u64,
                learned_at: learned,
                updated_at: updated,
            };
            patterns.insert(id, pattern);
        }
        Ok(patterns)
    }

    fn read_associations(conn: &Connection) -> Result<EdgeMap> {
        let mut stmt = conn.prepare("SELECT pattern_id, response_id, weight FROM associations")?;
        let rows: Vec<(String, String, f64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut edges = EdgeMap::new();
        for (pattern_id, response_id, weight) in rows {
            edges.entry(pattern_id).or_default().insert(response_id, weight);
        }
        Ok(edges)
    }

    fn read_context(conn: &Connection) -> Result<BTreeMap<String, Vec<ContextEntry>>> {
        let mut stmt = conn.prepare(
            "SELECT user_id, question, response, time FROM context_entries
             ORDER BY user_id, position",
        )?;
        let rows: Vec<(String, String, String, DateTime<Utc>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut context: BTreeMap<String, Vec<ContextEntry>> = BTreeMap::new();
        for (user_id, question, response, time) in rows {
            context.entry(user_id).or_default().push(ContextEntry {
                question,
                response,
                time,
            });
        }
        Ok(context)
    }

    fn read_events(conn: &Connection) -> Result<Vec<Event>> {
        let mut stmt = conn.prepare(
            "SELECT kind, question, response, user_id, score, time FROM events ORDER BY position",
        )?;
        #[allow(clippy::type_complexity)]
        let rows: Vec<(String, String, String, Option<String>, Option<f64>, DateTime<Utc>)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        rows.into_iter()
            .map(|(kind, question, response, user, score, time)| {
                let kind = EventKind::parse_name(&kind)
                    .ok_or_else(|| StorageError::Corrupt(format!("Unknown event kind: {}", kind)))?;
                Ok(Event {
                    kind,
                    question,
                    response,
                    user,
                    score,
                    time,
                })
            })
            .collect()
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::Lock("sqlite connection".into()))?;

        let meta: Option<(DateTime<Utc>, u32)> = conn
            .query_row(
                "SELECT saved_at, layout_version FROM snapshot_meta WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((saved_at, version)) = meta else {
            return Ok(None);
        };

        if version > SNAPSHOT_VERSION {
            tracing::warn!(
                "Snapshot layout v{} is newer than supported v{}",
                version,
                SNAPSHOT_VERSION
            );
        }

        Ok(Some(Snapshot {
            version,
            patterns: Self::read_patterns(&conn)?,
            associations: Self::read_associations(&conn)?,
            context: Self::read_context(&conn)?,
            events: Self::read_events(&conn)?,
            saved_at,
        }))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::Lock("sqlite connection".into()))?;
        let tx = conn.transaction()?;
        Self::write_all(&tx, snapshot)?;
        tx.commit()?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite::memory:".to_string(),
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(format!("Invalid {}: {}", what, e)))
}
