//! Database Migrations
//!
//! Schema migration definitions for the SQLite snapshot store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: patterns, associations, context, events",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Snapshot layout version and pattern timestamps index",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    id TEXT PRIMARY KEY,
    sequence INTEGER NOT NULL,
    question TEXT NOT NULL,
    -- token id -> count, JSON object
    signature TEXT NOT NULL DEFAULT '{}',
    -- ordered response texts, JSON array
    responses TEXT NOT NULL DEFAULT '[]',
    confidence REAL NOT NULL DEFAULT 1.0,
    contributors TEXT NOT NULL DEFAULT '[]',
    used_count INTEGER NOT NULL DEFAULT 0,
    success_rate REAL NOT NULL DEFAULT 1.0,
    learned_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_patterns_sequence ON patterns(sequence);

CREATE TABLE IF NOT EXISTS associations (
    pattern_id TEXT NOT NULL,
    response_id TEXT NOT NULL,
    weight REAL NOT NULL,
    PRIMARY KEY (pattern_id, response_id)
);

CREATE TABLE IF NOT EXISTS context_entries (
    user_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    question TEXT NOT NULL,
    response TEXT NOT NULL,
    time TEXT NOT NULL,
    PRIMARY KEY (user_id, position)
);

CREATE TABLE IF NOT EXISTS events (
    position INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    question TEXT NOT NULL,
    response TEXT NOT NULL,
    user_id TEXT,
    score REAL,
    time TEXT NOT NULL
);

-- Single row, present once a snapshot has been saved
CREATE TABLE IF NOT EXISTS snapshot_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    saved_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Snapshot layout version
const MIGRATION_V2_UP: &str = r#"
ALTER TABLE snapshot_meta ADD COLUMN layout_version INTEGER NOT NULL DEFAULT 1;

CREATE INDEX IF NOT EXISTS idx_patterns_learned ON patterns(learned_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Run one migration; its schema change and version bump commit together
fn apply_migration(conn: &rusqlite::Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.up)?;
    tx.commit()
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            apply_migration(conn, migration)?;
            applied += 1;
        }
    }

    Ok(applied)
}
