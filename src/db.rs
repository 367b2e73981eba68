//! Database module for AgeWise
//!
//! Provides persistence for sessions, their key-value state and transcripts.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Register a new session id
    pub fn create_session(&self, id: &str) -> DbResult<SessionRecord> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![id, now.to_rfc3339()],
        )?;
        Ok(SessionRecord {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get session by ID
    pub fn get_session(&self, id: &str) -> DbResult<SessionRecord> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, created_at, updated_at FROM sessions WHERE id = ?1",
            params![id],
            |row| {
                Ok(SessionRecord {
                    id: row.get(0)?,
                    created_at: parse_datetime(&row.get::<_, String>(1)?),
                    updated_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::SessionNotFound(id.to_string()),
            other => DbError::Sqlite(other),
        })
    }

    /// Most recently active sessions first
    pub fn list_sessions(&self, limit: u32) -> DbResult<Vec<SessionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at, updated_at FROM sessions
             ORDER BY updated_at DESC, rowid DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(SessionRecord {
                id: row.get(0)?,
                created_at: parse_datetime(&row.get::<_, String>(1)?),
                updated_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    fn touch_session(conn: &Connection, id: &str) -> DbResult<()> {
        conn.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    // ==================== Key-Value Operations ====================

    pub fn kv_get(&self, namespace: &str, key: &str) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, namespace: &str, key: &str, value: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![namespace, key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, namespace: &str, key: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(())
    }

    // ==================== Message Operations ====================

    /// Append a message to a session transcript
    pub fn append_message(&self, session_id: &str, message: &Message) -> DbResult<()> {
        let conn = self.lock()?;
        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        insert_message(&conn, session_id, sequence_id, message)?;
        Self::touch_session(&conn, session_id)
    }

    /// Replace the whole transcript
    pub fn replace_messages(&self, session_id: &str, messages: &[Message]) -> DbResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        for (sequence_id, message) in (1_i64..).zip(messages) {
            insert_message(&tx, session_id, sequence_id, message)?;
        }
        Self::touch_session(&tx, session_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Keep only the first message of a transcript
    pub fn truncate_messages(&self, session_id: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM messages WHERE session_id = ?1 AND sequence_id >
                (SELECT MIN(sequence_id) FROM messages WHERE session_id = ?1)",
            params![session_id],
        )?;
        Self::touch_session(&conn, session_id)
    }

    /// Get the transcript for a session
    pub fn get_messages(&self, session_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT message_id, role, text, created_at
             FROM messages WHERE session_id = ?1 ORDER BY sequence_id ASC",
        )?;

        let rows = stmt.query_map(params![session_id], parse_message_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn insert_message(
    conn: &Connection,
    session_id: &str,
    sequence_id: i64,
    message: &Message,
) -> DbResult<()> {
    conn.execute(
        "INSERT INTO messages (session_id, sequence_id, message_id, role, text, created_at, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session_id,
            sequence_id,
            message.id,
            message.role.to_string(),
            message.text,
            message.created_at,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn parse_message_row(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let role_str: String = row.get(1)?;
    let role = role_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Message {
        id: row.get(0)?,
        role,
        text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
