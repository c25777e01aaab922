use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::ShioriError;
use crate::models::{MediaKind, Rating};

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

/// Upper bound on ids per `IN (...)` query; larger batches are split.
const CHUNK_SIZE: usize = 250;

/// Token record: (access_token, refresh_token, expires_at).
pub type TokenRecord = (String, Option<String>, Option<String>);

/// SQLite-backed storage for the shiori ratings mirror.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, ShioriError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, ShioriError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Ratings ─────────────────────────────────────────────────

    /// Atomically discard every rating of `kind` and insert `ratings`.
    ///
    /// The local cache is a mirror of the remote snapshot: no merging,
    /// no diffing.
    pub fn replace_all_ratings(
        &mut self,
        kind: MediaKind,
        ratings: &[Rating],
    ) -> Result<(), ShioriError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM rating WHERE kind = ?1",
            params![kind.as_db_str()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rating (trakt_id, kind, rating, rated_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for rating in ratings {
                stmt.execute(params![
                    rating.trakt_id,
                    kind.as_db_str(),
                    rating.rating,
                    rating.rated_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert or update a single rating keyed by (trakt_id, kind).
    pub fn replace_rating(&self, rating: &Rating) -> Result<(), ShioriError> {
        self.conn.execute(
            "INSERT INTO rating (trakt_id, kind, rating, rated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(trakt_id, kind) DO UPDATE SET
               rating = excluded.rating,
               rated_at = excluded.rated_at",
            params![
                rating.trakt_id,
                rating.kind.as_db_str(),
                rating.rating,
                rating.rated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get all ratings of a kind.
    pub fn ratings_by_kind(&self, kind: MediaKind) -> Result<Vec<Rating>, ShioriError> {
        let mut stmt = self.conn.prepare(
            "SELECT trakt_id, kind, rating, rated_at FROM rating WHERE kind = ?1",
        )?;
        let rows = stmt
            .query_map(params![kind.as_db_str()], |row| Ok(row_to_rating(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Get the ratings of a kind for the given Trakt ids.
    ///
    /// The id list is split into chunks of [`CHUNK_SIZE`] to stay below the
    /// query-parameter ceiling; callers never see chunk boundaries.
    pub fn ratings_for_ids(
        &self,
        trakt_ids: &[i64],
        kind: MediaKind,
    ) -> Result<Vec<Rating>, ShioriError> {
        let mut out = Vec::with_capacity(trakt_ids.len());
        for chunk in trakt_ids.chunks(CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT trakt_id, kind, rating, rated_at FROM rating
                 WHERE kind = ? AND trakt_id IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let values = std::iter::once(Value::from(kind.as_db_str().to_string()))
                .chain(chunk.iter().map(|id| Value::from(*id)));
            let rows = stmt
                .query_map(params_from_iter(values), |row| Ok(row_to_rating(row)))?
                .filter_map(|r| r.ok());
            out.extend(rows);
        }
        Ok(out)
    }

    /// Delete the rating for (trakt_id, kind). No-op when absent.
    pub fn delete_rating(&self, trakt_id: i64, kind: MediaKind) -> Result<(), ShioriError> {
        self.conn.execute(
            "DELETE FROM rating WHERE trakt_id = ?1 AND kind = ?2",
            params![trakt_id, kind.as_db_str()],
        )?;
        Ok(())
    }

    /// Delete every rating of a kind.
    pub fn delete_all_ratings(&self, kind: MediaKind) -> Result<(), ShioriError> {
        self.conn.execute(
            "DELETE FROM rating WHERE kind = ?1",
            params![kind.as_db_str()],
        )?;
        Ok(())
    }

    /// Delete all ratings of every kind in one transaction: a concurrent
    /// reader observes either all kinds cleared or none.
    pub fn clear_ratings(&mut self) -> Result<(), ShioriError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM rating WHERE kind = ?1",
            params![MediaKind::Episode.as_db_str()],
        )?;
        tx.execute(
            "DELETE FROM rating WHERE kind = ?1",
            params![MediaKind::Season.as_db_str()],
        )?;
        tx.execute(
            "DELETE FROM rating WHERE kind = ?1",
            params![MediaKind::Show.as_db_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ── Auth Tokens ─────────────────────────────────────────────

    /// Store an auth token for a service.
    pub fn save_token(
        &self,
        service: &str,
        token: &str,
        refresh: Option<&str>,
        expires_at: Option<&str>,
    ) -> Result<(), ShioriError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO auth_tokens (service, token, refresh, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![service, token, refresh, expires_at],
        )?;
        Ok(())
    }

    /// Get the token for a service.
    pub fn get_token(&self, service: &str) -> Result<Option<String>, ShioriError> {
        self.conn
            .query_row(
                "SELECT token FROM auth_tokens WHERE service = ?1",
                params![service],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the full token record for a service (token, refresh_token, expires_at).
    pub fn get_token_full(&self, service: &str) -> Result<Option<TokenRecord>, ShioriError> {
        self.conn
            .query_row(
                "SELECT token, refresh, expires_at FROM auth_tokens WHERE service = ?1",
                params![service],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete the token for a service.
    pub fn delete_token(&self, service: &str) -> Result<(), ShioriError> {
        self.conn.execute(
            "DELETE FROM auth_tokens WHERE service = ?1",
            params![service],
        )?;
        Ok(())
    }
}

// ── Migrations ──────────────────────────────────────────────────

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), ShioriError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        tracing::debug!("applying schema migration v1");
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

/// Parse a datetime string from SQLite (either RFC 3339 or SQLite's `datetime('now')` format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    DateTime::default()
}

fn row_to_rating(row: &rusqlite::Row<'_>) -> Rating {
    let kind_str: String = row.get(1).unwrap_or_default();
    let rated_at_str: String = row.get(3).unwrap_or_default();

    Rating {
        trakt_id: row.get(0).unwrap_or(0),
        kind: MediaKind::from_db_str(&kind_str).unwrap_or(MediaKind::Show),
        rating: row.get(2).unwrap_or(0),
        rated_at: parse_datetime(&rated_at_str),
    }
}
