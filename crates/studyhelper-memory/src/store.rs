//! Snippet store backed by SQLite.
//!
//! One database file per collection, living inside the memory directory:
//! `<dir>/<collection>.db`. Snippet text goes into a plain table, vectors
//! into the sqlite-vec table managed by [`crate::vector`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::error::{MemoryError, Result};
use crate::types::{Snippet, SnippetId, StoreStats};
use crate::vector;

/// Current schema version for migrations.
const SCHEMA_VERSION: i32 = 1;

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "study_memory";

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store
// ─────────────────────────────────────────────────────────────────────────────

/// Snippet store backed by SQLite.
///
/// Append-only: snippets are inserted with their embedding and never updated
/// or deleted. Vector search must be enabled with [`MemoryStore::init_vectors`]
/// before embeddings can be stored.
pub struct MemoryStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    vectors_initialized: Mutex<bool>,
    vectors_stale: Mutex<bool>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("path", &self.path)
            .field("vectors_initialized", &*self.vectors_initialized.lock())
            .field("vectors_stale", &*self.vectors_stale.lock())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Open or create the store for `collection` inside `dir`.
    ///
    /// The directory is created if missing.
    pub fn open(dir: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| MemoryError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let path = dir.join(format!("{collection}.db"));

        vector::init_vector_extension();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.clone()),
            vectors_initialized: Mutex::new(false),
            vectors_stale: Mutex::new(false),
        };
        store.initialize()?;

        info!("Memory store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        vector::init_vector_extension();
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
            vectors_initialized: Mutex::new(false),
            vectors_stale: Mutex::new(false),
        };
        store.initialize()?;

        debug!("In-memory store created");
        Ok(store)
    }

    /// Path of the database file, if the store is on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let current_version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if current_version >= SCHEMA_VERSION {
            debug!("Schema up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating schema from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snippets (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_snippets_created_at
                ON snippets(created_at);

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vectors
    // ─────────────────────────────────────────────────────────────────────────

    /// Initialize vector storage with dimension mismatch detection.
    ///
    /// Records the dimensions and provider in the `meta` table. If the store
    /// was created with different dimensions, the vectors are marked stale and
    /// searches return nothing until the store is rebuilt.
    pub fn init_vectors(&self, dims: usize, provider: &str) -> Result<()> {
        let conn = self.conn.lock();

        let stored_dims: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'embedding.dimensions'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(old_dims) = stored_dims.and_then(|s| s.parse::<usize>().ok())
            && old_dims != dims
        {
            warn!(
                "Embedding dimension mismatch: stored={}, configured={}. \
                 Memory retrieval disabled for this store.",
                old_dims, dims
            );
            *self.vectors_stale.lock() = true;
            *self.vectors_initialized.lock() = true;
            return Ok(());
        }

        let stored_provider: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'embedding.provider'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(old) = stored_provider
            && old != provider
        {
            warn!(
                "Embedding provider changed from '{}' to '{}'; similarity across old and new snippets is unreliable",
                old, provider
            );
        }

        vector::create_vector_table(&conn, dims)?;

        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding.dimensions', ?1)",
            params![dims.to_string()],
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding.provider', ?1)",
            params![provider],
        )?;

        *self.vectors_initialized.lock() = true;
        Ok(())
    }

    /// Check if vectors are initialized.
    pub fn has_vectors(&self) -> bool {
        *self.vectors_initialized.lock()
    }

    /// Check if stored embeddings are stale (dimension mismatch).
    pub fn vectors_stale(&self) -> bool {
        *self.vectors_stale.lock()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snippets
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a snippet together with its embedding, atomically.
    pub fn insert_snippet_with_embedding(&self, snippet: &Snippet, embedding: &[f32]) -> Result<()> {
        if !self.has_vectors() {
            return Err(MemoryError::InvalidData(
                "vector storage not initialized; call init_vectors first".to_string(),
            ));
        }
        if self.vectors_stale() {
            return Err(MemoryError::InvalidData(
                "embedding dimensions do not match this store".to_string(),
            ));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO snippets (id, content, created_at) VALUES (?1, ?2, ?3)",
            params![
                snippet.id.to_string(),
                snippet.content,
                snippet.created_at.to_rfc3339()
            ],
        )?;
        vector::store_embedding(&tx, snippet.id, embedding)?;
        tx.commit()?;

        debug!(
            "Stored snippet {} ({} chars)",
            snippet.id,
            snippet.content.chars().count()
        );
        Ok(())
    }

    /// Get a snippet by id.
    pub fn get_snippet(&self, id: SnippetId) -> Result<Option<Snippet>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, content, created_at FROM snippets WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, content, created_at)| row_to_snippet(&id, content, &created_at))
            .transpose()
    }

    /// Search for the snippets nearest to `query_embedding`.
    ///
    /// Returns `(snippet, distance)` pairs, most similar first.
    pub fn search_similar_snippets(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<(Snippet, f32)>> {
        if !self.has_vectors() || self.vectors_stale() {
            debug!("Vector search skipped: vectors unavailable or stale");
            return Ok(Vec::new());
        }

        let results = {
            let conn = self.conn.lock();
            vector::search_similar(&conn, query_embedding, limit)?
        };

        let mut snippets = Vec::with_capacity(results.len());
        for result in results {
            if let Some(snippet) = self.get_snippet(result.snippet_id)? {
                snippets.push((snippet, result.distance));
            }
        }
        Ok(snippets)
    }

    /// Count stored snippets.
    pub fn count_snippets(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM snippets", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Summary statistics for the store.
    pub fn stats(&self) -> Result<StoreStats> {
        let snippet_count = self.count_snippets()?;
        let conn = self.conn.lock();

        let embedding_count = if *self.vectors_initialized.lock() && !*self.vectors_stale.lock() {
            vector::count_embeddings(&conn)?
        } else {
            0
        };

        let meta = |key: &str| -> Result<Option<String>> {
            Ok(conn
                .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?)
        };

        Ok(StoreStats {
            snippet_count,
            embedding_count,
            dimensions: meta("embedding.dimensions")?.and_then(|s| s.parse().ok()),
            provider: meta("embedding.provider")?,
        })
    }
}

fn row_to_snippet(id: &str, content: String, created_at: &str) -> Result<Snippet> {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| MemoryError::InvalidData(format!("bad timestamp '{created_at}': {e}")))?
        .with_timezone(&Utc);
    Ok(Snippet {
        id: SnippetId::parse(id)?,
        content,
        created_at,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
