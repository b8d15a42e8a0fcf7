//! Vector storage and similarity search using sqlite-vec.
//!
//! Embeddings live in a `vec0` virtual table keyed by snippet id. Distances
//! returned by searches are L2 distances: lower means more similar.

use std::sync::Once;

use rusqlite::{Connection, params};
use tracing::{debug, info};
use zerocopy::IntoBytes;

use crate::error::Result;
use crate::types::SnippetId;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default embedding dimensions (MiniLM-L6-v2 produces 384-dim vectors).
pub const DEFAULT_EMBEDDING_DIMS: usize = 384;

static VEC_INIT: Once = Once::new();

// ─────────────────────────────────────────────────────────────────────────────
// Extension
// ─────────────────────────────────────────────────────────────────────────────

/// Register the sqlite-vec extension for every connection opened afterwards.
///
/// Registration goes through `sqlite3_auto_extension`, so it is global to the
/// process and only needs to happen once.
pub fn init_vector_extension() {
    VEC_INIT.call_once(|| {
        use rusqlite::ffi::sqlite3_auto_extension;
        use sqlite_vec::sqlite3_vec_init;

        unsafe {
            #[allow(clippy::missing_transmute_annotations)]
            sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
        }
    });
}

/// Create the snippet embeddings table.
pub fn create_vector_table(conn: &Connection, dims: usize) -> Result<()> {
    let sql = format!(
        r#"
        CREATE VIRTUAL TABLE IF NOT EXISTS snippet_embeddings USING vec0(
            snippet_id TEXT PRIMARY KEY,
            embedding float[{dims}]
        )
        "#
    );

    conn.execute_batch(&sql)?;

    info!("Created snippet_embeddings table with {} dimensions", dims);
    Ok(())
}

/// Store the embedding for a snippet.
///
/// vec0 has no upsert, so any previous vector for the id is removed first.
pub fn store_embedding(conn: &Connection, snippet_id: SnippetId, embedding: &[f32]) -> Result<()> {
    conn.execute(
        "DELETE FROM snippet_embeddings WHERE snippet_id = ?1",
        params![snippet_id.to_string()],
    )?;

    conn.execute(
        "INSERT INTO snippet_embeddings (snippet_id, embedding) VALUES (?1, ?2)",
        params![snippet_id.to_string(), embedding.as_bytes()],
    )?;

    debug!("Stored embedding for snippet {}", snippet_id);
    Ok(())
}

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct SimilarityResult {
    /// The snippet ID.
    pub snippet_id: SnippetId,
    /// Distance from the query vector (lower = more similar).
    pub distance: f32,
}

/// Search for snippets similar to a query embedding.
///
/// Returns the top-k matches ordered by distance (ascending).
pub fn search_similar(
    conn: &Connection,
    query_embedding: &[f32],
    limit: usize,
) -> Result<Vec<SimilarityResult>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        r#"
        SELECT snippet_id, distance
        FROM snippet_embeddings
        WHERE embedding MATCH ?1
        ORDER BY distance
        LIMIT ?2
        "#,
    )?;

    let mut rows = stmt.query(params![query_embedding.as_bytes(), limit as i64])?;

    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let distance: f32 = row.get(1)?;

        results.push(SimilarityResult {
            snippet_id: SnippetId::parse(&id)?,
            distance,
        });
    }

    debug!(
        "Found {} similar snippets (limit: {})",
        results.len(),
        limit
    );
    Ok(results)
}

/// Get the count of stored embeddings.
pub fn count_embeddings(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM snippet_embeddings", [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
