//! SQLite-backed vector index.
//!
//! Embeddings are L2-normalized before insertion, so cosine similarity is
//! a dot product. Queries scan the stored vectors exactly; equal
//! similarities fall back to insertion order for reproducible results.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use manual_core::{ManualError, Result, VectorRecord, VectorStore};

/// File name of the vector database inside the persist directory.
pub const VECTOR_DB_FILE: &str = "vectors.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS embeddings (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    chunk_id    TEXT NOT NULL UNIQUE,
    page_number INTEGER NOT NULL,
    dim         INTEGER NOT NULL,
    embedding   BLOB NOT NULL
);
"#;

/// SQLite-based vector store implementation.
#[derive(Debug)]
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ManualError::database(format!("Failed to open database: {}", e)))?;

        Self::init(conn, path)
    }

    /// Open an existing database, failing if it is absent.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ManualError::index_not_found(
                "vector",
                format!("database missing: {:?}", path),
            ));
        }
        Self::open(path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ManualError::database(format!("Failed to open in-memory database: {}", e)))?;
        Self::init(conn, Path::new(":memory:"))
    }

    fn init(conn: Connection, path: &Path) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 30000;
            PRAGMA temp_store = MEMORY;
            "#,
        )
        .map_err(|e| ManualError::database(format!("Failed to configure connection: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| ManualError::database(format!("Failed to initialize schema: {}", e)))?;

        info!("Vector store opened at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ManualError::database("vector store mutex poisoned"))
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(ManualError::database("embedding blob length not a multiple of 4"));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| ManualError::database(format!("Failed to start transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO embeddings (chunk_id, page_number, dim, embedding)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(chunk_id) DO UPDATE SET
                         page_number = excluded.page_number,
                         dim = excluded.dim,
                         embedding = excluded.embedding",
                )
                .map_err(|e| ManualError::database(format!("Failed to prepare upsert: {}", e)))?;

            for record in records {
                stmt.execute(params![
                    record.chunk_id,
                    record.page_number,
                    record.embedding.len() as i64,
                    embedding_to_blob(&record.embedding),
                ])
                .map_err(|e| ManualError::database(format!("Failed to upsert embedding: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| ManualError::database(format!("Failed to commit upsert: {}", e)))?;

        debug!("Upserted {} embeddings", records.len());
        Ok(())
    }

    async fn remove(&self, chunk_ids: &[String]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| ManualError::database(format!("Failed to start transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare("DELETE FROM embeddings WHERE chunk_id = ?1")
                .map_err(|e| ManualError::database(format!("Failed to prepare delete: {}", e)))?;

            for chunk_id in chunk_ids {
                stmt.execute(params![chunk_id])
                    .map_err(|e| ManualError::database(format!("Failed to delete embedding: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| ManualError::database(format!("Failed to commit delete: {}", e)))?;

        debug!("Removed {} embeddings", chunk_ids.len());
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT chunk_id, embedding FROM embeddings ORDER BY seq")
            .map_err(|e| ManualError::database(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })
            .map_err(|e| ManualError::database(format!("Failed to query embeddings: {}", e)))?;

        let mut scored: Vec<(String, f32)> = Vec::new();
        for row in rows {
            let (chunk_id, blob) =
                row.map_err(|e| ManualError::database(format!("Failed to read row: {}", e)))?;
            let embedding = blob_to_embedding(&blob)?;
            if embedding.len() != vector.len() {
                return Err(ManualError::database(format!(
                    "dimension mismatch: stored {} vs query {}",
                    embedding.len(),
                    vector.len()
                )));
            }
            scored.push((chunk_id, dot(vector, &embedding)));
        }

        // Stable sort keeps the seq order on equal similarity.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(id, _)| id).collect())
    }

    async fn chunk_ids(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT chunk_id FROM embeddings ORDER BY seq")
            .map_err(|e| ManualError::database(format!("Failed to prepare id scan: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ManualError::database(format!("Failed to scan ids: {}", e)))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| ManualError::database(format!("Failed to read id: {}", e)))?);
        }
        Ok(ids)
    }

    async fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
            .map_err(|e| ManualError::database(format!("Failed to count embeddings: {}", e)))?;
        Ok(count as usize)
    }
}
