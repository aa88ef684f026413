//! Storage layer for bunkersurvey.
//!
//! Surveys, vessel configurations and user profiles are JSON documents
//! addressed by slash-separated paths such as `surveys/{uid}/{id}`. The
//! [`DocumentStore`] trait is the seam the repositories are written
//! against; [`Storage`] implements it on top of `SQLite`.

mod path;
pub mod migrations;
pub mod repository;
pub mod schema;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use path::{Collection, DocPath};
pub use repository::{
    Record, Repository, SurveyRepository, UserProfile, UserRepository, VesselRepository,
};

/// A hierarchical JSON document store.
pub trait DocumentStore {
    /// Write `value` at `path`, replacing the document and anything below it.
    ///
    /// Returns `false` when nothing changed: the stored body was identical and
    /// nothing was stored below it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn set(&self, path: &DocPath, value: &Value) -> Result<bool>;

    /// Read the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or the body is corrupt.
    fn get(&self, path: &DocPath) -> Result<Option<Value>>;

    /// Read the direct children of `path`, keyed by their last segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or a body is corrupt.
    fn children(&self, path: &DocPath) -> Result<BTreeMap<String, Value>>;

    /// Shallow-merge `fields` into the object at `path`.
    ///
    /// A `null` field removes the key. A missing document is created.
    /// Returns the merged document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored document is not
    /// a JSON object.
    fn update(&self, path: &DocPath, fields: &Map<String, Value>) -> Result<Value> {
        let mut merged = match self.get(path)? {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(Error::internal(format!(
                    "document at {path} is not an object"
                )))
            }
            None => Map::new(),
        };
        for (key, value) in fields {
            if value.is_null() {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
        let merged = Value::Object(merged);
        self.set(path, &merged)?;
        Ok(merged)
    }

    /// Delete the document at `path` and everything below it.
    ///
    /// Returns `true` if anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    fn remove(&self, path: &DocPath) -> Result<bool>;
}

/// `SQLite`-backed document store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening document store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Document store opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count stored documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count documents directly below `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_children(&self, path: &DocPath) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE parent = ?1",
            [path.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_documents = self.count()?;

        let mut per_collection = BTreeMap::new();
        for collection in [
            Collection::Users,
            Collection::VesselConfigs,
            Collection::Surveys,
            Collection::FullReports,
            Collection::PhotoReports,
        ] {
            let count: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE substr(path, 1, length(?1) + 1) = ?1 || '/'",
                [collection.name()],
                |row| row.get(0),
            )?;
            per_collection.insert(collection.name(), count);
        }

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM documents ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let last_updated = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_documents,
            per_collection,
            last_updated,
            db_size_bytes,
        })
    }

    fn stored_hash(&self, path: &DocPath) -> Result<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT body_hash FROM documents WHERE path = ?1",
                [path.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn delete_descendants(&self, path: &DocPath) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM documents WHERE substr(path, 1, length(?1) + 1) = ?1 || '/'",
            [path.as_str()],
        )?;
        Ok(affected)
    }

    fn parse_body(path: &str, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| {
            warn!("Corrupt document body at {}: {}", path, e);
            Error::Json(e)
        })
    }
}

impl DocumentStore for Storage {
    fn set(&self, path: &DocPath, value: &Value) -> Result<bool> {
        let body = serde_json::to_string(value)?;
        let hash = blake3::hash(body.as_bytes()).to_hex().to_string();

        let tx = self.conn.unchecked_transaction()?;
        let replaced = self.delete_descendants(path)?;
        if replaced > 0 {
            debug!("Replaced {} nested documents under {}", replaced, path);
        }

        if self.stored_hash(path)?.as_deref() == Some(hash.as_str()) {
            tx.commit()?;
            if replaced == 0 {
                debug!("Skipping unchanged document at {}", path);
            }
            return Ok(replaced > 0);
        }

        tx.execute(
            r"
            INSERT INTO documents (path, parent, body, body_hash, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(path) DO UPDATE SET
                body = excluded.body,
                body_hash = excluded.body_hash,
                updated_at = excluded.updated_at
            ",
            params![
                path.as_str(),
                path.parent(),
                body,
                hash,
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        debug!("Wrote document at {}", path);
        Ok(true)
    }

    fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE path = ?1",
                [path.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| Self::parse_body(path.as_str(), &b))
            .transpose()
    }

    fn children(&self, path: &DocPath) -> Result<BTreeMap<String, Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, body FROM documents WHERE parent = ?1")?;
        let rows = stmt
            .query_map([path.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut children = BTreeMap::new();
        for (child, body) in rows {
            let key = child.rsplit_once('/').map_or(child.as_str(), |(_, k)| k);
            children.insert(key.to_string(), Self::parse_body(&child, &body)?);
        }
        Ok(children)
    }

    fn remove(&self, path: &DocPath) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            DELETE FROM documents
            WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'
            ",
            [path.as_str()],
        )?;
        if affected > 0 {
            info!("Removed {} documents at {}", affected, path);
        }
        Ok(affected > 0)
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of documents stored.
    pub total_documents: i64,
    /// Documents per top-level collection.
    pub per_collection: BTreeMap<&'static str, i64>,
    /// Time of the most recent write.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
