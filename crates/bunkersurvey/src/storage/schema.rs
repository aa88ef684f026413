//! `SQLite` schema definitions for the document store.
//!
//! Every document is a JSON body addressed by its slash-separated path. The
//! `parent` column holds the path minus its last segment so that the direct
//! children of a node can be listed with an index lookup.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    path TEXT PRIMARY KEY,
    parent TEXT NOT NULL,
    body TEXT NOT NULL,
    body_hash TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `parent` for child listings.
pub const CREATE_PARENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(parent)
";

/// SQL statement to create an index on `updated_at` for recency queries.
pub const CREATE_UPDATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(updated_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Base schema statements, applied on every open.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_PARENT_INDEX,
    CREATE_METADATA_TABLE,
];
