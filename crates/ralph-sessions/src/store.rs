use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{debug, warn};

use crate::types::ConversationRecord;

/// Payloads past this size are presumed corrupt and skipped.
const MAX_PAYLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Read-only access to the Kiro CLI conversation database.
///
/// The database is owned and written by kiro-cli; we only ever look up the
/// newest conversation for a working directory. Anything unexpected in there
/// (missing file, broken rows, giant or malformed payloads) is downgraded to
/// "no session" with a warning, because a corrupt external store must never
/// crash the loop.
pub struct SessionStore {
    db_path: PathBuf,
}

impl SessionStore {
    /// Create a store pointing at the default kiro-cli database.
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir().with_context(|| "Could not determine data directory")?;
        let db_path = data_dir.join("kiro-cli").join("data.sqlite3");
        Ok(Self { db_path })
    }

    /// Create a store with a custom database path (useful for testing).
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Return the database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The most recently created conversation for `dir`, or `None`.
    ///
    /// The store keys conversations by absolute path, so `dir` is
    /// canonicalized before lookup (falling back to the path as given when
    /// canonicalization fails, e.g. the directory vanished).
    pub fn latest_for_dir(&self, dir: &Path) -> Option<ConversationRecord> {
        let key = dir
            .canonicalize()
            .unwrap_or_else(|_| dir.to_path_buf())
            .to_string_lossy()
            .into_owned();

        if !self.db_path.exists() {
            debug!(db = %self.db_path.display(), "Conversation database not found");
            return None;
        }

        let payload = match self.query_latest(&key) {
            Ok(payload) => payload?,
            Err(e) => {
                warn!(error = %e, key = %key, "Could not read conversation store");
                return None;
            }
        };

        if payload.len() > MAX_PAYLOAD_BYTES {
            warn!(
                bytes = payload.len(),
                key = %key,
                "Conversation payload exceeds sanity limit, treating as corrupt"
            );
            return None;
        }

        match serde_json::from_str::<ConversationRecord>(&payload) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, key = %key, "Malformed conversation payload");
                None
            }
        }
    }

    fn query_latest(&self, key: &str) -> Result<Option<String>> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open conversation db: {:?}", self.db_path))?;

        let value = conn
            .query_row(
                "SELECT value FROM conversations_v2
                 WHERE key = ?1
                 ORDER BY created_at DESC
                 LIMIT 1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| "Conversation query failed")?;

        Ok(value)
    }
}
