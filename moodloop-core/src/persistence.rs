//! Save files for characters.
//!
//! Each [`Character`] (emotional state, clock and memory store) is encoded
//! as one blob in an SQLite database:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS characters (
//!     character_id TEXT PRIMARY KEY,
//!     name         TEXT NOT NULL,
//!     format       TEXT NOT NULL,
//!     data         BLOB NOT NULL,
//!     updated_at   TEXT NOT NULL,
//!     checksum     TEXT
//! );
//! ```
//!
//! The blob format (JSON, MessagePack or bincode) is recorded per row, so a
//! save written under one format still loads after the configuration
//! changes. A CRC-32 of the blob detects corruption. Memory snapshots can
//! also be written to plain files with [`snapshot_to_bytes`] and
//! [`snapshot_from_bytes`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::character::Character;
use crate::config::{PersistenceConfig, SnapshotFormat};
use crate::error::{MoodloopError, Result};
use crate::memory::MemorySnapshot;
use crate::types::CharacterId;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS characters (
    character_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    format       TEXT NOT NULL,
    data         BLOB NOT NULL,
    updated_at   TEXT NOT NULL,
    checksum     TEXT
);";

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl SnapshotFormat {
    /// Name stored in the `format` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Msgpack => "msgpack",
            Self::Bincode => "bincode",
        }
    }

    fn from_column(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "msgpack" => Ok(Self::Msgpack),
            "bincode" => Ok(Self::Bincode),
            other => Err(MoodloopError::Serialization(format!("unknown save format {other:?}"))),
        }
    }
}

fn encode<T: Serialize>(value: &T, format: SnapshotFormat) -> Result<Vec<u8>> {
    let ser = |e: &dyn std::fmt::Display| MoodloopError::Serialization(e.to_string());
    match format {
        SnapshotFormat::Json => serde_json::to_vec(value).map_err(|e| ser(&e)),
        SnapshotFormat::Msgpack => rmp_serde::to_vec_named(value).map_err(|e| ser(&e)),
        SnapshotFormat::Bincode => bincode::serialize(value).map_err(|e| ser(&e)),
    }
}

fn decode<T: DeserializeOwned>(data: &[u8], format: SnapshotFormat) -> Result<T> {
    let de = |e: &dyn std::fmt::Display| MoodloopError::Serialization(e.to_string());
    match format {
        SnapshotFormat::Json => serde_json::from_slice(data).map_err(|e| de(&e)),
        SnapshotFormat::Msgpack => rmp_serde::from_slice(data).map_err(|e| de(&e)),
        SnapshotFormat::Bincode => bincode::deserialize(data).map_err(|e| de(&e)),
    }
}

/// Encode a memory snapshot.
///
/// # Errors
///
/// Returns [`MoodloopError::Serialization`] if encoding fails.
pub fn snapshot_to_bytes(snapshot: &MemorySnapshot, format: SnapshotFormat) -> Result<Vec<u8>> {
    encode(snapshot, format)
}

/// Decode a memory snapshot.
///
/// # Errors
///
/// Returns [`MoodloopError::Serialization`] if the bytes are not a valid
/// snapshot in `format`.
pub fn snapshot_from_bytes(data: &[u8], format: SnapshotFormat) -> Result<MemorySnapshot> {
    decode(data, format)
}

// ---------------------------------------------------------------------------
// CRC-32
// ---------------------------------------------------------------------------

fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// CRC-32 (ISO 3309), bitwise.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// PersistenceEngine
// ---------------------------------------------------------------------------

/// Handle to an open save database.
///
/// ```no_run
/// # use moodloop_core::persistence::PersistenceEngine;
/// # use moodloop_core::config::MoodloopConfig;
/// # use moodloop_core::character::Character;
/// let config = MoodloopConfig::default();
/// let saves = PersistenceEngine::open("saves.db", &config.persistence)?;
/// let maya = Character::new("Maya", &config);
/// saves.save_character(&maya)?;
/// let loaded = saves.load_character(&maya.id)?;
/// # Ok::<(), moodloop_core::error::MoodloopError>(())
/// ```
pub struct PersistenceEngine {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PersistenceEngine {
    /// Open (or create) a save database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, format = config.format.as_str(), "save database opened");

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// In-memory database (tests, throwaway sessions).
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------

    /// Save (upsert) a character in the configured format.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Serialization`] if encoding fails, or
    /// [`MoodloopError::Database`] on SQLite failures.
    pub fn save_character(&self, character: &Character) -> Result<()> {
        let start = Instant::now();
        let format = self.config.format;
        let data = encode(character, format)?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&data));

        self.conn.execute(
            "INSERT INTO characters (character_id, name, format, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(character_id) DO UPDATE SET
                name = excluded.name,
                format = excluded.format,
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![
                character.id.0.to_string(),
                character.name,
                format.as_str(),
                data,
                Utc::now().to_rfc3339(),
                checksum
            ],
        )?;

        debug!(
            character = %character.id,
            memories = character.memory.len(),
            bytes = data.len(),
            elapsed_us = start.elapsed().as_micros(),
            "character saved"
        );
        Ok(())
    }

    /// Load a character. `None` if nothing is saved under `id`. A checksum
    /// mismatch is logged and the data is still decoded.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Serialization`] if decoding fails, or
    /// [`MoodloopError::Database`] on SQLite failures.
    pub fn load_character(&self, id: &CharacterId) -> Result<Option<Character>> {
        let start = Instant::now();
        let mut stmt = self
            .conn
            .prepare_cached("SELECT format, data, checksum FROM characters WHERE character_id = ?1")?;
        let row: Option<(String, Vec<u8>, Option<String>)> = stmt
            .query_row(params![id.0.to_string()], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()?;

        let Some((format, data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(character = %id, %expected, %actual, "checksum mismatch, save may be corrupt");
                }
            }
        }

        let character: Character = decode(&data, SnapshotFormat::from_column(&format)?)?;
        debug!(
            character = %id,
            memories = character.memory.len(),
            elapsed_us = start.elapsed().as_micros(),
            "character loaded"
        );
        Ok(Some(character))
    }

    /// Delete a save. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] on SQLite failures.
    pub fn delete_character(&self, id: &CharacterId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM characters WHERE character_id = ?1", params![id.0.to_string()])?;
        Ok(deleted > 0)
    }

    /// Ids and names of every saved character, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] on SQLite failures.
    pub fn list_characters(&self) -> Result<Vec<(CharacterId, String)>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT character_id, name FROM characters ORDER BY name")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut characters = Vec::new();
        for row in rows {
            let (id, name) = row?;
            match uuid::Uuid::parse_str(&id) {
                Ok(uuid) => characters.push((CharacterId(uuid), name)),
                Err(_) => warn!(id = %id, "skipping save with invalid id"),
            }
        }
        Ok(characters)
    }

    /// Number of saved characters.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] on SQLite failures.
    pub fn character_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM characters", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Backup & maintenance
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;
        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "save database backed up"
        );
        Ok(())
    }

    /// Numbered backup next to the database file, keeping at most
    /// `backup_count` of them (`saves.db.bak.1` is the newest). No-op for
    /// in-memory databases.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] or [`MoodloopError::Io`] on failure.
    pub fn create_rotating_backup(&self) -> Result<()> {
        let max = self.config.backup_count;
        if self.db_path.as_os_str() == ":memory:" || max == 0 {
            return Ok(());
        }

        for i in (1..max).rev() {
            let src = self.backup_path(i);
            if src.exists() {
                std::fs::rename(&src, self.backup_path(i + 1))?;
            }
        }
        let oldest = self.backup_path(max + 1);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        self.backup(self.backup_path(1))
    }

    fn backup_path(&self, n: u32) -> PathBuf {
        let mut p = self.db_path.clone();
        let ext = format!(
            "{}.bak.{n}",
            p.extension().map_or(String::new(), |e| e.to_string_lossy().into_owned())
        );
        p.set_extension(ext);
        p
    }

    /// `PRAGMA integrity_check`; `Ok(false)` means corruption was found.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self.conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Database path, or `:memory:`.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
