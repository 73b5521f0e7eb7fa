//! Per-speaker feature persistence
//!
//! A `FeatureStore` owns the path to a single SQLite file and the codec
//! for the payload column. Every operation opens a scoped connection for
//! the duration of the call and releases it on every exit path; no handle
//! is shared or pooled. Concurrent writers from other processes rely on
//! SQLite's own file locking and are not coordinated here.

pub mod codec;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{info, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::error::{Result, VoiceprintError};

pub use codec::{ArrayCodec, ArrayValues, Dtype, FeatureArray};

/// Speaker ids follow a national identifier format: exactly 9 decimal
/// digits, no sign. A leading zero cannot survive the integer round-trip,
/// so the rule reduces to this numeric range.
const SPEAKER_ID_MIN: i64 = 100_000_000;
const SPEAKER_ID_MAX: i64 = 999_999_999;

/// A validated 9-digit speaker identifier.
///
/// Construction is the only validation point; a `SpeakerId` in hand is
/// always well-formed, so insert never re-checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeakerId(i64);

impl SpeakerId {
    /// Validate a raw id against the 9-digit rule.
    pub fn new(raw: i64) -> Result<Self> {
        if (SPEAKER_ID_MIN..=SPEAKER_ID_MAX).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(VoiceprintError::InvalidSpeakerId { id: raw })
        }
    }

    /// Coerce from string form, then validate.
    pub fn parse(value: &str) -> Result<Self> {
        let raw: i64 = value
            .trim()
            .parse()
            .map_err(|_| VoiceprintError::SpeakerIdParse {
                value: value.to_string(),
            })?;
        Self::new(raw)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SpeakerId {
    type Err = VoiceprintError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Result of an insert attempt.
///
/// A duplicate id is reported as an outcome rather than an error so a
/// batch caller can decide whether to continue or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DuplicateId,
}

/// A decoded row from a feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerRecord {
    pub id: i64,
    pub payload: FeatureArray,
}

/// Single-file embedded store for per-speaker feature arrays.
///
/// Tables share the fixed two-column shape
/// `(id INTEGER PRIMARY KEY, payload BLOB)`; only rows are ever deleted.
pub struct FeatureStore {
    path: PathBuf,
    codec: ArrayCodec,
}

impl FeatureStore {
    /// Bind a store to a database file.
    ///
    /// No I/O happens here; SQLite creates the file on the first
    /// connection.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: ArrayCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Create the database file if needed and ensure `table` exists.
    ///
    /// Creation is `IF NOT EXISTS`, so calling this against a populated
    /// file changes nothing, and a second table can be added to an
    /// existing file at any time.
    pub fn establish(&self, table: &str) -> Result<()> {
        self.create_table(table)
    }

    /// Issue the fixed two-column schema statement for `table`.
    pub fn create_table(&self, table: &str) -> Result<()> {
        let table = validate_table_name(table)?;
        let conn = self.connect()?;
        conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY, payload BLOB NOT NULL)"),
            [],
        )?;
        info!("ensured table {} in {}", table, self.path.display());
        Ok(())
    }

    /// Insert a new record.
    ///
    /// The payload is encoded through the store's codec. An id already
    /// present in the table is reported as `InsertOutcome::DuplicateId`
    /// and leaves the table unchanged; other statement failures are
    /// errors.
    pub fn insert(
        &self,
        table: &str,
        id: SpeakerId,
        payload: &FeatureArray,
    ) -> Result<InsertOutcome> {
        let table = validate_table_name(table)?;
        let blob = self.codec.encode(payload);

        let conn = self.connect()?;
        let result = conn.execute(
            &format!("INSERT INTO {table} (id, payload) VALUES (?1, ?2)"),
            params![id.as_i64(), blob],
        );

        match result {
            Ok(_) => {
                info!("inserted id {} into {}", id, table);
                Ok(InsertOutcome::Inserted)
            }
            Err(err) if is_unique_violation(&err) => {
                warn!("id {} already present in {}", id, table);
                Ok(InsertOutcome::DuplicateId)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Point lookup by primary key.
    ///
    /// An absent id is `Ok(None)`, not an error. A present row whose blob
    /// fails to decode is an error; there is no safe recovery from a
    /// corrupt payload.
    pub fn select(&self, table: &str, id: i64) -> Result<Option<SpeakerRecord>> {
        let table = validate_table_name(table)?;
        let conn = self.connect()?;

        let row: Option<(i64, Vec<u8>)> = conn
            .query_row(
                &format!("SELECT id, payload FROM {table} WHERE id = ?1"),
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((id, blob)) => {
                let payload = self.codec.decode(&blob)?;
                Ok(Some(SpeakerRecord { id, payload }))
            }
            None => Ok(None),
        }
    }

    /// Delete the row with the given id.
    ///
    /// Deleting an absent id is a silent success: zero rows affected.
    pub fn remove(&self, table: &str, id: i64) -> Result<()> {
        let table = validate_table_name(table)?;
        let conn = self.connect()?;

        let affected = conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1"),
            params![id],
        )?;
        if affected == 0 {
            info!("no row with id {} in {}", id, table);
        }
        Ok(())
    }

    /// Diagnostic scan of every row in `table`, in id order.
    pub fn list_all(&self, table: &str) -> Result<Vec<SpeakerRecord>> {
        let table = validate_table_name(table)?;
        let conn = self.connect()?;

        let mut stmt = conn.prepare(&format!("SELECT id, payload FROM {table} ORDER BY id"))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            records.push(SpeakerRecord {
                id,
                payload: self.codec.decode(&blob)?,
            });
        }
        Ok(records)
    }
}

/// Table names are restricted identifiers so they can be spliced into
/// schema and DML text without quoting. Names must never come from
/// untrusted input regardless.
fn validate_table_name(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(VoiceprintError::InvalidTableName {
            name: name.to_string(),
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_speaker_id_accepts_nine_digits() {
        assert_eq!(SpeakerId::new(100_000_001).unwrap().as_i64(), 100_000_001);
        assert_eq!(SpeakerId::new(999_999_999).unwrap().as_i64(), 999_999_999);
    }

    #[test_case(0)]
    #[test_case(12_345)]
    #[test_case(99_999_999)]
    #[test_case(1_000_000_000)]
    #[test_case(-100_000_001)]
    fn test_speaker_id_rejects_wrong_length(raw: i64) {
        match SpeakerId::new(raw).unwrap_err() {
            VoiceprintError::InvalidSpeakerId { id } => assert_eq!(id, raw),
            other => panic!("Expected InvalidSpeakerId, got: {:?}", other),
        }
    }

    #[test]
    fn test_speaker_id_parses_string_form() {
        assert_eq!(
            SpeakerId::parse("123456789").unwrap().as_i64(),
            123_456_789
        );
        assert_eq!(
            " 123456789 ".parse::<SpeakerId>().unwrap().as_i64(),
            123_456_789
        );
    }

    #[test]
    fn test_speaker_id_parse_rejects_non_numeric() {
        match SpeakerId::parse("abc").unwrap_err() {
            VoiceprintError::SpeakerIdParse { value } => assert_eq!(value, "abc"),
            other => panic!("Expected SpeakerIdParse, got: {:?}", other),
        }
    }

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("speakers").is_ok());
        assert!(validate_table_name("_enrollment_v2").is_ok());

        for bad in ["", "2speakers", "drop table", "users;--", "tbl-name"] {
            assert!(
                matches!(
                    validate_table_name(bad),
                    Err(VoiceprintError::InvalidTableName { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
