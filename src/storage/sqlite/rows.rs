//! Row conversion between `SQLite` and the site models.

use crate::models::{SiteConfig, SiteId, SiteRecord, UserSettings};
use crate::{Error, Result};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

impl ToSql for SiteId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.get())))
    }
}

impl FromSql for SiteId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        u32::try_from(raw)
            .map(Self::new)
            .map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// Raw columns of a `sites` row, before blob decoding.
#[derive(Debug)]
pub struct SiteRow {
    /// Primary key.
    pub id: SiteId,
    /// JSON-encoded [`SiteConfig`].
    pub config: String,
    /// JSON-encoded [`UserSettings`].
    pub user_settings: String,
}

impl SiteRow {
    /// Column list matching [`SiteRow::from_row`].
    pub const COLUMNS: &'static str = "id, config, user_settings";

    /// Reads the columns selected by [`SiteRow::COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns a `rusqlite` error if a column has the wrong type.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            config: row.get(1)?,
            user_settings: row.get(2)?,
        })
    }

    /// Decodes the JSON blobs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if either blob is malformed.
    pub fn into_record(self) -> Result<SiteRecord> {
        let config: SiteConfig =
            serde_json::from_str(&self.config).map_err(|e| Error::OperationFailed {
                operation: "decode_site_config".to_string(),
                cause: format!("site {}: {e}", self.id),
            })?;
        let user_settings: UserSettings = if self.user_settings.is_empty() {
            UserSettings::new()
        } else {
            serde_json::from_str(&self.user_settings).map_err(|e| Error::OperationFailed {
                operation: "decode_user_settings".to_string(),
                cause: format!("site {}: {e}", self.id),
            })?
        };

        Ok(SiteRecord {
            id: self.id,
            config,
            user_settings,
        })
    }
}

/// Encodes a record's blobs for storage.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if serialization fails.
pub fn encode_blobs(config: &SiteConfig, settings: &UserSettings) -> Result<(String, String)> {
    let config = serde_json::to_string(config).map_err(|e| Error::OperationFailed {
        operation: "encode_site_config".to_string(),
        cause: e.to_string(),
    })?;
    let settings = serde_json::to_string(settings).map_err(|e| Error::OperationFailed {
        operation: "encode_user_settings".to_string(),
        cause: e.to_string(),
    })?;
    Ok((config, settings))
}
