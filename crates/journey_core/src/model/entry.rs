//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the canonical record persisted in the `journals` blob.
//! - Own text normalization and write-time validation rules.
//!
//! # Invariants
//! - `uid` is stable for the entry lifetime and is the only identity key.
//! - `text` is trimmed and non-empty whenever an entry is persisted.
//! - `date_time` is an absolute UTC instant; it may be in the past.
//! - Persisted `date_time` values have millisecond precision and a year in
//!   `0..=9999`, so every written blob reads back unchanged.

use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Years a four-digit RFC 3339 timestamp can carry.
const STORABLE_YEARS: RangeInclusive<i32> = 0..=9999;

/// Opaque stable identifier of one entry.
///
/// Stored as a plain string so blobs written by earlier app builds (which
/// used a non-UUID generator) still parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryUid(String);

impl EntryUid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EntryUid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntryUid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One persisted journal entry.
///
/// Field names follow the external blob shape (`uid`, `text`, `dateTime`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub uid: EntryUid,
    pub text: String,
    #[serde(rename = "dateTime", with = "iso_millis")]
    pub date_time: DateTime<Utc>,
}

/// Validation errors raised before entry persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Text is empty after trimming.
    EmptyText,
    /// Timestamp year cannot be written as a four-digit RFC 3339 year.
    DateOutOfRange(DateTime<Utc>),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "entry text must not be empty"),
            Self::DateOutOfRange(value) => write!(
                f,
                "entry year {} is outside {}..={}",
                value.year(),
                STORABLE_YEARS.start(),
                STORABLE_YEARS.end()
            ),
        }
    }
}

impl Error for EntryValidationError {}

impl Entry {
    /// Builds an entry from raw user text, trimming it.
    ///
    /// # Errors
    /// - Returns `EmptyText` when `text` is empty or whitespace-only.
    /// - Returns `DateOutOfRange` when `date_time` cannot be stored.
    pub fn new(
        uid: EntryUid,
        text: &str,
        date_time: DateTime<Utc>,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            uid,
            text: normalize_text(text)?,
            date_time: normalize_date_time(date_time)?,
        };
        Ok(entry)
    }

    /// Validates write-time invariants.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.text.trim().is_empty() {
            return Err(EntryValidationError::EmptyText);
        }
        if !STORABLE_YEARS.contains(&self.date_time.year()) {
            return Err(EntryValidationError::DateOutOfRange(self.date_time));
        }
        Ok(())
    }
}

/// Unsaved entry content; the store assigns the uid on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub text: String,
    pub date_time: DateTime<Utc>,
}

impl NewEntry {
    pub fn new(text: impl Into<String>, date_time: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            date_time,
        }
    }
}

/// Partial update applied by `EntryStore::update`.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub text: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            date_time: None,
        }
    }

    pub fn date_time(date_time: DateTime<Utc>) -> Self {
        Self {
            text: None,
            date_time: Some(date_time),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.date_time.is_none()
    }

    /// Applies the patch to `entry`.
    ///
    /// Both fields are normalized before assignment, so a failed patch leaves
    /// the entry unchanged.
    pub fn apply_to(&self, entry: &mut Entry) -> Result<(), EntryValidationError> {
        let text = match self.text.as_deref() {
            Some(raw) => Some(normalize_text(raw)?),
            None => None,
        };
        let date_time = self.date_time.map(normalize_date_time).transpose()?;
        if let Some(text) = text {
            entry.text = text;
        }
        if let Some(date_time) = date_time {
            entry.date_time = date_time;
        }
        Ok(())
    }
}

/// Trims entry text and rejects empty results.
pub fn normalize_text(raw: &str) -> Result<String, EntryValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EntryValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Truncates to stored precision and rejects unstorable years.
pub fn normalize_date_time(value: DateTime<Utc>) -> Result<DateTime<Utc>, EntryValidationError> {
    if !STORABLE_YEARS.contains(&value.year()) {
        return Err(EntryValidationError::DateOutOfRange(value));
    }
    Ok(value.trunc_subsecs(3))
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
///
/// Reads accept any RFC 3339 offset and normalize to UTC.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|value| value.with_timezone(&Utc))
            .map_err(|err| serde::de::Error::custom(format!("invalid dateTime `{raw}`: {err}")))
    }
}
