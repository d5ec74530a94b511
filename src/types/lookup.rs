use crate::api::rest::Filter;
use crate::error::SeedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lookup tables this tool maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupTable {
    Formats,
    Types,
    Placements,
    Platforms,
    Countries,
}

/// Column a table's rows are addressed by when updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKey {
    Id,
    Code,
}

impl LookupTable {
    /// Seeding order. Countries last, as they have no generated id.
    pub const ALL: [LookupTable; 5] = [
        LookupTable::Formats,
        LookupTable::Types,
        LookupTable::Placements,
        LookupTable::Platforms,
        LookupTable::Countries,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formats => "formats",
            Self::Types => "types",
            Self::Placements => "placements",
            Self::Platforms => "platforms",
            Self::Countries => "countries",
        }
    }

    pub fn key(self) -> RowKey {
        match self {
            Self::Countries => RowKey::Code,
            _ => RowKey::Id,
        }
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupTable {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupTable::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SeedError::UnknownTable(s.to_string()))
    }
}

/// Payload for creating or updating a lookup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub code: String,
    pub name: String,
}

impl LookupEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// A lookup row as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupRow {
    #[serde(default)]
    pub id: Option<String>,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LookupRow {
    /// Filter addressing exactly this row for a PATCH.
    pub fn update_filter(&self, table: LookupTable) -> Result<Filter, SeedError> {
        match table.key() {
            RowKey::Code => Ok(Filter::eq("code", &self.code)),
            RowKey::Id => self
                .id
                .as_deref()
                .map(|id| Filter::eq("id", id))
                .ok_or_else(|| SeedError::MissingRowId {
                    table: table.to_string(),
                    code: self.code.clone(),
                }),
        }
    }
}
