//! Persistence state of a stored entity

use serde::{Deserialize, Serialize};

/// Lifecycle tag that gates which store operations are legal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceState {
    /// Built in memory, never written
    New,
    /// Matches the stored row
    Stored,
    /// Stored, with in-memory changes not yet written
    Updated,
    /// Row removed
    Deleted,
}

impl Default for PersistenceState {
    fn default() -> Self {
        Self::New
    }
}

impl PersistenceState {
    pub fn is_savable(self) -> bool {
        matches!(self, Self::New)
    }

    pub fn is_updatable(self) -> bool {
        matches!(self, Self::Stored | Self::Updated)
    }

    pub fn is_deletable(self) -> bool {
        matches!(self, Self::Stored | Self::Updated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Stored => "stored",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for PersistenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
