use serde::{Deserialize, Serialize};

use super::{Mvp, UserStory};

/// Schema version written by this build.
pub const CURRENT_DOCUMENT_VERSION: u32 = 1;

/// The whole persisted data set: both collections in one record.
///
/// Every mutation rewrites the entire document. Collections keep insertion
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    #[serde(default)]
    pub stories: Vec<UserStory>,
    #[serde(default)]
    pub mvps: Vec<Mvp>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty() && self.mvps.is_empty()
    }

    pub fn story(&self, id: &str) -> Option<&UserStory> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn mvp(&self, id: &str) -> Option<&Mvp> {
        self.mvps.iter().find(|m| m.id == id)
    }

    /// Stories whose `mvp_id` points at an MVP that does not exist.
    pub fn dangling_assignments(&self) -> Vec<&UserStory> {
        self.stories
            .iter()
            .filter(|s| match &s.mvp_id {
                Some(mvp_id) => self.mvp(mvp_id).is_none(),
                None => false,
            })
            .collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_DOCUMENT_VERSION,
            stories: Vec::new(),
            mvps: Vec::new(),
        }
    }
}

/// How the document returned by a load came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOrigin {
    /// No record existed under the key.
    Empty,
    /// The record parsed at the current version.
    Stored,
    /// The record used an older layout and was upgraded in memory.
    Migrated { from: u32 },
    /// The record could not be parsed; an empty document was substituted.
    Recovered,
}

impl DocumentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Stored => "stored",
            Self::Migrated { .. } => "migrated",
            Self::Recovered => "recovered",
        }
    }
}

/// A document together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub document: Document,
    pub origin: DocumentOrigin,
}
