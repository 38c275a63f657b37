use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved id bit marking synthetic category entries
pub const CATEGORY_FLAG: u64 = 1 << 63;

/// Origin shared by every synthetic category entry (and the root)
pub const CATEGORY_ORIGIN: &str = "$category";

/// `(origin, id)` pair identifying a document or a synthetic category
///
/// A document id may be placed several times in one view when it is
/// categorized by a multi-valued column; all placements share the same
/// `ScopedId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopedId {
    pub origin: String,
    pub id: u64,
}

impl ScopedId {
    pub fn new(origin: impl Into<String>, id: u64) -> Self {
        Self {
            origin: origin.into(),
            id,
        }
    }

    /// Synthetic category id for the given sequence number
    pub fn category(sequence: u64) -> Self {
        Self::new(CATEGORY_ORIGIN, CATEGORY_FLAG | sequence)
    }

    /// Id of the always-present root category
    pub fn root() -> Self {
        Self::category(0)
    }

    pub fn is_category(&self) -> bool {
        self.id & CATEGORY_FLAG != 0
    }

    pub fn is_root(&self) -> bool {
        self.id == CATEGORY_FLAG && self.origin == CATEGORY_ORIGIN
    }

    /// Id without the category bit
    pub fn note_id(&self) -> u64 {
        self.id & !CATEGORY_FLAG
    }
}

impl fmt::Display for ScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_category() {
            write!(f, "{}#c{}", self.origin, self.note_id())
        } else {
            write!(f, "{}#{}", self.origin, self.id)
        }
    }
}
