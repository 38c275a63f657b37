use super::entry::ViewEntry;
use super::scoped_id::ScopedId;
use super::value::ColumnValues;
use serde::{Deserialize, Serialize};

/// Detached copy of one entry handed to rendering/reporting consumers
///
/// # Examples
///
/// ```rust,ignore
/// let entries = view.find_entries("crm", 42);
/// for entry in entries {
///     println!("{} at {}", entry.scoped_id, entry.position_string());
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualViewEntry {
    pub scoped_id: ScopedId,
    pub unid: String,
    pub is_category: bool,
    pub column_values: ColumnValues,
    /// 0 for top-level entries
    pub level: usize,
    pub sibling_index: usize,
    /// Sibling indices from the top level down to this entry
    pub position: Vec<usize>,
    pub child_count: usize,
    pub child_category_count: usize,
    pub child_document_count: usize,
    pub descendant_count: usize,
    pub descendant_category_count: usize,
    pub descendant_document_count: usize,
}

impl VirtualViewEntry {
    pub(crate) fn capture(entry: &ViewEntry, position: Vec<usize>, level: usize) -> Self {
        let counters = &entry.counters;
        Self {
            scoped_id: entry.scoped_id.clone(),
            unid: entry.unid.clone(),
            is_category: entry.is_category(),
            column_values: entry.column_values.clone(),
            level,
            sibling_index: entry.sibling_index,
            position,
            child_count: counters.child_count(),
            child_category_count: counters.child_category_count(),
            child_document_count: counters.child_document_count(),
            descendant_count: counters.descendant_count(),
            descendant_category_count: counters.descendant_category_count(),
            descendant_document_count: counters.descendant_document_count(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.scoped_id.origin
    }

    pub fn id(&self) -> u64 {
        self.scoped_id.id
    }

    pub fn is_document(&self) -> bool {
        !self.is_category
    }

    /// Position formatted as dotted path, e.g. `"1.2.3"`
    pub fn position_string(&self) -> String {
        format_position(&self.position, '.')
    }
}

/// Join sibling indices with `separator`
pub fn format_position(position: &[usize], separator: char) -> String {
    position
        .iter()
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

/// Parse a dotted position string; `None` for malformed or zero indices
pub fn parse_position(position: &str, separator: char) -> Option<Vec<usize>> {
    if position.trim().is_empty() {
        return None;
    }
    position
        .split(separator)
        .map(|part| part.trim().parse::<usize>().ok().filter(|index| *index > 0))
        .collect()
}
