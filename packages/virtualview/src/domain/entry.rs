use super::scoped_id::ScopedId;
use super::sort_key::SortKey;
use super::value::{ColumnValue, ColumnValues};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Arena handle of a view entry
///
/// Handles are never reused within one view, so a stale handle held across
/// a batch simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({})", self.0)
    }
}

/// Aggregate counters of one entry
///
/// Updated by the view at the point of structural change and never
/// recomputed by scanning. The handle is shared (`Arc`) so it can be read
/// without holding the view lock; values are consistent with the tree only
/// between batches.
#[derive(Debug, Default)]
pub struct EntryCounters {
    child_count: AtomicUsize,
    child_category_count: AtomicUsize,
    child_document_count: AtomicUsize,
    descendant_count: AtomicUsize,
    descendant_category_count: AtomicUsize,
    descendant_document_count: AtomicUsize,
}

impl EntryCounters {
    pub fn child_count(&self) -> usize {
        self.child_count.load(Ordering::Acquire)
    }

    pub fn child_category_count(&self) -> usize {
        self.child_category_count.load(Ordering::Acquire)
    }

    pub fn child_document_count(&self) -> usize {
        self.child_document_count.load(Ordering::Acquire)
    }

    pub fn descendant_count(&self) -> usize {
        self.descendant_count.load(Ordering::Acquire)
    }

    pub fn descendant_category_count(&self) -> usize {
        self.descendant_category_count.load(Ordering::Acquire)
    }

    pub fn descendant_document_count(&self) -> usize {
        self.descendant_document_count.load(Ordering::Acquire)
    }

    pub(crate) fn child_attached(&self, is_category: bool) {
        self.child_count.fetch_add(1, Ordering::AcqRel);
        if is_category {
            self.child_category_count.fetch_add(1, Ordering::AcqRel);
        } else {
            self.child_document_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn child_detached(&self, is_category: bool) {
        self.child_count.fetch_sub(1, Ordering::AcqRel);
        if is_category {
            self.child_category_count.fetch_sub(1, Ordering::AcqRel);
        } else {
            self.child_document_count.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn descendant_attached(&self, is_category: bool) {
        self.descendant_count.fetch_add(1, Ordering::AcqRel);
        if is_category {
            self.descendant_category_count.fetch_add(1, Ordering::AcqRel);
        } else {
            self.descendant_document_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn descendant_detached(&self, is_category: bool) {
        self.descendant_count.fetch_sub(1, Ordering::AcqRel);
        if is_category {
            self.descendant_category_count.fetch_sub(1, Ordering::AcqRel);
        } else {
            self.descendant_document_count.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// One placement of a document, or a synthetic category
///
/// The view arena owns every entry; `children` holds handles ordered by
/// sort key and `parent` is a non-owning back-reference.
#[derive(Debug)]
pub struct ViewEntry {
    pub(crate) id: EntryId,
    pub(crate) scoped_id: ScopedId,
    pub(crate) unid: String,
    pub(crate) sort_key: SortKey,
    pub(crate) column_values: ColumnValues,
    pub(crate) parent: Option<EntryId>,
    pub(crate) children: BTreeMap<SortKey, EntryId>,
    pub(crate) sibling_index: usize,
    pub(crate) counters: Arc<EntryCounters>,
}

impl ViewEntry {
    pub(crate) fn new(
        id: EntryId,
        scoped_id: ScopedId,
        unid: String,
        sort_key: SortKey,
        column_values: ColumnValues,
        parent: Option<EntryId>,
    ) -> Self {
        Self {
            id,
            scoped_id,
            unid,
            sort_key,
            column_values,
            parent,
            children: BTreeMap::new(),
            sibling_index: 0,
            counters: Arc::new(EntryCounters::default()),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn scoped_id(&self) -> &ScopedId {
        &self.scoped_id
    }

    pub fn origin(&self) -> &str {
        &self.scoped_id.origin
    }

    /// Opaque content identifier (empty for categories)
    pub fn unid(&self) -> &str {
        &self.unid
    }

    pub fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }

    pub fn column_values(&self) -> &ColumnValues {
        &self.column_values
    }

    pub fn column_value(&self, item_name: &str) -> Option<&ColumnValue> {
        self.column_values.get(item_name)
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    /// Child handles in sibling order
    pub fn child_ids(&self) -> impl DoubleEndedIterator<Item = EntryId> + '_ {
        self.children.values().copied()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// 1-based rank among siblings (0 for the root)
    pub fn sibling_index(&self) -> usize {
        self.sibling_index
    }

    pub fn is_category(&self) -> bool {
        self.scoped_id.is_category()
    }

    pub fn is_document(&self) -> bool {
        !self.is_category()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Shared counter handle, readable without the view lock
    pub fn counters(&self) -> Arc<EntryCounters> {
        Arc::clone(&self.counters)
    }

    pub fn child_count(&self) -> usize {
        self.counters.child_count()
    }

    pub fn descendant_count(&self) -> usize {
        self.counters.descendant_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_kinds() {
        let counters = EntryCounters::default();
        counters.child_attached(true);
        counters.child_attached(false);
        counters.child_attached(false);
        counters.descendant_attached(false);

        assert_eq!(counters.child_count(), 3);
        assert_eq!(counters.child_category_count(), 1);
        assert_eq!(counters.child_document_count(), 2);
        assert_eq!(counters.descendant_count(), 1);
        assert_eq!(counters.descendant_document_count(), 1);

        counters.child_detached(false);
        counters.descendant_detached(false);
        assert_eq!(counters.child_count(), 2);
        assert_eq!(counters.child_document_count(), 1);
        assert_eq!(counters.descendant_count(), 0);
    }

    #[test]
    fn test_counter_handle_is_shared() {
        let scoped = ScopedId::root();
        let key = SortKey::category(0, None, false, &scoped);
        let entry = ViewEntry::new(EntryId(0), scoped, String::new(), key, ColumnValues::new(), None);

        let handle = entry.counters();
        entry.counters.child_attached(true);
        assert_eq!(handle.child_count(), 1);
        assert!(entry.is_root());
        assert!(entry.is_category());
    }
}
