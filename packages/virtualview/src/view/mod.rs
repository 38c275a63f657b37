//! View - incrementally maintained categorized index
//!
//! A [`View`] owns one [`ViewTree`] behind a `parking_lot::RwLock`:
//!
//! - `apply_changes` takes the write lock for the whole batch
//! - readers (navigators, snapshots) borrow the tree through
//!   [`View::access_with_read_lock`] or [`View::read`]
//! - root counters are shared atomics and can be read without any lock
//!
//! # Usage
//!
//! ```rust
//! use virtualview::{ColumnValue, ColumnValues, DataChange, SortDirection, View, VirtualViewColumn};
//!
//! let view = View::builder("people")
//!     .column(VirtualViewColumn::new("Department", "dept").categorized(SortDirection::Ascending))
//!     .column(VirtualViewColumn::new("Name", "name").sorted(SortDirection::Ascending))
//!     .build()
//!     .unwrap();
//!
//! let mut values = ColumnValues::new();
//! values.insert("dept".into(), ColumnValue::from("Eng"));
//! values.insert("name".into(), ColumnValue::from("Alice"));
//! view.apply_changes(&DataChange::new("o1").with_addition(1, "u1", values)).unwrap();
//!
//! assert_eq!(view.root_counters().descendant_document_count(), 1);
//! assert_eq!(view.find_entries("o1", 1)[0].position, vec![1, 1]);
//! ```

mod batch;
mod tree;
mod type_guard;

pub use tree::{BatchStats, ViewTree};

use crate::config::ViewConfig;
use crate::domain::{
    ColumnValues, DataChange, EntryCounters, ScopedId, VirtualViewColumn, VirtualViewEntry,
};
use crate::error::Result;
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::Arc;

/// Row-level filter consulted before a document is placed
///
/// Receives `(scoped_id, unid, column values)` after value functions ran;
/// returning `false` omits the row.
pub type AcceptanceFn = Arc<dyn Fn(&ScopedId, &str, &ColumnValues) -> bool + Send + Sync>;

pub struct View {
    name: String,
    tree: RwLock<ViewTree>,
    root_counters: Arc<EntryCounters>,
}

impl View {
    pub fn builder(name: impl Into<String>) -> ViewBuilder {
        ViewBuilder::new(name)
    }

    /// Build a view from a validated config
    pub fn new(name: impl Into<String>, config: ViewConfig) -> Result<Self> {
        Self::builder(name).config(config).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply one provider batch under the write lock
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: empty/reserved origin, id with the category bit
    /// - `ValueFunction`: a value-function column failed
    /// - `Comparison`: a sorted value's kind differs from the values of its
    ///   siblings at the same sort position
    ///
    /// On error nothing of the batch is applied, removals included.
    pub fn apply_changes(&self, change: &DataChange) -> Result<BatchStats> {
        let mut tree = self.tree.write();
        match tree.apply(change) {
            Ok(stats) => {
                tracing::debug!(
                    view = %self.name,
                    origin = %change.origin,
                    removed = stats.removed,
                    added = stats.added,
                    rejected = stats.rejected,
                    categories_created = stats.categories_created,
                    categories_pruned = stats.categories_pruned,
                    renumbered_parents = stats.renumbered_parents,
                    "Applied data change"
                );
                Ok(stats)
            }
            Err(err) => {
                tracing::warn!(
                    view = %self.name,
                    origin = %change.origin,
                    error = %err,
                    "Data change rejected; view unchanged"
                );
                Err(err)
            }
        }
    }

    /// Drop every document reported by `origin`
    pub fn remove_origin(&self, origin: &str) -> Result<BatchStats> {
        let mut tree = self.tree.write();
        let mut change = DataChange::new(origin);
        for id in tree.ids_for_origin(origin) {
            change.remove_entry(id);
        }
        let stats = tree.apply(&change)?;
        tracing::debug!(
            view = %self.name,
            origin,
            removed = stats.removed,
            categories_pruned = stats.categories_pruned,
            "Removed origin"
        );
        Ok(stats)
    }

    /// Run `f` against a consistent tree; batches wait until it returns
    pub fn access_with_read_lock<R>(&self, f: impl FnOnce(&ViewTree) -> R) -> R {
        let tree = self.tree.read();
        f(&tree)
    }

    /// Hold the read lock for as long as the guard lives
    pub fn read(&self) -> RwLockReadGuard<'_, ViewTree> {
        self.tree.read()
    }

    /// Snapshots of every placement of `(origin, id)`; empty when unknown
    pub fn find_entries(&self, origin: &str, id: u64) -> Vec<VirtualViewEntry> {
        let scoped_id = ScopedId::new(origin, id);
        self.tree.read().find_entries(&scoped_id)
    }

    /// Lock-free handle to the root's counters
    pub fn root_counters(&self) -> Arc<EntryCounters> {
        Arc::clone(&self.root_counters)
    }

    /// Distinct documents in the view
    pub fn document_count(&self) -> usize {
        self.tree.read().document_count()
    }

    /// Categories plus document placements
    pub fn entry_count(&self) -> usize {
        self.tree.read().entry_count()
    }

    pub fn origins(&self) -> Vec<String> {
        self.tree.read().origins()
    }

    pub fn ids_for_origin(&self, origin: &str) -> Vec<u64> {
        self.tree.read().ids_for_origin(origin)
    }

    pub fn config(&self) -> ViewConfig {
        self.tree.read().config().clone()
    }

    pub fn columns(&self) -> Vec<VirtualViewColumn> {
        self.tree.read().config().columns.clone()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("descendants", &self.root_counters.descendant_count())
            .finish()
    }
}

/// Builder for [`View`]
pub struct ViewBuilder {
    name: String,
    config: ViewConfig,
    acceptance: Option<AcceptanceFn>,
}

impl ViewBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ViewConfig::default(),
            acceptance: None,
        }
    }

    /// Replace the whole config (columns included)
    pub fn config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn column(mut self, column: VirtualViewColumn) -> Self {
        self.config.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = VirtualViewColumn>) -> Self {
        self.config.columns.extend(columns);
        self
    }

    pub fn accept_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ScopedId, &str, &ColumnValues) -> bool + Send + Sync + 'static,
    {
        self.acceptance = Some(Arc::new(predicate));
        self
    }

    /// Validate the config and create an empty view
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the column declarations are invalid.
    pub fn build(self) -> Result<View> {
        self.config.validate()?;

        let tree = ViewTree::new(self.config, self.acceptance);
        let root_counters = tree.root().counters();

        tracing::debug!(
            view = %self.name,
            columns = tree.config().columns.len(),
            "Created view"
        );

        Ok(View {
            name: self.name,
            tree: RwLock::new(tree),
            root_counters,
        })
    }
}
