//! VirtualView - categorized, sorted in-memory view index
//!
//! Aggregates documents reported by independent data providers into one
//! categorized, sorted tree that is maintained incrementally and navigated
//! with a stateful cursor.
//!
//! ## Core Principles
//!
//! 1. **Providers own the data**: the view only indexes `(origin, id)`
//!    placements reported through [`DataChange`] batches
//! 2. **Batches are atomic**: a batch is fully prepared before the tree is
//!    touched; a failing batch changes nothing
//! 3. **Deterministic order**: categories before documents, declared column
//!    order, `(origin, id)` tie-break, so sibling indices are reproducible
//! 4. **Deferred renumbering**: sibling indices are recomputed once per
//!    touched parent at the end of a batch
//!
//! ## Layout
//!
//! - [`domain`]: ids, values, sort keys, entries, column declarations
//! - [`view`]: mutation engine ([`View`], [`ViewTree`])
//! - [`navigator`]: traversal, expand/collapse, selection, visibility
//! - [`factory`]: versioned view cache
//! - [`config`]: YAML-loadable view configuration
//!
//! ## Usage
//!
//! ```rust
//! use virtualview::{
//!     ColumnValue, ColumnValues, DataChange, SortDirection, View, ViewNavigator, VirtualViewColumn,
//! };
//!
//! let view = View::builder("people")
//!     .column(VirtualViewColumn::new("Department", "dept").categorized(SortDirection::Ascending))
//!     .column(VirtualViewColumn::new("Name", "name").sorted(SortDirection::Ascending))
//!     .build()?;
//!
//! let mut change = DataChange::new("crm");
//! for (id, dept, name) in [(1, "Eng", "Alice"), (2, "Eng", "Bob")] {
//!     let mut values = ColumnValues::new();
//!     values.insert("dept".into(), ColumnValue::from(dept));
//!     values.insert("name".into(), ColumnValue::from(name));
//!     change.add_entry(id, format!("u{}", id), values);
//! }
//! view.apply_changes(&change)?;
//!
//! let positions = view.access_with_read_lock(|tree| {
//!     let mut nav = ViewNavigator::new(tree);
//!     nav.read_entries(10)
//!         .iter()
//!         .map(|entry| entry.position_string())
//!         .collect::<Vec<_>>()
//! });
//! assert_eq!(positions, vec!["1", "1.1", "1.2"]);
//! # Ok::<(), virtualview::ViewError>(())
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod factory;
pub mod navigator;
pub mod view;

pub use config::{Expansion, ViewConfig, DEFAULT_PATH_SEPARATOR};
pub use error::{ErrorKind, Result, ViewError};
pub use factory::ViewFactory;
pub use navigator::{NavigatorState, ViewNavigator, VisibilityFn};
pub use view::{AcceptanceFn, BatchStats, View, ViewBuilder, ViewTree};

// Domain re-exports
pub use domain::{
    format_position, parse_position, Addition, ColumnValue, ColumnValues, DataChange,
    EntryCounters, EntryId, RowContext, ScalarKind, ScalarValue, ScopedId, SortDirection,
    SortKey, ValueFunction, ValueFunctionError, ViewEntry, VirtualViewColumn, VirtualViewEntry,
    CATEGORY_FLAG, CATEGORY_ORIGIN,
};
