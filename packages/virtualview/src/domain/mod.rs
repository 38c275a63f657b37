//! Domain layer of the virtual view
//!
//! # Domain Models
//!
//! - `ScopedId`: `(origin, id)` identity of documents and categories
//! - `ColumnValue` / `ScalarValue`: provider-supplied column data
//! - `SortKey`: total order between siblings
//! - `ViewEntry`: arena node (category or document placement)
//! - `VirtualViewColumn`: column declarations (category, sort, value function)
//! - `DataChange`: provider batch of additions/removals
//! - `VirtualViewEntry`: detached snapshot for consumers

pub mod column;
pub mod data_change;
pub mod entry;
pub mod scoped_id;
pub mod snapshot;
pub mod sort_key;
pub mod value;

pub use column::{RowContext, SortDirection, ValueFunction, ValueFunctionError, VirtualViewColumn};
pub use data_change::{Addition, DataChange};
pub use entry::{EntryCounters, EntryId, ViewEntry};
pub use scoped_id::{ScopedId, CATEGORY_FLAG, CATEGORY_ORIGIN};
pub use snapshot::{format_position, parse_position, VirtualViewEntry};
pub use sort_key::{Bound, SortKey, SortValue};
pub use value::{ColumnValue, ColumnValues, ScalarKind, ScalarValue};
