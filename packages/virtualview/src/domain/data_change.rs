use super::value::ColumnValues;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One added or updated document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Addition {
    pub unid: String,
    pub values: ColumnValues,
}

/// Batch of additions/removals reported by one data provider
///
/// No order is implied between a removal and an addition of the same id:
/// the view applies every removal before any addition.
///
/// # Examples
///
/// ```rust
/// use virtualview::{ColumnValue, ColumnValues, DataChange};
///
/// let mut values = ColumnValues::new();
/// values.insert("dept".into(), ColumnValue::from("Eng"));
///
/// let change = DataChange::new("crm")
///     .with_addition(1, "u1", values)
///     .with_removal(7);
/// assert_eq!(change.additions.len(), 1);
/// assert!(change.removals.contains(&7));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataChange {
    pub origin: String,
    #[serde(default)]
    pub removals: BTreeSet<u64>,
    #[serde(default)]
    pub additions: BTreeMap<u64, Addition>,
}

impl DataChange {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            removals: BTreeSet::new(),
            additions: BTreeMap::new(),
        }
    }

    pub fn add_entry(&mut self, id: u64, unid: impl Into<String>, values: ColumnValues) {
        self.additions.insert(
            id,
            Addition {
                unid: unid.into(),
                values,
            },
        );
    }

    pub fn remove_entry(&mut self, id: u64) {
        self.removals.insert(id);
    }

    pub fn with_addition(mut self, id: u64, unid: impl Into<String>, values: ColumnValues) -> Self {
        self.add_entry(id, unid, values);
        self
    }

    pub fn with_removal(mut self, id: u64) -> Self {
        self.remove_entry(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}
