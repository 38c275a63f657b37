//! Test data builders

use virtualview::{ColumnValue, ColumnValues, DataChange};

/// Builder for one row of column values
#[derive(Debug, Default, Clone)]
pub struct RowBuilder {
    values: ColumnValues,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item_name: &str, value: impl Into<ColumnValue>) -> Self {
        self.values.insert(item_name.to_string(), value.into());
        self
    }

    pub fn with_list(mut self, item_name: &str, values: &[&str]) -> Self {
        self.values
            .insert(item_name.to_string(), ColumnValue::list(values.iter().copied()));
        self
    }

    pub fn build(self) -> ColumnValues {
        self.values
    }
}

/// Row with a department and a name
pub fn person(dept: &str, name: &str) -> ColumnValues {
    RowBuilder::new().with("dept", dept).with("name", name).build()
}

/// Batch adding `(id, dept, name)` rows with unid `u{id}`
pub fn people_batch(origin: &str, people: &[(u64, &str, &str)]) -> DataChange {
    let mut change = DataChange::new(origin);
    for (id, dept, name) in people {
        change.add_entry(*id, format!("u{}", id), person(dept, name));
    }
    change
}

/// Batch removing `ids`
pub fn removal_batch(origin: &str, ids: &[u64]) -> DataChange {
    let mut change = DataChange::new(origin);
    for id in ids {
        change.remove_entry(*id);
    }
    change
}
