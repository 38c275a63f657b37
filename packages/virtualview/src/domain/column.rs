use super::scoped_id::ScopedId;
use super::value::{ColumnValue, ColumnValues};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Declared sort direction of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_descending(&self) -> bool {
        matches!(self, SortDirection::Descending)
    }
}

/// Row handed to value functions
///
/// `values` contains the provider values plus every value-function column
/// declared before the one being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub scoped_id: &'a ScopedId,
    pub unid: &'a str,
    pub values: &'a ColumnValues,
}

impl<'a> RowContext<'a> {
    pub fn value(&self, item_name: &str) -> Option<&'a ColumnValue> {
        self.values.get(item_name)
    }
}

/// Error type value functions may return
pub type ValueFunctionError = Box<dyn std::error::Error + Send + Sync>;

/// Computed column: derives its value from the rest of the row at insertion
pub type ValueFunction =
    Arc<dyn Fn(&RowContext<'_>) -> Result<ColumnValue, ValueFunctionError> + Send + Sync>;

/// Column declaration of a virtual view
///
/// # Examples
///
/// ```rust
/// use virtualview::{SortDirection, VirtualViewColumn};
///
/// let dept = VirtualViewColumn::new("Department", "dept").categorized(SortDirection::Ascending);
/// let name = VirtualViewColumn::new("Name", "name").sorted(SortDirection::Ascending);
/// assert!(dept.is_category());
/// assert!(!name.is_category());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct VirtualViewColumn {
    pub title: String,
    pub item_name: String,
    #[serde(default)]
    pub category: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
    /// Formula evaluated by the provider; the view only carries it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip)]
    pub value_function: Option<ValueFunction>,
}

impl VirtualViewColumn {
    pub fn new(title: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            item_name: item_name.into(),
            category: false,
            sort: None,
            formula: None,
            value_function: None,
        }
    }

    /// Make this a category column sorted in `direction`
    pub fn categorized(mut self, direction: SortDirection) -> Self {
        self.category = true;
        self.sort = Some(direction);
        self
    }

    pub fn sorted(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_value_function<F>(mut self, function: F) -> Self
    where
        F: Fn(&RowContext<'_>) -> Result<ColumnValue, ValueFunctionError> + Send + Sync + 'static,
    {
        self.value_function = Some(Arc::new(function));
        self
    }

    pub fn is_category(&self) -> bool {
        self.category
    }

    pub fn is_sorted(&self) -> bool {
        self.sort.is_some()
    }

    pub fn is_descending(&self) -> bool {
        self.sort.map(|d| d.is_descending()).unwrap_or(false)
    }

    pub fn has_value_function(&self) -> bool {
        self.value_function.is_some()
    }
}

impl fmt::Debug for VirtualViewColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualViewColumn")
            .field("title", &self.title)
            .field("item_name", &self.item_name)
            .field("category", &self.category)
            .field("sort", &self.sort)
            .field("formula", &self.formula)
            .field("value_function", &self.value_function.is_some())
            .finish()
    }
}
