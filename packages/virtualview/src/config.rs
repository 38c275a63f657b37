//! View configuration
//!
//! A view is declared by its columns plus a few behavioral switches. The
//! static part can live in YAML:
//!
//! ```yaml
//! path_separator: "\\"
//! default_expansion: collapsed
//! columns:
//!   - title: Department
//!     item_name: dept
//!     category: true
//!     sort: ascending
//!   - title: Name
//!     item_name: name
//!     sort: ascending
//! ```
//!
//! Value-function columns cannot be expressed in YAML; attach them in code
//! with [`VirtualViewColumn::with_value_function`].

use crate::domain::VirtualViewColumn;
use crate::error::{Result, ViewError};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default character splitting a category value into nested categories
pub const DEFAULT_PATH_SEPARATOR: char = '\\';

/// Initial mode of a navigator's expand/collapse set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    #[default]
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Splits `"A\B"` into category `A` with nested category `B`
    pub path_separator: char,

    /// Starting expand mode for new navigators
    pub default_expansion: Expansion,

    /// Reject values whose kind differs from earlier values of the same
    /// sorted column instead of ordering them by kind
    pub strict_value_types: bool,

    pub columns: Vec<VirtualViewColumn>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            path_separator: DEFAULT_PATH_SEPARATOR,
            default_expansion: Expansion::Expanded,
            strict_value_types: true,
            columns: Vec::new(),
        }
    }
}

impl ViewConfig {
    pub fn new(columns: Vec<VirtualViewColumn>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn with_column(mut self, column: VirtualViewColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    pub fn with_default_expansion(mut self, expansion: Expansion) -> Self {
        self.default_expansion = expansion;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ViewConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ViewError::config(format!("cannot read view config {}", path.display())).with_source(e)
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Columns declared as categories, in declaration order
    pub fn category_columns(&self) -> impl Iterator<Item = &VirtualViewColumn> {
        self.columns.iter().filter(|c| c.is_category())
    }

    /// Non-category sorted columns, in declaration order
    pub fn document_sort_columns(&self) -> impl Iterator<Item = &VirtualViewColumn> {
        self.columns
            .iter()
            .filter(|c| !c.is_category() && c.is_sorted())
    }

    /// Fail-fast validation, run at view construction
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for:
    /// - a category column without sort direction
    /// - empty or duplicate item names
    /// - a column with both a formula and a value function
    /// - an alphanumeric or whitespace path separator
    pub fn validate(&self) -> Result<()> {
        if self.path_separator.is_alphanumeric() || self.path_separator.is_whitespace() {
            return Err(ViewError::config(format!(
                "path separator {:?} must be a punctuation character",
                self.path_separator
            )));
        }

        let mut seen = FxHashSet::default();
        for column in &self.columns {
            if column.item_name.trim().is_empty() {
                return Err(ViewError::config(format!(
                    "column '{}' has an empty item name",
                    column.title
                )));
            }
            if !seen.insert(column.item_name.as_str()) {
                return Err(ViewError::config(format!(
                    "item name '{}' is declared twice",
                    column.item_name
                )));
            }
            if column.is_category() && !column.is_sorted() {
                return Err(ViewError::config(format!(
                    "category column '{}' has no sort direction",
                    column.item_name
                )));
            }
            if column.formula.is_some() && column.has_value_function() {
                return Err(ViewError::config(format!(
                    "column '{}' declares both a formula and a value function",
                    column.item_name
                )));
            }
        }

        Ok(())
    }
}
