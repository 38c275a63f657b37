//! Sort keys and the sibling comparator
//!
//! # Ordering rules
//!
//! 1. `Bound::Low` sorts before everything, `Bound::High` after everything
//! 2. Categories sort before documents, regardless of column direction
//! 3. Sibling categories from different category columns (possible once a
//!    path separator nests one column's values beside the next column's)
//!    order by column index, so their values are never compared
//! 4. Values are compared pairwise in declared column order; null sorts after
//!    every non-null value, and a descending column reverses the comparison
//! 5. Ties fall through to `(origin, id)`
//!
//! Sentinel bounds only appear in keys built for range scans
//! (`category_bounds`, `categories`, `documents`); they are never stored in
//! a view.

use super::scoped_id::ScopedId;
use super::value::ScalarValue;
use crate::error::{Result, ViewError};
use std::cmp::Ordering;

/// Value slot of a sort key with explicit range-scan sentinels
#[derive(Debug, Clone, PartialEq)]
pub enum Bound<T> {
    Low,
    Normal(T),
    High,
}

impl<T> Bound<T> {
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Bound::Normal(_))
    }

    pub fn as_normal(&self) -> Option<&T> {
        match self {
            Bound::Normal(v) => Some(v),
            _ => None,
        }
    }
}

/// One sort position of a key: the value (null = `Normal(None)`) and the
/// declared direction of its column
#[derive(Debug, Clone, PartialEq)]
pub struct SortValue {
    pub value: Bound<Option<ScalarValue>>,
    pub descending: bool,
}

impl SortValue {
    pub fn new(value: Option<ScalarValue>, descending: bool) -> Self {
        Self {
            value: Bound::Normal(value.filter(|v| !v.is_empty_string())),
            descending,
        }
    }

    pub fn low() -> Self {
        Self {
            value: Bound::Low,
            descending: false,
        }
    }

    pub fn high() -> Self {
        Self {
            value: Bound::High,
            descending: false,
        }
    }

    pub fn scalar(&self) -> Option<&ScalarValue> {
        self.value.as_normal().and_then(Option::as_ref)
    }
}

/// Key positioning an entry among its siblings
#[derive(Debug, Clone)]
pub struct SortKey {
    is_category: bool,
    /// Category column the value comes from; 0 for documents
    column: usize,
    values: Vec<SortValue>,
    origin: Bound<String>,
    id: u64,
}

impl SortKey {
    /// Key of a category entry holding a `value` of category column `column`
    pub fn category(
        column: usize,
        value: Option<ScalarValue>,
        descending: bool,
        scoped_id: &ScopedId,
    ) -> Self {
        Self {
            is_category: true,
            column,
            values: vec![SortValue::new(value, descending)],
            origin: Bound::Normal(scoped_id.origin.clone()),
            id: scoped_id.id,
        }
    }

    /// Key of a document entry
    pub fn document(values: Vec<SortValue>, scoped_id: &ScopedId) -> Self {
        Self {
            is_category: false,
            column: 0,
            values,
            origin: Bound::Normal(scoped_id.origin.clone()),
            id: scoped_id.id,
        }
    }

    /// Closed range covering every category of `column` holding `value`
    pub fn category_bounds(
        column: usize,
        value: Option<ScalarValue>,
        descending: bool,
    ) -> (SortKey, SortKey) {
        let slot = SortValue::new(value, descending);
        let low = Self {
            is_category: true,
            column,
            values: vec![slot.clone()],
            origin: Bound::Low,
            id: 0,
        };
        let high = Self {
            is_category: true,
            column,
            values: vec![slot],
            origin: Bound::High,
            id: u64::MAX,
        };
        (low, high)
    }

    /// Closed range covering every category sibling
    pub fn categories() -> (SortKey, SortKey) {
        Self::open_range(true)
    }

    /// Closed range covering every document sibling
    pub fn documents() -> (SortKey, SortKey) {
        Self::open_range(false)
    }

    fn open_range(is_category: bool) -> (SortKey, SortKey) {
        let low = Self {
            is_category,
            column: 0,
            values: vec![SortValue::low()],
            origin: Bound::Low,
            id: 0,
        };
        let high = Self {
            is_category,
            column: usize::MAX,
            values: vec![SortValue::high()],
            origin: Bound::High,
            id: u64::MAX,
        };
        (low, high)
    }

    pub fn is_category(&self) -> bool {
        self.is_category
    }

    /// Category column index; 0 for documents
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn values(&self) -> &[SortValue] {
        &self.values
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_normal().map(String::as_str)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Strict comparator
    ///
    /// # Errors
    ///
    /// - `Comparison` when two non-null values at one position have
    ///   incompatible kinds
    /// - `Invariant` when both keys carry the same sentinel at one position,
    ///   or values of one position disagree on the sort direction
    pub fn try_compare(&self, other: &SortKey) -> Result<Ordering> {
        self.compare(other, true)
    }

    fn compare(&self, other: &SortKey, strict: bool) -> Result<Ordering> {
        // Categories always precede documents
        match (self.is_category, other.is_category) {
            (true, false) => return Ok(Ordering::Less),
            (false, true) => return Ok(Ordering::Greater),
            _ => {}
        }

        let ord = self.column.cmp(&other.column);
        if ord != Ordering::Equal {
            return Ok(ord);
        }

        for (position, (a, b)) in self.values.iter().zip(&other.values).enumerate() {
            let ord = compare_slot(position, a, b, strict)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }

        // Only sentinel keys can differ in width
        let ord = self.values.len().cmp(&other.values.len());
        if ord != Ordering::Equal {
            return Ok(ord);
        }

        let ord = compare_bound(&self.origin, &other.origin, strict, |a, b| Ok(a.cmp(b)))?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }

        Ok(self.id.cmp(&other.id))
    }
}

fn compare_slot(position: usize, a: &SortValue, b: &SortValue, strict: bool) -> Result<Ordering> {
    compare_bound(&a.value, &b.value, strict, |x, y| {
        if a.descending != b.descending && strict {
            return Err(ViewError::invariant(format!(
                "sort position {} mixes ascending and descending values",
                position
            )));
        }
        let descending = a.descending && b.descending;

        let ord = match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => match x.compare(y) {
                Some(ord) => ord,
                None if strict => {
                    return Err(ViewError::comparison(format!(
                        "cannot compare {} ({}) with {} ({}) at sort position {}",
                        x,
                        x.kind(),
                        y,
                        y.kind(),
                        position
                    )));
                }
                None => x.kind().rank().cmp(&y.kind().rank()),
            },
        };
        Ok(if descending { ord.reverse() } else { ord })
    })
}

fn compare_bound<T>(
    a: &Bound<T>,
    b: &Bound<T>,
    strict: bool,
    compare_normal: impl FnOnce(&T, &T) -> Result<Ordering>,
) -> Result<Ordering> {
    match (a, b) {
        (Bound::Low, Bound::Low) | (Bound::High, Bound::High) => {
            if strict {
                Err(ViewError::invariant(
                    "two sort keys carry the same sentinel at one position",
                ))
            } else {
                Ok(Ordering::Equal)
            }
        }
        (Bound::Low, _) | (_, Bound::High) => Ok(Ordering::Less),
        (_, Bound::Low) | (Bound::High, _) => Ok(Ordering::Greater),
        (Bound::Normal(x), Bound::Normal(y)) => compare_normal(x, y),
    }
}

// With strict value types, a batch that would put two kinds at one sibling
// position is rejected before insertion, so stored siblings never reach the
// lenient branch.
impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other, false).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}
