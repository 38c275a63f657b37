// Prepare phase of a data change
//
// Everything that can fail runs here, against an immutable view: id
// validation, value functions, the acceptance predicate, sort key and
// category path computation. The sibling kind check then replays the batch
// against the tree; the commit phase that follows only mutates the tree and
// cannot fail.

use super::AcceptanceFn;
use crate::config::ViewConfig;
use crate::domain::{
    ColumnValue, ColumnValues, DataChange, RowContext, ScalarValue, ScopedId, SortValue,
    CATEGORY_FLAG, CATEGORY_ORIGIN,
};
use crate::error::{Result, ViewError};

/// One level of a category path
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryStep {
    /// Index of the category column in the view config
    pub column: usize,
    pub value: Option<ScalarValue>,
    pub descending: bool,
}

#[derive(Debug)]
pub(crate) struct PreparedRow {
    pub scoped_id: ScopedId,
    pub unid: String,
    pub values: ColumnValues,
    pub document_key: Vec<SortValue>,
    /// One path per placement; empty when the view has no category columns
    pub category_paths: Vec<Vec<CategoryStep>>,
    pub accepted: bool,
}

#[derive(Debug)]
pub(crate) struct PreparedBatch {
    pub removals: Vec<ScopedId>,
    pub rows: Vec<PreparedRow>,
}

pub(crate) fn prepare(
    change: &DataChange,
    config: &ViewConfig,
    acceptance: Option<&AcceptanceFn>,
) -> Result<PreparedBatch> {
    validate_origin(&change.origin)?;
    for id in change.removals.iter().chain(change.additions.keys()) {
        validate_id(&change.origin, *id)?;
    }

    let removals = change
        .removals
        .iter()
        .map(|id| ScopedId::new(change.origin.as_str(), *id))
        .collect();

    let mut rows = Vec::with_capacity(change.additions.len());

    for (id, addition) in &change.additions {
        let scoped_id = ScopedId::new(change.origin.as_str(), *id);
        let values = evaluate_value_functions(config, &scoped_id, &addition.unid, &addition.values)?;

        let accepted = acceptance
            .map(|accept| accept(&scoped_id, &addition.unid, &values))
            .unwrap_or(true);

        if !accepted {
            rows.push(PreparedRow {
                scoped_id,
                unid: addition.unid.clone(),
                values,
                document_key: Vec::new(),
                category_paths: Vec::new(),
                accepted,
            });
            continue;
        }

        let document_key = document_key(config, &values);
        let category_paths = category_paths(config, &values);

        rows.push(PreparedRow {
            scoped_id,
            unid: addition.unid.clone(),
            values,
            document_key,
            category_paths,
            accepted,
        });
    }

    Ok(PreparedBatch { removals, rows })
}

fn validate_origin(origin: &str) -> Result<()> {
    if origin.is_empty() {
        return Err(ViewError::invalid_input("data change has an empty origin"));
    }
    if origin == CATEGORY_ORIGIN {
        return Err(ViewError::invalid_input(format!(
            "origin '{}' is reserved for categories",
            CATEGORY_ORIGIN
        )));
    }
    Ok(())
}

fn validate_id(origin: &str, id: u64) -> Result<()> {
    if id & CATEGORY_FLAG != 0 {
        return Err(ViewError::invalid_input(format!(
            "id {:#x} from origin '{}' carries the reserved category bit",
            id, origin
        )));
    }
    Ok(())
}

/// Run value-function columns in declaration order; each one sees the
/// provider values plus the results of earlier functions
fn evaluate_value_functions(
    config: &ViewConfig,
    scoped_id: &ScopedId,
    unid: &str,
    provided: &ColumnValues,
) -> Result<ColumnValues> {
    let mut values = provided.clone();

    for column in &config.columns {
        let Some(function) = &column.value_function else {
            continue;
        };

        let row = RowContext {
            scoped_id,
            unid,
            values: &values,
        };
        let value = function(&row).map_err(|source| {
            let mut err = ViewError::value_function(
                &column.item_name,
                format!("{} (row {})", source, scoped_id),
            );
            err.source = Some(source);
            err
        })?;

        values.insert(column.item_name.clone(), value);
    }

    Ok(values)
}

fn document_key(config: &ViewConfig, values: &ColumnValues) -> Vec<SortValue> {
    config
        .document_sort_columns()
        .map(|column| {
            let value = values
                .get(&column.item_name)
                .and_then(ColumnValue::sort_value)
                .cloned();
            SortValue::new(value, column.is_descending())
        })
        .collect()
}

/// Cartesian product over category columns of the distinct values of each
/// column; a value containing the path separator expands into a chain of
/// nested steps
fn category_paths(config: &ViewConfig, values: &ColumnValues) -> Vec<Vec<CategoryStep>> {
    let mut paths: Vec<Vec<CategoryStep>> = Vec::new();

    for (index, column) in config.columns.iter().enumerate() {
        if !column.is_category() {
            continue;
        }
        let descending = column.is_descending();

        let scalars = values
            .get(&column.item_name)
            .map(ColumnValue::values)
            .unwrap_or(&[]);

        let mut alternatives: Vec<Vec<CategoryStep>> = Vec::new();
        for scalar in scalars {
            let mut chain = Vec::new();
            for segment in split_segments(scalar, config.path_separator) {
                chain.push(CategoryStep {
                    column: index,
                    value: segment,
                    descending,
                });
            }
            if !alternatives.contains(&chain) {
                alternatives.push(chain);
            }
        }
        if alternatives.is_empty() {
            alternatives.push(vec![CategoryStep {
                column: index,
                value: None,
                descending,
            }]);
        }

        paths = if paths.is_empty() {
            alternatives
        } else {
            paths
                .iter()
                .flat_map(|prefix| {
                    alternatives.iter().map(move |chain| {
                        let mut path = prefix.clone();
                        path.extend(chain.iter().cloned());
                        path
                    })
                })
                .collect()
        };
    }

    paths
}

fn split_segments(value: &ScalarValue, separator: char) -> Vec<Option<ScalarValue>> {
    let ScalarValue::String(text) = value else {
        return vec![Some(value.clone())];
    };

    let segments: Vec<Option<ScalarValue>> = text
        .split(separator)
        .filter(|segment| !segment.is_empty())
        .map(|segment| Some(ScalarValue::from(segment)))
        .collect();

    if segments.is_empty() {
        vec![None]
    } else {
        segments
    }
}
