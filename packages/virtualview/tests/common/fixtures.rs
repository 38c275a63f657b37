//! Test fixtures

use super::builders::people_batch;
use virtualview::{SortDirection, View, ViewConfig, VirtualViewColumn};

/// `[Category(dept, ASC), Sort(name, ASC)]`
pub fn dept_name_config() -> ViewConfig {
    ViewConfig::new(vec![
        VirtualViewColumn::new("Department", "dept").categorized(SortDirection::Ascending),
        VirtualViewColumn::new("Name", "name").sorted(SortDirection::Ascending),
    ])
}

pub fn dept_name_view() -> View {
    View::new("people", dept_name_config()).expect("valid fixture config")
}

/// Flat view sorted by name only
pub fn flat_view(direction: SortDirection) -> View {
    View::builder("flat")
        .column(VirtualViewColumn::new("Name", "name").sorted(direction))
        .build()
        .expect("valid fixture config")
}

/// Org chart used by traversal tests
///
/// ```text
/// 1     Eng
/// 1.1     Alice   (o1, 1)
/// 1.2     Bob     (o1, 2)
/// 2     Ops
/// 2.1     Carol   (o1, 3)
/// 2.2     Dave    (o1, 4)
/// 3     Sales
/// 3.1     Erin    (o1, 5)
/// ```
pub fn org_view() -> View {
    let view = dept_name_view();
    view.apply_changes(&people_batch(
        "o1",
        &[
            (1, "Eng", "Alice"),
            (2, "Eng", "Bob"),
            (3, "Ops", "Carol"),
            (4, "Ops", "Dave"),
            (5, "Sales", "Erin"),
        ],
    ))
    .expect("fixture batch applies");
    view
}
