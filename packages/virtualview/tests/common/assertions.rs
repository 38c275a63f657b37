//! Custom assertions for view trees

use virtualview::{EntryId, View, ViewTree};

/// Assert every structural invariant of the view
pub fn assert_integrity(view: &View) {
    view.access_with_read_lock(|tree| {
        if let Err(err) = tree.verify_integrity() {
            panic!("view integrity violated: {}", err);
        }
    });
}

/// Display label of an entry: the category value or the document name
pub fn label(tree: &ViewTree, id: EntryId) -> String {
    let entry = tree.entry(id).expect("entry exists");
    let item = if entry.is_category() { "dept" } else { "name" };
    entry
        .column_value(item)
        .and_then(|value| value.values().first())
        .and_then(|value| value.as_str())
        .unwrap_or("<null>")
        .to_string()
}

/// Labels of the children of `parent`, in sibling order
pub fn child_labels(tree: &ViewTree, parent: EntryId) -> Vec<String> {
    tree.children(parent).map(|entry| label(tree, entry.id())).collect()
}

/// Indented outline of the whole tree, one entry per line
pub fn outline(view: &View) -> Vec<String> {
    fn walk(tree: &ViewTree, parent: EntryId, depth: usize, lines: &mut Vec<String>) {
        for child in tree.children(parent) {
            lines.push(format!("{}{}", "  ".repeat(depth), label(tree, child.id())));
            walk(tree, child.id(), depth + 1, lines);
        }
    }

    view.access_with_read_lock(|tree| {
        let mut lines = Vec::new();
        walk(tree, tree.root_id(), 0, &mut lines);
        lines
    })
}
