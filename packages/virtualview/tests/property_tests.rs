//! Property-based tests
//!
//! Invariants that should hold for ALL batch sequences:
//! - Integrity: every batch leaves a tree that passes `verify_integrity`
//! - Model agreement: live documents match a plain set of scoped ids
//! - Traversal symmetry: backward traversal is forward traversal reversed
//! - Addressing: every visited position leads back to its entry
//! - Category columns: sibling keys stay totally ordered whatever the
//!   column directions and nesting

mod common;

use common::*;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use virtualview::domain::SortValue;
use virtualview::{
    DataChange, EntryId, ErrorKind, Expansion, NavigatorState, ScalarValue, ScopedId,
    SortDirection, SortKey, View, ViewConfig, ViewNavigator, ViewTree, VirtualViewColumn,
};

const DEPTS: &[&str] = &["Eng", "eng", "Ops", "", "Eng\\Web", "Ops\\Infra\\Db"];
const NAMES: &[&str] = &["alice", "Alice", "bob", "", "carol", "dave"];

#[derive(Debug, Clone)]
enum Op {
    Add { id: u64, dept: usize, name: usize },
    Remove { id: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u64..12, 0..DEPTS.len(), 0..NAMES.len())
            .prop_map(|(id, dept, name)| Op::Add { id, dept, name }),
        1 => (0u64..12).prop_map(|id| Op::Remove { id }),
    ]
}

fn batch_strategy() -> impl Strategy<Value = (bool, Vec<Op>)> {
    (any::<bool>(), prop::collection::vec(op_strategy(), 1..8))
}

/// Turn generated ops into a batch, keeping the last op per id
fn to_change(origin: &str, ops: &[Op]) -> (DataChange, BTreeMap<u64, bool>) {
    let mut last: BTreeMap<u64, &Op> = BTreeMap::new();
    for op in ops {
        let id = match op {
            Op::Add { id, .. } | Op::Remove { id } => *id,
        };
        last.insert(id, op);
    }

    let mut change = DataChange::new(origin);
    let mut effect = BTreeMap::new();
    for (id, op) in last {
        match op {
            Op::Add { dept, name, .. } => {
                change.add_entry(id, format!("u{}", id), person(DEPTS[*dept], NAMES[*name]));
                effect.insert(id, true);
            }
            Op::Remove { .. } => {
                change.remove_entry(id);
                effect.insert(id, false);
            }
        }
    }
    (change, effect)
}

fn apply_all(view: &View, batches: &[(bool, Vec<Op>)]) -> BTreeSet<ScopedId> {
    let mut live = BTreeSet::new();
    for (second_origin, ops) in batches {
        let origin = if *second_origin { "o2" } else { "o1" };
        let (change, effect) = to_change(origin, ops);
        view.apply_changes(&change).unwrap();
        for (id, added) in effect {
            let scoped = ScopedId::new(origin, id);
            if added {
                live.insert(scoped);
            } else {
                live.remove(&scoped);
            }
        }
    }
    live
}

fn text_key(text: &str, descending: bool, origin: &str, id: u64) -> SortKey {
    SortKey::document(
        vec![SortValue::new(Some(ScalarValue::from(text)), descending)],
        &ScopedId::new(origin, id),
    )
}

// ============================================================================
// Sort Key Order
// ============================================================================

proptest! {
    #[test]
    fn prop_key_order_is_antisymmetric(
        a in "[a-cA-C]{0,3}",
        b in "[a-cA-C]{0,3}",
        descending in any::<bool>(),
        ids in (0u64..3, 0u64..3),
    ) {
        let ka = text_key(&a, descending, "o1", ids.0);
        let kb = text_key(&b, descending, "o1", ids.1);

        let ab = ka.try_compare(&kb).unwrap();
        let ba = kb.try_compare(&ka).unwrap();
        prop_assert_eq!(ab, ba.reverse());
        prop_assert_eq!(ka.cmp(&kb), ab);

        // Equal only when the tie-break ids agree
        if ab == Ordering::Equal {
            prop_assert_eq!(ids.0, ids.1);
        }
    }

    #[test]
    fn prop_key_order_is_transitive(
        texts in prop::collection::vec("[a-cA-C]{0,2}", 3),
        descending in any::<bool>(),
    ) {
        let mut keys: Vec<SortKey> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| text_key(t, descending, "o1", i as u64))
            .collect();
        keys.sort();

        for window in keys.windows(2) {
            prop_assert_eq!(window[0].try_compare(&window[1]).unwrap(), Ordering::Less);
        }
        prop_assert_eq!(keys[0].try_compare(&keys[2]).unwrap(), Ordering::Less);
    }
}

// ============================================================================
// Incremental Maintenance
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_batches_keep_integrity(batches in prop::collection::vec(batch_strategy(), 1..12)) {
        let view = dept_name_view();
        let live = apply_all(&view, &batches);

        prop_assert!(view.read().verify_integrity().is_ok());
        prop_assert_eq!(view.document_count(), live.len());
        // Single-valued categories place each document exactly once
        prop_assert_eq!(view.root_counters().descendant_document_count(), live.len());

        for scoped in &live {
            prop_assert!(!view.find_entries(&scoped.origin, scoped.id).is_empty());
        }
    }

    #[test]
    fn prop_re_adding_same_batch_is_idempotent(ops in prop::collection::vec(op_strategy(), 1..10)) {
        let view = dept_name_view();
        let (change, _) = to_change("o1", &ops);

        view.apply_changes(&change).unwrap();
        let before = outline(&view);
        let entries = view.entry_count();

        view.apply_changes(&change).unwrap();
        prop_assert_eq!(outline(&view), before);
        prop_assert_eq!(view.entry_count(), entries);
        assert_integrity(&view);
    }
}

// ============================================================================
// Category Columns
// ============================================================================

const FIRST: &[&str] = &["A", "A\\B", "B\\A", "", "B", "A\\B\\C", "a"];
const SECOND: &[&str] = &["A", "Z", "", "A\\Z", "B"];

#[derive(Debug, Clone)]
enum Second {
    Text(usize),
    Number(i32),
    Missing,
}

#[derive(Debug, Clone)]
enum CategoryOp {
    Add { id: u64, first: usize, second: Second },
    Remove { id: u64 },
}

fn second_strategy() -> impl Strategy<Value = Second> {
    prop_oneof![
        3 => (0..SECOND.len()).prop_map(Second::Text),
        1 => (0i32..3).prop_map(Second::Number),
        1 => Just(Second::Missing),
    ]
}

fn category_op_strategy() -> impl Strategy<Value = CategoryOp> {
    prop_oneof![
        4 => (0u64..10, 0..FIRST.len(), second_strategy())
            .prop_map(|(id, first, second)| CategoryOp::Add { id, first, second }),
        1 => (0u64..10).prop_map(|id| CategoryOp::Remove { id }),
    ]
}

fn direction(descending: bool) -> SortDirection {
    if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    }
}

fn category_view(first_descending: bool, second: Option<bool>) -> View {
    let mut columns =
        vec![VirtualViewColumn::new("C1", "c1").categorized(direction(first_descending))];
    if let Some(descending) = second {
        columns.push(VirtualViewColumn::new("C2", "c2").categorized(direction(descending)));
    }
    columns.push(VirtualViewColumn::new("Name", "name").sorted(SortDirection::Ascending));
    View::new("categories", ViewConfig::new(columns)).unwrap()
}

/// Keeps the last op per id; returns the batch and the ids it leaves live
fn category_change(ops: &[CategoryOp]) -> (DataChange, BTreeMap<u64, bool>) {
    let mut last: BTreeMap<u64, &CategoryOp> = BTreeMap::new();
    for op in ops {
        let id = match op {
            CategoryOp::Add { id, .. } | CategoryOp::Remove { id } => *id,
        };
        last.insert(id, op);
    }

    let mut change = DataChange::new("o1");
    let mut effect = BTreeMap::new();
    for (id, op) in last {
        match op {
            CategoryOp::Add { first, second, .. } => {
                let mut row = RowBuilder::new()
                    .with("c1", FIRST[*first])
                    .with("name", format!("n{}", id));
                row = match second {
                    Second::Text(index) => row.with("c2", SECOND[*index]),
                    Second::Number(n) => row.with("c2", *n),
                    Second::Missing => row,
                };
                change.add_entry(id, format!("u{}", id), row.build());
                effect.insert(id, true);
            }
            CategoryOp::Remove { .. } => {
                change.remove_entry(id);
                effect.insert(id, false);
            }
        }
    }
    (change, effect)
}

fn check_sibling_keys(tree: &ViewTree, parent: EntryId) -> Result<(), TestCaseError> {
    let keys: Vec<&SortKey> = tree.children(parent).map(|entry| entry.sort_key()).collect();
    for (i, a) in keys.iter().enumerate() {
        for (j, b) in keys.iter().enumerate() {
            let ab = a.try_compare(b).unwrap();
            prop_assert_eq!(ab, b.try_compare(a).unwrap().reverse());
            prop_assert_eq!(ab, i.cmp(&j));
        }
    }
    for child in tree.children(parent) {
        check_sibling_keys(tree, child.id())?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_category_columns_keep_total_order(
        first_descending in any::<bool>(),
        second in prop::option::of(any::<bool>()),
        batches in prop::collection::vec(prop::collection::vec(category_op_strategy(), 1..6), 1..8),
    ) {
        let view = category_view(first_descending, second);
        let mut live = BTreeSet::new();

        for ops in &batches {
            let (change, effect) = category_change(ops);
            let entries = view.entry_count();
            match view.apply_changes(&change) {
                Ok(_) => {
                    for (id, added) in effect {
                        if added {
                            live.insert(id);
                        } else {
                            live.remove(&id);
                        }
                    }

                    // Re-applying finds every category again
                    let after = view.entry_count();
                    prop_assert!(view.apply_changes(&change).is_ok());
                    prop_assert_eq!(view.entry_count(), after);
                }
                Err(err) => {
                    // Only a number meeting a string among c2 siblings can fail
                    prop_assert_eq!(err.kind, ErrorKind::Comparison);
                    prop_assert_eq!(view.entry_count(), entries);
                }
            }

            prop_assert!(view.read().verify_integrity().is_ok());
            prop_assert_eq!(view.document_count(), live.len());
            view.access_with_read_lock(|tree| check_sibling_keys(tree, tree.root_id()))?;
        }
    }
}

// ============================================================================
// Navigation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_backward_traversal_mirrors_forward(
        batches in prop::collection::vec(batch_strategy(), 1..8),
        collapsed in any::<bool>(),
        expanded_positions in prop::collection::vec(1usize..4, 0..3),
    ) {
        let view = dept_name_view();
        apply_all(&view, &batches);

        view.access_with_read_lock(|tree| {
            let mode = if collapsed { Expansion::Collapsed } else { Expansion::Expanded };
            let mut nav = ViewNavigator::with_state(tree, NavigatorState::new(mode));
            for top in &expanded_positions {
                nav.expand_pos(&[*top]);
            }

            let mut forward = Vec::new();
            if nav.goto_first() {
                forward.push(nav.current_id().unwrap());
                while nav.goto_next() {
                    forward.push(nav.current_id().unwrap());
                }
            }

            let mut backward = Vec::new();
            if nav.goto_last() {
                backward.push(nav.current_id().unwrap());
                while nav.goto_prev() {
                    backward.push(nav.current_id().unwrap());
                }
            }
            backward.reverse();

            prop_assert_eq!(forward, backward);
            Ok(())
        })?;
    }

    #[test]
    fn prop_positions_round_trip(batches in prop::collection::vec(batch_strategy(), 1..8)) {
        let view = dept_name_view();
        apply_all(&view, &batches);

        view.access_with_read_lock(|tree| {
            let mut nav = ViewNavigator::new(tree);
            let snapshots = nav.read_entries(usize::MAX);
            prop_assert_eq!(snapshots.len(), tree.entry_count());

            for snapshot in &snapshots {
                let mut cursor = ViewNavigator::new(tree);
                prop_assert!(cursor.goto_pos(&snapshot.position));
                prop_assert_eq!(cursor.current_position().unwrap(), snapshot.position.clone());
                prop_assert_eq!(&cursor.current().unwrap().scoped_id, &snapshot.scoped_id);
                prop_assert_eq!(tree.entry_at(&snapshot.position), cursor.current_id());
            }
            Ok(())
        })?;
    }
}
