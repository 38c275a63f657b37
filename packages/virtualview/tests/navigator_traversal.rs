//! Navigator traversal over the org chart fixture
//!
//! ```text
//! 1     Eng          1.1 Alice   1.2 Bob
//! 2     Ops          2.1 Carol   2.2 Dave
//! 3     Sales        3.1 Erin
//! ```

mod common;

use common::*;
use pretty_assertions::assert_eq;
use virtualview::{Expansion, NavigatorState, ScopedId, ViewNavigator};

fn walk_forward(nav: &mut ViewNavigator<'_>) -> Vec<String> {
    let mut labels = Vec::new();
    if nav.goto_first() {
        labels.push(label(nav.tree(), nav.current_id().unwrap()));
        while nav.goto_next() {
            labels.push(label(nav.tree(), nav.current_id().unwrap()));
        }
    }
    labels
}

fn walk_backward(nav: &mut ViewNavigator<'_>) -> Vec<String> {
    let mut labels = Vec::new();
    if nav.goto_last() {
        labels.push(label(nav.tree(), nav.current_id().unwrap()));
        while nav.goto_prev() {
            labels.push(label(nav.tree(), nav.current_id().unwrap()));
        }
    }
    labels
}

// ═══════════════════════════════════════════════════════════════════════════
// Ordered Traversal
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_traversal_both_directions() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        let forward = walk_forward(&mut nav);
        assert_eq!(
            forward,
            vec!["Eng", "Alice", "Bob", "Ops", "Carol", "Dave", "Sales", "Erin"]
        );

        let mut backward = walk_backward(&mut nav);
        backward.reverse();
        assert_eq!(backward, forward);
    });
}

#[test]
fn test_direction_changes_mid_level() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        assert!(nav.goto_pos(&[2, 1]));
        assert!(nav.goto_next());
        assert_eq!(label(tree, nav.current_id().unwrap()), "Dave");
        assert!(nav.goto_prev());
        assert_eq!(label(tree, nav.current_id().unwrap()), "Carol");
        assert!(nav.goto_prev());
        assert_eq!(label(tree, nav.current_id().unwrap()), "Ops");
        assert!(nav.goto_prev());
        assert_eq!(label(tree, nav.current_id().unwrap()), "Bob");
        assert!(nav.goto_next());
        assert_eq!(label(tree, nav.current_id().unwrap()), "Ops");
    });
}

#[test]
fn test_exhausted_traversal_keeps_cursor() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        assert!(nav.goto_first());
        assert!(!nav.goto_prev());
        assert_eq!(nav.current_position(), Some(vec![1]));

        assert!(nav.goto_last());
        assert!(!nav.goto_next());
        assert_eq!(nav.current_position(), Some(vec![3, 1]));
    });
}

#[test]
fn test_empty_view() {
    let view = dept_name_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        assert!(!nav.goto_first());
        assert!(!nav.goto_last());
        assert!(!nav.goto_next());
        assert!(!nav.goto_prev());
        assert!(nav.current().is_none());
        assert!(nav.read_entries(5).is_empty());
    });
}

// ═══════════════════════════════════════════════════════════════════════════
// Expand / Collapse
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_mostly_collapsed_with_exceptions() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let state = NavigatorState::new(Expansion::Collapsed);
        let mut nav = ViewNavigator::with_state(tree, state);
        assert!(nav.expand_pos(&[2]));

        assert_eq!(walk_forward(&mut nav), vec!["Eng", "Ops", "Carol", "Dave", "Sales"]);
        assert_eq!(walk_backward(&mut nav), vec!["Sales", "Dave", "Carol", "Ops", "Eng"]);
        assert_eq!(nav.state().expansion.exception_count(), 1);
    });
}

#[test]
fn test_collapse_by_scoped_id() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        let eng = tree.entry(tree.entry_at(&[1]).unwrap()).unwrap().scoped_id().clone();
        nav.collapse(&eng);
        assert!(!nav.is_expanded(&eng));
        assert!(nav.is_expanded(&ScopedId::root()));

        assert_eq!(
            walk_forward(&mut nav),
            vec!["Eng", "Ops", "Carol", "Dave", "Sales", "Erin"]
        );

        // Child navigation ignores expansion
        assert!(nav.goto_pos(&[1]));
        assert!(nav.goto_first_child());
        assert_eq!(label(tree, nav.current_id().unwrap()), "Alice");

        nav.expand_all();
        assert!(nav.is_expanded(&eng));
    });
}

// ═══════════════════════════════════════════════════════════════════════════
// Position Addressing
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_position_round_trip_for_every_entry() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        let snapshots = nav.read_entries(100);
        assert_eq!(snapshots.len(), 8);

        for snapshot in &snapshots {
            let mut cursor = ViewNavigator::new(tree);
            assert!(cursor.goto_pos(&snapshot.position));
            let current = cursor.current().unwrap();
            assert_eq!(current.scoped_id, snapshot.scoped_id);
            assert_eq!(cursor.current_position().unwrap(), snapshot.position);
            assert_eq!(
                cursor.get_pos(&snapshot.position).unwrap().scoped_id,
                snapshot.scoped_id
            );
        }
    });
}

#[test]
fn test_unknown_positions() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        assert!(nav.goto_pos(&[2, 2]));
        for bad in [&[4][..], &[0][..], &[1, 3][..], &[1, 1, 1][..], &[][..]] {
            assert!(nav.get_pos(bad).is_none());
            assert!(!nav.goto_pos(bad));
        }
        assert_eq!(nav.current_position(), Some(vec![2, 2]));
    });
}

// ═══════════════════════════════════════════════════════════════════════════
// Visibility & Selection
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_visibility_filter() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        // Hide odd document ids
        let mut nav =
            ViewNavigator::new(tree).with_visibility(|entry| entry.is_category() || entry.scoped_id().id % 2 == 0);

        assert_eq!(walk_forward(&mut nav), vec!["Eng", "Bob", "Ops", "Dave", "Sales"]);
        let mut backward = walk_backward(&mut nav);
        backward.reverse();
        assert_eq!(backward, vec!["Eng", "Bob", "Ops", "Dave", "Sales"]);

        assert!(!nav.goto_pos(&[1, 1]));
        assert!(!nav.goto_entry(&ScopedId::new("o1", 1)));
        assert!(nav.goto_entry(&ScopedId::new("o1", 2)));
        assert!(!nav.goto_prev_sibling());
    });
}

#[test]
fn test_state_survives_batches() {
    let view = org_view();
    let state = view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree).with_visibility(|entry| entry.scoped_id().id != 4);
        nav.select(&ScopedId::new("o1", 3), true);
        nav.into_state()
    });

    view.apply_changes(&people_batch("o1", &[(7, "Ops", "Bea")]))
        .unwrap();

    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::with_state(tree, state);
        assert!(nav.state().has_visibility());

        let ops_children: Vec<_> = {
            assert!(nav.goto_pos(&[2]));
            let mut labels = Vec::new();
            if nav.goto_first_child() {
                labels.push(label(tree, nav.current_id().unwrap()));
                while nav.goto_next_sibling() {
                    labels.push(label(tree, nav.current_id().unwrap()));
                }
            }
            labels
        };
        assert_eq!(ops_children, vec!["Bea", "Carol"]);

        let mut selected = Vec::new();
        assert!(nav.goto_first());
        assert!(!nav.goto_prev_selected());
        while nav.goto_next_selected() {
            selected.push(label(tree, nav.current_id().unwrap()));
        }
        assert_eq!(selected, vec!["Ops", "Carol"]);
    });
}

#[test]
fn test_select_all_with_exceptions() {
    let view = org_view();
    view.access_with_read_lock(|tree| {
        let mut nav = ViewNavigator::new(tree);
        nav.select_all();
        nav.deselect(&ScopedId::new("o1", 1), false);

        let mut selected = 0;
        while nav.goto_next_selected() {
            selected += 1;
        }
        assert_eq!(selected, 7);
        assert_eq!(nav.state().selection.exception_count(), 1);

        nav.deselect_all();
        assert!(!nav.goto_prev_selected());
    });
}

#[test]
fn test_navigator_over_read_guard() {
    let view = org_view();
    let guard = view.read();
    let mut nav = ViewNavigator::new(&guard);
    assert_eq!(nav.skip(3), 3);
    let current = nav.current().unwrap();
    assert_eq!(current.scoped_id, ScopedId::new("o1", 2));
    assert_eq!(current.level, 1);
}
