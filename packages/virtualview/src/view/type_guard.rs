// Sibling kind check
//
// Siblings compare their values position by position, so every sibling set
// must hold one value kind per position: the categories of one category
// column under a parent, and the documents under a parent at each document
// sort position. Before a batch is committed its effect is replayed against
// the live tree (removals, replaced placements, categories that would be
// created or pruned) and any sibling set that would end up holding two kinds
// rejects the whole batch.
//
// Live sibling sets are homogeneous, so one surviving non-null value stands
// for the kind of the whole set.

use super::batch::{CategoryStep, PreparedBatch};
use super::tree::ViewTree;
use crate::domain::{EntryId, ScalarValue, ScopedId, SortKey, ViewEntry};
use crate::error::{Result, ViewError};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// Parent of a sibling set: a live entry, or a category the batch creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Live(EntryId),
    Pending(usize),
}

/// One sort position among siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    /// Categories of one category column
    Category(usize),
    /// Documents, at one position of the document key
    Document(usize),
}

#[derive(Debug)]
struct PendingCategory {
    parent: Node,
    column: usize,
    value: Option<ScalarValue>,
}

pub(crate) struct SiblingKindCheck<'a> {
    tree: &'a ViewTree,
    /// Document placements the batch detaches
    detached: FxHashSet<EntryId>,
    /// Net child count change of live entries
    child_delta: FxHashMap<EntryId, isize>,
    pending: Vec<PendingCategory>,
    /// First value of each kind the batch adds to a sibling set
    added: FxHashMap<(Node, Slot), Vec<ScalarValue>>,
    /// Sibling sets in the order the batch first touches them
    touched: Vec<(Node, Slot)>,
}

impl<'a> SiblingKindCheck<'a> {
    /// Replay `batch` against `tree` without mutating it
    ///
    /// # Errors
    ///
    /// `Comparison` naming two values of different kinds that would become
    /// siblings at one sort position.
    pub(crate) fn run(tree: &'a ViewTree, batch: &PreparedBatch) -> Result<()> {
        let mut check = Self {
            tree,
            detached: FxHashSet::default(),
            child_delta: FxHashMap::default(),
            pending: Vec::new(),
            added: FxHashMap::default(),
            touched: Vec::new(),
        };

        for scoped_id in &batch.removals {
            check.detach_placements(scoped_id);
        }

        for row in &batch.rows {
            check.detach_placements(&row.scoped_id);
            if !row.accepted {
                continue;
            }

            let mut parents = Vec::with_capacity(row.category_paths.len().max(1));
            if row.category_paths.is_empty() {
                parents.push(Node::Live(tree.root_id()));
            }
            for path in &row.category_paths {
                let parent = check.resolve_path(path);
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }

            for parent in parents {
                check.add_child(parent);
                for (position, slot) in row.document_key.iter().enumerate() {
                    if let Some(value) = slot.scalar() {
                        check.observe(parent, Slot::Document(position), value);
                    }
                }
            }
        }

        check.finish()
    }

    fn detach_placements(&mut self, scoped_id: &ScopedId) {
        for id in self.tree.placements(scoped_id) {
            if !self.detached.insert(*id) {
                continue;
            }
            if let Some(parent) = self.tree.entry(*id).and_then(ViewEntry::parent) {
                *self.child_delta.entry(parent).or_default() -= 1;
            }
        }
    }

    fn resolve_path(&mut self, path: &[CategoryStep]) -> Node {
        let mut node = Node::Live(self.tree.root_id());
        for step in path {
            node = self.find_or_create(node, step);
        }
        node
    }

    fn find_or_create(&mut self, parent: Node, step: &CategoryStep) -> Node {
        if let Node::Live(id) = parent {
            let (low, high) =
                SortKey::category_bounds(step.column, step.value.clone(), step.descending);
            let existing = self
                .tree
                .child_map(id)
                .and_then(|children| children.range(low..=high).next())
                .map(|(_, child)| *child);
            if let Some(child) = existing {
                return Node::Live(child);
            }
        }

        let known = self.pending.iter().position(|category| {
            category.parent == parent
                && category.column == step.column
                && same_value(&category.value, &step.value)
        });
        if let Some(index) = known {
            return Node::Pending(index);
        }

        self.pending.push(PendingCategory {
            parent,
            column: step.column,
            value: step.value.clone(),
        });
        self.add_child(parent);
        if let Some(value) = &step.value {
            self.observe(parent, Slot::Category(step.column), value);
        }
        Node::Pending(self.pending.len() - 1)
    }

    fn add_child(&mut self, parent: Node) {
        if let Node::Live(id) = parent {
            *self.child_delta.entry(id).or_default() += 1;
        }
    }

    fn observe(&mut self, parent: Node, slot: Slot, value: &ScalarValue) {
        let key = (parent, slot);
        if !self.added.contains_key(&key) {
            self.touched.push(key);
        }
        let values = self.added.entry(key).or_default();
        if !values.iter().any(|known| known.kind() == value.kind()) {
            values.push(value.clone());
        }
    }

    fn finish(self) -> Result<()> {
        let pruned = self.pruned_categories();

        for key in &self.touched {
            let Some(added) = self.added.get(key) else {
                continue;
            };
            let (node, slot) = *key;
            let live = match node {
                Node::Live(id) => self.surviving_value(id, slot, &pruned),
                Node::Pending(_) => None,
            };

            let conflict = match live {
                Some(existing) => added
                    .iter()
                    .find(|value| value.kind() != existing.kind())
                    .map(|value| (value, existing)),
                None => added.get(1).zip(added.first()),
            };
            if let Some((value, other)) = conflict {
                return Err(ViewError::comparison(format!(
                    "cannot compare {} ({}) with {} ({}) among siblings in column '{}'",
                    value,
                    value.kind(),
                    other,
                    other.kind(),
                    self.item_name(slot)
                )));
            }
        }
        Ok(())
    }

    /// Live categories the batch leaves without children
    fn pruned_categories(&self) -> FxHashSet<EntryId> {
        let mut delta = self.child_delta.clone();
        let mut pruned = FxHashSet::default();
        let mut candidates: Vec<EntryId> = delta
            .iter()
            .filter(|(_, change)| **change < 0)
            .map(|(id, _)| *id)
            .collect();

        while let Some(id) = candidates.pop() {
            let Some(entry) = self.tree.entry(id) else {
                continue;
            };
            if entry.is_root() || !entry.is_category() || pruned.contains(&id) {
                continue;
            }
            let remaining = entry.child_count() as isize + delta.get(&id).copied().unwrap_or(0);
            if remaining > 0 {
                continue;
            }
            pruned.insert(id);
            if let Some(parent) = entry.parent() {
                *delta.entry(parent).or_default() -= 1;
                candidates.push(parent);
            }
        }
        pruned
    }

    /// First non-null value at `slot` among children of `id` the batch keeps
    fn surviving_value(
        &self,
        id: EntryId,
        slot: Slot,
        pruned: &FxHashSet<EntryId>,
    ) -> Option<&'a ScalarValue> {
        let tree = self.tree;
        let children = tree.child_map(id)?;
        let (low, high) = match slot {
            Slot::Category(_) => SortKey::categories(),
            Slot::Document(_) => SortKey::documents(),
        };

        children
            .range(low..=high)
            .filter(|(_, child)| !self.detached.contains(*child) && !pruned.contains(*child))
            .find_map(|(key, _)| match slot {
                Slot::Category(column) if key.column() == column => key.values().first()?.scalar(),
                Slot::Category(_) => None,
                Slot::Document(position) => key.values().get(position)?.scalar(),
            })
    }

    fn item_name(&self, slot: Slot) -> &'a str {
        let config = self.tree.config();
        let column = match slot {
            Slot::Category(index) => config.columns.get(index),
            Slot::Document(position) => config.document_sort_columns().nth(position),
        };
        column.map(|c| c.item_name.as_str()).unwrap_or("?")
    }
}

fn same_value(a: &Option<ScalarValue>, b: &Option<ScalarValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.compare(b) == Some(Ordering::Equal),
        _ => false,
    }
}
