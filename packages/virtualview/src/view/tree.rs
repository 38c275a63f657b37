//! Arena-backed view tree
//!
//! # Structure
//!
//! ```text
//! entries: EntryId -> ViewEntry            (owns every entry)
//! ViewEntry.children: SortKey -> EntryId   (sibling order)
//! ViewEntry.parent: Option<EntryId>        (non-owning back-reference)
//! by_scoped_id: ScopedId -> [EntryId]      (every placement of an id)
//! ```
//!
//! # Commit order of one batch
//!
//! 1. Removals: detach every placement, remember emptied parents
//! 2. Additions: drop prior placements, resolve category paths (creating
//!    categories on demand), insert the document leaves
//! 3. Prune categories left without children, up to the root
//! 4. Renumber the children of every parent touched in 1-3
//!
//! Sibling indices are only renumbered in step 4; in between they may be
//! stale.

use super::batch::{self, CategoryStep, PreparedBatch};
use super::type_guard::SiblingKindCheck;
use super::AcceptanceFn;
use crate::config::ViewConfig;
use crate::domain::{
    ColumnValue, ColumnValues, DataChange, EntryId, ScopedId, SortKey, ViewEntry, VirtualViewEntry,
};
use crate::error::{Result, ViewError};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Statistics of one applied batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Document placements detached (removals and replaced placements)
    pub removed: usize,
    /// Document placements inserted
    pub added: usize,
    /// Additions vetoed by the acceptance predicate
    pub rejected: usize,
    pub categories_created: usize,
    pub categories_pruned: usize,
    /// Parents whose children were renumbered
    pub renumbered_parents: usize,
}

pub struct ViewTree {
    config: ViewConfig,
    acceptance: Option<AcceptanceFn>,
    entries: FxHashMap<EntryId, ViewEntry>,
    root: EntryId,
    next_entry_id: u64,
    next_category_seq: u64,
    by_scoped_id: FxHashMap<ScopedId, Vec<EntryId>>,
    /// Parents whose sibling indices are stale
    pending_renumber: FxHashSet<EntryId>,
}

impl ViewTree {
    pub(crate) fn new(config: ViewConfig, acceptance: Option<AcceptanceFn>) -> Self {
        let root_id = EntryId(0);
        let root_scoped = ScopedId::root();
        let root = ViewEntry::new(
            root_id,
            root_scoped.clone(),
            String::new(),
            SortKey::category(0, None, false, &root_scoped),
            ColumnValues::new(),
            None,
        );

        let mut entries = FxHashMap::default();
        entries.insert(root_id, root);
        let mut by_scoped_id = FxHashMap::default();
        by_scoped_id.insert(root_scoped, vec![root_id]);

        Self {
            config,
            acceptance,
            entries,
            root: root_id,
            next_entry_id: 1,
            next_category_seq: 0,
            by_scoped_id,
            pending_renumber: FxHashSet::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutation
    // ═══════════════════════════════════════════════════════════════════════

    /// Apply one provider batch
    ///
    /// The batch is prepared and checked in full before the tree is touched;
    /// on error the tree is exactly as before the call.
    pub(crate) fn apply(&mut self, change: &DataChange) -> Result<BatchStats> {
        let prepared = batch::prepare(change, &self.config, self.acceptance.as_ref())?;
        if self.config.strict_value_types {
            SiblingKindCheck::run(self, &prepared)?;
        }
        Ok(self.commit(prepared))
    }

    fn commit(&mut self, prepared: PreparedBatch) -> BatchStats {
        let mut stats = BatchStats::default();
        let mut emptied = Vec::new();

        for scoped_id in &prepared.removals {
            stats.removed += self.remove_placements(scoped_id, &mut emptied);
        }

        for row in prepared.rows {
            stats.removed += self.remove_placements(&row.scoped_id, &mut emptied);
            if !row.accepted {
                stats.rejected += 1;
                continue;
            }

            let mut parents = Vec::with_capacity(row.category_paths.len().max(1));
            if row.category_paths.is_empty() {
                parents.push(self.root);
            }
            for path in &row.category_paths {
                let parent = self.resolve_category_path(path, &mut stats);
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }

            let key = SortKey::document(row.document_key, &row.scoped_id);
            for parent in parents {
                self.attach(
                    parent,
                    row.scoped_id.clone(),
                    row.unid.clone(),
                    key.clone(),
                    row.values.clone(),
                );
                stats.added += 1;
            }
        }

        stats.categories_pruned = self.prune(emptied);
        stats.renumbered_parents = self.flush_renumbering();
        stats
    }

    /// Detach every document placement of `scoped_id`; returns the count
    fn remove_placements(&mut self, scoped_id: &ScopedId, emptied: &mut Vec<EntryId>) -> usize {
        let Some(placements) = self.by_scoped_id.get(scoped_id).cloned() else {
            return 0;
        };

        let mut removed = 0;
        for id in placements {
            if let Some(entry) = self.detach(id) {
                removed += 1;
                if let Some(parent) = entry.parent {
                    if parent != self.root {
                        emptied.push(parent);
                    }
                }
            }
        }
        removed
    }

    fn resolve_category_path(&mut self, path: &[CategoryStep], stats: &mut BatchStats) -> EntryId {
        let mut parent = self.root;
        for step in path {
            parent = self.find_or_create_category(parent, step, stats);
        }
        parent
    }

    fn find_or_create_category(
        &mut self,
        parent: EntryId,
        step: &CategoryStep,
        stats: &mut BatchStats,
    ) -> EntryId {
        let (low, high) =
            SortKey::category_bounds(step.column, step.value.clone(), step.descending);
        let existing = self
            .entries
            .get(&parent)
            .and_then(|entry| entry.children.range(low..=high).next())
            .map(|(_, id)| *id);
        if let Some(id) = existing {
            return id;
        }

        self.next_category_seq += 1;
        let scoped_id = ScopedId::category(self.next_category_seq);
        let key =
            SortKey::category(step.column, step.value.clone(), step.descending, &scoped_id);

        let mut values = ColumnValues::new();
        if let Some(column) = self.config.columns.get(step.column) {
            values.insert(
                column.item_name.clone(),
                ColumnValue::from(step.value.clone()),
            );
        }

        stats.categories_created += 1;
        let id = self.attach(parent, scoped_id, String::new(), key, values);
        tracing::trace!(category = %id, parent = %parent, "created category");
        id
    }

    fn attach(
        &mut self,
        parent: EntryId,
        scoped_id: ScopedId,
        unid: String,
        key: SortKey,
        values: ColumnValues,
    ) -> EntryId {
        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;

        let is_category = scoped_id.is_category();
        if let Some(parent_entry) = self.entries.get_mut(&parent) {
            parent_entry.children.insert(key.clone(), id);
            parent_entry.counters.child_attached(is_category);
        }
        self.for_each_ancestor(parent, |entry| {
            entry.counters.descendant_attached(is_category)
        });

        self.by_scoped_id
            .entry(scoped_id.clone())
            .or_default()
            .push(id);
        self.entries.insert(
            id,
            ViewEntry::new(id, scoped_id, unid, key, values, Some(parent)),
        );
        self.pending_renumber.insert(parent);
        id
    }

    /// Unlink a childless entry from its parent and the id index
    fn detach(&mut self, id: EntryId) -> Option<ViewEntry> {
        if id == self.root {
            return None;
        }
        let entry = self.entries.remove(&id)?;
        debug_assert!(entry.children.is_empty(), "detached {} with children", id);

        let is_category = entry.is_category();
        if let Some(parent) = entry.parent {
            if let Some(parent_entry) = self.entries.get_mut(&parent) {
                parent_entry.children.remove(&entry.sort_key);
                parent_entry.counters.child_detached(is_category);
            }
            self.for_each_ancestor(parent, |ancestor| {
                ancestor.counters.descendant_detached(is_category)
            });
            self.pending_renumber.insert(parent);
        }

        if let Some(placements) = self.by_scoped_id.get_mut(&entry.scoped_id) {
            placements.retain(|placement| *placement != id);
            if placements.is_empty() {
                self.by_scoped_id.remove(&entry.scoped_id);
            }
        }
        self.pending_renumber.remove(&id);
        Some(entry)
    }

    fn for_each_ancestor(&self, start: EntryId, mut f: impl FnMut(&ViewEntry)) {
        let mut current = Some(start);
        while let Some(id) = current {
            let Some(entry) = self.entries.get(&id) else {
                break;
            };
            f(entry);
            current = entry.parent;
        }
    }

    /// Remove emptied categories, walking up each chain until a category
    /// with remaining children (or the root) is reached
    fn prune(&mut self, candidates: Vec<EntryId>) -> usize {
        let mut pruned = 0;
        for candidate in candidates {
            let mut current = candidate;
            while current != self.root {
                let Some(entry) = self.entries.get(&current) else {
                    break;
                };
                if entry.has_children() || !entry.is_category() {
                    break;
                }
                let parent = entry.parent;
                if self.detach(current).is_some() {
                    pruned += 1;
                    tracing::trace!(category = %current, "pruned empty category");
                }
                match parent {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }
        pruned
    }

    /// One renumbering pass per touched parent
    fn flush_renumbering(&mut self) -> usize {
        let dirty: Vec<EntryId> = self.pending_renumber.drain().collect();
        let mut renumbered = 0;

        for parent in dirty {
            let Some(entry) = self.entries.get(&parent) else {
                continue;
            };
            let children: Vec<EntryId> = entry.children.values().copied().collect();
            for (index, child) in children.into_iter().enumerate() {
                if let Some(child) = self.entries.get_mut(&child) {
                    child.sibling_index = index + 1;
                }
            }
            renumbered += 1;
        }
        renumbered
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Read API
    // ═══════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn root_id(&self) -> EntryId {
        self.root
    }

    pub fn root(&self) -> &ViewEntry {
        &self.entries[&self.root]
    }

    pub fn entry(&self, id: EntryId) -> Option<&ViewEntry> {
        self.entries.get(&id)
    }

    /// Children of `id` in sibling order (empty for unknown ids)
    pub fn children(&self, id: EntryId) -> impl DoubleEndedIterator<Item = &ViewEntry> + '_ {
        self.entries
            .get(&id)
            .into_iter()
            .flat_map(move |entry| entry.children.values().filter_map(move |c| self.entries.get(c)))
    }

    pub(crate) fn child_map(&self, id: EntryId) -> Option<&BTreeMap<SortKey, EntryId>> {
        self.entries.get(&id).map(|entry| &entry.children)
    }

    /// Every placement of a document (or the single entry of a category)
    pub fn placements(&self, scoped_id: &ScopedId) -> &[EntryId] {
        self.by_scoped_id
            .get(scoped_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sibling indices from the top level down to `id`; empty for the root
    /// and for unknown ids
    pub fn position(&self, id: EntryId) -> Vec<usize> {
        let mut position = Vec::new();
        let mut current = self.entries.get(&id);
        while let Some(entry) = current {
            let Some(parent) = entry.parent else {
                break;
            };
            position.push(entry.sibling_index);
            current = self.entries.get(&parent);
        }
        position.reverse();
        position
    }

    /// Depth below the root (0 = top level); `None` for the root itself
    pub fn level(&self, id: EntryId) -> Option<usize> {
        let mut depth = 0usize;
        let mut current = self.entries.get(&id)?;
        current.parent?;
        while let Some(parent) = current.parent {
            current = self.entries.get(&parent)?;
            depth += 1;
        }
        Some(depth - 1)
    }

    /// Resolve a position path of 1-based sibling indices
    pub fn entry_at(&self, position: &[usize]) -> Option<EntryId> {
        if position.is_empty() {
            return None;
        }
        let mut current = self.root;
        for &index in position {
            let children = self.child_map(current)?;
            current = *children.values().nth(index.checked_sub(1)?)?;
        }
        Some(current)
    }

    /// Detached copy of an entry; `None` for the root, which is not part of
    /// the visible hierarchy
    pub fn snapshot(&self, id: EntryId) -> Option<VirtualViewEntry> {
        let entry = self.entries.get(&id)?;
        let level = self.level(id)?;
        Some(VirtualViewEntry::capture(entry, self.position(id), level))
    }

    /// Snapshots of every placement of `(origin, id)`, in tree order
    pub fn find_entries(&self, scoped_id: &ScopedId) -> Vec<VirtualViewEntry> {
        let mut found: Vec<VirtualViewEntry> = self
            .placements(scoped_id)
            .iter()
            .filter_map(|id| self.snapshot(*id))
            .collect();
        found.sort_by(|a, b| a.position.cmp(&b.position));
        found
    }

    /// Distinct document ids (not placements) in the view
    pub fn document_count(&self) -> usize {
        self.by_scoped_id
            .keys()
            .filter(|scoped_id| !scoped_id.is_category())
            .count()
    }

    /// Every entry except the root
    pub fn entry_count(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn origins(&self) -> Vec<String> {
        self.by_scoped_id
            .keys()
            .filter(|scoped_id| !scoped_id.is_category())
            .map(|scoped_id| scoped_id.origin.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn ids_for_origin(&self, origin: &str) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .by_scoped_id
            .keys()
            .filter(|scoped_id| !scoped_id.is_category() && scoped_id.origin == origin)
            .map(|scoped_id| scoped_id.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Integrity
    // ═══════════════════════════════════════════════════════════════════════

    /// Check every structural invariant of the tree
    ///
    /// # Errors
    ///
    /// Returns an `Invariant` error describing the first violation found, or
    /// a `Comparison` error if two stored siblings are not comparable.
    pub fn verify_integrity(&self) -> Result<()> {
        let mut reached = 1usize;
        self.verify_subtree(self.root, &mut reached)?;
        if reached != self.entries.len() {
            return Err(ViewError::invariant(format!(
                "{} entries in the arena but {} reachable from the root",
                self.entries.len(),
                reached
            )));
        }

        let mut indexed = 0usize;
        for (scoped_id, placements) in &self.by_scoped_id {
            if placements.is_empty() {
                return Err(ViewError::invariant(format!(
                    "empty placement list for {}",
                    scoped_id
                )));
            }
            for id in placements {
                match self.entries.get(id) {
                    Some(entry) if &entry.scoped_id == scoped_id => {}
                    _ => {
                        return Err(ViewError::invariant(format!(
                            "stale placement {} indexed for {}",
                            id, scoped_id
                        )))
                    }
                }
            }
            if !scoped_id.is_category() {
                let parents: FxHashSet<_> = placements
                    .iter()
                    .filter_map(|id| self.entries.get(id).and_then(|e| e.parent))
                    .collect();
                if parents.len() != placements.len() {
                    return Err(ViewError::invariant(format!(
                        "{} placed twice under one parent",
                        scoped_id
                    )));
                }
            }
            indexed += placements.len();
        }
        if indexed != self.entries.len() {
            return Err(ViewError::invariant(format!(
                "id index holds {} placements for {} entries",
                indexed,
                self.entries.len()
            )));
        }

        if !self.pending_renumber.is_empty() {
            return Err(ViewError::invariant(
                "sibling renumbering left pending after a batch",
            ));
        }
        Ok(())
    }

    /// Strict comparison unless the view tolerates mixed value kinds
    fn compare_keys(&self, a: &SortKey, b: &SortKey) -> Result<Ordering> {
        if self.config.strict_value_types {
            a.try_compare(b)
        } else {
            Ok(a.cmp(b))
        }
    }

    /// Returns `(categories, documents)` below `id`
    fn verify_subtree(&self, id: EntryId, reached: &mut usize) -> Result<(usize, usize)> {
        let entry = self
            .entries
            .get(&id)
            .ok_or_else(|| ViewError::invariant(format!("dangling child handle {}", id)))?;

        if entry.is_category() && id != self.root && entry.children.is_empty() {
            return Err(ViewError::invariant(format!(
                "empty category {} survived pruning",
                entry.scoped_id
            )));
        }
        if entry.is_document() && !entry.children.is_empty() {
            return Err(ViewError::invariant(format!(
                "document {} has children",
                entry.scoped_id
            )));
        }

        let mut categories = 0usize;
        let mut documents = 0usize;
        let mut child_categories = 0usize;
        let mut seen_document = false;
        let mut previous: Option<&SortKey> = None;

        for (index, (key, child_id)) in entry.children.iter().enumerate() {
            let child = self.entries.get(child_id).ok_or_else(|| {
                ViewError::invariant(format!("dangling child handle {} under {}", child_id, id))
            })?;
            *reached += 1;

            if child.parent != Some(id) {
                return Err(ViewError::invariant(format!(
                    "{} listed under {} but points to {:?}",
                    child_id, id, child.parent
                )));
            }
            if self.compare_keys(&child.sort_key, key)? != Ordering::Equal {
                return Err(ViewError::invariant(format!(
                    "{} stored under a key that differs from its own",
                    child_id
                )));
            }
            if child.sibling_index != index + 1 {
                return Err(ViewError::invariant(format!(
                    "{} has sibling index {} at rank {}",
                    child_id,
                    child.sibling_index,
                    index + 1
                )));
            }
            if let Some(previous) = previous {
                if self.compare_keys(previous, key)? != Ordering::Less {
                    return Err(ViewError::invariant(format!(
                        "children of {} are out of order at rank {}",
                        id,
                        index + 1
                    )));
                }
            }
            previous = Some(key);

            if child.is_category() {
                if seen_document {
                    return Err(ViewError::invariant(format!(
                        "category {} sorts after a document",
                        child.scoped_id
                    )));
                }
                child_categories += 1;
                categories += 1;
            } else {
                seen_document = true;
                documents += 1;
            }

            let (below_categories, below_documents) = self.verify_subtree(*child_id, reached)?;
            categories += below_categories;
            documents += below_documents;
        }

        let counters = &entry.counters;
        let expected = [
            ("child_count", counters.child_count(), entry.children.len()),
            (
                "child_category_count",
                counters.child_category_count(),
                child_categories,
            ),
            (
                "child_document_count",
                counters.child_document_count(),
                entry.children.len() - child_categories,
            ),
            (
                "descendant_count",
                counters.descendant_count(),
                categories + documents,
            ),
            (
                "descendant_category_count",
                counters.descendant_category_count(),
                categories,
            ),
            (
                "descendant_document_count",
                counters.descendant_document_count(),
                documents,
            ),
        ];
        for (name, actual, scanned) in expected {
            if actual != scanned {
                return Err(ViewError::invariant(format!(
                    "{} of {} is {} but the subtree holds {}",
                    name, entry.scoped_id, actual, scanned
                )));
            }
        }

        Ok((categories, documents))
    }
}

impl std::fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewTree")
            .field("entries", &self.entries.len())
            .field("columns", &self.config.columns.len())
            .field("acceptance", &self.acceptance.is_some())
            .finish()
    }
}
