//! Stateful cursor over a view
//!
//! A [`ViewNavigator`] borrows the tree for its whole life, so it can only be
//! created inside [`View::access_with_read_lock`](crate::View::access_with_read_lock)
//! or from a [`View::read`](crate::View::read) guard. Batches wait until the
//! navigator is gone.
//!
//! # Traversal
//!
//! `goto_next`/`goto_prev` walk the visible, expanded part of the tree in
//! pre-order (and its exact reverse):
//!
//! ```text
//! Eng            goto_next: Eng -> Alice -> Bob -> Ops -> Carol
//!   Alice        goto_prev: Carol -> Ops -> Bob -> Alice -> Eng
//!   Bob
//! Ops            collapsed Ops: Eng -> Alice -> Bob -> Ops
//!   Carol
//! ```
//!
//! Entries rejected by the visibility predicate are skipped together with
//! their subtrees.
//!
//! # State across lock scopes
//!
//! ```rust,ignore
//! let state = view.access_with_read_lock(|tree| {
//!     let mut nav = ViewNavigator::new(tree);
//!     nav.collapse_all();
//!     nav.goto_first();
//!     nav.into_state()
//! });
//! view.apply_changes(&change)?;
//! view.access_with_read_lock(|tree| {
//!     let mut nav = ViewNavigator::with_state(tree, state);
//!     nav.goto_first();
//! });
//! ```

mod cursor;
mod state;

pub use state::{ExceptionSet, ExpansionState, NavigatorState, SelectionState};

use crate::domain::{EntryId, ScopedId, ViewEntry, VirtualViewEntry};
use crate::view::ViewTree;
use cursor::{Direction, LevelCursor};
use std::sync::Arc;

/// Per-entry visibility check (e.g. an access-control test)
pub type VisibilityFn = Arc<dyn Fn(&ViewEntry) -> bool + Send + Sync>;

pub struct ViewNavigator<'a> {
    tree: &'a ViewTree,
    /// One cursor per level, top level first; empty before the first move
    stack: Vec<LevelCursor<'a>>,
    state: NavigatorState,
}

impl<'a> ViewNavigator<'a> {
    /// Navigator using the view's default expansion, nothing selected
    pub fn new(tree: &'a ViewTree) -> Self {
        let state = NavigatorState::new(tree.config().default_expansion);
        Self::with_state(tree, state)
    }

    pub fn with_state(tree: &'a ViewTree, state: NavigatorState) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            state,
        }
    }

    pub fn with_visibility<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ViewEntry) -> bool + Send + Sync + 'static,
    {
        self.state.visibility = Some(Arc::new(predicate));
        self
    }

    pub fn set_visibility(&mut self, predicate: Option<VisibilityFn>) {
        self.state.visibility = predicate;
    }

    pub fn tree(&self) -> &'a ViewTree {
        self.tree
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    /// Keep expansion, selection and visibility for a later lock scope
    pub fn into_state(self) -> NavigatorState {
        self.state
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Current entry
    // ═══════════════════════════════════════════════════════════════════════

    pub fn current_id(&self) -> Option<EntryId> {
        self.stack.last()?.current()
    }

    pub fn current_entry(&self) -> Option<&'a ViewEntry> {
        self.tree.entry(self.current_id()?)
    }

    pub fn current(&self) -> Option<VirtualViewEntry> {
        self.tree.snapshot(self.current_id()?)
    }

    /// Sibling indices from the top level down to the current entry
    pub fn current_position(&self) -> Option<Vec<usize>> {
        if self.stack.is_empty() {
            return None;
        }
        self.stack
            .iter()
            .map(|level| {
                level
                    .current()
                    .and_then(|id| self.tree.entry(id))
                    .map(ViewEntry::sibling_index)
            })
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Traversal
    // ═══════════════════════════════════════════════════════════════════════

    /// First visible top-level entry
    pub fn goto_first(&mut self) -> bool {
        let mut stack = Vec::new();
        if self.push_edge(&mut stack, self.tree.root_id(), Direction::Forward) {
            self.commit(stack)
        } else {
            false
        }
    }

    /// Last visible entry in traversal order: the deepest last descendant
    /// of the last top-level entry, following expanded categories only
    pub fn goto_last(&mut self) -> bool {
        let mut stack = Vec::new();
        if !self.push_edge(&mut stack, self.tree.root_id(), Direction::Backward) {
            return false;
        }
        self.descend_last(&mut stack);
        self.commit(stack)
    }

    pub fn goto_next(&mut self) -> bool {
        let Some(current) = self.current_id() else {
            return self.goto_first();
        };

        let mut stack = self.stack.clone();
        if self.is_open(current) && self.push_edge(&mut stack, current, Direction::Forward) {
            return self.commit(stack);
        }

        while let Some(level) = stack.last_mut() {
            if level.advance(Direction::Forward, |id| self.is_visible(id)) {
                return self.commit(stack);
            }
            stack.pop();
        }
        false
    }

    pub fn goto_prev(&mut self) -> bool {
        if self.current_id().is_none() {
            return self.goto_last();
        }

        let mut stack = self.stack.clone();
        let Some(level) = stack.last_mut() else {
            return false;
        };
        if level.advance(Direction::Backward, |id| self.is_visible(id)) {
            self.descend_last(&mut stack);
            return self.commit(stack);
        }
        if stack.len() > 1 {
            stack.pop();
            return self.commit(stack);
        }
        false
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// First visible child, whether or not the current entry is expanded
    pub fn goto_first_child(&mut self) -> bool {
        self.goto_child(Direction::Forward)
    }

    pub fn goto_last_child(&mut self) -> bool {
        self.goto_child(Direction::Backward)
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        self.goto_sibling(Direction::Forward)
    }

    pub fn goto_prev_sibling(&mut self) -> bool {
        self.goto_sibling(Direction::Backward)
    }

    /// Move to a position path; the cursor is unchanged when the path does
    /// not resolve to a visible entry
    pub fn goto_pos(&mut self, position: &[usize]) -> bool {
        match self.resolve(position) {
            Some(stack) => self.commit(stack),
            None => false,
        }
    }

    /// Resolve a position path without moving
    pub fn get_pos(&self, position: &[usize]) -> Option<VirtualViewEntry> {
        let stack = self.resolve(position)?;
        self.tree.snapshot(stack.last()?.current()?)
    }

    /// Move to the first placement (in tree order) of a document or category
    pub fn goto_entry(&mut self, scoped_id: &ScopedId) -> bool {
        let mut positions: Vec<Vec<usize>> = self
            .tree
            .placements(scoped_id)
            .iter()
            .map(|id| self.tree.position(*id))
            .filter(|position| !position.is_empty())
            .collect();
        positions.sort();
        positions.iter().any(|position| self.goto_pos(position))
    }

    pub fn goto_next_selected(&mut self) -> bool {
        self.seek_selected(Direction::Forward)
    }

    pub fn goto_prev_selected(&mut self) -> bool {
        self.seek_selected(Direction::Backward)
    }

    /// Move `count` steps (backwards when negative); returns the steps taken
    pub fn skip(&mut self, count: isize) -> usize {
        let steps = count.unsigned_abs();
        if count >= 0 {
            (0..steps).take_while(|_| self.goto_next()).count()
        } else {
            (0..steps).take_while(|_| self.goto_prev()).count()
        }
    }

    /// Up to `count` snapshots starting at the current entry (or the first
    /// one); the cursor ends on the last entry returned
    pub fn read_entries(&mut self, count: usize) -> Vec<VirtualViewEntry> {
        let mut entries = Vec::new();
        if count == 0 || (self.current_id().is_none() && !self.goto_first()) {
            return entries;
        }

        loop {
            if let Some(entry) = self.current() {
                entries.push(entry);
            }
            if entries.len() >= count || !self.goto_next() {
                break;
            }
        }
        entries
    }

    fn goto_child(&mut self, direction: Direction) -> bool {
        let Some(current) = self.current_id() else {
            return false;
        };
        let mut stack = self.stack.clone();
        if self.push_edge(&mut stack, current, direction) {
            self.commit(stack)
        } else {
            false
        }
    }

    fn goto_sibling(&mut self, direction: Direction) -> bool {
        let Some(mut level) = self.stack.last().cloned() else {
            return false;
        };
        if !level.advance(direction, |id| self.is_visible(id)) {
            return false;
        }
        if let Some(top) = self.stack.last_mut() {
            *top = level;
        }
        true
    }

    fn seek_selected(&mut self, direction: Direction) -> bool {
        let saved = self.stack.clone();
        loop {
            let moved = match direction {
                Direction::Forward => self.goto_next(),
                Direction::Backward => self.goto_prev(),
            };
            if !moved {
                self.stack = saved;
                return false;
            }
            let selected = self
                .current_entry()
                .map(|entry| self.state.selection.is_selected(entry.scoped_id()))
                .unwrap_or(false);
            if selected {
                return true;
            }
        }
    }

    fn resolve(&self, position: &[usize]) -> Option<Vec<LevelCursor<'a>>> {
        if position.is_empty() {
            return None;
        }

        let mut parent = self.tree.root_id();
        let mut stack = Vec::with_capacity(position.len());
        for &index in position {
            let children = self.tree.child_map(parent)?;
            let (key, id) = children.iter().nth(index.checked_sub(1)?)?;
            if !self.is_visible(*id) {
                return None;
            }
            stack.push(LevelCursor::at(parent, children, key, *id));
            parent = *id;
        }
        Some(stack)
    }

    /// Push a cursor on the first/last visible child of `parent`
    fn push_edge(
        &self,
        stack: &mut Vec<LevelCursor<'a>>,
        parent: EntryId,
        direction: Direction,
    ) -> bool {
        let Some(children) = self.tree.child_map(parent) else {
            return false;
        };
        let mut level = LevelCursor::new(parent, children);
        if level.advance(direction, |id| self.is_visible(id)) {
            stack.push(level);
            true
        } else {
            false
        }
    }

    fn descend_last(&self, stack: &mut Vec<LevelCursor<'a>>) {
        while let Some(current) = stack.last().and_then(LevelCursor::current) {
            if !self.is_open(current) || !self.push_edge(stack, current, Direction::Backward) {
                break;
            }
        }
    }

    fn commit(&mut self, stack: Vec<LevelCursor<'a>>) -> bool {
        self.stack = stack;
        true
    }

    fn is_visible(&self, id: EntryId) -> bool {
        let Some(entry) = self.tree.entry(id) else {
            return false;
        };
        self.state
            .visibility
            .as_ref()
            .map(|visible| visible(entry))
            .unwrap_or(true)
    }

    fn is_open(&self, id: EntryId) -> bool {
        self.tree
            .entry(id)
            .map(|entry| entry.is_category() && self.state.expansion.is_expanded(entry.scoped_id()))
            .unwrap_or(false)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expand / Collapse
    // ═══════════════════════════════════════════════════════════════════════

    pub fn is_expanded(&self, scoped_id: &ScopedId) -> bool {
        self.state.expansion.is_expanded(scoped_id)
    }

    pub fn expand(&mut self, scoped_id: &ScopedId) {
        self.state.expansion.expand(scoped_id);
    }

    pub fn collapse(&mut self, scoped_id: &ScopedId) {
        self.state.expansion.collapse(scoped_id);
    }

    /// Expand the entry at `position`; `false` when nothing is there
    pub fn expand_pos(&mut self, position: &[usize]) -> bool {
        match self.scoped_id_at(position) {
            Some(scoped_id) => {
                self.state.expansion.expand(&scoped_id);
                true
            }
            None => false,
        }
    }

    pub fn collapse_pos(&mut self, position: &[usize]) -> bool {
        match self.scoped_id_at(position) {
            Some(scoped_id) => {
                self.state.expansion.collapse(&scoped_id);
                true
            }
            None => false,
        }
    }

    pub fn expand_all(&mut self) {
        self.state.expansion.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.state.expansion.collapse_all();
    }

    fn scoped_id_at(&self, position: &[usize]) -> Option<ScopedId> {
        let id = self.tree.entry_at(position)?;
        Some(self.tree.entry(id)?.scoped_id().clone())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Selection
    // ═══════════════════════════════════════════════════════════════════════

    pub fn is_selected(&self, scoped_id: &ScopedId) -> bool {
        self.state.selection.is_selected(scoped_id)
    }

    /// Select an id, optionally with every category above any placement
    pub fn select(&mut self, scoped_id: &ScopedId, with_parents: bool) {
        self.state.selection.select(scoped_id);
        if with_parents {
            for ancestor in self.ancestor_categories(scoped_id) {
                self.state.selection.select(ancestor.scoped_id());
            }
        }
    }

    /// Deselect an id; with `with_parents`, also every category above it
    /// that has no other selected entry below
    pub fn deselect(&mut self, scoped_id: &ScopedId, with_parents: bool) {
        self.state.selection.deselect(scoped_id);
        if with_parents {
            // Deepest first, so a parent sees its children already deselected
            for ancestor in self.ancestor_categories(scoped_id) {
                if !self.has_selected_below(ancestor.id()) {
                    self.state.selection.deselect(ancestor.scoped_id());
                }
            }
        }
    }

    /// Select the current entry; `false` without a current entry
    pub fn select_current(&mut self, with_parents: bool) -> bool {
        let Some(entry) = self.current_entry() else {
            return false;
        };
        self.select(entry.scoped_id(), with_parents);
        true
    }

    pub fn select_all(&mut self) {
        self.state.selection.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.state.selection.deselect_all();
    }

    /// Categories above any placement of `scoped_id`, deepest first
    fn ancestor_categories(&self, scoped_id: &ScopedId) -> Vec<&'a ViewEntry> {
        let tree = self.tree;
        let mut ancestors: Vec<(usize, &'a ViewEntry)> = Vec::new();
        for id in tree.placements(scoped_id) {
            let mut parent = tree.entry(*id).and_then(ViewEntry::parent);
            while let Some(entry) = parent.and_then(|p| tree.entry(p)) {
                if entry.is_root() {
                    break;
                }
                if !ancestors.iter().any(|(_, known)| known.id() == entry.id()) {
                    let level = tree.level(entry.id()).unwrap_or(0);
                    ancestors.push((level, entry));
                }
                parent = entry.parent();
            }
        }
        ancestors.sort_by(|a, b| b.0.cmp(&a.0));
        ancestors.into_iter().map(|(_, entry)| entry).collect()
    }

    fn has_selected_below(&self, id: EntryId) -> bool {
        self.tree.children(id).any(|child| {
            self.state.selection.is_selected(child.scoped_id())
                || self.has_selected_below(child.id())
        })
    }
}

impl std::fmt::Debug for ViewNavigator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewNavigator")
            .field("current", &self.current_id())
            .field("depth", &self.stack.len())
            .field("state", &self.state)
            .finish()
    }
}
