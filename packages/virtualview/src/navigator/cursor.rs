// Per-level traversal context
//
// Each level keeps the live range iterator it moved with. Moving again in
// the same direction continues that iterator; switching direction
// re-anchors a fresh range at the current key.

use crate::domain::{EntryId, SortKey};
use std::collections::btree_map::Range;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

#[derive(Clone)]
pub(crate) struct LevelCursor<'a> {
    parent: EntryId,
    children: &'a BTreeMap<SortKey, EntryId>,
    current: Option<(&'a SortKey, EntryId)>,
    iter: Option<(Direction, Range<'a, SortKey, EntryId>)>,
}

impl<'a> LevelCursor<'a> {
    /// Cursor before the first (or after the last) child of `parent`
    pub(crate) fn new(parent: EntryId, children: &'a BTreeMap<SortKey, EntryId>) -> Self {
        Self {
            parent,
            children,
            current: None,
            iter: None,
        }
    }

    /// Cursor resting on a known child
    pub(crate) fn at(
        parent: EntryId,
        children: &'a BTreeMap<SortKey, EntryId>,
        key: &'a SortKey,
        id: EntryId,
    ) -> Self {
        Self {
            parent,
            children,
            current: Some((key, id)),
            iter: None,
        }
    }

    pub(crate) fn parent(&self) -> EntryId {
        self.parent
    }

    pub(crate) fn current(&self) -> Option<EntryId> {
        self.current.map(|(_, id)| id)
    }

    /// Move to the nearest child in `direction` that `accept` lets through
    ///
    /// Leaves the cursor where it was and returns `false` when there is none.
    pub(crate) fn advance(
        &mut self,
        direction: Direction,
        mut accept: impl FnMut(EntryId) -> bool,
    ) -> bool {
        let mut iter = match self.iter.take() {
            Some((moving, iter)) if moving == direction => iter,
            _ => self.anchor(direction),
        };

        loop {
            let next = match direction {
                Direction::Forward => iter.next(),
                Direction::Backward => iter.next_back(),
            };
            match next {
                Some((key, id)) if accept(*id) => {
                    self.current = Some((key, *id));
                    self.iter = Some((direction, iter));
                    return true;
                }
                Some(_) => continue,
                // Exhausted; re-anchor next time so a changed filter is honored
                None => return false,
            }
        }
    }

    fn anchor(&self, direction: Direction) -> Range<'a, SortKey, EntryId> {
        match (self.current, direction) {
            (None, _) => self.children.range::<SortKey, _>(..),
            (Some((key, _)), Direction::Forward) => self
                .children
                .range::<SortKey, _>((Excluded(key), Unbounded)),
            (Some((key, _)), Direction::Backward) => self
                .children
                .range::<SortKey, _>((Unbounded, Excluded(key))),
        }
    }
}
