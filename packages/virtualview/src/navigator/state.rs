use super::VisibilityFn;
use crate::config::Expansion;
use crate::domain::ScopedId;
use rustc_hash::FxHashSet;
use std::fmt;

/// Boolean membership over every id, stored as a default plus the ids
/// that differ from it
///
/// "All but a few" and "none but a few" both stay small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionSet {
    default: bool,
    exceptions: FxHashSet<ScopedId>,
}

impl ExceptionSet {
    pub fn all(value: bool) -> Self {
        Self {
            default: value,
            exceptions: FxHashSet::default(),
        }
    }

    pub fn contains(&self, id: &ScopedId) -> bool {
        self.default != self.exceptions.contains(id)
    }

    pub fn set(&mut self, id: &ScopedId, value: bool) {
        if value == self.default {
            self.exceptions.remove(id);
        } else {
            self.exceptions.insert(id.clone());
        }
    }

    /// Reset every id to `value`
    pub fn reset(&mut self, value: bool) {
        self.default = value;
        self.exceptions.clear();
    }

    pub fn default_value(&self) -> bool {
        self.default
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }
}

/// Expand/collapse set; the root is always expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionState(ExceptionSet);

impl ExpansionState {
    pub fn new(mode: Expansion) -> Self {
        Self(ExceptionSet::all(mode == Expansion::Expanded))
    }

    pub fn is_expanded(&self, id: &ScopedId) -> bool {
        id.is_root() || self.0.contains(id)
    }

    pub fn expand(&mut self, id: &ScopedId) {
        self.0.set(id, true);
    }

    pub fn collapse(&mut self, id: &ScopedId) {
        if !id.is_root() {
            self.0.set(id, false);
        }
    }

    pub fn expand_all(&mut self) {
        self.0.reset(true);
    }

    pub fn collapse_all(&mut self) {
        self.0.reset(false);
    }

    pub fn mode(&self) -> Expansion {
        if self.0.default_value() {
            Expansion::Expanded
        } else {
            Expansion::Collapsed
        }
    }

    pub fn exception_count(&self) -> usize {
        self.0.exception_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState(ExceptionSet);

impl Default for SelectionState {
    fn default() -> Self {
        Self(ExceptionSet::all(false))
    }
}

impl SelectionState {
    pub fn is_selected(&self, id: &ScopedId) -> bool {
        self.0.contains(id)
    }

    pub fn select(&mut self, id: &ScopedId) {
        self.0.set(id, true);
    }

    pub fn deselect(&mut self, id: &ScopedId) {
        self.0.set(id, false);
    }

    pub fn select_all(&mut self) {
        self.0.reset(true);
    }

    pub fn deselect_all(&mut self) {
        self.0.reset(false);
    }

    pub fn exception_count(&self) -> usize {
        self.0.exception_count()
    }
}

/// Navigator state that survives the read lock
///
/// Positions are tied to one lock scope; expansion, selection and the
/// visibility predicate are not.
#[derive(Clone)]
pub struct NavigatorState {
    pub expansion: ExpansionState,
    pub selection: SelectionState,
    pub(crate) visibility: Option<VisibilityFn>,
}

impl NavigatorState {
    pub fn new(mode: Expansion) -> Self {
        Self {
            expansion: ExpansionState::new(mode),
            selection: SelectionState::default(),
            visibility: None,
        }
    }

    pub fn with_visibility<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&crate::domain::ViewEntry) -> bool + Send + Sync + 'static,
    {
        self.visibility = Some(std::sync::Arc::new(predicate));
        self
    }

    pub fn has_visibility(&self) -> bool {
        self.visibility.is_some()
    }
}

impl Default for NavigatorState {
    fn default() -> Self {
        Self::new(Expansion::default())
    }
}

impl fmt::Debug for NavigatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorState")
            .field("expansion", &self.expansion)
            .field("selection", &self.selection)
            .field("visibility", &self.visibility.is_some())
            .finish()
    }
}
