//! Versioned view cache
//!
//! Holds at most one live [`View`] per view id. A request carrying a
//! different version discards the cached view and builds a new one with the
//! caller's constructor.
//!
//! Constructors run outside the map's shard locks, so a constructor may use
//! the factory itself. When two threads build the same id concurrently the
//! first one to publish wins and the other result is dropped.

use crate::error::Result;
use crate::view::View;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL_FACTORY: Lazy<ViewFactory> = Lazy::new(ViewFactory::new);

#[derive(Debug)]
struct CachedView {
    version: u64,
    view: Arc<View>,
}

#[derive(Debug, Default)]
pub struct ViewFactory {
    views: DashMap<String, CachedView>,
}

impl ViewFactory {
    pub fn new() -> Self {
        Self {
            views: DashMap::new(),
        }
    }

    /// Process-wide factory
    pub fn global() -> &'static ViewFactory {
        &GLOBAL_FACTORY
    }

    /// Cached view for `view_id` at `version`, built with `build` on a miss
    ///
    /// # Errors
    ///
    /// Propagates the constructor's error. A stale view that failed to
    /// rebuild is evicted anyway.
    pub fn get_view<F>(&self, view_id: &str, version: u64, build: F) -> Result<Arc<View>>
    where
        F: FnOnce() -> Result<View>,
    {
        let stale = match self.views.get(view_id) {
            Some(cached) if cached.version == version => return Ok(Arc::clone(&cached.view)),
            Some(cached) => Some(cached.version),
            None => None,
        };

        let built = match build() {
            Ok(view) => Arc::new(view),
            Err(err) => {
                if let Some(stale) = stale {
                    self.views
                        .remove_if(view_id, |_, cached| cached.version == stale);
                }
                tracing::warn!(view_id, version, error = %err, "View construction failed");
                return Err(err);
            }
        };

        match self.views.entry(view_id.to_string()) {
            Entry::Occupied(cached) if cached.get().version == version => {
                Ok(Arc::clone(&cached.get().view))
            }
            Entry::Occupied(mut cached) => {
                tracing::info!(
                    view_id,
                    cached_version = cached.get().version,
                    version,
                    "View version changed; rebuilt"
                );
                cached.insert(CachedView {
                    version,
                    view: Arc::clone(&built),
                });
                Ok(built)
            }
            Entry::Vacant(vacant) => {
                tracing::info!(view_id, version, "View built");
                vacant.insert(CachedView {
                    version,
                    view: Arc::clone(&built),
                });
                Ok(built)
            }
        }
    }

    /// Evict immediately; holders of the `Arc` keep their copy alive
    pub fn dispose_view(&self, view_id: &str) -> bool {
        let disposed = self.views.remove(view_id).is_some();
        if disposed {
            tracing::info!(view_id, "View disposed");
        }
        disposed
    }

    pub fn contains(&self, view_id: &str) -> bool {
        self.views.contains_key(view_id)
    }

    pub fn cached_version(&self, view_id: &str) -> Option<u64> {
        self.views.get(view_id).map(|cached| cached.version)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Cached view ids, sorted
    pub fn view_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.views.iter().map(|item| item.key().clone()).collect();
        ids.sort();
        ids
    }
}
