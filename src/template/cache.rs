//! Readiness-gated cache of compiled email templates

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::compiled::TemplateSet;
use super::ready::ReadySignal;
use super::types::{RenderedEmail, TemplateError, TemplateResult};
use crate::collection::{Snapshot, SnapshotStream, TemplateCollection};

#[derive(Default)]
struct CacheState {
    templates: HashMap<String, Arc<TemplateSet>>,
    snapshots: u64,
    last_snapshot_at: Option<DateTime<Utc>>,
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub ready: bool,
    pub templates: usize,
    pub snapshots: u64,
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

/// Compiled email templates kept in sync with a template collection.
///
/// Every snapshot delivered by the collection replaces the records of the
/// templates it contains. Templates missing from a later snapshot keep their
/// last compiled version; entries are never evicted.
///
/// Renders issued before the first snapshot has been applied wait for it,
/// without timeout.
pub struct TemplateCache {
    state: RwLock<CacheState>,
    ready: ReadySignal,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl TemplateCache {
    /// Create a cache fed by `collection`.
    ///
    /// The subscription is registered immediately and driven by a background
    /// task until the cache is dropped. Must be called within a Tokio runtime.
    pub fn new(collection: &dyn TemplateCollection) -> Arc<Self> {
        let cache = Arc::new(Self::detached());
        let snapshots = collection.subscribe();
        let handle = tokio::spawn(drive_subscription(Arc::downgrade(&cache), snapshots));
        *cache
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        cache
    }

    /// Create a cache with no subscription; snapshots are applied with
    /// [`TemplateCache::handle_snapshot`].
    pub fn detached() -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            ready: ReadySignal::new(),
            subscription: Mutex::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compile and apply a full collection snapshot, then mark the cache ready.
    ///
    /// Returns the number of templates loaded.
    pub fn handle_snapshot(&self, snapshot: &Snapshot) -> usize {
        // Compile outside the lock; renders keep using the previous records meanwhile
        let compiled: Vec<(String, Arc<TemplateSet>)> = snapshot
            .docs()
            .iter()
            .map(|doc| {
                let set = TemplateSet::compile(doc);
                for (field, error) in set.compile_errors() {
                    tracing::warn!(
                        template = %doc.id,
                        field = %field,
                        error = %error,
                        "Template failed to compile"
                    );
                }
                (doc.id.clone(), Arc::new(set))
            })
            .collect();

        let loaded: Vec<String> = compiled.iter().map(|(id, _)| id.clone()).collect();
        {
            let mut state = self.write();
            state.templates.extend(compiled);
            state.snapshots += 1;
            state.last_snapshot_at = Some(Utc::now());
        }

        for id in &loaded {
            tracing::info!(template = %id, "loaded template '{}'", id);
        }

        let released = self.ready.fire();
        if released > 0 {
            tracing::debug!(released, "Released renders waiting for templates");
        }

        loaded.len()
    }

    /// Wait until the first snapshot has been applied
    pub async fn wait_until_ready(&self) {
        self.ready.wait().await;
    }

    /// Render every part of the named template with `data`
    pub async fn render<T: Serialize>(
        &self,
        name: &str,
        data: &T,
    ) -> TemplateResult<RenderedEmail> {
        self.wait_until_ready().await;

        let set = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        set.render(data)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_fired()
    }

    /// Number of callers waiting for the first snapshot
    pub fn waiting(&self) -> usize {
        self.ready.pending()
    }

    pub fn get(&self, name: &str) -> Option<Arc<TemplateSet>> {
        self.read().templates.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().templates.is_empty()
    }

    /// Names of every cached template, sorted
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().templates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.read();
        CacheStats {
            ready: self.is_ready(),
            templates: state.templates.len(),
            snapshots: state.snapshots,
            last_snapshot_at: state.last_snapshot_at,
        }
    }
}

impl Drop for TemplateCache {
    fn drop(&mut self) {
        let handle = self
            .subscription
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

async fn drive_subscription(cache: Weak<TemplateCache>, mut snapshots: SnapshotStream) {
    while let Some(snapshot) = snapshots.next().await {
        let Some(cache) = cache.upgrade() else {
            return;
        };
        let loaded = cache.handle_snapshot(&snapshot);
        tracing::debug!(loaded, "Applied template snapshot");
    }

    tracing::warn!("Template collection subscription ended");
}
