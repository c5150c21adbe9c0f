//! In-process template collection

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{Snapshot, SnapshotStream, TemplateCollection, TemplateDocument};

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<String, TemplateDocument>,
    last: Option<Snapshot>,
    subscribers: Vec<mpsc::UnboundedSender<Snapshot>>,
}

/// Template collection held in memory.
///
/// Nothing is delivered until the first publish; late subscribers receive the
/// most recent snapshot immediately.
#[derive(Default)]
pub struct MemoryCollection {
    state: Mutex<MemoryState>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the document set and deliver it to every subscriber
    pub fn publish(&self, snapshot: Snapshot) {
        let mut state = self.lock();
        state.documents = snapshot
            .docs()
            .iter()
            .map(|doc| (doc.id.clone(), doc.clone()))
            .collect();
        Self::deliver(&mut state, snapshot);
    }

    /// Insert or replace one document and publish the full set
    pub fn upsert(&self, doc: TemplateDocument) {
        let mut state = self.lock();
        state.documents.insert(doc.id.clone(), doc);
        let snapshot = state.documents.values().cloned().collect();
        Self::deliver(&mut state, snapshot);
    }

    /// Remove one document and publish the full set
    pub fn remove(&self, id: &str) -> Option<TemplateDocument> {
        let mut state = self.lock();
        let removed = state.documents.remove(id);
        let snapshot = state.documents.values().cloned().collect();
        Self::deliver(&mut state, snapshot);
        removed
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    fn deliver(state: &mut MemoryState, snapshot: Snapshot) {
        state
            .subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        tracing::debug!(
            documents = snapshot.len(),
            subscribers = state.subscribers.len(),
            "Published template snapshot"
        );
        state.last = Some(snapshot);
    }
}

impl TemplateCollection for MemoryCollection {
    fn subscribe(&self) -> SnapshotStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if let Some(last) = &state.last {
            let _ = tx.send(last.clone());
        }
        state.subscribers.push(tx);

        UnboundedReceiverStream::new(rx).boxed()
    }
}
