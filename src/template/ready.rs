//! One-shot readiness signal

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

#[derive(Default)]
struct SignalState {
    fired: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Signal that fires exactly once and releases its waiters in arrival order.
///
/// Waiters registered after the signal fired complete without suspending.
#[derive(Default)]
pub struct ReadySignal {
    state: Mutex<SignalState>,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_fired(&self) -> bool {
        self.lock().fired
    }

    /// Number of callers currently waiting
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    pub async fn wait(&self) {
        let rx = {
            let mut state = self.lock();
            if state.fired {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        // The sender is only dropped after sending, never before
        let _ = rx.await;
    }

    /// Fire the signal, returning how many waiters were released.
    ///
    /// Only the first call releases anyone.
    pub fn fire(&self) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.fired = true;
            std::mem::take(&mut state.waiters)
        };

        let released = waiters.len();
        for tx in waiters {
            // Abandoned waiters have dropped their receiver
            let _ = tx.send(());
        }
        released
    }
}
