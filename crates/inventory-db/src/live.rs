//! # Live Queries
//!
//! Change notification for the items table and the stream type handed out
//! by `query_all` / `query_by_id`.
//!
//! ## How a Live Query Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Live Query Lifecycle                                 │
//! │                                                                         │
//! │  store.query_all()                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ChangeTracker::register() ──► registry[id] = watch::Sender            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  first poll: run SELECT ───────────────────────► emit snapshot #1      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  wait for registry[id] to change                                       │
//! │       ▲                                 │                               │
//! │       │                                 ▼                               │
//! │  insert/update/delete commits    run SELECT ───► emit snapshot #N      │
//! │  notify_commit() bumps version          │                               │
//! │                                         └──► Err? emit it, then end    │
//! │                                                                         │
//! │  drop(stream) ──► Registration::drop ──► registry.remove(id)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Each subscription re-runs its query one evaluation at a time, and every
//! evaluation starts after the commit that woke it. Snapshots for one
//! subscriber therefore never go backward. Several commits landing while a
//! subscriber is busy collapse into a single re-evaluation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use futures_util::stream::{self, BoxStream, Stream};
use tokio::sync::watch;
use tracing::debug;

use crate::error::DbResult;

/// Identifier of a registered live query.
pub type SubscriptionId = u64;

// =============================================================================
// Change Tracker
// =============================================================================

#[derive(Debug, Default)]
struct TrackerInner {
    next_id: AtomicU64,
    version: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionId, watch::Sender<u64>>>,
}

impl TrackerInner {
    fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriptionId, watch::Sender<u64>>> {
        // The map stays consistent even if a holder panicked.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of active live queries over one table.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    inner: Arc<TrackerInner>,
}

impl ChangeTracker {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription to the registry.
    ///
    /// The returned registration only reports commits that happen after
    /// this call.
    pub fn register(&self) -> Registration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.inner.subscribers();
        let (tx, rx) = watch::channel(self.inner.version.load(Ordering::Acquire));
        subscribers.insert(id, tx);
        debug!(subscription = id, active = subscribers.len(), "Live query registered");

        Registration {
            id,
            rx,
            tracker: Arc::downgrade(&self.inner),
        }
    }

    /// Records a committed mutation and wakes every registered subscription.
    ///
    /// Returns the new table version.
    pub fn notify_commit(&self) -> u64 {
        let subscribers = self.inner.subscribers();
        let version = self.inner.version.fetch_add(1, Ordering::AcqRel) + 1;

        for tx in subscribers.values() {
            tx.send_replace(version);
        }

        debug!(version, notified = subscribers.len(), "Table change committed");
        version
    }

    /// Number of live queries currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    /// Number of committed mutations seen so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }
}

/// A live query's entry in the [`ChangeTracker`].
///
/// Dropping it removes the entry.
#[derive(Debug)]
pub struct Registration {
    id: SubscriptionId,
    rx: watch::Receiver<u64>,
    tracker: Weak<TrackerInner>,
}

impl Registration {
    /// Returns the subscription id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next commit.
    ///
    /// Returns false once the tracker itself is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(inner) = self.tracker.upgrade() {
            let mut subscribers = inner.subscribers();
            subscribers.remove(&self.id);
            debug!(
                subscription = self.id,
                active = subscribers.len(),
                "Live query cancelled"
            );
        }
    }
}

// =============================================================================
// Live Query Stream
// =============================================================================

enum Phase {
    Initial,
    Waiting,
    Finished,
}

struct LiveState<F> {
    registration: Registration,
    fetch: F,
    phase: Phase,
}

/// A never-ending stream of query snapshots.
///
/// - Yields the current result as soon as it is polled
/// - Yields a fresh, complete result after every committed mutation
/// - Yields `Err` once if a re-evaluation fails, then ends
/// - Dropping it cancels the subscription
pub struct LiveQuery<T> {
    id: SubscriptionId,
    inner: BoxStream<'static, DbResult<T>>,
}

impl<T: Send + 'static> LiveQuery<T> {
    /// Builds a live query that runs `fetch` now and after every commit
    /// reported to `registration`.
    pub fn new<F, Fut>(registration: Registration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = DbResult<T>> + Send + 'static,
    {
        let id = registration.id();
        let state = LiveState {
            registration,
            fetch,
            phase: Phase::Initial,
        };

        let inner = stream::unfold(state, |mut state| async move {
            match state.phase {
                Phase::Finished => return None,
                Phase::Initial => {}
                Phase::Waiting => {
                    if !state.registration.changed().await {
                        return None;
                    }
                }
            }

            let result = (state.fetch)().await;
            state.phase = match result {
                Ok(_) => Phase::Waiting,
                Err(ref e) => {
                    debug!(subscription = state.registration.id(), error = %e, "Live query failed");
                    Phase::Finished
                }
            };
            Some((result, state))
        });

        LiveQuery {
            id,
            inner: Box::pin(inner),
        }
    }

    /// Returns the subscription id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Cancels the subscription. Same as dropping it.
    pub fn cancel(self) {}
}

impl<T> Stream for LiveQuery<T> {
    type Item = DbResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> std::fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery").field("id", &self.id).finish()
    }
}
