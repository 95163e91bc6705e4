//! Confirmation pipe - correlates outbound publishes with broker replies.
//!
//! The pipe tracks every in-flight publishing identifier in a concurrent
//! pending map and delivers exactly one terminal [`ConfirmationStatus`] per
//! identifier through a single-concurrency dispatcher:
//!
//! ```text
//! Transport ── register(id, msgs) ──► pending map
//! Transport ── resolve(status, id) ─► remove-if-present ─► bounded queue ─► dispatcher ─► user callback
//! Sweeper ──── resolve(timeout, id) ─┘                (suspends when full)   (one at a time)
//! ```
//!
//! Both the broker-reply path and the timeout sweeper converge on the same
//! atomic remove-if-present primitive, so a race between a late
//! acknowledgement and a sweep resolves an identifier exactly once -
//! whichever removes it first wins.
//!
//! # Example
//!
//! ```ignore
//! use streamwire_client::confirm::{ConfirmationPipe, ConfirmationStatus, PipeConfig};
//!
//! let pipe = ConfirmationPipe::new(PipeConfig::default(), |confirmation| async move {
//!     println!("publish {} -> {:?}", confirmation.publishing_id, confirmation.status);
//! });
//! pipe.start();
//!
//! pipe.register(1, vec![message]);
//! // ... transport receives the acknowledgement frame ...
//! pipe.resolve(ConfirmationStatus::Confirmed, 1, Some("orders".to_string())).await;
//!
//! pipe.stop().await;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ConfirmationStatus;
use crate::message::Message;

/// Default time a publish may stay unconfirmed before it is force-resolved.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum in-flight publish count.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1000;

/// Boxed future returned by the user confirmation callback.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Type-erased user confirmation callback.
type ConfirmCallback = Arc<dyn Fn(MessagesConfirmation) -> BoxFuture<()> + Send + Sync>;

/// Configuration for the confirmation pipe.
///
/// Fixed for the pipe's lifetime; there is no per-message override.
#[derive(Debug, Clone)]
pub struct PipeConfig {
    /// Unconfirmed publishes older than this are resolved as
    /// [`ClientTimeoutError`](ConfirmationStatus::ClientTimeoutError); also
    /// the sweep interval.
    pub message_timeout: Duration,
    /// Maximum in-flight publish count. The dispatcher queue is sized at
    /// twice this value; a full queue suspends `resolve` callers.
    pub max_in_flight: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Outcome record for one publishing identifier.
///
/// Exactly one instance exists per pending identifier; it is removed from
/// the pending map atomically and handed to the user callback exactly once.
#[derive(Debug)]
pub struct MessagesConfirmation {
    /// Producer-chosen identifier correlating the publish with its reply.
    pub publishing_id: u64,
    /// The messages that were part of this publish (ownership transferred
    /// from the producer at registration).
    pub messages: Vec<Message>,
    /// When the publish was registered.
    pub inserted_at: Instant,
    /// Terminal status, stamped on resolution.
    pub status: ConfirmationStatus,
    /// Stream name, populated only on resolution.
    pub stream: Option<String>,
}

/// Concurrent registry of in-flight publishes plus a single-worker
/// dispatcher and a periodic timeout sweeper.
pub struct ConfirmationPipe {
    pending: Arc<DashMap<u64, MessagesConfirmation>>,
    tx: Mutex<Option<mpsc::Sender<MessagesConfirmation>>>,
    rx: Mutex<Option<mpsc::Receiver<MessagesConfirmation>>>,
    callback: ConfirmCallback,
    config: PipeConfig,
    closed: AtomicBool,
    sweeper_stop: Mutex<Option<oneshot::Sender<()>>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl ConfirmationPipe {
    /// Create a pipe with the given configuration and user callback.
    ///
    /// The callback runs with concurrency exactly one, so user code never
    /// needs to synchronize state it mutates from inside it. Call
    /// [`start`](Self::start) to arm the dispatcher and the sweeper.
    pub fn new<F, Fut>(config: PipeConfig, callback: F) -> Self
    where
        F: Fn(MessagesConfirmation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let capacity = (config.max_in_flight * 2).max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            pending: Arc::new(DashMap::new()),
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            callback: Arc::new(move |confirmation| Box::pin(callback(confirmation))),
            config,
            closed: AtomicBool::new(false),
            sweeper_stop: Mutex::new(None),
            sweeper: Mutex::new(None),
            dispatcher: Mutex::new(None),
        }
    }

    /// Arm the dispatcher and the timeout sweeper. A second call is a no-op.
    pub fn start(&self) {
        let Some(rx) = self.rx.lock().ok().and_then(|mut guard| guard.take()) else {
            tracing::warn!("confirmation pipe already started");
            return;
        };
        let Some(tx) = self.tx.lock().ok().and_then(|guard| guard.clone()) else {
            return;
        };

        let callback = self.callback.clone();
        let dispatcher = tokio::spawn(dispatch_loop(rx, callback));
        if let Ok(mut guard) = self.dispatcher.lock() {
            *guard = Some(dispatcher);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let sweeper = tokio::spawn(sweep_loop(
            self.pending.clone(),
            tx,
            stop_rx,
            self.config.message_timeout,
        ));
        if let Ok(mut guard) = self.sweeper_stop.lock() {
            *guard = Some(stop_tx);
        }
        if let Ok(mut guard) = self.sweeper.lock() {
            *guard = Some(sweeper);
        }
    }

    /// Register a new pending publish, taking ownership of its messages.
    ///
    /// Insert-if-absent: a duplicate identifier leaves the existing entry
    /// untouched and releases the new message list immediately, as if
    /// transmission had failed. The duplicate is logged but not reported as
    /// an error.
    pub fn register(&self, publishing_id: u64, messages: Vec<Message>) {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!(publishing_id, "register after stop, releasing messages");
            release_all(messages);
            return;
        }

        match self.pending.entry(publishing_id) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    publishing_id,
                    "duplicate registration, releasing new message batch"
                );
                release_all(messages);
            }
            Entry::Vacant(slot) => {
                slot.insert(MessagesConfirmation {
                    publishing_id,
                    messages,
                    inserted_at: Instant::now(),
                    status: ConfirmationStatus::WaitForConfirmation,
                    stream: None,
                });
            }
        }
    }

    /// Resolve a pending publish with a terminal status.
    ///
    /// Remove-if-present: an unknown or already-resolved identifier is a
    /// silent no-op. When the dispatcher queue is full this call suspends
    /// until space frees, propagating backpressure to the caller (typically
    /// the transport's frame-receive loop).
    pub async fn resolve(
        &self,
        status: ConfirmationStatus,
        publishing_id: u64,
        stream: Option<String>,
    ) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let Some(tx) = self.tx.lock().ok().and_then(|guard| guard.clone()) else {
            return;
        };
        resolve_entry(&self.pending, &tx, status, publishing_id, stream).await;
    }

    /// Number of publishes currently awaiting confirmation.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True once [`start`](Self::start) has armed the worker tasks.
    pub fn is_started(&self) -> bool {
        self.rx.lock().map(|guard| guard.is_none()).unwrap_or(false)
    }

    /// Shut the pipe down.
    ///
    /// Force-resolves every still-pending entry as
    /// [`ClientTimeoutError`](ConfirmationStatus::ClientTimeoutError) with
    /// the stream unset, disarms the sweeper, then closes the queue and
    /// waits until the dispatcher has delivered every buffered confirmation.
    /// Idempotent; must be awaited for teardown to complete.
    pub async fn stop(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let tx = self.tx.lock().ok().and_then(|mut guard| guard.take());
        if let Some(tx) = &tx {
            let pending_ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
            for publishing_id in pending_ids {
                resolve_entry(
                    &self.pending,
                    tx,
                    ConfirmationStatus::ClientTimeoutError,
                    publishing_id,
                    None,
                )
                .await;
            }
        }

        if let Some(stop) = self.sweeper_stop.lock().ok().and_then(|mut g| g.take()) {
            let _ = stop.send(());
        }
        if let Some(handle) = self.sweeper.lock().ok().and_then(|mut g| g.take()) {
            let _ = handle.await;
        }

        // Dropping the last sender closes the queue; the dispatcher drains
        // what is buffered and exits.
        drop(tx);
        if let Some(handle) = self.dispatcher.lock().ok().and_then(|mut g| g.take()) {
            let _ = handle.await;
        }
    }
}

fn release_all(messages: Vec<Message>) {
    for mut message in messages {
        message.release();
    }
}

/// Shared remove-if-present resolution primitive.
///
/// Used by `resolve`, the sweeper, and `stop`; atomicity of the removal is
/// what guarantees at-most-one delivery per identifier.
async fn resolve_entry(
    pending: &DashMap<u64, MessagesConfirmation>,
    tx: &mpsc::Sender<MessagesConfirmation>,
    status: ConfirmationStatus,
    publishing_id: u64,
    stream: Option<String>,
) {
    let Some((_, mut confirmation)) = pending.remove(&publishing_id) else {
        return;
    };
    confirmation.status = status;
    confirmation.stream = stream;
    if tx.send(confirmation).await.is_err() {
        tracing::warn!(publishing_id, "dispatcher closed, confirmation dropped");
    }
}

/// Single consumer of the bounded queue; invokes the user callback with
/// concurrency exactly one, in enqueue order.
async fn dispatch_loop(mut rx: mpsc::Receiver<MessagesConfirmation>, callback: ConfirmCallback) {
    while let Some(confirmation) = rx.recv().await {
        let publishing_id = confirmation.publishing_id;
        // The callback runs in its own task so a panic in user code is
        // isolated from the dispatcher; awaiting it keeps delivery
        // concurrency at exactly one.
        let fut = (callback)(confirmation);
        if let Err(e) = tokio::spawn(fut).await {
            tracing::error!(publishing_id, "confirmation callback panicked: {e}");
        }
    }
}

/// Periodic sweep resolving entries older than `timeout`.
///
/// Runs until `stop` fires; timeout resolutions go through the same queue
/// as broker resolutions and are subject to the same backpressure.
async fn sweep_loop(
    pending: Arc<DashMap<u64, MessagesConfirmation>>,
    tx: mpsc::Sender<MessagesConfirmation>,
    mut stop: oneshot::Receiver<()>,
    timeout: Duration,
) {
    let mut ticker = tokio::time::interval(timeout);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so sweeps start one
    // full interval after the pipe is armed.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let expired: Vec<u64> = pending
                    .iter()
                    .filter(|entry| entry.value().inserted_at.elapsed() >= timeout)
                    .map(|entry| *entry.key())
                    .collect();
                if !expired.is_empty() {
                    tracing::debug!(count = expired.len(), "sweeping timed-out publishes");
                }
                for publishing_id in expired {
                    resolve_entry(
                        &pending,
                        &tx,
                        ConfirmationStatus::ClientTimeoutError,
                        publishing_id,
                        None,
                    )
                    .await;
                }
            }
        }
    }
}
