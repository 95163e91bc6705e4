//! Pooled payload buffers with scoped ownership.
//!
//! A [`BufferPool`] hands out [`LeasedBuffer`]s backed by recycled `BytesMut`
//! storage. A lease is released exactly once: explicitly via
//! [`LeasedBuffer::release`] along the normal path, or by `Drop` as a
//! last-resort safety net. After release the backing bytes read as empty.
//!
//! # Example
//!
//! ```
//! use streamwire_client::message::BufferPool;
//!
//! let pool = BufferPool::new(4096);
//! let mut lease = pool.lease_from(b"payload");
//! assert_eq!(lease.bytes(), b"payload");
//!
//! lease.release();
//! assert!(lease.bytes().is_empty());
//! assert_eq!(pool.free_count(), 1); // storage went back to the pool
//! ```

use std::sync::{Arc, Mutex};

use bytes::BytesMut;

/// Default capacity of a freshly allocated pool buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// A pool of reusable payload buffers.
///
/// Cheaply cloneable; clones share the same free list.
#[derive(Debug, Clone)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<BytesMut>>>,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Create an empty pool. Buffers are allocated lazily on first lease.
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::new())),
            buffer_capacity,
        }
    }

    /// Create a pool with `count` buffers pre-allocated.
    pub fn with_preallocated(buffer_capacity: usize, count: usize) -> Self {
        let free = (0..count)
            .map(|_| BytesMut::with_capacity(buffer_capacity))
            .collect();
        Self {
            free: Arc::new(Mutex::new(free)),
            buffer_capacity,
        }
    }

    /// Lease a buffer containing a copy of `data`.
    pub fn lease_from(&self, data: &[u8]) -> LeasedBuffer {
        let mut storage = self
            .free
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_capacity.max(data.len())));
        storage.clear();
        storage.extend_from_slice(data);
        LeasedBuffer {
            storage: Some(storage),
            free: Arc::clone(&self.free),
        }
    }

    /// Number of buffers currently sitting in the free list.
    pub fn free_count(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

/// Exclusive lease over one pooled buffer.
///
/// Not cloneable: the lease is the single owner of its storage until release.
#[derive(Debug)]
pub struct LeasedBuffer {
    storage: Option<BytesMut>,
    free: Arc<Mutex<Vec<BytesMut>>>,
}

impl LeasedBuffer {
    /// View of the leased bytes. Empty once the lease has been released.
    pub fn bytes(&self) -> &[u8] {
        self.storage.as_deref().unwrap_or(&[])
    }

    /// Length of the leased bytes.
    pub fn len(&self) -> usize {
        self.storage.as_ref().map(BytesMut::len).unwrap_or(0)
    }

    /// True if the lease holds no bytes (including after release).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the lease has already been released.
    pub fn is_released(&self) -> bool {
        self.storage.is_none()
    }

    /// Return the storage to the pool. Idempotent: a second call is a no-op,
    /// so the `Drop` safety net can never double-release.
    pub fn release(&mut self) {
        if let Some(mut storage) = self.storage.take() {
            storage.clear();
            if let Ok(mut free) = self.free.lock() {
                free.push(storage);
            }
            // On a poisoned lock the storage is simply dropped.
        }
    }
}

impl Drop for LeasedBuffer {
    fn drop(&mut self) {
        self.release();
    }
}
