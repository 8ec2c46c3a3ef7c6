//! Reusable object pools.
//!
//! Encoders and byte buffers are expensive to allocate at high request
//! rates, so each client keeps a bounded free list of them. Objects are
//! handed out behind a [`Pooled`] guard that puts them back on drop, on
//! every exit path.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Objects that can live in an [`ObjectPool`].
pub trait Poolable: Send {
    /// Create a fresh instance.
    fn create() -> Self;
    /// Prepare an instance for reuse.
    fn reset(&mut self);
}

/// Capacity a pooled buffer may keep between uses.
pub const MAX_POOLED_BUFFER_CAPACITY: usize = 64 * 1024;

impl Poolable for Vec<u8> {
    fn create() -> Self {
        Vec::with_capacity(1024)
    }

    fn reset(&mut self) {
        self.clear();
        self.shrink_to(MAX_POOLED_BUFFER_CAPACITY);
    }
}

/// Bounded free list of reusable objects.
#[derive(Debug)]
pub struct ObjectPool<T: Poolable> {
    free: Mutex<Vec<T>>,
    max_size: usize,
    stats: PoolStats,
}

impl<T: Poolable> ObjectPool<T> {
    /// Create a pool that keeps at most `max_size` idle objects.
    pub fn new(max_size: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_size,
            stats: PoolStats::default(),
        }
    }

    /// Take an object from the pool, creating one if none is idle.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let obj = match self.free.lock().pop() {
            Some(obj) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                obj
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                T::create()
            }
        };

        Pooled {
            obj: Some(obj),
            pool: self,
        }
    }

    fn release(&self, mut obj: T) {
        obj.reset();

        let mut free = self.free.lock();
        if free.len() < self.max_size {
            free.push(obj);
            self.stats.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of idle objects.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Pool statistics.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

/// RAII guard for a pooled object.
pub struct Pooled<'a, T: Poolable> {
    obj: Option<T>,
    pool: &'a ObjectPool<T>,
}

impl<T: Poolable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `None` after drop has taken it.
        self.obj.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Poolable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.obj.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Poolable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.pool.release(obj);
        }
    }
}

/// Pool statistics.
#[derive(Debug, Default)]
pub struct PoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

impl PoolStats {
    /// Acquisitions served from the free list.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Acquisitions that had to create a new object.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Objects put back on the free list.
    pub fn returns(&self) -> u64 {
        self.returns.load(Ordering::Relaxed)
    }

    /// Objects discarded because the free list was full.
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }
}
