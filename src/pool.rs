//! Bounded pool of reusable, expensive-to-construct objects.
//!
//! Each vortex owns one pool for its debris bodies so that native object
//! creation is amortized across captures instead of paid on every spawn.
//! The pool is internally synchronized; callers never need an external
//! lock around acquire/release.
//!
//! # Example
//!
//! ```
//! use twister::pool::ResourcePool;
//!
//! let pool: ResourcePool<Vec<u8>> = ResourcePool::new(3, || Ok(Vec::with_capacity(1024)));
//! let buf = pool.acquire().unwrap();
//! assert!(pool.release(buf)); // stored for reuse
//! ```

use crate::error::PoolError;
use std::sync::Mutex;

type CreateFn<T> = dyn Fn() -> Result<T, PoolError> + Send + Sync;
type ResetFn<T> = dyn Fn(&mut T) + Send + Sync;
type TeardownFn<T> = dyn Fn(T) -> Result<(), String> + Send + Sync;

/// A thread-safe pool of reusable objects with a bounded idle set.
///
/// [`ResourcePool::acquire`] hands out an idle item if one exists and
/// otherwise invokes the creation closure. [`ResourcePool::release`]
/// stores the item back unless the pool is full, in which case it returns
/// `false` and the caller owns cleanup. That refusal is a backpressure
/// valve, not an error.
pub struct ResourcePool<T> {
    idle: Mutex<Vec<T>>,
    max_size: usize,
    create: Box<CreateFn<T>>,
    reset: Option<Box<ResetFn<T>>>,
    teardown: Option<Box<TeardownFn<T>>>,
}

impl<T> ResourcePool<T> {
    /// Create a pool holding at most `max_size` idle items.
    ///
    /// `create` is invoked whenever [`ResourcePool::acquire`] finds the
    /// idle set empty; its error surfaces to the caller as
    /// [`PoolError::CreationFailed`].
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    pub fn new<F>(max_size: usize, create: F) -> Self
    where
        F: Fn() -> Result<T, PoolError> + Send + Sync + 'static,
    {
        assert!(max_size > 0, "Pool max size must be greater than 0");
        Self {
            idle: Mutex::new(Vec::with_capacity(max_size)),
            max_size,
            create: Box::new(create),
            reset: None,
            teardown: None,
        }
    }

    /// Set a closure applied to every item as it re-enters the idle set.
    pub fn with_reset<F>(mut self, reset: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Set the cleanup closure used by [`ResourcePool::clear`] when asked
    /// to dispose drained items.
    pub fn with_teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn(T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// Take an item from the pool, creating a fresh one if none are idle.
    ///
    /// Never blocks beyond the internal mutex and never returns a
    /// placeholder: the only failure is the creation closure failing.
    pub fn acquire(&self) -> Result<T, PoolError> {
        if let Some(item) = self.idle.lock().expect("pool mutex poisoned").pop() {
            return Ok(item);
        }

        (self.create)()
    }

    /// Return an item to the pool.
    ///
    /// Returns `true` if the item was stored. Returns `false` when the
    /// idle set is already at capacity; ownership stays with the caller,
    /// who is expected to destroy the item.
    pub fn release(&self, mut item: T) -> bool {
        let mut idle = self.idle.lock().expect("pool mutex poisoned");
        if idle.len() >= self.max_size {
            log::debug!("Pool full ({}/{}), discarding item", idle.len(), self.max_size);
            return false;
        }

        if let Some(reset) = &self.reset {
            reset(&mut item);
        }
        idle.push(item);
        true
    }

    /// Drain the idle set.
    ///
    /// Items are moved out under the lock in one snapshot, then (if
    /// `dispose` is set) run through the teardown closure outside it.
    /// Teardown failures are logged and swallowed so one bad item cannot
    /// block draining the rest.
    pub fn clear(&self, dispose: bool) {
        let drained: Vec<T> = {
            let mut idle = self.idle.lock().expect("pool mutex poisoned");
            std::mem::take(&mut *idle)
        };

        let count = drained.len();
        if dispose {
            if let Some(teardown) = &self.teardown {
                for item in drained {
                    if let Err(msg) = teardown(item) {
                        log::warn!("Error disposing pooled object: {}", msg);
                    }
                }
            }
        }

        if count > 0 {
            log::debug!("Cleared pool, removed {} objects", count);
        }
    }

    /// Number of items currently idle in the pool.
    #[inline]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().expect("pool mutex poisoned").len()
    }

    /// The configured idle-set bound.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<T> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("idle", &self.idle_count())
            .field("max_size", &self.max_size)
            .finish()
    }
}
