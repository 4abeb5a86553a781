//! Cache crate
//!
//! Provides [`Memo`], a thread-safe lazy cell that computes its value at most
//! once per reset. Concurrent callers that arrive while the value is being
//! computed wait for that computation instead of starting their own, and a
//! failed computation is remembered and returned to every later caller.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

/// Observable state of a [`Memo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    Unloaded,
    Loaded,
    Failed,
}

enum Slot<T, E> {
    Unloaded,
    Loaded(Arc<T>),
    Failed(E),
}

impl<T, E: Clone> Slot<T, E> {
    fn get(&self) -> Option<Result<Arc<T>, E>> {
        match self {
            Slot::Unloaded => None,
            Slot::Loaded(value) => Some(Ok(Arc::clone(value))),
            Slot::Failed(err) => Some(Err(err.clone())),
        }
    }
}

/// A single-flight, failure-caching, resettable lazy cell.
pub struct Memo<T, E> {
    slot: RwLock<Slot<T, E>>,
    // Held for the duration of a load; serializes loaders and resets.
    load_lock: Mutex<()>,
}

impl<T, E: Clone> Default for Memo<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E: Clone> Memo<T, E> {
    /// Creates a new, unloaded memo.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Slot::Unloaded),
            load_lock: Mutex::new(()),
        }
    }

    /// Returns the memoized result, running `load` if nothing is cached yet.
    ///
    /// Only one caller runs `load`; callers arriving during the load block until
    /// it finishes and then observe the same value or the same error.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(cached) = self.peek() {
            if cached.is_err() {
                debug!("returning cached failure");
            }
            return cached;
        }

        let _loading = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished loading while we waited.
        if let Some(cached) = self.peek() {
            debug!("memo populated by concurrent loader");
            return cached;
        }

        let (slot, result) = match load() {
            Ok(value) => {
                let value = Arc::new(value);
                (Slot::Loaded(Arc::clone(&value)), Ok(value))
            }
            Err(err) => (Slot::Failed(err.clone()), Err(err)),
        };
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = slot;
        result
    }

    /// Returns the cached result without loading.
    pub fn peek(&self) -> Option<Result<Arc<T>, E>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).get()
    }

    pub fn state(&self) -> MemoState {
        match *self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Unloaded => MemoState::Unloaded,
            Slot::Loaded(_) => MemoState::Loaded,
            Slot::Failed(_) => MemoState::Failed,
        }
    }

    /// Discards the cached value or failure. Waits for an in-flight load to finish.
    pub fn reset(&self) {
        let _loading = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Slot::Unloaded;
        debug!("memo reset");
    }
}
