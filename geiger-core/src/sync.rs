//! Interrupt-safe storage for state shared between callbacks and the main loop.
//!
//! [`Shared`] pairs a [`critical_section::Mutex`] with a [`RefCell`] so every
//! access happens inside a critical section that is released when the closure
//! returns. Callers keep the closure to a handful of assignments; anything
//! longer adds directly to worst-case interrupt latency.

use core::cell::RefCell;

use critical_section::Mutex;

/// Value guarded by a critical section.
pub struct Shared<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    /// Wraps `value` so it can live in a `static`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Runs `f` with exclusive access to the guarded value.
    ///
    /// `f` must not call back into the same cell.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}

impl<T: Copy> Shared<T> {
    /// Returns a copy of the guarded value.
    pub fn get(&self) -> T {
        self.with(|value| *value)
    }

    /// Replaces the guarded value.
    pub fn set(&self, value: T) {
        self.with(|slot| *slot = value);
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
