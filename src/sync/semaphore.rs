//! Counting semaphore
//!
//! Used as the "child has recorded its exit status" signal of a kinship
//! record. A waiter polls the count and runs a relax hook between polls;
//! the kernel passes a scheduler yield so a waiting parent gives up its
//! time slice instead of burning it.

use spin::Mutex;

/// A counting semaphore.
#[derive(Debug)]
pub struct Semaphore {
    value: Mutex<usize>,
}

impl Semaphore {
    /// Create a semaphore with the given initial count.
    pub const fn new(value: usize) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Increment the count, releasing one waiter.
    pub fn up(&self) {
        *self.value.lock() += 1;
    }

    /// Decrement the count if it is positive. Never blocks.
    pub fn try_down(&self) -> bool {
        let mut value = self.value.lock();
        if *value > 0 {
            *value -= 1;
            true
        } else {
            false
        }
    }

    /// Wait until the count is positive, then decrement it.
    pub fn down(&self) {
        self.down_with(core::hint::spin_loop);
    }

    /// Like `down`, calling `relax` each time the count is still zero.
    pub fn down_with(&self, mut relax: impl FnMut()) {
        while !self.try_down() {
            relax();
        }
    }

    /// Current count.
    pub fn value(&self) -> usize {
        *self.value.lock()
    }
}
