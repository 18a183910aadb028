//! Kernel synchronization primitives
//!
//! Mutual exclusion comes straight from `spin::Mutex`; this module adds the
//! signalling primitive the parent/child exit handshake needs.

pub mod semaphore;

pub use semaphore::Semaphore;
