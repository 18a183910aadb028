//! PantherOS - User Program System Call Layer
//!
//! The boundary between user programs and the kernel: argument decoding,
//! user-pointer validation, per-process file descriptors, parent/child
//! exit bookkeeping and serialized access to the file system.
//!
//! # Security Features
//! - Every user pointer is validated before use (null, kernel half, unmapped)
//! - A bad pointer terminates only the offending process, with status -1
//! - The file system is entered through a single gate, one primitive at a time
//! - Running executables are write-protected
//!
//! # Architecture
//! - Target: 32-bit user ABI, arguments on the user stack
//! - Collaborators: the file system, scheduler/loader and console are
//!   traits implemented by the rest of the kernel

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod drivers;
pub mod fs;
pub mod kernel;
pub mod mm;
pub mod process;
pub mod sync;
pub mod syscall;
pub mod trap;

#[cfg(test)]
mod testing;

pub use kernel::{Kernel, ProcessHost};
pub use trap::{Disposition, SyscallFrame};
