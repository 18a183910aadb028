//! System Call Interface
//!
//! Entry point for user-mode requests: the trap glue hands every system
//! call of a process to `Kernel::dispatch`.
//!
//! # Security Model
//! - Whitelist approach: only the numbers in `SyscallNumber` are accepted
//! - All parameters are validated before use
//! - Invalid pointers terminate the caller with status -1, never panic
//!
//! # Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line)
//! - 3: wait(pid)
//! - 4: create(name, initial_size)
//! - 5: remove(name)
//! - 6: open(name)
//! - 7: filesize(fd)
//! - 8: read(fd, buf, len)
//! - 9: write(fd, buf, len)
//! - 10: seek(fd, position)
//! - 11: tell(fd)
//! - 12: close(fd)
//! - 13: practice(n)

mod fault;
mod file;
mod handler;
mod numbers;
pub mod validate;

pub use fault::{Fault, FAULT_EXIT_STATUS};
pub use file::MAX_FILENAME_LEN;
pub use handler::{Outcome, SyscallResult};
pub use numbers::SyscallNumber;
pub use validate::{UserBuffer, UserBufferMut};
