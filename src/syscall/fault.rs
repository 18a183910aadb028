//! Fatal System Call Faults
//!
//! A `Fault` is a user error the kernel refuses to survive on the caller's
//! behalf: the offending process is terminated with status -1. Recoverable
//! failures (missing file, unknown descriptor, ...) are never faults.

use core::fmt;

use crate::mm::VirtAddr;

/// Exit status recorded for a process killed by a fault.
pub const FAULT_EXIT_STATUS: i32 = -1;

/// Reasons a system call kills its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A user pointer was null.
    NullPointer,
    /// A user pointer reached into kernel space.
    KernelAddress(VirtAddr),
    /// A user pointer referenced a page that is not mapped for the process.
    Unmapped(VirtAddr),
    /// The syscall number is not one the kernel implements.
    UnknownSyscall(u32),
    /// `create` was handed an empty file name.
    EmptyFileName,
}

impl Fault {
    /// Exit status the termination path records for this fault.
    #[inline]
    pub const fn exit_status(self) -> i32 {
        FAULT_EXIT_STATUS
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullPointer => write!(f, "null user pointer"),
            Self::KernelAddress(addr) => write!(f, "user pointer into kernel space at {}", addr),
            Self::Unmapped(addr) => write!(f, "unmapped user address {}", addr),
            Self::UnknownSyscall(nr) => write!(f, "unknown system call {}", nr),
            Self::EmptyFileName => write!(f, "empty file name"),
        }
    }
}
