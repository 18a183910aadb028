//! System call trap frame
//!
//! The architecture's trap entry saves the user context and hands the
//! kernel a `SyscallFrame`: the user stack pointer, where the argument
//! vector lives, and the return-value register.
//!
//! # Argument vector layout
//! ```text
//!   esp + 0   syscall number
//!   esp + 4   argument 1
//!   esp + 8   argument 2
//!   esp + 12  argument 3
//! ```
//!
//! # Security Considerations
//! - The stack pointer is user controlled and is only ever treated as a
//!   `VirtAddr` to be validated
//! - After `Disposition::Exited` the frame belongs to a dead process and
//!   must not be resumed

use crate::mm::VirtAddr;

/// Machine word of the syscall ABI.
pub type Word = u32;

/// The part of the saved user context the syscall layer touches.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyscallFrame {
    /// User stack pointer at the time of the trap.
    pub esp: Word,
    /// Return-value register.
    pub eax: Word,
}

impl SyscallFrame {
    /// Build a frame for a trap taken with the given user stack pointer.
    pub const fn new(esp: Word) -> Self {
        Self { esp, eax: 0 }
    }

    /// Base of the argument vector.
    #[inline]
    pub fn args(&self) -> VirtAddr {
        VirtAddr::from(self.esp)
    }

    /// Store a result word for the user program.
    #[inline]
    pub fn set_return(&mut self, value: Word) {
        self.eax = value;
    }

    /// Result word interpreted as a signed value.
    #[inline]
    pub fn return_value(&self) -> i32 {
        self.eax as i32
    }
}

/// What the trap glue must do after a system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Disposition {
    /// Return to the user program.
    Resume,
    /// The process was torn down with this status; schedule something else.
    Exited(i32),
    /// The machine is powering off.
    Halted,
}
