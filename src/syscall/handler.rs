//! System Call Handler
//!
//! Dispatches system calls and implements the process-control handlers.
//! File handlers live in `file.rs`.
//!
//! # Flow of one trap
//! ```text
//! decode ─▶ validate argument vector ─▶ route ─▶ handler validates operands
//!    │                 │                               │
//!    └──── Fault ──────┴─────────── Fault ─────────────┴─▶ kill_process(-1)
//!                                                      │
//!                                    execute ─▶ write result to eax
//! ```
//!
//! # Security Considerations
//! - Unknown syscall numbers are faults, not no-ops
//! - Every argument word is read through the validator
//! - A `Fault` can only be produced before the file-system gate is taken

use alloc::string::String;

use crate::drivers::Console;
use crate::fs::FileSystem;
use crate::kernel::{Kernel, ProcessHost};
use crate::mm::{PageDirectory, VirtAddr, WORD_SIZE};
use crate::process::{Fd, Kinship, Pid, Process, ProcessState};
use crate::trap::{Disposition, SyscallFrame, Word};

use super::fault::Fault;
use super::numbers::SyscallNumber;
use super::validate;

/// What a handler asks the dispatcher to do with the trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Store this word in the caller's return register.
    Value(Word),
    /// No result (`seek`, `close`).
    Silent,
    /// Terminate the caller with this status.
    Exit(i32),
    /// Power off.
    Halt,
}

impl Outcome {
    /// A signed result.
    #[inline]
    pub const fn int(value: i32) -> Self {
        Self::Value(value as Word)
    }

    /// A 1/0 success flag.
    #[inline]
    pub const fn flag(ok: bool) -> Self {
        Self::Value(ok as Word)
    }
}

/// Result of a single handler.
pub type SyscallResult = Result<Outcome, Fault>;

/// Argument words of the current trap.
pub(super) struct SyscallArgs<'a, D: PageDirectory + ?Sized> {
    dir: &'a D,
    base: VirtAddr,
}

impl<'a, D: PageDirectory + ?Sized> SyscallArgs<'a, D> {
    /// Raw argument word `index` (1-based; word 0 is the number).
    pub(super) fn word(&self, index: usize) -> Result<Word, Fault> {
        let addr = self
            .base
            .checked_add(index * WORD_SIZE)
            .ok_or(Fault::KernelAddress(self.base))?;
        validate::read_word(self.dir, addr)
    }

    pub(super) fn int(&self, index: usize) -> Result<i32, Fault> {
        self.word(index).map(|w| w as i32)
    }

    pub(super) fn addr(&self, index: usize) -> Result<VirtAddr, Fault> {
        self.word(index).map(VirtAddr::from)
    }

    pub(super) fn fd(&self, index: usize) -> Result<Fd, Fault> {
        self.int(index).map(Fd::new)
    }
}

impl<F, H, C> Kernel<F, H, C>
where
    F: FileSystem,
    H: ProcessHost,
    C: Console,
{
    /// Handle one system call trap of `process`.
    ///
    /// # Returns
    /// What the trap glue must do next. On `Resume` the result (if any)
    /// is already in `frame.eax`.
    pub fn dispatch(&self, process: &mut Process<F::File>, frame: &mut SyscallFrame) -> Disposition {
        if let ProcessState::Exited(status) = process.state() {
            return Disposition::Exited(status);
        }

        match self.route(process, frame.args()) {
            Ok(Outcome::Value(word)) => {
                frame.set_return(word);
                Disposition::Resume
            }
            Ok(Outcome::Silent) => Disposition::Resume,
            Ok(Outcome::Exit(status)) => {
                frame.set_return(status as Word);
                self.kill_process(process, status)
            }
            Ok(Outcome::Halt) => {
                log::info!("halt requested by pid {}", process.pid());
                self.host().power_off();
                Disposition::Halted
            }
            Err(fault) => {
                log::warn!("pid {} ({}): {}; terminating", process.pid(), process.name(), fault);
                self.kill_process(process, fault.exit_status())
            }
        }
    }

    /// Decode the argument vector and run the matching handler.
    fn route(&self, process: &mut Process<F::File>, base: VirtAddr) -> SyscallResult {
        let number = validate::check_argument_vector(process.page_dir(), base)?;
        let args = SyscallArgs {
            dir: process.page_dir(),
            base,
        };
        log::trace!("pid {}: {:?}", process.pid(), number);

        match number {
            SyscallNumber::Halt => Ok(Outcome::Halt),
            SyscallNumber::Exit => Ok(Outcome::Exit(args.int(1)?)),
            SyscallNumber::Exec => {
                let cmd = args.addr(1)?;
                self.sys_exec(process, cmd)
            }
            SyscallNumber::Wait => {
                let pid = Pid::new(args.int(1)?);
                Ok(self.sys_wait(process, pid))
            }
            SyscallNumber::Create => {
                let (name, size) = (args.addr(1)?, args.word(2)?);
                self.sys_create(process, name, size)
            }
            SyscallNumber::Remove => {
                let name = args.addr(1)?;
                self.sys_remove(process, name)
            }
            SyscallNumber::Open => {
                let name = args.addr(1)?;
                self.sys_open(process, name)
            }
            SyscallNumber::Filesize => {
                let fd = args.fd(1)?;
                Ok(self.sys_filesize(process, fd))
            }
            SyscallNumber::Read => {
                let (fd, buf, len) = (args.fd(1)?, args.addr(2)?, args.word(3)?);
                self.sys_read(process, fd, buf, len as usize)
            }
            SyscallNumber::Write => {
                let (fd, buf, len) = (args.fd(1)?, args.addr(2)?, args.word(3)?);
                self.sys_write(process, fd, buf, len as usize)
            }
            SyscallNumber::Seek => {
                let (fd, position) = (args.fd(1)?, args.word(2)?);
                self.sys_seek(process, fd, position);
                Ok(Outcome::Silent)
            }
            SyscallNumber::Tell => {
                let fd = args.fd(1)?;
                Ok(match self.sys_tell(process, fd) {
                    Some(position) => Outcome::Value(position),
                    None => Outcome::int(-1),
                })
            }
            SyscallNumber::Close => {
                let fd = args.fd(1)?;
                self.sys_close(process, fd);
                Ok(Outcome::Silent)
            }
            SyscallNumber::Practice => Ok(Outcome::int(sys_practice(args.int(1)?))),
        }
    }

    /// Start a child running `cmd`.
    ///
    /// # Returns
    /// The child's pid, or -1 if the program could not be loaded or the
    /// command line is not UTF-8.
    fn sys_exec(&self, process: &mut Process<F::File>, cmd: VirtAddr) -> SyscallResult {
        let raw = validate::read_user_string(process.page_dir(), cmd)?;
        let Ok(cmd_line) = String::from_utf8(raw) else {
            log::debug!("pid {}: exec: command line is not UTF-8", process.pid());
            return Ok(Outcome::int(-1));
        };

        let child = Kinship::new(cmd_line, Some(process.pid()));
        match self.host().execute(&child) {
            Some(pid) => {
                child.set_child(pid);
                log::debug!("pid {}: exec {:?} -> pid {}", process.pid(), child.cmd_line(), pid);
                process.adopt(child);
                Ok(Outcome::int(pid.as_i32()))
            }
            None => {
                log::debug!("pid {}: exec {:?} failed to load", process.pid(), child.cmd_line());
                Ok(Outcome::int(-1))
            }
        }
    }

    /// Wait for child `pid` and collect its exit status.
    ///
    /// Returns -1 at once if `pid` is not a child of the caller or was
    /// already waited for.
    fn sys_wait(&self, process: &mut Process<F::File>, pid: Pid) -> Outcome {
        match process.take_child(pid) {
            Some(child) => Outcome::int(child.wait_for_exit_with(|| self.host().yield_now())),
            None => {
                log::debug!("pid {}: wait({}) on a non-child", process.pid(), pid);
                Outcome::int(-1)
            }
        }
    }
}

/// `practice(n)`: n + 1.
fn sys_practice(value: i32) -> i32 {
    value.wrapping_add(1)
}
