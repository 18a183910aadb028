//! Process termination path
//!
//! `Kernel::kill_process` is the only way a process leaves the system call
//! layer: explicit `exit`, a validation fault, or any other fatal
//! condition all end here.
//!
//! # Ordering
//! 1. The exit status is recorded in the kinship record
//! 2. Every open descriptor is closed, one gate acquisition per file
//! 3. The executable is made writable again and closed
//! 4. The termination message is printed
//! 5. Child records are released and the parent is woken
//!
//! No lock is held on entry: faults are raised before the gate is taken,
//! and the gate is dropped at the end of every primitive.

use crate::cprintln;
use crate::drivers::Console;
use crate::fs::FileSystem;
use crate::kernel::{Kernel, ProcessHost};
use crate::trap::Disposition;

use super::{Fd, Process, ProcessState};

impl<F, H, C> Kernel<F, H, C>
where
    F: FileSystem,
    H: ProcessHost,
    C: Console,
{
    /// Release one descriptor of `process` through the gate.
    ///
    /// Returns `false` if the descriptor was not open.
    pub fn close_file(&self, process: &mut Process<F::File>, fd: Fd) -> bool {
        match process.files.remove(fd) {
            Some(file) => {
                self.fs().close(file);
                true
            }
            None => false,
        }
    }

    /// Terminate `process` with `status`.
    ///
    /// Terminal: the returned disposition is always `Exited`, and the
    /// process must not be resumed. Killing an already exited process only
    /// reports its original status.
    pub fn kill_process(&self, process: &mut Process<F::File>, status: i32) -> Disposition {
        if let ProcessState::Exited(original) = process.state {
            return Disposition::Exited(original);
        }
        process.state = ProcessState::Exited(status);

        process.kinship.record_status(status);

        while let Some((fd, file)) = process.files.pop() {
            log::trace!("pid {}: closing fd {} on exit", process.pid, fd);
            self.fs().close(file);
        }

        if let Some(mut exe) = process.executable.take() {
            self.fs().allow_write(&mut exe);
            self.fs().close(exe);
        }

        cprintln!(self.console(), "{}: exit({})", process.name, status);
        log::info!("pid {} ({}) exited with status {}", process.pid, process.name, status);

        // Children still running keep their own reference.
        process.children.clear();

        process.kinship.signal_exit();
        self.host().exit_thread(process.pid);

        Disposition::Exited(status)
    }
}
