//! Kernel context of the system call layer
//!
//! Built once at boot from the external collaborators and shared by every
//! trapping thread for the lifetime of the system.

use alloc::sync::Arc;

use crate::drivers::Console;
use crate::fs::{FileSystem, FsGate};
use crate::process::{Kinship, Pid, Process, UserPageDir};

/// Process and thread services provided by the scheduler and loader.
pub trait ProcessHost {
    /// Load the program named by `child.cmd_line()` and start it in a new
    /// thread that owns the other side of `child`.
    ///
    /// Returns once loading finished, with the child's pid, or `None` if
    /// the program could not be loaded.
    fn execute(&self, child: &Arc<Kinship>) -> Option<Pid>;

    /// The thread of `pid` has been torn down and will never run again.
    fn exit_thread(&self, pid: Pid);

    /// Power the machine off.
    fn power_off(&self);

    /// Give up the CPU while the current thread waits for another one.
    fn yield_now(&self) {
        core::hint::spin_loop();
    }
}

/// Shared kernel state: the file-system gate plus the collaborators.
pub struct Kernel<F: FileSystem, H, C> {
    fs: FsGate<F>,
    host: H,
    console: C,
}

impl<F, H, C> Kernel<F, H, C>
where
    F: FileSystem,
    H: ProcessHost,
    C: Console,
{
    /// Initialize the syscall layer. The gate lives as long as the kernel.
    pub fn new(fs: F, host: H, console: C) -> Self {
        log::info!("syscall layer initialized");
        Self {
            fs: FsGate::new(fs),
            host,
            console,
        }
    }

    /// The file-system gate.
    pub fn fs(&self) -> &FsGate<F> {
        &self.fs
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Set up the syscall-side state of a freshly loaded process.
    ///
    /// The executable, if given, stays open and write-protected until the
    /// process terminates.
    pub fn start_process(
        &self,
        pid: Pid,
        page_dir: UserPageDir,
        kinship: Arc<Kinship>,
        executable: Option<F::File>,
    ) -> Process<F::File> {
        let executable = executable.map(|mut file| {
            self.fs.deny_write(&mut file);
            file
        });
        log::debug!("pid {} started: {:?}", pid, kinship.cmd_line());
        Process::new(pid, page_dir, kinship, executable)
    }
}
