//! User processes as seen by the system call layer
//!
//! A `Process` bundles what a trapping thread owns: its page directory,
//! its descriptor table, its running executable, its side of the kinship
//! record with its parent, and the records of the children it started.
//!
//! # Ownership
//! - The descriptor table is touched only by the owning thread: no locking
//! - Kinship records are `Arc`-shared with exactly one other process

mod exit;
pub mod fd_table;
pub mod kinship;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::mm::PageDirectory;

pub use fd_table::{DescriptorTable, Fd};
pub use kinship::Kinship;

/// Process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Exited(i32),
}

/// Page directory handle owned by a process.
pub type UserPageDir = Box<dyn PageDirectory + Send>;

/// Per-process state of the system call layer.
pub struct Process<Fl> {
    pid: Pid,
    name: String,
    page_dir: UserPageDir,
    files: DescriptorTable<Fl>,
    executable: Option<Fl>,
    kinship: Arc<Kinship>,
    children: Vec<Arc<Kinship>>,
    state: ProcessState,
}

impl<Fl> Process<Fl> {
    /// Assemble a process. Use `Kernel::start_process`, which also
    /// write-protects the executable.
    pub(crate) fn new(pid: Pid, page_dir: UserPageDir, kinship: Arc<Kinship>, executable: Option<Fl>) -> Self {
        Self {
            pid,
            name: String::from(kinship.program_name()),
            page_dir,
            files: DescriptorTable::new(),
            executable,
            kinship,
            children: Vec::new(),
            state: ProcessState::Running,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Program name used in kernel messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    /// The process's page directory.
    pub fn page_dir(&self) -> &(dyn PageDirectory + Send) {
        &*self.page_dir
    }

    pub fn files(&self) -> &DescriptorTable<Fl> {
        &self.files
    }

    /// Borrow the page directory and the descriptor table at the same time.
    pub fn parts_mut(&mut self) -> (&(dyn PageDirectory + Send), &mut DescriptorTable<Fl>) {
        (&*self.page_dir, &mut self.files)
    }

    /// This process's side of the kinship record with its parent.
    pub fn kinship(&self) -> &Arc<Kinship> {
        &self.kinship
    }

    /// Remember a freshly started child.
    pub(crate) fn adopt(&mut self, child: Arc<Kinship>) {
        self.children.push(child);
    }

    /// Detach the record of child `pid` so it can be waited on. A second
    /// call for the same pid finds nothing.
    pub(crate) fn take_child(&mut self, pid: Pid) -> Option<Arc<Kinship>> {
        let index = self.children.iter().position(|kin| kin.child() == Some(pid))?;
        Some(self.children.swap_remove(index))
    }

    /// Pids of children not yet waited for.
    pub fn children(&self) -> impl Iterator<Item = Pid> + '_ {
        self.children.iter().filter_map(|kin| kin.child())
    }
}

impl<Fl> fmt::Debug for Process<Fl> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("open_files", &self.files.len())
            .field("children", &self.children.len())
            .field("state", &self.state)
            .finish()
    }
}
