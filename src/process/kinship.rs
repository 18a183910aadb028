//! Parent/child kinship records
//!
//! A `Kinship` is created by the parent when it executes a child and is
//! shared by exactly those two processes. The child records its exit
//! status in it on the way out; the parent consumes that status once, in
//! `wait`.
//!
//! # Lifetime
//! The record is reference counted. The parent holds one reference in its
//! child list until it waits (or exits), the child holds one until it
//! exits. Whichever side lets go last frees the record, so a parent that
//! never waits leaks nothing and a parent that waits late never reads
//! freed memory.

use alloc::string::String;
use alloc::sync::Arc;

use spin::Mutex;

use crate::sync::Semaphore;

use super::Pid;

#[derive(Debug, Default)]
struct KinState {
    child: Option<Pid>,
    exit_status: Option<i32>,
}

/// Shared state between a parent and one child.
#[derive(Debug)]
pub struct Kinship {
    cmd_line: String,
    parent: Option<Pid>,
    state: Mutex<KinState>,
    exited: Semaphore,
}

impl Kinship {
    /// Create the record for a child about to be started with `cmd_line`.
    ///
    /// `parent` is `None` only for the first user process.
    pub fn new(cmd_line: String, parent: Option<Pid>) -> Arc<Self> {
        Arc::new(Self {
            cmd_line,
            parent,
            state: Mutex::new(KinState::default()),
            exited: Semaphore::new(0),
        })
    }

    /// Command line the child was started with.
    pub fn cmd_line(&self) -> &str {
        &self.cmd_line
    }

    /// Program name: the first token of the command line.
    pub fn program_name(&self) -> &str {
        self.cmd_line.split_whitespace().next().unwrap_or("")
    }

    /// Pid of the parent, if any.
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    /// Pid of the child once the loader assigned one.
    pub fn child(&self) -> Option<Pid> {
        self.state.lock().child
    }

    /// Record the pid the loader assigned to the child.
    pub fn set_child(&self, pid: Pid) {
        self.state.lock().child = Some(pid);
    }

    /// Child side: store the exit status without waking the parent yet.
    ///
    /// Only the first status is kept; returns whether this call stored it.
    pub fn record_status(&self, status: i32) -> bool {
        let mut state = self.state.lock();
        if state.exit_status.is_some() {
            return false;
        }
        state.exit_status = Some(status);
        true
    }

    /// Child side: wake the parent. Called once, after teardown.
    pub fn signal_exit(&self) {
        self.exited.up();
    }

    /// Child side: store the status and wake the parent in one step.
    pub fn record_exit(&self, status: i32) {
        if self.record_status(status) {
            self.signal_exit();
        }
    }

    /// Has the child recorded its status yet?
    pub fn has_status(&self) -> bool {
        self.state.lock().exit_status.is_some()
    }

    /// Parent side: block until the child has exited and return its status.
    ///
    /// Spins on the CPU while waiting; the syscall path uses
    /// `wait_for_exit_with` and yields to the scheduler instead.
    pub fn wait_for_exit(&self) -> i32 {
        self.wait_for_exit_with(core::hint::spin_loop)
    }

    /// Like `wait_for_exit`, calling `relax` between polls.
    pub fn wait_for_exit_with(&self, relax: impl FnMut()) -> i32 {
        self.exited.down_with(relax);
        self.state.lock().exit_status.unwrap_or(-1)
    }
}
