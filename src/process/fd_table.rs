//! Per-process file descriptor table
//!
//! Maps small integers to open files for exactly one process.
//!
//! # Design
//! - Descriptors 0 and 1 are the console and never stored here
//! - New descriptors come from a monotonic counter starting at 2, so a
//!   value is never handed out twice during a process's lifetime
//! - Entries live in a short ordered sequence, newest first; lookups are
//!   linear scans
//!
//! The table only owns file handles. Releasing a handle goes through the
//! file-system gate, which the caller holds; see `Kernel::close_file`.

use alloc::collections::VecDeque;
use core::fmt;

/// A file descriptor as seen by user programs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Keyboard input.
    pub const STDIN: Self = Self(0);
    /// Console output.
    pub const STDOUT: Self = Self(1);
    /// First descriptor the table hands out.
    pub const FIRST: Self = Self(2);

    /// Wrap a raw descriptor value.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw descriptor value.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fd({})", self.0)
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open file owned by a process.
#[derive(Debug)]
struct OpenFile<Fl> {
    fd: Fd,
    file: Fl,
}

/// A process's descriptor table.
#[derive(Debug)]
pub struct DescriptorTable<Fl> {
    entries: VecDeque<OpenFile<Fl>>,
    next_fd: Option<i32>,
}

impl<Fl> DescriptorTable<Fl> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_fd: Some(Fd::FIRST.0),
        }
    }

    /// Install `file` under the next descriptor.
    ///
    /// Hands the file back if the descriptor space is exhausted; the
    /// caller is responsible for closing it.
    pub fn insert(&mut self, file: Fl) -> Result<Fd, Fl> {
        let Some(raw) = self.next_fd else {
            return Err(file);
        };
        self.next_fd = raw.checked_add(1);

        let fd = Fd(raw);
        self.entries.push_front(OpenFile { fd, file });
        Ok(fd)
    }

    /// Look up an open file.
    pub fn get(&self, fd: Fd) -> Option<&Fl> {
        self.entries.iter().find(|e| e.fd == fd).map(|e| &e.file)
    }

    /// Look up an open file for mutation.
    pub fn get_mut(&mut self, fd: Fd) -> Option<&mut Fl> {
        self.entries.iter_mut().find(|e| e.fd == fd).map(|e| &mut e.file)
    }

    /// Remove a descriptor, returning its file for release.
    pub fn remove(&mut self, fd: Fd) -> Option<Fl> {
        let index = self.entries.iter().position(|e| e.fd == fd)?;
        self.entries.remove(index).map(|e| e.file)
    }

    /// Take the most recently opened entry. Used by teardown to close the
    /// table one entry at a time.
    pub fn pop(&mut self) -> Option<(Fd, Fl)> {
        self.entries.pop_front().map(|e| (e.fd, e.file))
    }

    /// Make `raw` the next descriptor handed out.
    #[cfg(test)]
    pub(crate) fn skip_to(&mut self, raw: i32) {
        self.next_fd = Some(raw);
    }

    /// Number of open descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Fl> Default for DescriptorTable<Fl> {
    fn default() -> Self {
        Self::new()
    }
}
