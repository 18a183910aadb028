//! File system interface
//!
//! The on-disk file system is an external component. The kernel reaches it
//! only through [`FileSystem`], and only while holding the [`FsGate`].
//!
//! # Concurrency
//! The backing file system is not reentrant. Every method takes
//! `&mut self`; the gate's mutex is the only place that hands such a
//! reference out.

mod gate;

pub use gate::FsGate;

/// Primitive operations of the backing file system.
pub trait FileSystem {
    /// An open file. Owned by exactly one descriptor table entry (or the
    /// process's running executable).
    type File;

    /// Create `name` with `initial_size` zero bytes.
    fn create(&mut self, name: &str, initial_size: u32) -> bool;

    /// Unlink `name`. Open handles keep working.
    fn remove(&mut self, name: &str) -> bool;

    /// Open `name`.
    fn open(&mut self, name: &str) -> Option<Self::File>;

    /// Close a file handle.
    fn close(&mut self, file: Self::File);

    /// Read at the file position, returning the byte count.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> usize;

    /// Write at the file position, returning the byte count.
    fn write(&mut self, file: &mut Self::File, buf: &[u8]) -> usize;

    /// Move the file position.
    fn seek(&mut self, file: &mut Self::File, position: u32);

    /// Current file position.
    fn tell(&mut self, file: &Self::File) -> u32;

    /// File length in bytes.
    fn length(&mut self, file: &Self::File) -> u32;

    /// Re-enable writes to the underlying inode.
    fn allow_write(&mut self, file: &mut Self::File);

    /// Deny writes to the underlying inode while `file` stays open.
    fn deny_write(&mut self, file: &mut Self::File);
}
