//! The file-system gate
//!
//! One kernel-wide lock in front of the file system. Each method acquires
//! it for exactly one primitive call and releases it before returning.
//!
//! # Security Considerations
//! - Methods accept kernel data only (`&str`, byte slices, file handles).
//!   User pointers have to be validated and copied in before any of them
//!   can be called, so validation can never fault with the gate held.
//! - Coarse-grained: unrelated files still serialize. Waiters are not
//!   ordered.

use spin::Mutex;

use super::FileSystem;

/// Serializing wrapper around the backing file system.
pub struct FsGate<F> {
    fs: Mutex<F>,
}

impl<F: FileSystem> FsGate<F> {
    /// Wrap the file system. Called once at kernel start.
    pub const fn new(fs: F) -> Self {
        Self { fs: Mutex::new(fs) }
    }

    /// Run `f` with the gate held.
    ///
    /// For collaborators (the loader, diagnostics) that need a short
    /// sequence of primitives to appear atomic.
    pub fn with<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        let mut fs = self.fs.lock();
        f(&mut *fs)
    }

    pub fn create(&self, name: &str, initial_size: u32) -> bool {
        self.fs.lock().create(name, initial_size)
    }

    pub fn remove(&self, name: &str) -> bool {
        self.fs.lock().remove(name)
    }

    pub fn open(&self, name: &str) -> Option<F::File> {
        self.fs.lock().open(name)
    }

    pub fn close(&self, file: F::File) {
        self.fs.lock().close(file);
    }

    pub fn read(&self, file: &mut F::File, buf: &mut [u8]) -> usize {
        self.fs.lock().read(file, buf)
    }

    pub fn write(&self, file: &mut F::File, buf: &[u8]) -> usize {
        self.fs.lock().write(file, buf)
    }

    pub fn seek(&self, file: &mut F::File, position: u32) {
        self.fs.lock().seek(file, position);
    }

    pub fn tell(&self, file: &F::File) -> u32 {
        self.fs.lock().tell(file)
    }

    pub fn length(&self, file: &F::File) -> u32 {
        self.fs.lock().length(file)
    }

    pub fn allow_write(&self, file: &mut F::File) {
        self.fs.lock().allow_write(file);
    }

    pub fn deny_write(&self, file: &mut F::File) {
        self.fs.lock().deny_write(file);
    }

    /// Is some thread inside the file system right now?
    pub fn is_held(&self) -> bool {
        self.fs.is_locked()
    }
}
