//! File system call handlers
//!
//! Every handler follows the same order:
//! 1. validate and copy user operands into kernel memory (may fault)
//! 2. look the descriptor up in the caller's table (no lock needed)
//! 3. perform exactly one primitive per gate acquisition
//!
//! Nothing after step 1 can fault, so the gate is never held on the way
//! to `kill_process`.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::drivers::{Console, CONSOLE_CHUNK};
use crate::fs::FileSystem;
use crate::kernel::{Kernel, ProcessHost};
use crate::mm::VirtAddr;
use crate::process::{Fd, Process};

use super::fault::Fault;
use super::handler::{Outcome, SyscallResult};
use super::validate;

/// Longest file name the backing name table accepts.
pub const MAX_FILENAME_LEN: usize = 14;

impl<F, H, C> Kernel<F, H, C>
where
    F: FileSystem,
    H: ProcessHost,
    C: Console,
{
    /// Copy a file name in from user space.
    ///
    /// `Ok(None)` if the bytes are not valid UTF-8; such a name can never
    /// match a file.
    fn user_file_name(&self, process: &Process<F::File>, name: VirtAddr) -> Result<Option<String>, Fault> {
        let raw = validate::read_user_string(process.page_dir(), name)?;
        Ok(decode_name(process, raw))
    }

    /// `create(name, initial_size)`
    ///
    /// An empty name is a fault. A name longer than `MAX_FILENAME_LEN`, or
    /// one that is not UTF-8, fails quietly with 0 and never reaches the
    /// file system.
    pub(super) fn sys_create(&self, process: &mut Process<F::File>, name: VirtAddr, size: u32) -> SyscallResult {
        let raw = validate::read_user_string(process.page_dir(), name)?;
        if raw.is_empty() {
            return Err(Fault::EmptyFileName);
        }
        if raw.len() > MAX_FILENAME_LEN {
            log::debug!("pid {}: create: name of {} bytes too long", process.pid(), raw.len());
            return Ok(Outcome::flag(false));
        }

        let Some(name) = decode_name(process, raw) else {
            return Ok(Outcome::flag(false));
        };
        Ok(Outcome::flag(self.fs().create(&name, size)))
    }

    /// `remove(name)`: unlink; descriptors already open stay usable.
    pub(super) fn sys_remove(&self, process: &mut Process<F::File>, name: VirtAddr) -> SyscallResult {
        let Some(name) = self.user_file_name(process, name)? else {
            return Ok(Outcome::flag(false));
        };
        Ok(Outcome::flag(self.fs().remove(&name)))
    }

    /// `open(name)`
    ///
    /// # Returns
    /// A new descriptor (>= 2), or -1 if the file does not exist or the
    /// process ran out of descriptors.
    pub(super) fn sys_open(&self, process: &mut Process<F::File>, name: VirtAddr) -> SyscallResult {
        let Some(name) = self.user_file_name(process, name)? else {
            return Ok(Outcome::int(-1));
        };

        let Some(file) = self.fs().open(&name) else {
            log::debug!("pid {}: open {:?}: not found", process.pid(), name);
            return Ok(Outcome::int(-1));
        };

        let (_, files) = process.parts_mut();
        match files.insert(file) {
            Ok(fd) => Ok(Outcome::int(fd.as_i32())),
            Err(file) => {
                log::debug!("pid {}: open {:?}: descriptors exhausted", process.pid(), name);
                self.fs().close(file);
                Ok(Outcome::int(-1))
            }
        }
    }

    /// `filesize(fd)`: length in bytes, or -1 for an unknown descriptor.
    pub(super) fn sys_filesize(&self, process: &mut Process<F::File>, fd: Fd) -> Outcome {
        match process.files().get(fd) {
            Some(file) => Outcome::int(self.fs().length(file) as i32),
            None => Outcome::int(-1),
        }
    }

    /// `read(fd, buffer, length)`
    ///
    /// Descriptor 0 reads `length` keystrokes one byte at a time.
    ///
    /// # Returns
    /// Bytes read, or -1 for an unknown descriptor.
    pub(super) fn sys_read(&self, process: &mut Process<F::File>, fd: Fd, buf: VirtAddr, len: usize) -> SyscallResult {
        let pid = process.pid();
        let (dir, files) = process.parts_mut();
        let mut user = validate::validate_user_write(dir, buf, len)?;

        if fd == Fd::STDIN {
            for offset in 0..len {
                let key = self.console().read_byte();
                user.copy_from(offset, &[key])?;
            }
            return Ok(Outcome::int(len as i32));
        }

        let Some(file) = files.get_mut(fd) else {
            log::debug!("pid {}: read from unknown fd {}", pid, fd);
            return Ok(Outcome::int(-1));
        };

        let mut bounce = vec![0u8; len];
        let count = self.fs().read(file, &mut bounce).min(len);
        user.copy_from(0, &bounce[..count])?;
        Ok(Outcome::int(count as i32))
    }

    /// `write(fd, buffer, length)`
    ///
    /// Descriptor 1 goes to the console in chunks of at most
    /// `CONSOLE_CHUNK` bytes.
    ///
    /// # Returns
    /// Bytes written, or -1 for an unknown descriptor.
    pub(super) fn sys_write(&self, process: &mut Process<F::File>, fd: Fd, buf: VirtAddr, len: usize) -> SyscallResult {
        let pid = process.pid();
        let (dir, files) = process.parts_mut();
        let user = validate::validate_user_read(dir, buf, len)?;

        if fd == Fd::STDOUT {
            let mut chunk = [0u8; CONSOLE_CHUNK];
            let mut offset = 0;
            while offset < len {
                let amount = (len - offset).min(CONSOLE_CHUNK);
                user.copy_range_to(offset, &mut chunk[..amount])?;
                self.console().write_chunk(&chunk[..amount]);
                offset += amount;
            }
            return Ok(Outcome::int(len as i32));
        }

        let Some(file) = files.get_mut(fd) else {
            log::debug!("pid {}: write to unknown fd {}", pid, fd);
            return Ok(Outcome::int(-1));
        };


        let data = user.to_vec()?;
        Ok(Outcome::int(self.fs().write(file, &data) as i32))
    }

    /// `seek(fd, position)`: no-op for an unknown descriptor.
    pub(super) fn sys_seek(&self, process: &mut Process<F::File>, fd: Fd, position: u32) {
        let (_, files) = process.parts_mut();
        if let Some(file) = files.get_mut(fd) {
            self.fs().seek(file, position);
        }
    }

    /// `tell(fd)`: current position, `None` for an unknown descriptor.
    pub(super) fn sys_tell(&self, process: &Process<F::File>, fd: Fd) -> Option<u32> {
        let file = process.files().get(fd)?;
        Some(self.fs().tell(file))
    }

    /// `close(fd)`: no-op for an unknown descriptor, including 0 and 1.
    pub(super) fn sys_close(&self, process: &mut Process<F::File>, fd: Fd) {
        if !self.close_file(process, fd) {
            log::debug!("pid {}: close of unknown fd {}", process.pid(), fd);
        }
    }
}

/// Decode a copied-in name without rewriting any byte of it.
fn decode_name<Fl>(process: &Process<Fl>, raw: Vec<u8>) -> Option<String> {
    match String::from_utf8(raw) {
        Ok(name) => Some(name),
        Err(err) => {
            log::debug!("pid {}: file name is not UTF-8: {:?}", process.pid(), err.as_bytes());
            None
        }
    }
}
