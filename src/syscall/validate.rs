//! System Call Input Validation
//!
//! Every user pointer is proven mapped, user-owned and below `PHYS_BASE`
//! before a single byte behind it is touched.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: deny by default
//! - Never dereference a user address: bytes are reached through the
//!   kernel alias the page directory hands back, and only after the check
//! - Copy into kernel memory (`Vec`/`String`) before any lock is taken, so
//!   the file-system gate never sees a user pointer

use alloc::vec::Vec;
use core::ptr::NonNull;

use crate::mm::{PageDirectory, VirtAddr, WORD_SIZE};

use super::fault::Fault;
use super::numbers::SyscallNumber;

/// Resolve one user byte to its kernel alias, or explain why it is off limits.
fn user_byte<D: PageDirectory + ?Sized>(dir: &D, addr: VirtAddr) -> Result<NonNull<u8>, Fault> {
    if addr.is_null() {
        return Err(Fault::NullPointer);
    }
    if addr.is_kernel() {
        return Err(Fault::KernelAddress(addr));
    }
    match dir.translate(addr) {
        Some(mapping) if mapping.is_user_accessible() => Ok(mapping.byte_ptr(addr)),
        _ => Err(Fault::Unmapped(addr)),
    }
}

/// `Result` form of [`validate_pointer`].
pub fn check_pointer<D: PageDirectory + ?Sized>(dir: &D, addr: VirtAddr) -> Result<(), Fault> {
    user_byte(dir, addr).map(|_| ())
}

/// Is `addr` non-null, below `PHYS_BASE` and mapped for the process?
pub fn validate_pointer<D: PageDirectory + ?Sized>(dir: &D, addr: VirtAddr) -> bool {
    check_pointer(dir, addr).is_ok()
}

/// Walk a NUL-terminated user string, handing each byte (terminator
/// excluded) to `sink`. Stops at the first byte that fails validation.
fn walk_string<D, F>(dir: &D, start: VirtAddr, mut sink: F) -> Result<(), Fault>
where
    D: PageDirectory + ?Sized,
    F: FnMut(u8),
{
    if start.is_null() {
        return Err(Fault::NullPointer);
    }

    let mut addr = start;
    loop {
        let byte_ptr = user_byte(dir, addr)?;
        // SAFETY: user_byte only returns aliases of present user pages, which
        // the PageDirectory contract keeps valid for the whole system call.
        let byte = unsafe { byte_ptr.as_ptr().read() };
        if byte == 0 {
            return Ok(());
        }
        sink(byte);
        addr = addr.checked_add(1).ok_or(Fault::KernelAddress(addr))?;
    }
}

/// Is there a terminator reachable from `ptr` through valid bytes only?
pub fn validate_string<D: PageDirectory + ?Sized>(dir: &D, ptr: VirtAddr) -> bool {
    walk_string(dir, ptr, |_| {}).is_ok()
}

/// Validate a user string and copy it (without terminator) into the kernel.
pub fn read_user_string<D: PageDirectory + ?Sized>(dir: &D, ptr: VirtAddr) -> Result<Vec<u8>, Fault> {
    let mut bytes = Vec::new();
    walk_string(dir, ptr, |b| bytes.push(b))?;
    Ok(bytes)
}

/// `Result` form of [`validate_buffer`].
///
/// Presence is a per-page property, so each page the range touches is
/// checked once, at the first byte of the range inside it.
pub fn check_buffer<D: PageDirectory + ?Sized>(dir: &D, ptr: VirtAddr, len: usize) -> Result<(), Fault> {
    if ptr.is_null() {
        return Err(Fault::NullPointer);
    }
    for_each_segment(ptr, len, |addr, _, _| check_pointer(dir, addr))
}

/// Are all `len` bytes from `ptr` valid user memory?
pub fn validate_buffer<D: PageDirectory + ?Sized>(dir: &D, ptr: VirtAddr, len: usize) -> bool {
    check_buffer(dir, ptr, len).is_ok()
}

/// Split `[start, start + len)` at page boundaries.
///
/// The callback receives the segment start, its offset from `start` and
/// its length. A range that wraps the address space is reported as a
/// kernel-space fault.
fn for_each_segment<F>(start: VirtAddr, len: usize, mut f: F) -> Result<(), Fault>
where
    F: FnMut(VirtAddr, usize, usize) -> Result<(), Fault>,
{
    let mut offset = 0;
    while offset < len {
        let addr = start.checked_add(offset).ok_or(Fault::KernelAddress(start))?;
        let chunk = addr.bytes_to_page_end().min(len - offset);
        f(addr, offset, chunk)?;
        offset += chunk;
    }
    Ok(())
}

/// Read one argument word, checking every byte of it.
pub fn read_word<D: PageDirectory + ?Sized>(dir: &D, addr: VirtAddr) -> Result<u32, Fault> {
    let buf = validate_user_read(dir, addr, WORD_SIZE)?;
    let mut raw = [0u8; WORD_SIZE];
    buf.copy_to(&mut raw)?;
    Ok(u32::from_le_bytes(raw))
}

/// `Result` form of [`validate_argument_vector`], yielding the decoded number.
///
/// # Security Checks
/// 1. The syscall-number word itself is readable
/// 2. The number is one the kernel knows
/// 3. The slot `arg_count` words past the base is a valid pointer
pub fn check_argument_vector<D: PageDirectory + ?Sized>(
    dir: &D,
    args: VirtAddr,
) -> Result<SyscallNumber, Fault> {
    check_pointer(dir, args)?;
    let number = SyscallNumber::try_from(read_word(dir, args)?)?;

    let last = args
        .checked_add(WORD_SIZE * number.arg_count())
        .ok_or(Fault::KernelAddress(args))?;
    check_pointer(dir, last)?;

    Ok(number)
}

/// Is the argument vector at `args` well formed for the number it carries?
pub fn validate_argument_vector<D: PageDirectory + ?Sized>(dir: &D, args: VirtAddr) -> bool {
    check_argument_vector(dir, args).is_ok()
}

/// A validated user-space buffer the kernel reads from.
///
/// This type guarantees that every byte was validated against the page
/// directory it borrows; it cannot be built any other way.
#[derive(Debug)]
pub struct UserBuffer<'a, D: PageDirectory + ?Sized> {
    dir: &'a D,
    start: VirtAddr,
    len: usize,
}

impl<'a, D: PageDirectory + ?Sized> UserBuffer<'a, D> {
    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the buffer empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `dst.len()` bytes starting at `offset` into kernel memory.
    ///
    /// Fails only if a page was unmapped after validation.
    ///
    /// # Panics
    /// Panics if the range exceeds the validated buffer.
    pub fn copy_range_to(&self, offset: usize, dst: &mut [u8]) -> Result<(), Fault> {
        assert!(offset + dst.len() <= self.len, "copy beyond validated buffer");
        let start = VirtAddr::new(self.start.as_usize() + offset);
        for_each_segment(start, dst.len(), |addr, at, chunk| {
            let src = user_byte(self.dir, addr)?;
            // SAFETY: the whole buffer was validated on construction; the
            // segment stays inside one page of the kernel alias.
            unsafe {
                core::ptr::copy_nonoverlapping(src.as_ptr(), dst[at..].as_mut_ptr(), chunk);
            }
            Ok(())
        })
    }

    /// Copy the whole buffer into `dst`.
    pub fn copy_to(&self, dst: &mut [u8]) -> Result<(), Fault> {
        self.copy_range_to(0, &mut dst[..self.len])
    }

    /// Copy the whole buffer into a fresh kernel vector.
    pub fn to_vec(&self) -> Result<Vec<u8>, Fault> {
        let mut out = alloc::vec![0u8; self.len];
        self.copy_to(&mut out)?;
        Ok(out)
    }
}

/// Validate a user-space buffer the kernel will read from.
pub fn validate_user_read<D: PageDirectory + ?Sized>(
    dir: &D,
    ptr: VirtAddr,
    len: usize,
) -> Result<UserBuffer<'_, D>, Fault> {
    check_buffer(dir, ptr, len)?;
    Ok(UserBuffer { dir, start: ptr, len })
}

/// A validated user-space buffer the kernel writes into.
#[derive(Debug)]
pub struct UserBufferMut<'a, D: PageDirectory + ?Sized> {
    dir: &'a D,
    start: VirtAddr,
    len: usize,
}

impl<'a, D: PageDirectory + ?Sized> UserBufferMut<'a, D> {
    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the buffer empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `src` into the buffer at `offset`.
    ///
    /// Fails only if a page was unmapped after validation.
    ///
    /// # Panics
    /// Panics if the range exceeds the validated buffer.
    pub fn copy_from(&mut self, offset: usize, src: &[u8]) -> Result<(), Fault> {
        assert!(offset + src.len() <= self.len, "copy beyond validated buffer");
        let start = VirtAddr::new(self.start.as_usize() + offset);
        for_each_segment(start, src.len(), |addr, at, chunk| {
            let dst = user_byte(self.dir, addr)?;
            // SAFETY: same as UserBuffer::copy_range_to; the kernel alias is
            // writable per the PageDirectory contract.
            unsafe {
                core::ptr::copy_nonoverlapping(src[at..].as_ptr(), dst.as_ptr(), chunk);
            }
            Ok(())
        })
    }
}

/// Validate a user-space buffer the kernel will write into.
///
/// Same checks as read validation.
pub fn validate_user_write<D: PageDirectory + ?Sized>(
    dir: &D,
    ptr: VirtAddr,
    len: usize,
) -> Result<UserBufferMut<'_, D>, Fault> {
    check_buffer(dir, ptr, len)?;
    Ok(UserBufferMut { dir, start: ptr, len })
}
