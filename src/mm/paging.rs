//! Page Directory Query Interface
//!
//! The kernel never walks user page tables itself from the syscall path;
//! it asks the process's page directory whether a page is present and
//! where the kernel can reach it.
//!
//! # Security Properties
//! - `translate` is a pure lookup and never faults
//! - A mapping is only usable by the syscall layer if it is both
//!   `PRESENT` and `USER`

use core::ptr::NonNull;

use bitflags::bitflags;

use super::address::VirtAddr;

bitflags! {
    /// Attribute bits of a user page mapping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        /// Entry maps a frame.
        const PRESENT = 1 << 0;
        /// User code may write the page.
        const WRITABLE = 1 << 1;
        /// User code may access the page at all.
        const USER = 1 << 2;

        /// Ordinary user data page.
        const USER_DATA = Self::PRESENT.bits() | Self::WRITABLE.bits() | Self::USER.bits();
    }
}

/// A present mapping returned by a page directory lookup.
#[derive(Debug, Clone, Copy)]
pub struct PageMapping {
    /// Kernel-accessible alias of the first byte of the page.
    pub frame: NonNull<u8>,
    /// Attribute bits of the mapping.
    pub flags: PageFlags,
}

impl PageMapping {
    /// Check that user code owns this mapping.
    #[inline]
    pub fn is_user_accessible(&self) -> bool {
        self.flags.contains(PageFlags::PRESENT | PageFlags::USER)
    }

    /// Kernel alias of the byte at `addr` inside this page.
    #[inline]
    pub fn byte_ptr(&self, addr: VirtAddr) -> NonNull<u8> {
        // SAFETY: page_offset() < PAGE_SIZE and the frame spans PAGE_SIZE bytes
        // per the PageDirectory contract.
        unsafe { NonNull::new_unchecked(self.frame.as_ptr().add(addr.page_offset())) }
    }
}

/// The page-table query of a process.
///
/// # Safety
/// Implementors must guarantee that every `PageMapping` they return
/// points to `PAGE_SIZE` bytes that stay valid for reads and writes for as
/// long as the mapping remains installed, and that the mapping for a page
/// does not change while a system call of the owning process is running.
pub unsafe trait PageDirectory {
    /// Look up the page containing `addr`. Returns `None` if nothing is mapped.
    fn translate(&self, addr: VirtAddr) -> Option<PageMapping>;
}
