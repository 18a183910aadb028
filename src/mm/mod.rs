//! Memory management types used by the system call layer
//!
//! Provides:
//! - User virtual addresses and the user/kernel split
//! - The page-directory query the address validator relies on
//!
//! # Security Principles
//! - User addresses are plain numbers until proven mapped
//! - Presence is decided by the page directory, never by touching memory

pub mod address;
pub mod paging;

pub use address::{VirtAddr, PAGE_SIZE, PHYS_BASE, WORD_SIZE};
pub use paging::{PageDirectory, PageFlags, PageMapping};
