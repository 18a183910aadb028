//! Device interfaces used by the system call layer
//!
//! All drivers follow these security principles:
//! - Input validation happens before a driver is called
//! - Bounded work per driver call
//! - No panics on invalid input

pub mod console;

pub use console::{Console, CONSOLE_CHUNK};
