//! Console and keyboard device interface
//!
//! The console driver is an external component; the kernel only needs to
//! push byte chunks at it and pull keyboard bytes from it.
//!
//! # Security Considerations
//! - A single driver call never receives more than `CONSOLE_CHUNK` bytes,
//!   so one large user write cannot monopolize the device in one call

use core::fmt::{self, Write};

/// Largest chunk handed to the console driver in one call.
pub const CONSOLE_CHUNK: usize = 256;

/// Console output and keyboard input.
pub trait Console {
    /// Write one chunk (at most `CONSOLE_CHUNK` bytes) to the console.
    fn write_chunk(&self, bytes: &[u8]);

    /// Block until a key is available and return it.
    fn read_byte(&self) -> u8;
}

/// Write `bytes` to the console in chunks of at most `CONSOLE_CHUNK` bytes.
pub fn write_all<C: Console + ?Sized>(console: &C, bytes: &[u8]) {
    for chunk in bytes.chunks(CONSOLE_CHUNK) {
        console.write_chunk(chunk);
    }
}

/// `core::fmt::Write` adapter for kernel messages on the console.
pub struct ConsoleWriter<'a, C: Console + ?Sized> {
    console: &'a C,
}

impl<'a, C: Console + ?Sized> ConsoleWriter<'a, C> {
    pub fn new(console: &'a C) -> Self {
        Self { console }
    }
}

impl<C: Console + ?Sized> Write for ConsoleWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_all(self.console, s.as_bytes());
        Ok(())
    }
}

/// Print formatted text to a console.
#[macro_export]
macro_rules! cprint {
    ($console:expr, $($arg:tt)*) => {{
        use core::fmt::Write;
        let _ = write!($crate::drivers::console::ConsoleWriter::new($console), $($arg)*);
    }};
}

/// Print formatted text and a newline to a console.
#[macro_export]
macro_rules! cprintln {
    ($console:expr) => {
        $crate::cprint!($console, "\n")
    };
    ($console:expr, $($arg:tt)*) => {{
        $crate::cprint!($console, $($arg)*);
        $crate::cprint!($console, "\n");
    }};
}
