//! System call numbers and their argument counts.

use super::fault::Fault;

/// Logical system call numbers (word 0 of the argument vector).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SyscallNumber {
    Halt = 0,
    Exit = 1,
    Exec = 2,
    Wait = 3,
    Create = 4,
    Remove = 5,
    Open = 6,
    Filesize = 7,
    Read = 8,
    Write = 9,
    Seek = 10,
    Tell = 11,
    Close = 12,
    Practice = 13,
}

impl SyscallNumber {
    /// Number of argument slots the argument-vector check must cover.
    ///
    /// `create`, `seek`, `read` and `write` all report 2 here even though
    /// `read` and `write` take three words; the third is fetched through a
    /// checked word read like every other argument.
    pub const fn arg_count(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Exec
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Wait
            | Self::Tell
            | Self::Close
            | Self::Practice => 1,
            Self::Create | Self::Read | Self::Write | Self::Seek => 2,
        }
    }
}

impl TryFrom<u32> for SyscallNumber {
    type Error = Fault;

    fn try_from(nr: u32) -> Result<Self, Self::Error> {
        Ok(match nr {
            0 => Self::Halt,
            1 => Self::Exit,
            2 => Self::Exec,
            3 => Self::Wait,
            4 => Self::Create,
            5 => Self::Remove,
            6 => Self::Open,
            7 => Self::Filesize,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Seek,
            11 => Self::Tell,
            12 => Self::Close,
            13 => Self::Practice,
            _ => return Err(Fault::UnknownSyscall(nr)),
        })
    }
}
