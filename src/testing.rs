//! Host-side stand-ins for the kernel collaborators
//!
//! A simulated user address space, an in-memory file system, a recording
//! console and a recording scheduler, plus `Program`, which lays out
//! argument vectors the way the user-side syscall stubs do.

use std::collections::{BTreeMap, VecDeque};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use spin::Mutex;

use crate::drivers::Console;
use crate::fs::FileSystem;
use crate::kernel::{Kernel, ProcessHost};
use crate::mm::{PageDirectory, PageFlags, PageMapping, VirtAddr, PAGE_SIZE, PHYS_BASE, WORD_SIZE};
use crate::process::{Kinship, Pid, Process};
use crate::syscall::SyscallNumber;
use crate::trap::{Disposition, SyscallFrame};

// ---------------------------------------------------------------------------
// User address space
// ---------------------------------------------------------------------------

/// One heap-allocated page frame.
struct Frame(NonNull<[u8; PAGE_SIZE]>);

// SAFETY: a frame is plain memory owned by exactly one page table entry.
unsafe impl Send for Frame {}
unsafe impl Sync for Frame {}

impl Frame {
    fn zeroed() -> Self {
        Self(NonNull::from(Box::leak(Box::new([0u8; PAGE_SIZE]))))
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        // SAFETY: allocated by Box in `zeroed` and freed only here.
        unsafe { drop(Box::from_raw(self.0.as_ptr())) }
    }
}

/// A user page table backed by host memory. Clones share the same pages.
#[derive(Clone, Default)]
pub struct UserSpace {
    pages: Arc<Mutex<BTreeMap<usize, (Frame, PageFlags)>>>,
}

impl UserSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `count` fresh zeroed pages starting at the page of `base`.
    pub fn map(&mut self, base: VirtAddr, count: usize, flags: PageFlags) {
        let mut pages = self.pages.lock();
        for page in base.page_number()..base.page_number() + count {
            pages.insert(page, (Frame::zeroed(), flags));
        }
    }

    fn byte(&self, addr: usize) -> *mut u8 {
        let addr = VirtAddr::new(addr);
        let pages = self.pages.lock();
        let (frame, _) = pages
            .get(&addr.page_number())
            .unwrap_or_else(|| panic!("test touched unmapped address {}", addr));
        // SAFETY: page_offset() < PAGE_SIZE.
        unsafe { frame.0.as_ptr().cast::<u8>().add(addr.page_offset()) }
    }

    /// Drop the mappings of `count` pages starting at the page of `base`.
    pub fn unmap(&mut self, base: VirtAddr, count: usize) {
        let mut pages = self.pages.lock();
        for page in base.page_number()..base.page_number() + count {
            pages.remove(&page);
        }
    }

    /// Store bytes as the user program would, ignoring page flags.
    pub fn write(&self, at: VirtAddr, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            // SAFETY: `byte` returns a pointer into a live frame.
            unsafe { *self.byte(at.as_usize() + i) = b };
        }
    }

    /// Store little-endian words.
    pub fn write_words(&self, at: VirtAddr, words: &[u32]) {
        for (i, w) in words.iter().enumerate() {
            self.write(VirtAddr::new(at.as_usize() + i * WORD_SIZE), &w.to_le_bytes());
        }
    }

    pub fn read(&self, at: VirtAddr, len: usize) -> Vec<u8> {
        // SAFETY: `byte` returns a pointer into a live frame.
        (0..len).map(|i| unsafe { *self.byte(at.as_usize() + i) }).collect()
    }
}

// SAFETY: frames live until the last clone is dropped and are never remapped
// while a test holds a process built on this space.
unsafe impl PageDirectory for UserSpace {
    fn translate(&self, addr: VirtAddr) -> Option<PageMapping> {
        let pages = self.pages.lock();
        pages.get(&addr.page_number()).map(|(frame, flags)| PageMapping {
            frame: frame.0.cast(),
            flags: *flags,
        })
    }
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inode {
    data: Vec<u8>,
    open_count: usize,
    deny_write: usize,
    unlinked: bool,
}

/// Flat in-memory file system. Files never grow past their created size.
#[derive(Debug, Default)]
pub struct RamFs {
    names: BTreeMap<String, usize>,
    inodes: BTreeMap<usize, Inode>,
    next_inode: usize,
}

#[derive(Debug)]
pub struct RamFile {
    inode: usize,
    pos: u32,
    denying: bool,
}

impl RamFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles currently open across all files.
    pub fn open_handles(&self) -> usize {
        self.inodes.values().map(|inode| inode.open_count).sum()
    }

    /// Number of named files.
    pub fn file_count(&self) -> usize {
        self.names.len()
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let inode = self.names.get(name)?;
        self.inodes.get(inode).map(|inode| inode.data.clone())
    }

    fn inode(&mut self, file: &RamFile) -> &mut Inode {
        self.inodes.get_mut(&file.inode).expect("handle to a freed inode")
    }

    fn release_if_orphaned(&mut self, number: usize) {
        if self.inodes.get(&number).is_some_and(|i| i.unlinked && i.open_count == 0) {
            self.inodes.remove(&number);
        }
    }
}

impl FileSystem for RamFs {
    type File = RamFile;

    fn create(&mut self, name: &str, initial_size: u32) -> bool {
        if name.is_empty() || self.names.contains_key(name) {
            return false;
        }
        let number = self.next_inode;
        self.next_inode += 1;
        self.inodes.insert(
            number,
            Inode {
                data: vec![0; initial_size as usize],
                ..Inode::default()
            },
        );
        self.names.insert(name.to_string(), number);
        true
    }

    fn remove(&mut self, name: &str) -> bool {
        let Some(number) = self.names.remove(name) else {
            return false;
        };
        if let Some(inode) = self.inodes.get_mut(&number) {
            inode.unlinked = true;
        }
        self.release_if_orphaned(number);
        true
    }

    fn open(&mut self, name: &str) -> Option<RamFile> {
        let number = *self.names.get(name)?;
        self.inodes.get_mut(&number)?.open_count += 1;
        Some(RamFile {
            inode: number,
            pos: 0,
            denying: false,
        })
    }

    fn close(&mut self, file: RamFile) {
        let inode = self.inode(&file);
        inode.open_count -= 1;
        if file.denying {
            inode.deny_write -= 1;
        }
        self.release_if_orphaned(file.inode);
    }

    fn read(&mut self, file: &mut RamFile, buf: &mut [u8]) -> usize {
        let data = &self.inode(file).data;
        let pos = (file.pos as usize).min(data.len());
        let count = data.len().saturating_sub(pos).min(buf.len());
        buf[..count].copy_from_slice(&data[pos..pos + count]);
        file.pos += count as u32;
        count
    }

    fn write(&mut self, file: &mut RamFile, buf: &[u8]) -> usize {
        let inode = self.inode(file);
        if inode.deny_write > 0 {
            return 0;
        }
        let pos = (file.pos as usize).min(inode.data.len());
        let count = inode.data.len().saturating_sub(pos).min(buf.len());
        inode.data[pos..pos + count].copy_from_slice(&buf[..count]);
        file.pos += count as u32;
        count
    }

    fn seek(&mut self, file: &mut RamFile, position: u32) {
        file.pos = position;
    }

    fn tell(&mut self, file: &RamFile) -> u32 {
        file.pos
    }

    fn length(&mut self, file: &RamFile) -> u32 {
        self.inode(file).data.len() as u32
    }

    fn allow_write(&mut self, file: &mut RamFile) {
        if file.denying {
            file.denying = false;
            self.inode(file).deny_write -= 1;
        }
    }

    fn deny_write(&mut self, file: &mut RamFile) {
        if !file.denying {
            file.denying = true;
            self.inode(file).deny_write += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Console that keeps every chunk written and serves queued keystrokes.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    chunks: Mutex<Vec<Vec<u8>>>,
    keys: Mutex<VecDeque<u8>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> Vec<u8> {
        self.chunks.lock().concat()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.lock().iter().map(Vec::len).collect()
    }

    pub fn type_keys(&self, keys: &[u8]) {
        self.keys.lock().extend(keys.iter().copied());
    }

    pub fn pending_keys(&self) -> usize {
        self.keys.lock().len()
    }
}

impl Console for RecordingConsole {
    fn write_chunk(&self, bytes: &[u8]) {
        self.chunks.lock().push(bytes.to_vec());
    }

    fn read_byte(&self) -> u8 {
        self.keys.lock().pop_front().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Scheduler / loader
// ---------------------------------------------------------------------------

/// Loader that "starts" every program except those named `no-such*`.
#[derive(Debug)]
pub struct RecordingHost {
    next_pid: AtomicI32,
    spawned: Mutex<Vec<Arc<Kinship>>>,
    exited: Mutex<Vec<Pid>>,
    powered_off: AtomicBool,
    yields: AtomicUsize,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            next_pid: AtomicI32::new(1),
            spawned: Mutex::new(Vec::new()),
            exited: Mutex::new(Vec::new()),
            powered_off: AtomicBool::new(false),
            yields: AtomicUsize::new(0),
        }
    }
}

impl RecordingHost {
    pub fn allocate_pid(&self) -> Pid {
        Pid::new(self.next_pid.fetch_add(1, Ordering::Relaxed))
    }

    /// Kinship records of started children, oldest first.
    pub fn take_spawned(&self) -> Vec<Arc<Kinship>> {
        std::mem::take(&mut *self.spawned.lock())
    }

    pub fn exited(&self) -> Vec<Pid> {
        self.exited.lock().clone()
    }

    pub fn powered_off(&self) -> bool {
        self.powered_off.load(Ordering::Relaxed)
    }

    /// Times a waiting thread gave up the CPU.
    pub fn yields(&self) -> usize {
        self.yields.load(Ordering::Relaxed)
    }
}

impl ProcessHost for RecordingHost {
    fn execute(&self, child: &Arc<Kinship>) -> Option<Pid> {
        if child.program_name().starts_with("no-such") {
            return None;
        }
        let pid = self.allocate_pid();
        self.spawned.lock().push(Arc::clone(child));
        Some(pid)
    }

    fn exit_thread(&self, pid: Pid) {
        self.exited.lock().push(pid);
    }

    fn power_off(&self) {
        self.powered_off.store(true, Ordering::Relaxed);
    }

    fn yield_now(&self) {
        self.yields.fetch_add(1, Ordering::Relaxed);
        std::thread::yield_now();
    }
}

// ---------------------------------------------------------------------------
// Processes
// ---------------------------------------------------------------------------

pub type TestKernel = Kernel<RamFs, RecordingHost, RecordingConsole>;

pub fn test_kernel() -> TestKernel {
    Kernel::new(RamFs::new(), RecordingHost::default(), RecordingConsole::new())
}

/// Start of the data region every test process gets.
pub const DATA: usize = 0x0804_8000;
const DATA_PAGES: usize = 4;

fn standard_space() -> UserSpace {
    let mut space = UserSpace::new();
    space.map(VirtAddr::new(DATA), DATA_PAGES, PageFlags::USER_DATA);
    space.map(VirtAddr::new(PHYS_BASE - PAGE_SIZE), 1, PageFlags::USER_DATA);
    space
}

fn start(kernel: &TestKernel, pid: Pid, kinship: Arc<Kinship>, exe: Option<RamFile>) -> (Process<RamFile>, UserSpace) {
    let space = standard_space();
    let process = kernel.start_process(pid, Box::new(space.clone()), kinship, exe);
    (process, space)
}

/// Start a first-generation process running `cmd_line`.
pub fn spawn_process(kernel: &TestKernel, cmd_line: &str, exe: Option<RamFile>) -> (Process<RamFile>, UserSpace) {
    let kinship = Kinship::new(cmd_line.to_string(), None);
    let pid = kernel.host().allocate_pid();
    kinship.set_child(pid);
    start(kernel, pid, kinship, exe)
}

/// Bring up the child side of a record handed to `ProcessHost::execute`.
pub fn adopt_process(kernel: &TestKernel, kinship: Arc<Kinship>) -> (Process<RamFile>, UserSpace) {
    let pid = kinship.child().unwrap_or_else(|| kernel.host().allocate_pid());
    start(kernel, pid, kinship, None)
}

/// User-side view of a test process: places data and issues syscalls.
pub struct Program {
    space: UserSpace,
    heap: usize,
}

impl Program {
    /// Where argument vectors are pushed.
    const ARGS: usize = PHYS_BASE - 64;

    pub fn new(space: UserSpace) -> Self {
        Self { space, heap: DATA }
    }

    pub fn space(&self) -> &UserSpace {
        &self.space
    }

    /// One past the highest mapped user stack byte.
    pub fn stack_top(&self) -> usize {
        PHYS_BASE
    }

    /// Reserve `len` zeroed bytes in the data region.
    pub fn alloc(&mut self, len: usize) -> u32 {
        let at = self.heap;
        self.heap = (at + len + WORD_SIZE) & !(WORD_SIZE - 1);
        assert!(self.heap <= DATA + DATA_PAGES * PAGE_SIZE, "test data region exhausted");
        at as u32
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> u32 {
        let at = self.alloc(bytes.len());
        self.space.write(VirtAddr::from(at), bytes);
        at
    }

    /// Store a NUL-terminated copy of `s`.
    pub fn put_str(&mut self, s: &str) -> u32 {
        let at = self.alloc(s.len() + 1);
        self.space.write(VirtAddr::from(at), s.as_bytes());
        self.space.write(VirtAddr::from(at + s.len() as u32), &[0]);
        at
    }

    /// Lay out an argument vector and return the stack pointer for it.
    pub fn push_words(&self, words: &[u32]) -> u32 {
        self.space.write_words(VirtAddr::new(Self::ARGS), words);
        Self::ARGS as u32
    }

    pub fn frame(&self, number: SyscallNumber, args: &[u32]) -> SyscallFrame {
        self.raw_frame(number as u32, args)
    }

    fn raw_frame(&self, number: u32, args: &[u32]) -> SyscallFrame {
        let mut words = vec![number];
        words.extend_from_slice(args);
        SyscallFrame::new(self.push_words(&words))
    }

    /// Issue a system call. `Ok(eax)` if the process resumes, `Err(status)`
    /// if it was terminated.
    pub fn call(
        &self,
        kernel: &TestKernel,
        process: &mut Process<RamFile>,
        number: SyscallNumber,
        args: &[u32],
    ) -> Result<u32, i32> {
        self.call_raw(kernel, process, number as u32, args)
    }

    pub fn call_raw(&self, kernel: &TestKernel, process: &mut Process<RamFile>, number: u32, args: &[u32]) -> Result<u32, i32> {
        let mut frame = self.raw_frame(number, args);
        match kernel.dispatch(process, &mut frame) {
            Disposition::Resume => Ok(frame.eax),
            Disposition::Exited(status) => Err(status),
            Disposition::Halted => panic!("unexpected halt"),
        }
    }
}
