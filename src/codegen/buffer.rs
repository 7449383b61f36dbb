use std::error::Error;
use std::fmt;
use std::io;
use std::mem;
use std::ptr;

use crate::interp::Cell;

/// mmap or mprotect failed. There is no recovery path: the caller
/// reports it and the run aborts.
#[derive(Debug)]
pub struct MemoryError {
    op: &'static str,
    source: io::Error,
}

impl MemoryError {
    fn last_os_error(op: &'static str) -> Self {
        Self {
            op,
            source: io::Error::last_os_error(),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "executable memory: {} failed: {}", self.op, self.source)
    }
}

impl Error for MemoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    Writable,
    Executable,
}

/// A fixed-capacity memory region that starts writable, is filled by the
/// code generator, then transitions once to executable (never both at
/// the same time) and is jumped into.
pub struct ExecutableBuffer {
    base: *mut u8,
    capacity: usize,
    cursor: usize,
    state: State,
}

impl ExecutableBuffer {
    /// Maps an anonymous private read/write region of `capacity` bytes.
    pub fn allocate(capacity: usize) -> Result<Self, MemoryError> {
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(MemoryError::last_os_error("mmap"));
        }
        Ok(Self {
            base: base as *mut u8,
            capacity,
            cursor: 0,
            state: State::Writable,
        })
    }

    /// Appends at the cursor. Running past capacity is a precondition
    /// violation (the buffer is sized from the program up front).
    pub fn write(&mut self, bytes: &[u8]) {
        assert_eq!(self.state, State::Writable, "write after make_executable");
        assert!(
            self.cursor + bytes.len() <= self.capacity,
            "code buffer overflow: {} + {} > {}",
            self.cursor,
            bytes.len(),
            self.capacity
        );
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.base.add(self.cursor), bytes.len());
        }
        self.cursor += bytes.len();
    }

    /// Little-endian, the operand encoding of every 4-byte immediate we
    /// emit.
    pub fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Moves the write cursor; only used by the backpatch
    /// seek-write-restore sequence.
    pub fn seek(&mut self, position: usize) {
        assert!(position <= self.capacity);
        self.cursor = position;
    }

    /// The bytes emitted so far, up to the cursor.
    pub fn code(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.base, self.cursor) }
    }

    /// Transitions the region to read/execute. No write may follow.
    pub fn make_executable(&mut self) -> Result<(), MemoryError> {
        assert_eq!(self.state, State::Writable);
        let ret = unsafe {
            libc::mprotect(
                self.base as *mut libc::c_void,
                self.capacity,
                libc::PROT_READ | libc::PROT_EXEC,
            )
        };
        if ret != 0 {
            return Err(MemoryError::last_os_error("mprotect"));
        }
        self.state = State::Executable;
        Ok(())
    }

    /// Calls the generated routine with the tape base in the first
    /// argument register, per the SysV convention the emitted code
    /// assumes. Returns when the generated `ret` executes.
    ///
    /// # Safety
    ///
    /// The buffer must hold a complete routine produced by
    /// [`compile`](crate::codegen::compile), and `tape_base` must point
    /// at a tape large enough for every pointer position the program
    /// reaches.
    pub unsafe fn invoke(&self, tape_base: *mut Cell) {
        assert_eq!(self.state, State::Executable, "invoke before make_executable");
        let entry: extern "sysv64" fn(*mut Cell) = mem::transmute(self.base);
        entry(tape_base);
    }
}

impl Drop for ExecutableBuffer {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.base as *mut libc::c_void, self.capacity);
        }
    }
}
