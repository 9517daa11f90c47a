//! The capability table: every hosted operation the toolchain may call.

/// File descriptor, as the C side sees it.
pub type Fd = i32;
/// Process identifier.
pub type Pid = i32;

pub const STDIN: Fd = 0;
pub const STDOUT: Fd = 1;
pub const STDERR: Fd = 2;

/// The one logical process on the target.
pub const GETPID_SENTINEL: Pid = 1000;

// `open(2)` flag bits, Linux values.
pub const O_RDONLY: i32 = 0;
pub const O_WRONLY: i32 = 1;
pub const O_RDWR: i32 = 2;
pub const O_CREAT: i32 = 0o100;
pub const O_TRUNC: i32 = 0o1000;

// `lseek(2)` whence values.
pub const SEEK_SET: i32 = 0;
pub const SEEK_CUR: i32 = 1;
pub const SEEK_END: i32 = 2;

/// Subset of `struct stat` the toolchain looks at.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stat {
    pub st_mode: u32,
    pub st_size: i64,
}

impl Stat {
    pub const S_IFREG: u32 = 0o100000;
    pub const S_IFDIR: u32 = 0o040000;
}

/// Opaque `FILE *` stand-in returned by the memory-stream helpers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stream(pub usize);

impl Stream {
    pub const NULL: Stream = Stream(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Hosted-environment contract consumed by the compiler and the harness.
///
/// Implementations must never fail observably: every call returns, and
/// callers treat a zero result as "nothing happened" rather than as an
/// error. [`HostEnv::exit`] is the exception and never returns at all.
pub trait HostEnv {
    fn read(&self, fd: Fd, buf: &mut [u8]) -> isize;
    fn write(&self, fd: Fd, buf: &[u8]) -> isize;
    fn open(&self, path: &[u8], flags: i32) -> Fd;
    fn close(&self, fd: Fd) -> i32;
    fn lseek(&self, fd: Fd, offset: i64, whence: i32) -> i64;
    fn stat(&self, path: &[u8], out: &mut Stat) -> i32;
    fn kill(&self, pid: Pid, signal: i32) -> i32;
    fn getpid(&self) -> Pid;
    fn open_memstream(&self) -> Stream;
    fn fmemopen(&self, buf: &mut [u8], mode: &[u8]) -> Stream;
    /// Ends execution of the whole context.
    fn exit(&self, code: i32) -> !;
}

/// Capability table for a target with no operating system.
///
/// Every operation is a black hole: it accepts its arguments, touches none
/// of the caller's memory and reports zero. `exit` halts the machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoOsEnv;

/// Process-wide neutral table, established at link time.
pub static NO_OS: NoOsEnv = NoOsEnv;

impl HostEnv for NoOsEnv {
    fn read(&self, _fd: Fd, _buf: &mut [u8]) -> isize {
        0
    }

    fn write(&self, _fd: Fd, _buf: &[u8]) -> isize {
        0
    }

    fn open(&self, _path: &[u8], _flags: i32) -> Fd {
        0
    }

    fn close(&self, _fd: Fd) -> i32 {
        0
    }

    fn lseek(&self, _fd: Fd, _offset: i64, _whence: i32) -> i64 {
        0
    }

    fn stat(&self, _path: &[u8], _out: &mut Stat) -> i32 {
        0
    }

    fn kill(&self, _pid: Pid, _signal: i32) -> i32 {
        0
    }

    fn getpid(&self) -> Pid {
        GETPID_SENTINEL
    }

    fn open_memstream(&self) -> Stream {
        Stream::NULL
    }

    fn fmemopen(&self, _buf: &mut [u8], _mode: &[u8]) -> Stream {
        Stream::NULL
    }

    fn exit(&self, code: i32) -> ! {
        crate::halt::sys_halt(code)
    }
}
