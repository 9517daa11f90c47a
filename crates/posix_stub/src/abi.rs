//! C symbols for the no-OS image.
//!
//! These satisfy the link-time references of the C toolchain and of the code
//! it emits. Each export forwards to [`NoOsEnv`](crate::NoOsEnv) and never
//! dereferences the caller's pointers. The names are only left unmangled on
//! `target_os = "none"`; on an OS they would shadow the C library.
#![allow(non_upper_case_globals)]

use core::ffi::{c_char, c_int, c_long, c_void};

use crate::env::{HostEnv, NO_OS, STDERR, STDIN, STDOUT, Stat};

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub static stdin: c_int = STDIN;
#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub static stdout: c_int = STDOUT;
#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub static stderr: c_int = STDERR;

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn read(fd: c_int, _buf: *mut c_void, _count: usize) -> isize {
    NO_OS.read(fd, &mut [])
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn write(fd: c_int, _buf: *const c_void, _count: usize) -> isize {
    NO_OS.write(fd, &[])
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn open(_path: *const c_char, flags: c_int) -> c_int {
    NO_OS.open(&[], flags)
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn close(fd: c_int) -> c_int {
    NO_OS.close(fd)
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn lseek(fd: c_int, offset: c_long, whence: c_int) -> c_long {
    NO_OS.lseek(fd, offset as i64, whence) as c_long
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn stat(_path: *const c_char, _buf: *mut c_void) -> c_int {
    let mut scratch = Stat::default();
    NO_OS.stat(&[], &mut scratch)
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn kill(pid: c_int, signal: c_int) -> c_int {
    NO_OS.kill(pid, signal)
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn getpid() -> c_int {
    NO_OS.getpid()
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn open_memstream(_ptr: *mut *mut c_char, _size: *mut usize) -> *mut c_void {
    NO_OS.open_memstream().0 as *mut c_void
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn fmemopen(_buf: *mut c_void, _size: usize, _mode: *const c_char) -> *mut c_void {
    NO_OS.fmemopen(&mut [], &[]).0 as *mut c_void
}

#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn _exit(code: c_int) -> ! {
    NO_OS.exit(code)
}

/// Same as [`_exit`]: there are no buffered streams to flush.
#[cfg_attr(target_os = "none", unsafe(no_mangle))]
pub extern "C" fn exit(code: c_int) -> ! {
    NO_OS.exit(code)
}
