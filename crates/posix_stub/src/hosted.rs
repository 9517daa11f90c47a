//! OS-backed capability table for running the toolchain on a native host.
//!
//! The standard handles go to the process's real streams and `open` hands
//! out descriptors from a private table of `std::fs::File`s, so `#include`
//! resolves against the real filesystem. Signals and memory streams stay
//! neutral: the host process is never signalled through this table.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use crate::env::{
    Fd, HostEnv, O_CREAT, O_RDWR, O_TRUNC, O_WRONLY, Pid, SEEK_CUR, SEEK_END, SEEK_SET, STDERR,
    STDIN, STDOUT, Stat, Stream,
};

/// First descriptor handed out by `open`; 0..=2 are the standard handles.
const FIRST_FILE_FD: Fd = 3;
const ACCESS_MODE_MASK: i32 = 0b11;

#[derive(Debug, Default)]
pub struct HostedEnv {
    files: Mutex<Vec<Option<File>>>,
}

impl HostedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_file<T>(&self, fd: Fd, fallback: T, f: impl FnOnce(&mut File) -> T) -> T {
        let Some(slot) = slot_index(fd) else {
            return fallback;
        };
        let Ok(mut files) = self.files.lock() else {
            return fallback;
        };
        match files.get_mut(slot) {
            Some(Some(file)) => f(file),
            _ => fallback,
        }
    }
}

fn slot_index(fd: Fd) -> Option<usize> {
    fd.checked_sub(FIRST_FILE_FD)
        .and_then(|slot| usize::try_from(slot).ok())
}

fn path_str(path: &[u8]) -> Option<&str> {
    core::str::from_utf8(path).ok()
}

fn io_len(result: io::Result<usize>) -> isize {
    match result {
        Ok(n) => n as isize,
        Err(_) => -1,
    }
}

impl HostEnv for HostedEnv {
    fn read(&self, fd: Fd, buf: &mut [u8]) -> isize {
        if fd == STDIN {
            return io_len(io::stdin().read(buf));
        }
        self.with_file(fd, -1, |file| io_len(file.read(buf)))
    }

    fn write(&self, fd: Fd, buf: &[u8]) -> isize {
        let written = match fd {
            STDOUT => io::stdout().write_all(buf),
            STDERR => io::stderr().write_all(buf),
            _ => return self.with_file(fd, -1, |file| io_len(file.write(buf))),
        };
        match written {
            Ok(()) => buf.len() as isize,
            Err(_) => -1,
        }
    }

    fn open(&self, path: &[u8], flags: i32) -> Fd {
        let Some(path) = path_str(path) else {
            return -1;
        };
        let access = flags & ACCESS_MODE_MASK;
        let opened = OpenOptions::new()
            .read(access != O_WRONLY)
            .write(access == O_WRONLY || access == O_RDWR)
            .create(flags & O_CREAT != 0)
            .truncate(flags & O_TRUNC != 0)
            .open(path);
        let Ok(file) = opened else {
            return -1;
        };
        let Ok(mut files) = self.files.lock() else {
            return -1;
        };
        let slot = match files.iter().position(Option::is_none) {
            Some(free) => {
                files[free] = Some(file);
                free
            }
            None => {
                files.push(Some(file));
                files.len() - 1
            }
        };
        FIRST_FILE_FD + slot as Fd
    }

    fn close(&self, fd: Fd) -> i32 {
        let Some(slot) = slot_index(fd) else {
            return -1;
        };
        let Ok(mut files) = self.files.lock() else {
            return -1;
        };
        match files.get_mut(slot).and_then(Option::take) {
            Some(_) => 0,
            None => -1,
        }
    }

    fn lseek(&self, fd: Fd, offset: i64, whence: i32) -> i64 {
        let target = match whence {
            SEEK_SET if offset >= 0 => SeekFrom::Start(offset as u64),
            SEEK_CUR => SeekFrom::Current(offset),
            SEEK_END => SeekFrom::End(offset),
            _ => return -1,
        };
        self.with_file(fd, -1, |file| match file.seek(target) {
            Ok(pos) => pos as i64,
            Err(_) => -1,
        })
    }

    fn stat(&self, path: &[u8], out: &mut Stat) -> i32 {
        let Some(meta) = path_str(path).and_then(|p| std::fs::metadata(p).ok()) else {
            return -1;
        };
        out.st_size = meta.len() as i64;
        out.st_mode = if meta.is_dir() { Stat::S_IFDIR } else { Stat::S_IFREG };
        0
    }

    fn kill(&self, _pid: Pid, _signal: i32) -> i32 {
        0
    }

    fn getpid(&self) -> Pid {
        std::process::id() as Pid
    }

    fn open_memstream(&self) -> Stream {
        Stream::NULL
    }

    fn fmemopen(&self, _buf: &mut [u8], _mode: &[u8]) -> Stream {
        Stream::NULL
    }

    fn exit(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}
