use core::ffi::{c_char, c_void};
use core::ptr;

use posix_stub::abi;
use posix_stub::{GETPID_SENTINEL, O_RDONLY, SEEK_END};

#[test]
fn standard_handle_symbols() {
    assert_eq!(abi::stdin, 0);
    assert_eq!(abi::stdout, 1);
    assert_eq!(abi::stderr, 2);
}

#[test]
fn getpid_symbol_is_sentinel() {
    assert_eq!(abi::getpid(), 1000);
    assert_eq!(abi::getpid(), GETPID_SENTINEL);
}

#[test]
fn io_symbols_are_neutral_and_leave_buffers_alone() {
    let mut buf = [0x5au8; 32];
    assert_eq!(abi::read(abi::stdin, buf.as_mut_ptr() as *mut c_void, buf.len()), 0);
    assert_eq!(buf, [0x5a; 32]);
    assert_eq!(abi::write(abi::stdout, b"hello".as_ptr() as *const c_void, 5), 0);

    let path = c"/etc/passwd";
    assert_eq!(abi::open(path.as_ptr(), O_RDONLY), 0);
    assert_eq!(abi::close(3), 0);
    assert_eq!(abi::lseek(3, 64, SEEK_END), 0);

    let mut stat_buf = [0xffu8; 64];
    assert_eq!(abi::stat(path.as_ptr(), stat_buf.as_mut_ptr() as *mut c_void), 0);
    assert_eq!(stat_buf, [0xff; 64]);

    assert_eq!(abi::kill(1, 9), 0);
}

#[test]
fn null_pointers_are_accepted() {
    assert_eq!(abi::read(0, ptr::null_mut(), 1024), 0);
    assert_eq!(abi::write(2, ptr::null(), 1024), 0);
    assert_eq!(abi::open(ptr::null(), 0), 0);
    assert_eq!(abi::stat(ptr::null(), ptr::null_mut()), 0);
}

#[test]
fn memory_stream_symbols_return_null() {
    let mut out: *mut c_char = ptr::null_mut();
    let mut size = 7usize;
    assert!(abi::open_memstream(&mut out, &mut size).is_null());
    assert!(out.is_null());
    assert_eq!(size, 7);

    let mut backing = [1u8; 8];
    let stream = abi::fmemopen(backing.as_mut_ptr() as *mut c_void, backing.len(), c"r".as_ptr());
    assert!(stream.is_null());
    assert_eq!(backing, [1; 8]);
}
