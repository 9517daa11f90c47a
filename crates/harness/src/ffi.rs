//! C entry point of the no-OS image.

use core::ffi::c_char;
use core::ptr;

use crate::config::HarnessConfig;
use crate::harness::{Harness, source_from_c_str};

/// Compiles `input` into a fresh region of `output_buf_len` bytes and
/// returns it. The region is owned by the caller and never freed.
///
/// Returns null when the capacity is rejected or `input` is null while the
/// built-in test program is not selected.
///
/// # Safety
/// `input` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn string_to_bin(input: *const c_char, output_buf_len: u32) -> *mut c_char {
    let harness = Harness::no_os(HarnessConfig::from_features());
    let source = if harness.config().use_fixed_test_source {
        HarnessConfig::FIXED_TEST_SOURCE
    } else {
        match unsafe { source_from_c_str(input) } {
            Ok(source) => source,
            Err(_) => return ptr::null_mut(),
        }
    };
    match harness.compile_to_buffer(source, output_buf_len as usize) {
        Ok(buffer) => buffer.into_raw() as *mut c_char,
        Err(_) => ptr::null_mut(),
    }
}
