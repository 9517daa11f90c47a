//! In-memory compile harness for the no-OS target.
//!
//! [`Harness::compile_to_buffer`] takes C source through the four stages of
//! a [`Frontend`] and returns the machine code in a caller-sized region. The
//! compiler reads its environment through a [`posix_stub::HostEnv`]; on the
//! target that is the neutral [`posix_stub::NoOsEnv`].
#![no_std]

extern crate alloc;

pub mod buffer;
pub mod config;
pub mod error;
pub mod frontend;
pub mod harness;

#[cfg(feature = "c_abi")]
pub mod ffi;

pub use buffer::CodeBuffer;
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use frontend::Frontend;
pub use harness::{Harness, source_from_c_str};

/// [`Harness::compile_to_buffer`] on the no-OS environment with the
/// feature-selected configuration.
pub fn compile_to_buffer(source: &[u8], output_capacity: usize) -> Result<CodeBuffer, HarnessError> {
    Harness::no_os(HarnessConfig::from_features()).compile_to_buffer(source, output_capacity)
}
