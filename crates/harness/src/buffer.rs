use alloc::boxed::Box;
use alloc::string::String;

use sha2::{Digest, Sha256};

/// Output region filled by the code generator.
///
/// The region is exactly the requested capacity; `len` bytes from offset 0
/// hold the generated code and the rest stays zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBuffer {
    region: Box<[u8]>,
    len: usize,
}

impl CodeBuffer {
    pub(crate) fn new(region: Box<[u8]>, len: usize) -> Self {
        debug_assert!(len <= region.len());
        Self { region, len }
    }

    pub fn code(&self) -> &[u8] {
        &self.region[..self.len]
    }

    pub fn region(&self) -> &[u8] {
        &self.region
    }

    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// SHA-256 of the generated code.
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.code()).into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.code())
    }

    pub fn into_region(self) -> Box<[u8]> {
        self.region
    }

    /// Hands the region to a C caller. It is never freed.
    pub fn into_raw(self) -> *mut u8 {
        Box::into_raw(self.region) as *mut u8
    }

    /// Jumps into the generated entry stub.
    ///
    /// # Safety
    /// The buffer must hold a complete program with an entry stub, and the
    /// region must be executable. Control never comes back: the stub ends in
    /// the halt trap.
    #[cfg(target_arch = "riscv32")]
    pub unsafe fn enter(&self) -> ! {
        let entry: extern "C" fn() -> ! = unsafe { core::mem::transmute(self.region.as_ptr()) };
        entry()
    }
}
