use alloc::vec;
use core::ffi::{CStr, c_char};

use compiler::Compiler;
use posix_stub::{HostEnv, NO_OS, log};

use crate::buffer::CodeBuffer;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::frontend::Frontend;

/// Runs source through lex, preprocess, parse and codegen into memory.
///
/// Every intermediate lives only for the duration of one call. The output
/// region is the only thing handed back.
pub struct Harness<'e, F = Compiler<'e>> {
    frontend: F,
    env: &'e dyn HostEnv,
    config: HarnessConfig,
}

impl<'e> Harness<'e> {
    pub fn new(env: &'e dyn HostEnv, config: HarnessConfig) -> Self {
        Self {
            frontend: Compiler::new(env),
            env,
            config,
        }
    }
}

impl Harness<'static> {
    /// The configuration the no-OS image runs with: neutral capabilities,
    /// includes resolve to nothing and logs are discarded.
    pub fn no_os(config: HarnessConfig) -> Self {
        Self::new(&NO_OS, config)
    }
}

impl<'e, F: Frontend> Harness<'e, F> {
    pub fn with_frontend(frontend: F, env: &'e dyn HostEnv, config: HarnessConfig) -> Self {
        Self {
            frontend,
            env,
            config,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// The caller's source, or the built-in program when configured.
    pub fn select_source<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        if self.config.use_fixed_test_source {
            HarnessConfig::FIXED_TEST_SOURCE
        } else {
            source
        }
    }

    fn lower(&self, source: &[u8]) -> F::Program {
        let source = self.select_source(source);
        if self.config.verbose {
            log!(self.env, "harness: tokenize {} bytes", source.len());
        }
        let tokens = self.frontend.tokenize(source);
        if self.config.verbose {
            log!(self.env, "harness: preprocess");
        }
        let tokens = self.frontend.preprocess(tokens);
        if self.config.verbose {
            log!(self.env, "harness: parse");
        }
        self.frontend.parse(tokens)
    }

    fn check_capacity(&self, program: &F::Program, capacity: usize) -> Result<(), HarnessError> {
        if capacity == 0 {
            return Err(HarnessError::ZeroCapacity);
        }
        if capacity > HarnessConfig::MAX_OUTPUT_CAPACITY {
            return Err(HarnessError::CapacityExceedsCeiling {
                capacity,
                ceiling: HarnessConfig::MAX_OUTPUT_CAPACITY,
            });
        }
        if let Some(required) = self.frontend.code_size(program) {
            if required > capacity {
                return Err(HarnessError::CapacityTooSmall { required, capacity });
            }
        }
        Ok(())
    }

    fn emit(&self, program: &F::Program, out: &mut [u8]) -> usize {
        let written = self.frontend.generate_code(program, out);
        if self.config.verbose {
            log!(self.env, "harness: codegen wrote {} of {} bytes", written, out.len());
        }
        written
    }

    /// Compiles into a fresh region of exactly `capacity` bytes.
    ///
    /// Stage errors in the source are not failures: the returned buffer holds
    /// whatever the code generator produced, possibly nothing.
    pub fn compile_to_buffer(&self, source: &[u8], capacity: usize) -> Result<CodeBuffer, HarnessError> {
        if capacity == 0 {
            return Err(HarnessError::ZeroCapacity);
        }
        let program = self.lower(source);
        self.check_capacity(&program, capacity)?;
        let mut region = vec![0u8; capacity].into_boxed_slice();
        let len = self.emit(&program, &mut region);
        Ok(CodeBuffer::new(region, len))
    }

    /// Like [`Harness::compile_to_buffer`] with a caller-owned region.
    pub fn compile_into(&self, source: &[u8], out: &mut [u8]) -> Result<usize, HarnessError> {
        if out.is_empty() {
            return Err(HarnessError::ZeroCapacity);
        }
        let program = self.lower(source);
        self.check_capacity(&program, out.len())?;
        Ok(self.emit(&program, out))
    }

    /// Skips every capacity check. Output past the end of `out` is dropped.
    pub fn compile_unchecked(&self, source: &[u8], out: &mut [u8]) -> usize {
        let program = self.lower(source);
        self.emit(&program, out)
    }

    /// Raw-pointer form of [`Harness::compile_into`].
    ///
    /// # Safety
    /// `out` must be valid for writes of `capacity` bytes and not aliased for
    /// the duration of the call.
    pub unsafe fn compile_to_ptr(
        &self,
        source: &[u8],
        out: *mut u8,
        capacity: usize,
    ) -> Result<usize, HarnessError> {
        if capacity == 0 {
            return Err(HarnessError::ZeroCapacity);
        }
        let out = unsafe { core::slice::from_raw_parts_mut(out, capacity) };
        self.compile_into(source, out)
    }
}

/// Borrows a NUL-terminated C string as source bytes.
///
/// # Safety
/// A non-null `ptr` must point to a NUL-terminated string that outlives `'a`.
pub unsafe fn source_from_c_str<'a>(ptr: *const c_char) -> Result<&'a [u8], HarnessError> {
    if ptr.is_null() {
        return Err(HarnessError::NullSource);
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_bytes())
}
