//! No-OS image: compiles the built-in test program into a
//! [`HarnessConfig::DEFAULT_OUTPUT_CAPACITY`] region and halts.
//!
//! Exit code 0 means the region was filled, 1 means the harness rejected the
//! request and 101 means the image panicked.
#![cfg_attr(target_arch = "riscv32", no_std, no_main)]

#[cfg(target_arch = "riscv32")]
extern crate alloc;

#[cfg(target_arch = "riscv32")]
mod guest {
    use core::alloc::{GlobalAlloc, Layout};
    use core::cell::UnsafeCell;
    use core::ptr;

    use harness::{Harness, HarnessConfig};
    use posix_stub::{HostEnv, NO_OS, log, sys_halt};

    const HEAP_BYTES: usize = 0x40000; // 256 KiB
    const PANIC_EXIT_CODE: i32 = 101;

    #[repr(C, align(16))]
    struct Arena([u8; HEAP_BYTES]);

    /// Bump allocator over a static arena. Memory is never reused; the image
    /// halts long before that matters.
    struct BumpAllocator {
        arena: UnsafeCell<Arena>,
        next: UnsafeCell<usize>,
    }

    // Single hart, no interrupts.
    unsafe impl Sync for BumpAllocator {}

    unsafe impl GlobalAlloc for BumpAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let next = unsafe { &mut *self.next.get() };
            let start = (*next + layout.align() - 1) & !(layout.align() - 1);
            let Some(end) = start.checked_add(layout.size()) else {
                return ptr::null_mut();
            };
            if end > HEAP_BYTES {
                return ptr::null_mut();
            }
            *next = end;
            unsafe { (self.arena.get() as *mut u8).add(start) }
        }

        unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {}
    }

    #[global_allocator]
    static ALLOCATOR: BumpAllocator = BumpAllocator {
        arena: UnsafeCell::new(Arena([0; HEAP_BYTES])),
        next: UnsafeCell::new(0),
    };

    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        log!(NO_OS, "{}", info);
        sys_halt(PANIC_EXIT_CODE)
    }

    #[unsafe(no_mangle)]
    pub extern "C" fn _start() -> ! {
        let harness = Harness::no_os(HarnessConfig::from_features());
        let code = match harness.compile_to_buffer(
            HarnessConfig::FIXED_TEST_SOURCE,
            HarnessConfig::DEFAULT_OUTPUT_CAPACITY,
        ) {
            Ok(buffer) => {
                log!(NO_OS, "compiled {} bytes", buffer.len());
                0
            }
            Err(err) => {
                log!(NO_OS, "compile failed: {}", err);
                1
            }
        };
        NO_OS.exit(code)
    }
}

/// Native stand-in: compile the built-in program and print the code as hex.
#[cfg(not(target_arch = "riscv32"))]
fn main() {
    use harness::{Harness, HarnessConfig};

    let harness = Harness::no_os(HarnessConfig::from_features());
    match harness.compile_to_buffer(
        HarnessConfig::FIXED_TEST_SOURCE,
        HarnessConfig::DEFAULT_OUTPUT_CAPACITY,
    ) {
        Ok(buffer) => println!("{}", buffer.to_hex()),
        Err(err) => {
            eprintln!("compile failed: {}", err);
            std::process::exit(1);
        }
    }
}
