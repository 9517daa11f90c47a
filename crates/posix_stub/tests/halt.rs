use std::panic::catch_unwind;

use posix_stub::halt::{ECALL, LOAD_HALT_OPCODE, SPIN, halt_sequence_bytes};
use posix_stub::{HALT_OPCODE, HALT_SEQUENCE, HostEnv, NoOsEnv, sys_halt};

#[test]
fn halt_sequence_encodes_li_ecall_spin() {
    assert_eq!(HALT_OPCODE, 0);
    // addi t0, zero, 0
    assert_eq!(LOAD_HALT_OPCODE, 0x0000_0293);
    assert_eq!(ECALL, 0x0000_0073);
    // jal zero, 0
    assert_eq!(SPIN, 0x0000_006f);
    assert_eq!(HALT_SEQUENCE, [0x293, 0x73, 0x6f]);
}

#[test]
fn halt_sequence_bytes_are_little_endian() {
    let bytes = halt_sequence_bytes();
    assert_eq!(&bytes[0..4], &[0x93, 0x02, 0x00, 0x00]);
    assert_eq!(&bytes[4..8], &[0x73, 0x00, 0x00, 0x00]);
    assert_eq!(&bytes[8..12], &[0x6f, 0x00, 0x00, 0x00]);
}

#[test]
#[should_panic(expected = "sys_halt: exit code 3")]
fn sys_halt_never_returns_on_host() {
    sys_halt(3);
}

#[test]
fn exit_through_table_does_not_reach_following_code() {
    let mut reached = false;
    let result = catch_unwind(std::panic::AssertUnwindSafe(|| {
        NoOsEnv.exit(0);
        #[allow(unreachable_code)]
        {
            reached = true;
        }
    }));
    assert!(result.is_err());
    assert!(!reached);
}
