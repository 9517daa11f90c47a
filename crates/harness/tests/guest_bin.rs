use std::process::Command;

use harness::{Harness, HarnessConfig};

#[test]
fn native_image_prints_fixed_program_as_hex() {
    let output = Command::new(env!("CARGO_BIN_EXE_compile")).output().unwrap();
    assert!(output.status.success(), "{:?}", output);

    let expected = Harness::no_os(HarnessConfig::from_features())
        .compile_to_buffer(
            HarnessConfig::FIXED_TEST_SOURCE,
            HarnessConfig::DEFAULT_OUTPUT_CAPACITY,
        )
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end(), expected.to_hex());
    assert!(!expected.is_empty());
}

