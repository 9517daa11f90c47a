#![cfg_attr(not(feature = "std"), no_std)]
//! Runtime shim for running the C toolchain on a target with no operating
//! system underneath.
//!
//! Every hosted symbol the compiler or its generated code expects is given a
//! neutral behavior here. The only operation with a real effect is
//! termination, which issues the zkVM halt trap and never returns.
//!
//! The symbols are modeled as the [`HostEnv`] capability table so callers can
//! inject the neutral [`NoOsEnv`] on the target or an OS-backed table on a
//! native host. The raw C exports live in [`abi`] behind the `c_abi` feature.

pub mod env;
pub use env::{
    Fd, HostEnv, NO_OS, GETPID_SENTINEL, NoOsEnv, O_CREAT, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY,
    Pid, SEEK_CUR, SEEK_END, SEEK_SET, STDERR, STDIN, STDOUT, Stat, Stream,
};

pub mod halt;
pub use halt::{HALT_OPCODE, HALT_SEQUENCE, sys_halt};

#[macro_use] // enables `log!` across the crate
pub mod log;

#[cfg(feature = "std")]
pub mod hosted;
#[cfg(feature = "std")]
pub use hosted::HostedEnv;

#[cfg(feature = "c_abi")]
pub mod abi;
