//! Line logging through the capability table.
//!
//! Lines are formatted into a fixed stack buffer and handed to
//! `write(STDERR, ..)`. On the no-OS table they vanish; on a hosted table
//! they reach the real stderr. Nothing here allocates.

use core::fmt::{self, Write};

/// Longest line emitted, newline included. Longer output is truncated.
pub const LOG_LINE_MAX: usize = 192;

struct LineWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Write for LineWriter<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let space = self.buf.len().saturating_sub(self.pos);
        let len = core::cmp::min(s.len(), space);
        self.buf[self.pos..self.pos + len].copy_from_slice(&s.as_bytes()[..len]);
        self.pos += len;
        Ok(())
    }
}

/// Formats `args` into `buf` and terminates the line with `\n`.
/// Returns the number of bytes used.
pub fn format_line(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    let Some(body) = buf.len().checked_sub(1) else {
        return 0;
    };
    let mut writer = LineWriter { buf: &mut buf[..body], pos: 0 };
    let _ = writer.write_fmt(args);
    let end = writer.pos;
    buf[end] = b'\n';
    end + 1
}

/// `log!(env, "fmt", args..)` writes one formatted line to the environment's
/// stderr handle.
#[macro_export]
macro_rules! log {
    ($env:expr, $($arg:tt)+) => {{
        use $crate::HostEnv as _;
        let mut line = [0u8; $crate::log::LOG_LINE_MAX];
        let len = $crate::log::format_line(&mut line, format_args!($($arg)+));
        let _ = ($env).write($crate::STDERR, &line[..len]);
    }};
}
