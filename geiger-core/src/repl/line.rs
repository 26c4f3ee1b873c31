//! Byte-at-a-time line assembly for serial consoles.

use core::fmt;
use core::str;

use heapless::Vec;

/// Longest accepted console line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 96;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineError {
    /// The line exceeded the buffer; the whole line is discarded.
    Overflow,
    InvalidUtf8,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Overflow => write!(f, "line longer than {MAX_LINE_LEN} bytes"),
            LineError::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
        }
    }
}

/// Collects bytes until `\r` or `\n`.
///
/// Empty lines (including the second half of `\r\n`) are swallowed.
#[derive(Debug, Default)]
pub struct LineBuffer {
    bytes: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
    complete: bool,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            overflowed: false,
            complete: false,
        }
    }

    /// Feeds one byte. Returns the finished line when `byte` terminates a
    /// non-empty line.
    pub fn push(&mut self, byte: u8) -> Option<Result<&str, LineError>> {
        if self.complete {
            self.reset();
        }

        match byte {
            b'\r' | b'\n' => {
                if self.overflowed {
                    self.complete = true;
                    return Some(Err(LineError::Overflow));
                }
                if self.bytes.is_empty() {
                    return None;
                }
                self.complete = true;
                Some(str::from_utf8(&self.bytes).map_err(|_| LineError::InvalidUtf8))
            }
            // Backspace and DEL.
            0x08 | 0x7f => {
                self.bytes.pop();
                None
            }
            _ => {
                if self.bytes.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
        self.overflowed = false;
        self.complete = false;
    }
}
