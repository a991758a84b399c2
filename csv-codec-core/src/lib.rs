/*!
`csv-codec-core` provides the low level pieces of the `csv-codec` crate: a
finite state scanner that splits CSV text into rows of cells, and a dialect
detector that guesses the cell delimiter and line terminator of a sample.

The scanner works on a complete in-memory `&str`. Cells are returned as
`Cow<str>` slices borrowed from the input; a cell is only copied when it was
quoted *and* contained doubled quotes (or stray text after its closing
quote) that have to be collapsed.

# Example

```
use csv_codec_core::ScannerBuilder;

let mut scanner = ScannerBuilder::new()
    .build("a,\"b,c\"\r\nx,\"say \"\"hi\"\"\"")
    .unwrap();

let mut row = vec![];
assert!(scanner.read_row(&mut row));
assert_eq!(row, vec!["a", "b,c"]);
assert!(scanner.read_row(&mut row));
assert_eq!(row, vec!["x", "say \"hi\""]);
assert!(!scanner.read_row(&mut row));
```
*/

#![deny(missing_docs)]

use std::error;
use std::fmt;

pub use crate::detect::{
    detect, detect_delimiter, detect_delimiter_except, detect_terminator,
    frequency, scan_limit, CELL_DELIMITERS, LINE_TERMINATORS,
};
pub use crate::scanner::{Scanner, ScannerBuilder};

mod detect;
mod scanner;

/// A record terminator.
///
/// Use this to specify the line terminator while scanning or writing CSV.
/// The default is `CRLF`, which is the two byte sequence `\r\n`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Terminator {
    /// The two byte sequence `\r\n`.
    ///
    /// A lone `\r` or `\n` is ordinary cell content under this terminator.
    CRLF,
    /// The byte given, usually `\r` or `\n`.
    Any(u8),
}

impl Terminator {
    /// Returns true if this is the `\r\n` terminator.
    pub fn is_crlf(&self) -> bool {
        match *self {
            Terminator::CRLF => true,
            Terminator::Any(_) => false,
        }
    }

    /// The bytes of this terminator.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Terminator::CRLF => b"\r\n",
            Terminator::Any(ref b) => std::slice::from_ref(b),
        }
    }

    /// The first byte of this terminator.
    #[inline]
    pub fn first(&self) -> u8 {
        match *self {
            Terminator::CRLF => b'\r',
            Terminator::Any(b) => b,
        }
    }

    /// The number of bytes in this terminator.
    #[inline]
    pub fn len(&self) -> usize {
        match *self {
            Terminator::CRLF => 2,
            Terminator::Any(_) => 1,
        }
    }

    /// Returns true if `b` is any byte of this terminator.
    #[inline]
    pub fn contains(&self, b: u8) -> bool {
        match *self {
            Terminator::CRLF => b == b'\r' || b == b'\n',
            Terminator::Any(t) => b == t,
        }
    }

    /// The terminator as a string slice.
    ///
    /// Terminators are always ASCII once validated, so this never fails for
    /// a terminator accepted by a builder. Non-ASCII bytes yield `""`.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::CRLF
    }
}

/// The position of a row in the scanned text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Position {
    byte: u64,
    line: u64,
    record: u64,
}

impl Position {
    /// Returns a new position initialized to the start of a text.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, record: 0 }
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`, of this position.
    ///
    /// Lines are counted by occurrences of `\n`, or of the terminator byte
    /// when a single byte terminator other than `\n` is used.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record index, starting at `0`, of this position.
    ///
    /// Blank lines are not records.
    pub fn record(&self) -> u64 {
        self.record
    }

    /// Set the byte offset of this position.
    pub fn set_byte(&mut self, byte: u64) -> &mut Position {
        self.byte = byte;
        self
    }

    /// Set the line number of this position.
    pub fn set_line(&mut self, line: u64) -> &mut Position {
        assert!(line > 0);
        self.line = line;
        self
    }

    /// Set the record index of this position.
    pub fn set_record(&mut self, record: u64) -> &mut Position {
        self.record = record;
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "record {} (line {}, byte {})",
            self.record, self.line, self.byte
        )
    }
}

/// An error describing a delimiter, quote and terminator combination that
/// cannot be scanned unambiguously.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The named byte is not ASCII.
    ///
    /// Cells are sliced directly out of UTF-8 text at delimiter, quote and
    /// terminator positions, so these must be single byte characters.
    NonAscii {
        /// Which setting held the byte (`"delimiter"`, `"quote"` or
        /// `"terminator"`).
        name: &'static str,
        /// The offending byte.
        byte: u8,
    },
    /// Two settings use the same byte.
    Overlap {
        /// The first setting.
        first: &'static str,
        /// The second setting.
        second: &'static str,
        /// The shared byte.
        byte: u8,
    },
}

impl ConfigError {
    /// Check that a delimiter, quote and terminator can be used together.
    pub fn check(
        delimiter: u8,
        quote: u8,
        term: Terminator,
    ) -> Result<(), ConfigError> {
        if !delimiter.is_ascii() {
            return Err(ConfigError::NonAscii {
                name: "delimiter",
                byte: delimiter,
            });
        }
        if !quote.is_ascii() {
            return Err(ConfigError::NonAscii { name: "quote", byte: quote });
        }
        if let Terminator::Any(b) = term {
            if !b.is_ascii() {
                return Err(ConfigError::NonAscii {
                    name: "terminator",
                    byte: b,
                });
            }
        }
        if delimiter == quote {
            return Err(ConfigError::Overlap {
                first: "delimiter",
                second: "quote",
                byte: delimiter,
            });
        }
        if term.contains(delimiter) {
            return Err(ConfigError::Overlap {
                first: "delimiter",
                second: "terminator",
                byte: delimiter,
            });
        }
        if term.contains(quote) {
            return Err(ConfigError::Overlap {
                first: "quote",
                second: "terminator",
                byte: quote,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::NonAscii { name, byte } => write!(
                f,
                "{} must be a single ASCII character, got byte 0x{:02X}",
                name, byte
            ),
            ConfigError::Overlap { first, second, byte } => write!(
                f,
                "{} and {} must differ, both use {:?}",
                first, second, byte as char
            ),
        }
    }
}

impl error::Error for ConfigError {}
