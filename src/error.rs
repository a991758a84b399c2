use std::io;
use std::result;

use csv_codec_core::{ConfigError, Position};
use thiserror::Error;

/// A type alias for `Result<T, csv_codec::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when parsing or encoding CSV data.
///
/// Note that malformed CSV text is never an error. The scanner always finds
/// *a* parse: an unclosed quote runs to the end of the input and rows of
/// varying length are passed through as they are.
#[derive(Debug, Error)]
pub enum Error {
    /// The delimiter, quote and terminator cannot be used together.
    ///
    /// This is reported when a reader or writer is built, before any data
    /// is looked at.
    #[error("CSV config error: {0}")]
    Config(#[from] ConfigError),
    /// A cell in a column that was explicitly typed as a number or a boolean
    /// could not be read as one.
    #[error(
        "CSV cast error: {pos}, field {field}: \
         cannot read {value:?} as a {expected}"
    )]
    Cast {
        /// The position of the row containing the cell.
        pos: Position,
        /// The index of the cell in its row.
        field: usize,
        /// The cell as it appeared in the input.
        value: String,
        /// The type the column asked for.
        expected: &'static str,
    },
    /// A cell needed quotes but the writer was configured to never quote.
    #[error(
        "CSV write error: field {field} requires quotes, \
         but the quote style is `Never`"
    )]
    Quote {
        /// The index of the cell in its row.
        field: usize,
    },
    /// An I/O error that occurred while writing CSV data.
    #[error("CSV I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// The position of the row this error refers to, if any.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Cast { ref pos, .. } => Some(pos),
            _ => None,
        }
    }
}
