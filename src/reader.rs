use std::borrow::Cow;
use std::ops::ControlFlow;
use std::sync::Arc;

use csv_codec_core::{
    detect_delimiter_except, detect_terminator, Position, Scanner,
    ScannerBuilder, Terminator,
};

use crate::cast::Cast;
use crate::error::Result;
use crate::record::Record;
use crate::schema::{Header, Schema};

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, line terminator,
/// header handling and casting. Once a `Reader` is built, its configuration
/// cannot be changed. A builder can be reused to parse any number of texts.
///
/// # Example
///
/// ```
/// use csv_codec::{ReaderBuilder, Value};
///
/// let mut builder = ReaderBuilder::new();
/// builder.header(true).cast(true);
///
/// let mut rdr = builder.from_text("name,age\r\nWill,32").unwrap();
/// let rec = rdr.records().next().unwrap().unwrap();
/// assert_eq!(rec["name"], Value::from("Will"));
/// assert_eq!(rec["age"], Value::from(32));
/// ```
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    delimiter: Option<u8>,
    term: Option<Terminator>,
    quote: u8,
    header: Header,
    cast: Cast,
    skip: usize,
    limit: Option<usize>,
    replace: bool,
    trim: bool,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            delimiter: None,
            term: None,
            quote: b'"',
            header: Header::None,
            cast: Cast::None,
            skip: 0,
            limit: None,
            replace: false,
            trim: false,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV reader from this configuration that reads `text`.
    ///
    /// An unset delimiter or terminator is detected from `text`. This fails
    /// when the delimiter, quote and terminator cannot be used together.
    pub fn from_text<'a>(&self, text: &'a str) -> Result<Reader<'a>> {
        let text = if text.trim().is_empty() { "" } else { text };
        let term = match self.term {
            Some(term) => term,
            None => {
                let term = detect_terminator(text);
                tracing::debug!(
                    terminator = ?term,
                    "detected line terminator"
                );
                term
            }
        };
        let delimiter = match self.delimiter {
            Some(delimiter) => delimiter,
            None => {
                // Bytes that already mean something can't be the delimiter.
                let mut reserved = vec![self.quote];
                reserved.extend_from_slice(term.as_bytes());
                let delimiter = detect_delimiter_except(text, &reserved);
                tracing::debug!(
                    delimiter = ?(delimiter as char),
                    "detected cell delimiter"
                );
                delimiter
            }
        };
        let scanner = ScannerBuilder::new()
            .delimiter(delimiter)
            .terminator(term)
            .quote(self.quote)
            .build(text)?;
        Ok(Reader {
            scanner,
            row: vec![],
            header: self.header.clone(),
            cast: self.cast.clone(),
            skip: self.skip,
            limit: self.limit,
            replace: self.replace,
            trim: self.trim,
            started: false,
            fields: None,
            schema: None,
            count: 0,
        })
    }

    /// The cell delimiter to use when parsing CSV.
    ///
    /// When this is not set, the delimiter is detected from the text: the
    /// most frequent of `,`, `;`, `\t`, `|` and `^` at the start of the text
    /// wins, falling back to `,`. The quote is never detected as the
    /// delimiter.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.delimiter = Some(delimiter);
        self
    }

    /// The line terminator to use when parsing CSV.
    ///
    /// When this is not set, the terminator is detected from the text, out of
    /// `\r\n`, `\r` and `\n`, falling back to `\r\n`.
    pub fn terminator(&mut self, term: Terminator) -> &mut ReaderBuilder {
        self.term = Some(term);
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.quote = quote;
        self
    }

    /// Where field names come from.
    ///
    /// Accepts a `Header`, a `bool` (`true` for `Header::FirstRow`) or a list
    /// of names. When there are field names, every record is keyed.
    ///
    /// The default is `Header::None`.
    pub fn header<H: Into<Header>>(
        &mut self,
        header: H,
    ) -> &mut ReaderBuilder {
        self.header = header.into();
        self
    }

    /// How cells are typed.
    ///
    /// Accepts a `Cast`, a `bool` (`true` for `Cast::Sniff`) or a list of
    /// `ColumnCast`s.
    ///
    /// The default is `Cast::None`, which keeps every cell as text.
    pub fn cast<C: Into<Cast>>(&mut self, cast: C) -> &mut ReaderBuilder {
        self.cast = cast.into();
        self
    }

    /// The number of rows to discard from the start of the text, before
    /// any header row.
    pub fn skip(&mut self, skip: usize) -> &mut ReaderBuilder {
        self.skip = skip;
        self
    }

    /// The maximum number of records to read.
    pub fn limit(&mut self, limit: Option<usize>) -> &mut ReaderBuilder {
        self.limit = limit;
        self
    }

    /// Whether the first row is a header to be replaced by the names given
    /// with `Header::Fields`.
    ///
    /// When enabled, the first row is dropped. It has no effect for other
    /// header modes.
    pub fn replace(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.replace = yes;
        self
    }

    /// Whether to trim whitespace around every cell, including cells that
    /// are not cast and the names read from a header row.
    ///
    /// Cast cells are always trimmed before they are converted.
    pub fn trim(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.trim = yes;
        self
    }
}

/// A CSV reader over an in-memory text.
///
/// The reader scans rows on demand and shapes them into `Record`s. Its
/// casting schema is built once, from the first data row.
///
/// Create one with `ReaderBuilder::from_text`, or use `Reader::from_text` for
/// the default configuration.
#[derive(Clone)]
pub struct Reader<'a> {
    scanner: Scanner<'a>,
    row: Vec<Cow<'a, str>>,
    header: Header,
    cast: Cast,
    skip: usize,
    limit: Option<usize>,
    replace: bool,
    trim: bool,
    /// Whether skipped and header rows were consumed.
    started: bool,
    fields: Option<Arc<[String]>>,
    schema: Option<Schema>,
    /// The number of records read so far.
    count: usize,
}

impl<'a> Reader<'a> {
    /// Create a new CSV reader over `text` with a default configuration.
    ///
    /// The delimiter and terminator are detected. There is no header and
    /// no casting.
    pub fn from_text(text: &'a str) -> Result<Reader<'a>> {
        ReaderBuilder::new().from_text(text)
    }

    /// Returns the field names of the records, if any.
    ///
    /// With `Header::FirstRow`, this reads the header row if it hasn't been
    /// read yet. It returns `None` when there are no field names, including
    /// when the text ended before the header row.
    pub fn headers(&mut self) -> Option<&[String]> {
        self.start();
        self.fields.as_deref()
    }

    /// Read a single record into `record`.
    ///
    /// This returns `false` when there are no more records, either because
    /// the text is exhausted or because the configured limit was reached.
    ///
    /// This returns an error when a cell of an explicitly typed column
    /// cannot be cast. The row is consumed regardless, so reading can carry
    /// on with the next row.
    pub fn read_record(&mut self, record: &mut Record) -> Result<bool> {
        self.start();
        if self.limit.map_or(false, |limit| self.count >= limit) {
            record.clear();
            return Ok(false);
        }
        if !self.scanner.read_row(&mut self.row) {
            record.clear();
            return Ok(false);
        }
        self.count += 1;
        let (fields, row, cast, trim) =
            (&self.fields, &self.row, &self.cast, self.trim);
        let schema = self
            .schema
            .get_or_insert_with(|| Schema::new(fields.clone(), row, cast, trim));
        schema.build(&mut self.row, self.scanner.position(), record)?;
        Ok(true)
    }

    /// Returns a borrowed iterator over all records.
    ///
    /// Each item yielded is a `Result<Record, Error>`.
    pub fn records(&mut self) -> RecordsIter<'_, 'a> {
        RecordsIter { rdr: self }
    }

    /// The position of the row most recently read.
    pub fn position(&self) -> &Position {
        self.scanner.position()
    }

    /// The cell delimiter in use, whether configured or detected.
    pub fn delimiter(&self) -> u8 {
        self.scanner.delimiter()
    }

    /// The line terminator in use, whether configured or detected.
    pub fn terminator(&self) -> Terminator {
        self.scanner.terminator()
    }

    /// Returns true when the whole text has been scanned.
    pub fn is_done(&self) -> bool {
        self.scanner.is_done()
    }

    /// Consume the rows that precede the data: skipped rows, then the header
    /// row if there is one.
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        for _ in 0..self.skip {
            if !self.scanner.read_row(&mut self.row) {
                return;
            }
        }
        match self.header {
            Header::None => {}
            Header::FirstRow => {
                if self.scanner.read_row(&mut self.row) {
                    let trim = self.trim;
                    let fields: Vec<String> = self
                        .row
                        .drain(..)
                        .map(|name| {
                            if trim {
                                name.trim().to_string()
                            } else {
                                name.into_owned()
                            }
                        })
                        .collect();
                    self.fields = Some(fields.into());
                }
            }
            Header::Fields(ref names) => {
                self.fields = Some(names.clone().into());
                if self.replace {
                    self.scanner.read_row(&mut self.row);
                }
            }
        }
    }
}

/// A borrowed iterator over the records of a CSV reader.
///
/// The `'r` lifetime refers to the lifetime of the `Reader` that is being
/// borrowed, and `'a` to the text it reads.
pub struct RecordsIter<'r, 'a> {
    rdr: &'r mut Reader<'a>,
}

impl<'r, 'a> RecordsIter<'r, 'a> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<'a> {
        self.rdr
    }
}

impl<'r, 'a> Iterator for RecordsIter<'r, 'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        let mut rec = Record::new();
        match self.rdr.read_record(&mut rec) {
            Err(err) => Some(Err(err)),
            Ok(true) => Some(Ok(rec)),
            Ok(false) => None,
        }
    }
}

/// Parse `text` into records.
///
/// ```
/// use csv_codec::{parse, ReaderBuilder, Value};
///
/// let recs = parse("a;b\n1;\"x;y\"\n", &ReaderBuilder::new()).unwrap();
/// assert_eq!(recs.len(), 2);
/// assert_eq!(recs[1].values(), &[Value::from("1"), Value::from("x;y")][..]);
/// ```
pub fn parse(text: &str, builder: &ReaderBuilder) -> Result<Vec<Record>> {
    builder.from_text(text)?.records().collect()
}

/// Parse `text`, handing every record to `sink` as soon as it is read.
///
/// Parsing stops early when the sink returns `ControlFlow::Break`. This
/// returns `true` if every record was handed over and `false` if the sink
/// stopped the parse.
pub fn parse_with<F>(
    text: &str,
    builder: &ReaderBuilder,
    mut sink: F,
) -> Result<bool>
where
    F: FnMut(Record) -> ControlFlow<()>,
{
    let mut rdr = builder.from_text(text)?;
    loop {
        let mut rec = Record::new();
        if !rdr.read_record(&mut rec)? {
            return Ok(true);
        }
        if sink(rec).is_break() {
            tracing::trace!(position = %rdr.position(), "sink stopped parsing");
            return Ok(false);
        }
    }
}
