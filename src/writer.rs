use std::io;
use std::ops::ControlFlow;

use csv_codec_core::{ConfigError, Terminator};
use indexmap::IndexMap;

use crate::cast::{quote_into, CellFormat, FieldFormat, QuoteStyle};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::Header;
use crate::value::Value;

/// The value of a key missing from a record.
static NULL: Value = Value::Null;

/// Builds a CSV writer with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, line terminator,
/// quoting and header. Once a `Writer` is built, its configuration cannot be
/// changed. The same builder configures the `encode_*` functions.
///
/// # Example
///
/// ```
/// use csv_codec::{QuoteStyle, Value, WriterBuilder};
///
/// let mut builder = WriterBuilder::new();
/// builder.delimiter(b';').quote_style(QuoteStyle::Necessary);
///
/// let mut wtr = builder.from_writer(vec![]).unwrap();
/// wtr.write_row(&[Value::from("a;b"), Value::from(1)]).unwrap();
/// wtr.write_row(&[Value::from("c"), Value::Null]).unwrap();
///
/// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "\"a;b\";1\r\nc;");
/// ```
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    delimiter: u8,
    term: Terminator,
    quote: u8,
    style: QuoteStyle,
    header: Header,
    formats: Vec<FieldFormat>,
    skip: usize,
    limit: Option<usize>,
    trailing: bool,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            delimiter: b',',
            term: Terminator::CRLF,
            quote: b'"',
            style: QuoteStyle::default(),
            header: Header::None,
            formats: vec![],
            skip: 0,
            limit: None,
            trailing: false,
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    ///
    /// This fails when the delimiter, quote and terminator cannot be used
    /// together.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        Ok(Writer {
            enc: Encoder::new(self)?,
            sink: IoSink { wtr, term: self.term, pending: false },
            trailing: self.trailing,
        })
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// The line terminator to use when writing CSV.
    ///
    /// The default is `Terminator::CRLF`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.term = term;
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.quote = quote;
        self
    }

    /// The quoting style to use when writing CSV.
    ///
    /// The default is `QuoteStyle::NonNumeric`.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.style = style;
        self
    }

    /// The header line to write.
    ///
    /// `Header::FirstRow` (or `true`) writes the keys of the first keyed
    /// record. It writes nothing for plain rows. `Header::Fields` is always
    /// written, and also picks the keys of keyed records and their order.
    ///
    /// The default is `Header::None`.
    pub fn header<H: Into<Header>>(
        &mut self,
        header: H,
    ) -> &mut WriterBuilder {
        self.header = header.into();
        self
    }

    /// The format of each column, by position.
    ///
    /// Columns without a format use `FieldFormat::Auto`.
    pub fn formats<I>(&mut self, formats: I) -> &mut WriterBuilder
    where
        I: IntoIterator<Item = FieldFormat>,
    {
        self.formats = formats.into_iter().collect();
        self
    }

    /// The number of input rows to drop before writing.
    pub fn skip(&mut self, skip: usize) -> &mut WriterBuilder {
        self.skip = skip;
        self
    }

    /// The maximum number of rows to write, not counting the header.
    pub fn limit(&mut self, limit: Option<usize>) -> &mut WriterBuilder {
        self.limit = limit;
        self
    }

    /// Whether to end the last line with a terminator.
    ///
    /// When disabled, lines are separated by the terminator but the output
    /// does not end with one. The default is `false`.
    pub fn trailing_terminator(&mut self, yes: bool) -> &mut WriterBuilder {
        self.trailing = yes;
        self
    }
}

/// A record that can be written by key.
///
/// This is implemented for `IndexMap<String, Value>` and for `Record`s.
pub trait Keyed {
    /// The keys of this record, in column order.
    fn keys(&self) -> Vec<&str>;

    /// The value stored under `key`.
    fn value(&self, key: &str) -> Option<&Value>;

    /// The values of a record that has no keys, in column order.
    ///
    /// Records returning `Some` are written positionally, like rows.
    fn positional(&self) -> Option<&[Value]> {
        None
    }
}

impl Keyed for IndexMap<String, Value> {
    fn keys(&self) -> Vec<&str> {
        IndexMap::keys(self).map(|k| k.as_str()).collect()
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// A record without field names has no keys and is written positionally.
impl Keyed for Record {
    fn keys(&self) -> Vec<&str> {
        match self.fields() {
            None => vec![],
            Some(fields) => fields.iter().map(|f| f.as_str()).collect(),
        }
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.get_by_name(key)
    }

    fn positional(&self) -> Option<&[Value]> {
        if self.is_keyed() {
            None
        } else {
            Some(self.values())
        }
    }
}

impl<'a, K: Keyed + ?Sized> Keyed for &'a K {
    fn keys(&self) -> Vec<&str> {
        (**self).keys()
    }

    fn value(&self, key: &str) -> Option<&Value> {
        (**self).value(key)
    }

    fn positional(&self) -> Option<&[Value]> {
        (**self).positional()
    }
}

/// Receives encoded lines, without terminators.
trait Sink {
    fn line(&mut self, line: &str) -> Result<ControlFlow<()>>;
}

/// Writes lines to an `io::Write`, separated by the terminator.
#[derive(Debug)]
struct IoSink<W> {
    wtr: W,
    term: Terminator,
    /// Whether the last line written still lacks its terminator.
    pending: bool,
}

impl<W: io::Write> Sink for IoSink<W> {
    fn line(&mut self, line: &str) -> Result<ControlFlow<()>> {
        if self.pending {
            self.wtr.write_all(self.term.as_bytes())?;
        }
        self.wtr.write_all(line.as_bytes())?;
        self.pending = true;
        Ok(ControlFlow::Continue(()))
    }
}

/// Joins lines into a string, separated by the terminator.
struct TextSink {
    text: String,
    term: Terminator,
    pending: bool,
}

impl TextSink {
    fn new(term: Terminator) -> TextSink {
        TextSink { text: String::new(), term, pending: false }
    }

    fn finish(mut self, trailing: bool) -> String {
        if trailing && self.pending {
            self.text.push_str(self.term.as_str());
        }
        self.text
    }
}

impl Sink for TextSink {
    fn line(&mut self, line: &str) -> Result<ControlFlow<()>> {
        if self.pending {
            self.text.push_str(self.term.as_str());
        }
        self.text.push_str(line);
        self.pending = true;
        Ok(ControlFlow::Continue(()))
    }
}

/// Hands lines to a caller supplied function.
struct FnSink<F>(F);

impl<F: FnMut(&str) -> ControlFlow<()>> Sink for FnSink<F> {
    fn line(&mut self, line: &str) -> Result<ControlFlow<()>> {
        Ok((self.0)(line))
    }
}

/// Formats rows into lines and keeps track of headers, skips and limits.
#[derive(Debug)]
struct Encoder {
    cell: CellFormat,
    header: Header,
    formats: Vec<FieldFormat>,
    /// The number of input rows still to be dropped.
    skip: usize,
    limit: Option<usize>,
    /// The number of rows written, not counting the header.
    written: usize,
    /// Whether the header was dealt with.
    started: bool,
    /// The keys of keyed records, fixed by the first one.
    keys: Option<Vec<String>>,
    line: String,
}

impl Encoder {
    fn new(builder: &WriterBuilder) -> Result<Encoder> {
        ConfigError::check(builder.delimiter, builder.quote, builder.term)?;
        Ok(Encoder::unchecked(builder))
    }

    fn unchecked(builder: &WriterBuilder) -> Encoder {
        Encoder {
            cell: CellFormat {
                delimiter: builder.delimiter,
                quote: builder.quote,
                term: builder.term,
                style: builder.style,
            },
            header: builder.header.clone(),
            formats: builder.formats.clone(),
            skip: builder.skip,
            limit: builder.limit,
            written: 0,
            started: false,
            keys: None,
            line: String::new(),
        }
    }

    /// Returns true once the row limit has been reached.
    fn is_full(&self) -> bool {
        self.limit.map_or(false, |limit| self.written >= limit)
    }

    /// Returns true if the next input row should be written.
    fn admit(&mut self) -> bool {
        if self.skip > 0 {
            self.skip -= 1;
            return false;
        }
        !self.is_full()
    }

    fn row<S: Sink>(
        &mut self,
        row: &[Value],
        sink: &mut S,
    ) -> Result<ControlFlow<()>> {
        if !self.admit() {
            return Ok(ControlFlow::Continue(()));
        }
        self.values(row, sink)
    }

    /// Write one admitted row, preceded by the header line when the header
    /// names are given.
    fn values<S: Sink>(
        &mut self,
        row: &[Value],
        sink: &mut S,
    ) -> Result<ControlFlow<()>> {
        if !self.started {
            self.started = true;
            if let Header::Fields(ref names) = self.header {
                header_line(&self.cell, names, &mut self.line)?;
                if sink.line(&self.line)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        format_line(&self.cell, &self.formats, row.iter(), &mut self.line)?;
        self.written += 1;
        sink.line(&self.line)
    }

    fn record<K: Keyed + ?Sized, S: Sink>(
        &mut self,
        record: &K,
        sink: &mut S,
    ) -> Result<ControlFlow<()>> {
        if !self.admit() {
            return Ok(ControlFlow::Continue(()));
        }
        if let Some(values) = record.positional() {
            return self.values(values, sink);
        }
        if self.keys.is_none() {
            let keys: Vec<String> = match self.header {
                Header::Fields(ref names) => names.clone(),
                _ => record.keys().into_iter().map(String::from).collect(),
            };
            tracing::debug!(keys = ?keys, "fixed record keys");
            self.keys = Some(keys);
        }
        let keys = match self.keys {
            Some(ref keys) => keys,
            None => return Ok(ControlFlow::Continue(())),
        };
        if !self.started {
            self.started = true;
            if self.header != Header::None {
                header_line(&self.cell, keys, &mut self.line)?;
                if sink.line(&self.line)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        let values = keys.iter().map(|k| record.value(k).unwrap_or(&NULL));
        format_line(&self.cell, &self.formats, values, &mut self.line)?;
        self.written += 1;
        sink.line(&self.line)
    }
}

/// Format field names as a line. Names are written as text.
fn header_line(
    cell: &CellFormat,
    names: &[String],
    line: &mut String,
) -> Result<()> {
    line.clear();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            line.push(cell.delimiter as char);
        }
        if !cell.write(&Value::from(name.as_str()), line) {
            return Err(Error::Quote { field: i });
        }
    }
    Ok(())
}

fn format_line<'v, I>(
    cell: &CellFormat,
    formats: &[FieldFormat],
    values: I,
    line: &mut String,
) -> Result<()>
where
    I: Iterator<Item = &'v Value>,
{
    line.clear();
    let mut count = 0;
    for (i, value) in values.enumerate() {
        count += 1;
        if i > 0 {
            line.push(cell.delimiter as char);
        }
        match formats.get(i) {
            None | Some(FieldFormat::Auto) => {
                if !cell.write(value, line) {
                    return Err(Error::Quote { field: i });
                }
            }
            Some(FieldFormat::Text) => {
                quote_into(&value.to_string(), cell.quote, line);
            }
            Some(FieldFormat::Custom(f)) => line.push_str(&f(value)),
        }
    }
    // A lone empty cell would read back as a blank line.
    if count == 1 && line.is_empty() {
        if cell.style == QuoteStyle::Never {
            return Err(Error::Quote { field: 0 });
        }
        quote_into("", cell.quote, line);
    }
    Ok(())
}

/// A CSV writer.
///
/// A writer formats rows of values as lines and writes them to an
/// `io::Write`, separating lines with the terminator.
///
/// Call `finish` (or `into_inner`) once all rows are written so that a
/// trailing terminator, if configured, is written and the underlying writer
/// is flushed.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    enc: Encoder,
    sink: IoSink<W>,
    trailing: bool,
}

impl<W: io::Write> Writer<W> {
    /// Create a new CSV writer that writes to `wtr` with a default
    /// configuration.
    pub fn from_writer(wtr: W) -> Writer<W> {
        // The default configuration is always valid.
        let builder = WriterBuilder::new();
        Writer {
            enc: Encoder::unchecked(&builder),
            sink: IoSink { wtr, term: builder.term, pending: false },
            trailing: builder.trailing,
        }
    }

    /// Write a single row.
    ///
    /// Rows past the configured limit are silently dropped.
    ///
    /// This returns an error if a cell requires quotes under
    /// `QuoteStyle::Never`, or if writing to the underlying writer fails.
    pub fn write_row(&mut self, row: &[Value]) -> Result<()> {
        self.enc.row(row, &mut self.sink).map(|_| ())
    }

    /// Write a single keyed record.
    ///
    /// The columns are the keys of the first record written, or the
    /// configured field names. Missing keys are written as `Null`.
    pub fn write_record<K: Keyed + ?Sized>(
        &mut self,
        record: &K,
    ) -> Result<()> {
        self.enc.record(record, &mut self.sink).map(|_| ())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.wtr.flush()?;
        Ok(())
    }

    /// Write the trailing terminator, if configured, and flush.
    pub fn finish(&mut self) -> Result<()> {
        if self.trailing && self.sink.pending {
            self.sink.wtr.write_all(self.sink.term.as_bytes())?;
            self.sink.pending = false;
        }
        self.flush()
    }

    /// Finish writing and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.sink.wtr)
    }

    /// Return a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.sink.wtr
    }
}

/// Encode rows of values as CSV text.
///
/// ```
/// use csv_codec::{encode_rows, Value, WriterBuilder};
///
/// let rows = vec![
///     vec![Value::from("Will"), Value::from(32)],
///     vec![Value::from("3,4"), Value::Null],
/// ];
/// let text = encode_rows(&rows, &WriterBuilder::new()).unwrap();
/// assert_eq!(text, "\"Will\",32\r\n\"3,4\",");
/// ```
pub fn encode_rows<I, R>(rows: I, builder: &WriterBuilder) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Value]>,
{
    let mut enc = Encoder::new(builder)?;
    let mut sink = TextSink::new(builder.term);
    for row in rows {
        if enc.is_full() {
            break;
        }
        if enc.row(row.as_ref(), &mut sink)?.is_break() {
            break;
        }
    }
    Ok(sink.finish(builder.trailing))
}

/// Encode keyed records as CSV text.
///
/// The columns are the keys of the first record, in order, unless the
/// builder's header names them. A header line is written for
/// `Header::FirstRow` and `Header::Fields`. Records without keys are
/// written positionally, as `encode_rows` would.
pub fn encode_records<I, K>(
    records: I,
    builder: &WriterBuilder,
) -> Result<String>
where
    I: IntoIterator<Item = K>,
    K: Keyed,
{
    let mut enc = Encoder::new(builder)?;
    let mut sink = TextSink::new(builder.term);
    for record in records {
        if enc.is_full() {
            break;
        }
        if enc.record(&record, &mut sink)?.is_break() {
            break;
        }
    }
    Ok(sink.finish(builder.trailing))
}

/// Encode rows of values, handing every line to `sink` as soon as it is
/// formatted.
///
/// Lines are handed over without their terminator, the header line first.
/// Encoding stops early when the sink returns `ControlFlow::Break`. This
/// returns `true` if every line was handed over and `false` if the sink
/// stopped the encode.
pub fn encode_rows_with<I, R, F>(
    rows: I,
    builder: &WriterBuilder,
    sink: F,
) -> Result<bool>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Value]>,
    F: FnMut(&str) -> ControlFlow<()>,
{
    let mut enc = Encoder::new(builder)?;
    let mut sink = FnSink(sink);
    for row in rows {
        if enc.is_full() {
            break;
        }
        if enc.row(row.as_ref(), &mut sink)?.is_break() {
            tracing::trace!(rows = enc.written, "sink stopped encoding");
            return Ok(false);
        }
    }
    Ok(true)
}

/// Encode keyed records, handing every line to `sink` as soon as it is
/// formatted.
///
/// This behaves like `encode_rows_with`, with the columns of
/// `encode_records`.
pub fn encode_records_with<I, K, F>(
    records: I,
    builder: &WriterBuilder,
    sink: F,
) -> Result<bool>
where
    I: IntoIterator<Item = K>,
    K: Keyed,
    F: FnMut(&str) -> ControlFlow<()>,
{
    let mut enc = Encoder::new(builder)?;
    let mut sink = FnSink(sink);
    for record in records {
        if enc.is_full() {
            break;
        }
        if enc.record(&record, &mut sink)?.is_break() {
            tracing::trace!(rows = enc.written, "sink stopped encoding");
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::ops::ControlFlow;

    use csv_codec_core::Terminator;
    use indexmap::IndexMap;

    use crate::cast::{FieldFormat, QuoteStyle};
    use crate::error::Error;
    use crate::record::Record;
    use crate::schema::Header;
    use crate::value::Value;

    use super::{
        encode_records, encode_records_with, encode_rows, encode_rows_with,
        Writer, WriterBuilder,
    };

    fn map(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn rows_default_style() {
        let rows = vec![
            vec![Value::from("Will"), Value::from(32), Value::from(true)],
            vec![Value::from("\"3,4\""), Value::Null, Value::from("12")],
        ];
        let got = encode_rows(&rows, &WriterBuilder::new()).unwrap();
        assert_eq!(
            got,
            "\"Will\",32,\"true\"\r\n\"\"\"3,4\"\"\",,12"
        );
    }

    #[test]
    fn trailing_terminator() {
        let rows = vec![vec![Value::from(1)], vec![Value::from(2)]];
        let mut builder = WriterBuilder::new();
        builder.terminator(Terminator::Any(b'\n'));
        assert_eq!(encode_rows(&rows, &builder).unwrap(), "1\n2");

        builder.trailing_terminator(true);
        assert_eq!(encode_rows(&rows, &builder).unwrap(), "1\n2\n");

        let none: Vec<Vec<Value>> = vec![];
        assert_eq!(encode_rows(&none, &builder).unwrap(), "");
    }

    #[test]
    fn lone_empty_cell() {
        let rows = vec![vec![Value::from("")], vec![Value::Null]];
        let got = encode_rows(&rows, &WriterBuilder::new()).unwrap();
        assert_eq!(got, "\"\"\r\n\"\"");

        let mut builder = WriterBuilder::new();
        builder.quote_style(QuoteStyle::Never);
        match encode_rows(&rows, &builder) {
            Err(Error::Quote { field: 0 }) => {}
            got => panic!("unexpected result: {:?}", got),
        }
    }

    #[test]
    fn never_style_rejects() {
        let mut builder = WriterBuilder::new();
        builder.quote_style(QuoteStyle::Never);
        let rows = vec![vec![Value::from("a"), Value::from("b\nc")]];
        match encode_rows(&rows, &builder) {
            Err(Error::Quote { field: 1 }) => {}
            got => panic!("unexpected result: {:?}", got),
        }
    }

    #[test]
    fn header_with_rows() {
        let rows = vec![vec![Value::from(1), Value::from(2)]];
        let mut builder = WriterBuilder::new();
        builder.header(true);
        assert_eq!(encode_rows(&rows, &builder).unwrap(), "1,2");

        builder.header(vec!["a", "b"]);
        assert_eq!(
            encode_rows(&rows, &builder).unwrap(),
            "\"a\",\"b\"\r\n1,2"
        );
    }

    #[test]
    fn keyed_records() {
        let recs = vec![
            map(&[("name", Value::from("Will")), ("age", Value::from(32))]),
            map(&[("age", Value::from(7)), ("name", Value::from("Ann"))]),
            map(&[("name", Value::from("Bo"))]),
        ];
        let mut builder = WriterBuilder::new();
        builder.header(true).quote_style(QuoteStyle::Necessary);
        assert_eq!(
            encode_records(&recs, &builder).unwrap(),
            "name,age\r\nWill,32\r\nAnn,7\r\nBo,"
        );

        builder.header(vec!["age"]);
        assert_eq!(
            encode_records(&recs, &builder).unwrap(),
            "age\r\n32\r\n7\r\n\"\""
        );

        builder.header(Header::None);
        assert_eq!(
            encode_records(&recs, &builder).unwrap(),
            "Will,32\r\nAnn,7\r\nBo,"
        );
    }

    #[test]
    fn unkeyed_records_are_positional() {
        let recs = vec![
            Record::from_values(vec![Value::from("a"), Value::from(1)]),
            Record::from_values(vec![Value::from("b"), Value::from(2)]),
        ];
        let mut builder = WriterBuilder::new();
        assert_eq!(
            encode_records(&recs, &builder).unwrap(),
            "\"a\",1\r\n\"b\",2"
        );

        builder.header(true);
        assert_eq!(
            encode_records(&recs, &builder).unwrap(),
            "\"a\",1\r\n\"b\",2"
        );

        builder.header(vec!["x", "y"]);
        assert_eq!(
            encode_records(&recs, &builder).unwrap(),
            "\"x\",\"y\"\r\n\"a\",1\r\n\"b\",2"
        );

        let mut wtr = WriterBuilder::new().from_writer(vec![]).unwrap();
        wtr.write_record(&recs[1]).unwrap();
        assert_eq!(wtr.into_inner().unwrap(), b"\"b\",2".to_vec());
    }

    #[test]
    fn keyed_parsed_records() {
        let rec = Record::with_fields(
            vec!["a".to_string(), "b".to_string()],
            vec![Value::from(1), Value::from("x")],
        );
        let mut builder = WriterBuilder::new();
        builder.header(true);
        assert_eq!(
            encode_records(vec![rec], &builder).unwrap(),
            "\"a\",\"b\"\r\n1,\"x\""
        );
    }

    #[test]
    fn skip_and_limit() {
        let rows: Vec<Vec<Value>> =
            (0..10).map(|i| vec![Value::from(i)]).collect();
        let mut builder = WriterBuilder::new();
        builder.skip(2).limit(Some(3)).terminator(Terminator::Any(b'\n'));
        assert_eq!(encode_rows(&rows, &builder).unwrap(), "2\n3\n4");
    }

    #[test]
    fn field_formats() {
        let rows = vec![vec![Value::from(1), Value::Null, Value::from(2.5)]];
        let mut builder = WriterBuilder::new();
        builder.formats(vec![
            FieldFormat::Text,
            FieldFormat::Text,
            FieldFormat::custom(|v| format!("<{}>", v)),
        ]);
        assert_eq!(
            encode_rows(&rows, &builder).unwrap(),
            "\"1\",\"\",<2.5>"
        );
    }

    #[test]
    fn sinks_stop() {
        let rows: Vec<Vec<Value>> =
            (0..5).map(|i| vec![Value::from(i)]).collect();
        let mut lines = vec![];
        let done = encode_rows_with(&rows, &WriterBuilder::new(), |line| {
            lines.push(line.to_string());
            if lines.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert!(!done);
        assert_eq!(lines, vec!["0", "1"]);

        let recs = vec![map(&[("k", Value::from("v"))])];
        let mut builder = WriterBuilder::new();
        builder.header(true);
        let mut lines = vec![];
        let done = encode_records_with(&recs, &builder, |line| {
            lines.push(line.to_string());
            ControlFlow::Continue(())
        })
        .unwrap();
        assert!(done);
        assert_eq!(lines, vec!["\"k\"", "\"v\""]);
    }

    #[test]
    fn limit_is_not_a_stop() {
        let rows: Vec<Vec<Value>> =
            (0..5).map(|i| vec![Value::from(i)]).collect();
        let mut builder = WriterBuilder::new();
        builder.limit(Some(1));
        let mut count = 0;
        let done = encode_rows_with(&rows, &builder, |_| {
            count += 1;
            ControlFlow::Continue(())
        })
        .unwrap();
        assert!(done);
        assert_eq!(count, 1);
    }

    #[test]
    fn writer_trailing_terminator() {
        let mut builder = WriterBuilder::new();
        builder.trailing_terminator(true).terminator(Terminator::Any(b'\r'));
        let mut wtr = builder.from_writer(vec![]).unwrap();
        wtr.write_row(&[Value::from(1)]).unwrap();
        wtr.write_row(&[Value::from(2)]).unwrap();
        wtr.finish().unwrap();
        wtr.write_row(&[Value::from(3)]).unwrap();
        let data = wtr.into_inner().unwrap();
        assert_eq!(data, b"1\r2\r3\r");
    }

    #[test]
    fn writer_defaults() {
        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_row(&[Value::from("a"), Value::from(1)]).unwrap();
        assert_eq!(wtr.get_ref(), b"\"a\",1");
    }

    #[test]
    fn invalid_config() {
        let mut builder = WriterBuilder::new();
        builder.quote(b';').delimiter(b';');
        match builder.from_writer(vec![]) {
            Err(Error::Config(_)) => {}
            _ => panic!("expected config error"),
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_errors() {
        let mut wtr = WriterBuilder::new().from_writer(Broken).unwrap();
        let err = wtr.write_row(&[Value::from(1)]).unwrap_err();
        assert!(err.is_io_error());
    }
}
