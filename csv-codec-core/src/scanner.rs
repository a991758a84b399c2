use std::borrow::Cow;

use memchr::{memchr, memchr2, memchr_iter};

use crate::{ConfigError, Position, Terminator};

/// Builds a CSV scanner with various configuration knobs.
///
/// This builder can be used to tweak the cell delimiter, line terminator
/// and quote character. Once a `Scanner` is built, its configuration cannot
/// be changed.
#[derive(Clone, Debug)]
pub struct ScannerBuilder {
    delimiter: u8,
    term: Terminator,
    quote: u8,
}

impl Default for ScannerBuilder {
    fn default() -> ScannerBuilder {
        ScannerBuilder {
            delimiter: b',',
            term: Terminator::default(),
            quote: b'"',
        }
    }
}

impl ScannerBuilder {
    /// Create a new builder.
    pub fn new() -> ScannerBuilder {
        ScannerBuilder::default()
    }

    /// Build a scanner over `input` from this configuration.
    ///
    /// This fails when the delimiter, quote and terminator are not distinct
    /// ASCII characters.
    pub fn build<'a>(&self, input: &'a str) -> Result<Scanner<'a>, ConfigError> {
        ConfigError::check(self.delimiter, self.quote, self.term)?;
        Ok(Scanner {
            input,
            pos: 0,
            delimiter: self.delimiter,
            term: self.term,
            quote: self.quote,
            line_byte: if self.term == Terminator::Any(b'\r') {
                b'\r'
            } else {
                b'\n'
            },
            position: Position::new(),
            row_start: Position::new(),
        })
    }

    /// The cell delimiter to use when scanning CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ScannerBuilder {
        self.delimiter = delimiter;
        self
    }

    /// The line terminator to use when scanning CSV.
    ///
    /// The default is `Terminator::CRLF`.
    pub fn terminator(&mut self, term: Terminator) -> &mut ScannerBuilder {
        self.term = term;
        self
    }

    /// The quote character to use when scanning CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ScannerBuilder {
        self.quote = quote;
        self
    }
}

/// The states of the scanner.
///
/// `InQuotedCellAfterQuote` is entered after a quote that was not doubled:
/// the quoted cell has closed, but the next byte decides whether the cell
/// ends here or carries on as plain text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    AtCellStart,
    InPlainCell,
    InQuotedCell,
    InQuotedCellAfterQuote,
    AtLineEnd,
}

/// What stopped a plain cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Boundary {
    Delimiter,
    Terminator,
    End,
}

/// A CSV scanner over an in-memory string.
///
/// The scanner splits text into rows of cells in a single pass. It never
/// fails: malformed input (such as a quote that is never closed) is scanned
/// best-effort.
///
/// * A cell starting with the quote character is a quoted cell. Delimiters
///   and terminators inside it are content, a doubled quote is one literal
///   quote and a single quote closes it. Text after the closing quote, up to
///   the next delimiter or terminator, is kept verbatim.
/// * The end of the input terminates the last cell and row, whether or not a
///   terminator precedes it. An unclosed quoted cell runs to the end of the
///   input.
/// * Blank lines, i.e., lines with no content at all, are not rows.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    delimiter: u8,
    term: Terminator,
    quote: u8,
    /// The byte counted as a line break for positions.
    line_byte: u8,
    /// Where the next row may start.
    position: Position,
    /// Where the last row returned started.
    row_start: Position,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner over `input` with the default configuration.
    pub fn new(input: &'a str) -> Scanner<'a> {
        // The default configuration is always valid.
        match ScannerBuilder::new().build(input) {
            Ok(scanner) => scanner,
            Err(err) => unreachable!("invalid default scanner: {}", err),
        }
    }

    /// The position at which the last row read started.
    ///
    /// Before any row is read, this is the start of the input.
    pub fn position(&self) -> &Position {
        &self.row_start
    }

    /// Returns true when every row has been read.
    pub fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The cell delimiter of this scanner.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// The line terminator of this scanner.
    pub fn terminator(&self) -> Terminator {
        self.term
    }

    /// Read the next row into `row`.
    ///
    /// `row` is cleared first. Its cells borrow from the scanned input
    /// whenever possible. This returns `false` (leaving `row` empty) when
    /// there are no more rows.
    pub fn read_row(&mut self, row: &mut Vec<Cow<'a, str>>) -> bool {
        row.clear();
        self.skip_blank_lines();
        if self.is_done() {
            return false;
        }
        self.row_start = self.position;

        let input = self.input;
        let bytes = input.as_bytes();
        let mut state = State::AtCellStart;
        let mut i = self.pos;
        // Start of the not yet copied content of the current cell.
        let mut start = i;
        // Content already materialized for the current cell.
        let mut prefix: Option<String> = None;
        // A closed quoted cell waiting for its boundary.
        let mut closed: Option<Cow<'a, str>> = None;
        loop {
            match state {
                State::AtCellStart => {
                    if i < bytes.len() && bytes[i] == self.quote {
                        i += 1;
                        state = State::InQuotedCell;
                    } else {
                        state = State::InPlainCell;
                    }
                    start = i;
                }
                State::InPlainCell => {
                    let (end, boundary) = self.find_plain_end(i);
                    row.push(cell(input, &mut prefix, start, end));
                    match boundary {
                        Boundary::Delimiter => {
                            i = end + 1;
                            state = State::AtCellStart;
                        }
                        Boundary::Terminator => {
                            i = end + self.term.len();
                            state = State::AtLineEnd;
                        }
                        Boundary::End => {
                            i = end;
                            state = State::AtLineEnd;
                        }
                    }
                }
                State::InQuotedCell => match memchr(self.quote, &bytes[i..]) {
                    None => {
                        row.push(cell(input, &mut prefix, start, bytes.len()));
                        i = bytes.len();
                        state = State::AtLineEnd;
                    }
                    Some(off) => {
                        let q = i + off;
                        if q + 1 < bytes.len() && bytes[q + 1] == self.quote {
                            // Keep the first quote of the pair as content.
                            prefix
                                .get_or_insert_with(String::new)
                                .push_str(&input[start..q + 1]);
                            i = q + 2;
                            start = i;
                        } else {
                            closed = Some(cell(input, &mut prefix, start, q));
                            i = q + 1;
                            state = State::InQuotedCellAfterQuote;
                        }
                    }
                },
                State::InQuotedCellAfterQuote => {
                    let value = closed.take().unwrap_or_default();
                    if i >= bytes.len() {
                        row.push(value);
                        state = State::AtLineEnd;
                    } else if bytes[i] == self.delimiter {
                        row.push(value);
                        i += 1;
                        state = State::AtCellStart;
                    } else if self.is_term_at(i) {
                        row.push(value);
                        i += self.term.len();
                        state = State::AtLineEnd;
                    } else {
                        prefix = Some(value.into_owned());
                        start = i;
                        state = State::InPlainCell;
                    }
                }
                State::AtLineEnd => {
                    self.advance(i);
                    self.position.set_record(self.position.record() + 1);
                    return true;
                }
            }
        }
    }

    /// Move past any terminators at the current position.
    fn skip_blank_lines(&mut self) {
        let mut i = self.pos;
        while i < self.input.len() && self.is_term_at(i) {
            i += self.term.len();
        }
        self.advance(i);
    }

    /// Move the scanner to `to`, updating the byte and line counts.
    fn advance(&mut self, to: usize) {
        if to == self.pos {
            return;
        }
        let consumed = &self.input.as_bytes()[self.pos..to];
        let lines = memchr_iter(self.line_byte, consumed).count() as u64;
        let line = self.position.line() + lines;
        self.position.set_byte(to as u64).set_line(line);
        self.pos = to;
    }

    /// Returns true if the terminator starts at byte offset `i`.
    #[inline]
    fn is_term_at(&self, i: usize) -> bool {
        let bytes = self.input.as_bytes();
        match self.term {
            Terminator::CRLF => {
                bytes[i] == b'\r'
                    && i + 1 < bytes.len()
                    && bytes[i + 1] == b'\n'
            }
            Terminator::Any(b) => bytes[i] == b,
        }
    }

    /// Find the end of a plain cell whose content continues at `i`.
    #[inline]
    fn find_plain_end(&self, mut i: usize) -> (usize, Boundary) {
        let bytes = self.input.as_bytes();
        loop {
            match memchr2(self.delimiter, self.term.first(), &bytes[i..]) {
                None => return (bytes.len(), Boundary::End),
                Some(off) => {
                    let at = i + off;
                    if bytes[at] == self.delimiter {
                        return (at, Boundary::Delimiter);
                    }
                    if self.is_term_at(at) {
                        return (at, Boundary::Terminator);
                    }
                    // A lone `\r` under a `\r\n` terminator.
                    i = at + 1;
                }
            }
        }
    }
}

/// Finish a cell whose remaining content is `input[start..end]`.
#[inline]
fn cell<'a>(
    input: &'a str,
    prefix: &mut Option<String>,
    start: usize,
    end: usize,
) -> Cow<'a, str> {
    let rest = &input[start..end];
    match prefix.take() {
        None => Cow::Borrowed(rest),
        Some(mut owned) => {
            owned.push_str(rest);
            Cow::Owned(owned)
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Vec<Cow<'a, str>>;

    fn next(&mut self) -> Option<Vec<Cow<'a, str>>> {
        let mut row = vec![];
        if self.read_row(&mut row) {
            Some(row)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{Scanner, ScannerBuilder};
    use crate::Terminator;

    type Csv = Vec<Vec<String>>;

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            fn x() -> Csv {
                let mut csv = Csv::new();
                $(
                    let mut row = vec![];
                    $(
                        row.push(String::from($field));
                    )*
                    csv.push(row);
                )*
                csv
            }
            x()
        }}
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |builder| builder);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ScannerBuilder::new();
                $config(&mut builder);
                let got = parse_by_row(&builder, $data);
                assert_eq!($expected, got, "by row");

                let got = parse_by_iter(&builder, $data);
                assert_eq!($expected, got, "by iterator");
            }
        };
    }

    fn parse_by_row(builder: &ScannerBuilder, data: &str) -> Csv {
        let mut scanner = builder.build(data).unwrap();
        let mut csv = Csv::new();
        let mut row = vec![];
        while scanner.read_row(&mut row) {
            csv.push(row.iter().map(|c| c.to_string()).collect());
        }
        assert!(row.is_empty());
        assert!(scanner.is_done());
        csv
    }

    fn parse_by_iter(builder: &ScannerBuilder, data: &str) -> Csv {
        builder
            .build(data)
            .unwrap()
            .map(|row| row.into_iter().map(Cow::into_owned).collect())
            .collect()
    }

    fn lf(b: &mut ScannerBuilder) {
        b.terminator(Terminator::Any(b'\n'));
    }

    fn cr(b: &mut ScannerBuilder) {
        b.terminator(Terminator::Any(b'\r'));
    }

    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_lf, "a\n", csv![["a"]], lf);
    parses_to!(one_row_many_fields_lf, "a,b,c\n", csv![["a", "b", "c"]], lf);
    parses_to!(one_row_trailing_comma_lf, "a,b,\n", csv![["a", "b", ""]], lf);
    parses_to!(one_row_one_field_crlf, "a\r\n", csv![["a"]]);
    parses_to!(one_row_many_fields_crlf, "a,b,c\r\n", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_crlf, "a,b,\r\n", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_cr, "a\r", csv![["a"]], cr);
    parses_to!(one_row_many_fields_cr, "a,b,c\r", csv![["a", "b", "c"]], cr);
    parses_to!(one_row_trailing_comma_cr, "a,b,\r", csv![["a", "b", ""]], cr);

    parses_to!(many_rows_one_field, "a\r\nb", csv![["a"], ["b"]]);
    parses_to!(
        many_rows_many_fields,
        "a,b,c\r\nx,y,z",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_trailing_comma,
        "a,b,\r\nx,y,",
        csv![["a", "b", ""], ["x", "y", ""]]
    );
    parses_to!(many_rows_one_field_lf, "a\nb\n", csv![["a"], ["b"]], lf);
    parses_to!(
        many_rows_many_fields_lf,
        "a,b,c\nx,y,z\n",
        csv![["a", "b", "c"], ["x", "y", "z"]],
        lf
    );
    parses_to!(
        many_rows_many_fields_crlf,
        "a,b,c\r\nx,y,z\r\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_many_fields_cr,
        "a,b,c\rx,y,z\r",
        csv![["a", "b", "c"], ["x", "y", "z"]],
        cr
    );
    parses_to!(
        no_trailing_terminator,
        "1,2,3,4\r\n5,6,7,8",
        csv![["1", "2", "3", "4"], ["5", "6", "7", "8"]]
    );

    parses_to!(
        trailing_lines_no_record_lf,
        "\n\n\na,b,c\nx,y,z\n\n\n",
        csv![["a", "b", "c"], ["x", "y", "z"]],
        lf
    );
    parses_to!(
        trailing_lines_no_record_crlf,
        "\r\n\r\n\r\na,b,c\r\nx,y,z\r\n\r\n\r\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );

    parses_to!(empty, "", csv![]);
    parses_to!(empty_lines_lf, "\n\n\n\n", csv![], lf);
    parses_to!(empty_lines_crlf, "\r\n\r\n\r\n\r\n", csv![]);
    parses_to!(
        empty_lines_interspersed_crlf,
        "\r\n\r\na,b\r\n\r\n\r\nx,y\r\n\r\n\r\nm,n\r\n",
        csv![["a", "b"], ["x", "y"], ["m", "n"]]
    );
    parses_to!(
        empty_lines_interspersed_cr,
        "\r\ra,b\r\r\rx,y\r\r\rm,n\r",
        csv![["a", "b"], ["x", "y"], ["m", "n"]],
        cr
    );

    parses_to!(lone_cr_in_crlf, "a\rb,c\r\nd", csv![["a\rb", "c"], ["d"]]);
    parses_to!(lone_lf_in_crlf, "a\nb,c", csv![["a\nb", "c"]]);
    parses_to!(whitespace_line, "a\r\n  \r\nb", csv![["a"], ["  "], ["b"]]);

    parses_to!(quote_empty, "\"\"", csv![[""]]);
    parses_to!(quote_empty_crlf, "\"\"\r\n", csv![[""]]);
    parses_to!(quote_space, "\" \"", csv![[" "]]);
    parses_to!(quote_inner_space, "\" a \"", csv![[" a "]]);
    parses_to!(quote_outer_space, "  \"a\"  ", csv![["  \"a\"  "]]);
    parses_to!(quote_trailing_text, "\"a\"b,c", csv![["ab", "c"]]);
    parses_to!(quote_doubled_trailing_text, "\"a\"\"\"b,c", csv![["a\"b", "c"]]);
    parses_to!(quote_change, "'a,b',c", csv![["a,b", "c"]], |b: &mut ScannerBuilder| {
        b.quote(b'\'');
    });

    parses_to!(embedded_delimiter, "1,2,\"3,4\"", csv![["1", "2", "3,4"]]);
    parses_to!(embedded_newline_lf, "1,2,\"3\n4\"", csv![["1", "2", "3\n4"]], lf);
    parses_to!(embedded_crlf, "1,\"2\r\n3\"\r\n4", csv![["1", "2\r\n3"], ["4"]]);
    parses_to!(doubled_quote, "1,2,\"\"\"3,4\"\"\"", csv![["1", "2", "\"3,4\""]]);
    parses_to!(only_doubled_quotes, "\"\"\"\"", csv![["\""]]);

    parses_to!(unterminated_quote, "a,\"b,c\r\nd", csv![["a", "b,c\r\nd"]]);
    parses_to!(unterminated_doubled, "\"a\"\"b", csv![["a\"b"]]);
    parses_to!(lone_quote, "\"", csv![[""]]);

    parses_to!(delimiter_tabs, "a\tb", csv![["a", "b"]], |b: &mut ScannerBuilder| {
        b.delimiter(b'\t');
    });
    parses_to!(
        delimiter_semicolon,
        "a;\"b;c\";d",
        csv![["a", "b;c", "d"]],
        |b: &mut ScannerBuilder| {
            b.delimiter(b';');
        }
    );
    parses_to!(
        ascii_delimited,
        "a\x1fb\x1ec\x1fd",
        csv![["a", "b"], ["c", "d"]],
        |b: &mut ScannerBuilder| {
            b.delimiter(b'\x1F').terminator(Terminator::Any(b'\x1E'));
        }
    );

    parses_to!(
        unicode_cells,
        "héllo,\"wörld, ok\"\r\nñ",
        csv![["héllo", "wörld, ok"], ["ñ"]]
    );

    #[test]
    fn cells_borrow_unless_collapsed() {
        let mut scanner = Scanner::new("plain,\"quoted\",\"dou\"\"ble\"");
        let mut row = vec![];
        assert!(scanner.read_row(&mut row));
        assert!(matches!(row[0], Cow::Borrowed("plain")));
        assert!(matches!(row[1], Cow::Borrowed("quoted")));
        assert!(matches!(row[2], Cow::Owned(ref s) if s == "dou\"ble"));
    }

    #[test]
    fn positions() {
        let mut scanner = Scanner::new("a,b\r\n\r\n\"c\r\nd\",e\r\nf");
        let mut row = vec![];

        assert_eq!(scanner.position().line(), 1);
        assert!(scanner.read_row(&mut row));
        assert_eq!(scanner.position().byte(), 0);
        assert_eq!(scanner.position().line(), 1);
        assert_eq!(scanner.position().record(), 0);

        assert!(scanner.read_row(&mut row));
        assert_eq!(row, vec!["c\r\nd", "e"]);
        assert_eq!(scanner.position().byte(), 7);
        assert_eq!(scanner.position().line(), 3);
        assert_eq!(scanner.position().record(), 1);

        assert!(scanner.read_row(&mut row));
        assert_eq!(row, vec!["f"]);
        assert_eq!(scanner.position().line(), 5);
        assert_eq!(scanner.position().record(), 2);

        assert!(!scanner.read_row(&mut row));
    }

    #[test]
    fn invalid_config() {
        assert!(ScannerBuilder::new().delimiter(b'"').build("a").is_err());
        assert!(ScannerBuilder::new()
            .terminator(Terminator::Any(b','))
            .build("a")
            .is_err());
    }
}
