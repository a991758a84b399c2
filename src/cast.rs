/*!
Conversions between cell text and typed values.

The parse direction turns a cell into a `Value` (`cast_auto`, `is_numeric`,
`parse_number`, `parse_bool`). The encode direction renders a `Value` as cell
text and decides whether it must be quoted (`format_number`, `quote`,
`CellFormat`).

Every function here is pure. Nothing is cached between calls.
*/

use std::fmt;
use std::sync::Arc;

use csv_codec_core::Terminator;

use crate::value::Value;

/// The largest magnitude below which every integral `f64` is exact.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A custom parse-direction cast applied to every cell of a column.
pub type CastFn = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// A custom encode-direction format applied to every cell of a column.
///
/// The returned string is written verbatim. Use `quote` if it needs quotes.
pub type FormatFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// How cells are typed while parsing.
#[derive(Clone, Debug)]
pub enum Cast {
    /// Every cell is kept as `Value::Text`. This is the default.
    None,
    /// Each column's type is sniffed from the first data row only.
    ///
    /// A column whose first cell looks numeric becomes a number column, one
    /// whose first cell is `true`, `false`, `t` or `f` (in any case) becomes a
    /// boolean column, and anything else is a text column. Every later cell
    /// of the column is read as that type, whatever it looks like: a
    /// non-numeric cell in a number column reads as `NaN` and a boolean
    /// column reads `true` only for `true` and `t`.
    ///
    /// This is fast but fragile. Prefer `PerCell` unless every column is
    /// known to be uniform.
    Sniff,
    /// Every cell is typed on its own with `cast_auto`.
    PerCell,
    /// Explicit per column casts. Columns past the end of the list are kept
    /// as text.
    Columns(Vec<ColumnCast>),
}

impl Default for Cast {
    fn default() -> Cast {
        Cast::None
    }
}

impl From<bool> for Cast {
    fn from(yes: bool) -> Cast {
        if yes {
            Cast::Sniff
        } else {
            Cast::None
        }
    }
}

impl From<Vec<ColumnCast>> for Cast {
    fn from(columns: Vec<ColumnCast>) -> Cast {
        Cast::Columns(columns)
    }
}

/// The cast of a single column.
#[derive(Clone)]
pub enum ColumnCast {
    /// Trimmed text. Empty cells stay empty strings.
    Text,
    /// A number. Cells that do not parse are an error.
    Number,
    /// A boolean (see `parse_bool`). Cells that do not parse are an error.
    Bool,
    /// Whatever `cast_auto` makes of each cell.
    Auto,
    /// A caller supplied function, given the cell as scanned.
    Custom(CastFn),
}

impl ColumnCast {
    /// Wrap a function as a custom column cast.
    pub fn custom<F>(f: F) -> ColumnCast
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        ColumnCast::Custom(Arc::new(f))
    }
}

impl fmt::Debug for ColumnCast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ColumnCast::Text => write!(f, "Text"),
            ColumnCast::Number => write!(f, "Number"),
            ColumnCast::Bool => write!(f, "Bool"),
            ColumnCast::Auto => write!(f, "Auto"),
            ColumnCast::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// The format of a single column while encoding.
#[derive(Clone)]
pub enum FieldFormat {
    /// Quote according to the writer's `QuoteStyle`. This is the default.
    Auto,
    /// Always quote, whatever the value. `Null` is written as `""`.
    Text,
    /// A caller supplied function whose output is written verbatim.
    Custom(FormatFn),
}

impl FieldFormat {
    /// Wrap a function as a custom field format.
    pub fn custom<F>(f: F) -> FieldFormat
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        FieldFormat::Custom(Arc::new(f))
    }
}

impl Default for FieldFormat {
    fn default() -> FieldFormat {
        FieldFormat::Auto
    }
}

impl fmt::Debug for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldFormat::Auto => write!(f, "Auto"),
            FieldFormat::Text => write!(f, "Text"),
            FieldFormat::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// The quoting style to use when writing CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, delimiter or record
    /// terminator.
    Necessary,
    /// This puts quotes around every field that is not a number.
    ///
    /// Numbers, text that looks like a number and nulls are written bare.
    /// Fields that need quotes are quoted regardless.
    ///
    /// This is the default.
    NonNumeric,
    /// This *never* writes quotes.
    ///
    /// If a field requires quotes, then the writer will report an error.
    Never,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::NonNumeric
    }
}

/// Returns true if `s` looks like a number.
///
/// Numbers are an optional sign followed by either digits with an optional
/// fractional part (`12`, `-0.5`, `+3.25`) or `Infinity`. Exponents, hex
/// and surrounding whitespace are not numbers.
pub fn is_numeric(s: &str) -> bool {
    let b = s.as_bytes();
    let b = match b.first() {
        Some(b'+') | Some(b'-') => &b[1..],
        _ => b,
    };
    if b == b"Infinity" {
        return true;
    }
    let int_len = b.iter().take_while(|c| c.is_ascii_digit()).count();
    if int_len == 0 {
        return false;
    }
    match b[int_len..].split_first() {
        None => true,
        Some((&b'.', frac)) => {
            !frac.is_empty() && frac.iter().all(u8::is_ascii_digit)
        }
        Some(_) => false,
    }
}

/// Parse `s` as a number if `is_numeric` accepts it.
pub fn parse_number(s: &str) -> Option<f64> {
    if !is_numeric(s) {
        return None;
    }
    let (negative, body) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let n = if body == "Infinity" {
        f64::INFINITY
    } else {
        body.parse::<f64>().ok()?
    };
    Some(if negative { -n } else { n })
}

/// Parse `s` as a boolean.
///
/// `true`, `t`, `yes` and `y` are true, `false`, `f`, `no` and `n` are false,
/// in any case.
pub fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: &[&str] = &["true", "t", "yes", "y"];
    const FALSE: &[&str] = &["false", "f", "no", "n"];

    if TRUE.iter().any(|w| s.eq_ignore_ascii_case(w)) {
        Some(true)
    } else if FALSE.iter().any(|w| s.eq_ignore_ascii_case(w)) {
        Some(false)
    } else {
        None
    }
}

/// Returns true for the boolean spellings a sniffed column recognizes.
pub(crate) fn is_sniffed_bool(s: &str) -> bool {
    ["true", "false", "t", "f"].iter().any(|w| s.eq_ignore_ascii_case(w))
}

/// Type a single cell.
///
/// The cell is trimmed. Empty cells are `Null`, numbers (see `is_numeric`)
/// are `Number`, booleans (see `parse_bool`) are `Bool` and anything else is
/// `Text`.
pub fn cast_auto(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        Value::Null
    } else if let Some(n) = parse_number(cell) {
        Value::Number(n)
    } else if let Some(b) = parse_bool(cell) {
        Value::Bool(b)
    } else {
        Value::Text(cell.to_string())
    }
}

/// The integer value of `n`, if it is integral and exactly representable.
pub(crate) fn as_integer(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        Some(n as i64)
    } else {
        None
    }
}

/// Append the text of the number `n` to `out`.
///
/// Integral values are written without a fractional part, others with the
/// shortest representation that reads back to the same number. Infinities
/// are `Infinity` and `-Infinity`.
pub fn format_number(n: f64, out: &mut String) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if let Some(i) = as_integer(n) {
        out.push_str(itoa::Buffer::new().format(i));
    } else {
        out.push_str(ryu::Buffer::new().format_finite(n));
    }
}

/// Append `s` to `out` wrapped in `quote`, doubling every quote inside.
pub fn quote_into(s: &str, quote: u8, out: &mut String) {
    let q = quote as char;
    out.push(q);
    for (i, part) in s.split(q).enumerate() {
        if i > 0 {
            out.push(q);
            out.push(q);
        }
        out.push_str(part);
    }
    out.push(q);
}

/// Wrap `s` in `quote`, doubling every quote inside.
///
/// ```
/// use csv_codec::cast::quote;
///
/// assert_eq!(quote("3,4", b'"'), "\"3,4\"");
/// assert_eq!(quote("say \"hi\"", b'"'), "\"say \"\"hi\"\"\"");
/// ```
pub fn quote(s: &str, quote: u8) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    quote_into(s, quote, &mut out);
    out
}

/// Undo `quote`.
///
/// Returns `None` if `s` is not wrapped in `quote`, or if a quote inside it
/// is not doubled.
pub fn unquote(s: &str, quote: u8) -> Option<String> {
    let q = quote as char;
    let inner = s.strip_prefix(q)?.strip_suffix(q)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == q && chars.next() != Some(q) {
            return None;
        }
        out.push(c);
    }
    Some(out)
}

/// Renders values as cells for one writer configuration.
#[derive(Clone, Copy, Debug)]
pub struct CellFormat {
    /// The cell delimiter.
    pub delimiter: u8,
    /// The quote character.
    pub quote: u8,
    /// The line terminator.
    pub term: Terminator,
    /// When to quote.
    pub style: QuoteStyle,
}

impl CellFormat {
    /// Returns true if `text` cannot be written without quotes.
    pub fn requires_quotes(&self, text: &str) -> bool {
        text.bytes().any(|b| {
            b == self.delimiter
                || b == self.quote
                || b == b'\r'
                || b == b'\n'
                || self.term.contains(b)
        })
    }

    /// Append the cell for `value` to `out`.
    ///
    /// This returns `false`, leaving `out` untouched, when the value needs
    /// quotes and the style is `QuoteStyle::Never`.
    pub fn write(&self, value: &Value, out: &mut String) -> bool {
        let mut number = String::new();
        let text: &str = match *value {
            Value::Null => "",
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
            Value::Number(n) => {
                format_number(n, &mut number);
                &number
            }
            Value::Text(ref s) => s,
        };
        let needs_quotes = self.requires_quotes(text);
        let quoted = match self.style {
            QuoteStyle::Always => true,
            QuoteStyle::Necessary => needs_quotes,
            QuoteStyle::NonNumeric => {
                needs_quotes
                    || match *value {
                        Value::Null | Value::Number(_) => false,
                        Value::Text(ref s) => !is_numeric(s),
                        Value::Bool(_) => true,
                    }
            }
            QuoteStyle::Never if needs_quotes => return false,
            QuoteStyle::Never => false,
        };
        if quoted {
            quote_into(text, self.quote, out);
        } else {
            out.push_str(text);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use csv_codec_core::Terminator;

    use super::*;

    fn format(style: QuoteStyle, value: Value) -> Option<String> {
        let fmt = CellFormat {
            delimiter: b',',
            quote: b'"',
            term: Terminator::CRLF,
            style,
        };
        let mut out = String::new();
        if fmt.write(&value, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    #[test]
    fn numeric_detection() {
        for s in &["0", "12", "-3", "+4", "1.5", "-0.25", "Infinity", "-Infinity"] {
            assert!(is_numeric(s), "{:?} should be numeric", s);
        }
        for s in &["", "-", "1.", ".5", "1e5", "0x10", " 1", "1 ", "inf", "NaN", "1.2.3"] {
            assert!(!is_numeric(s), "{:?} should not be numeric", s);
        }
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("32"), Some(32.0));
        assert_eq!(parse_number("-1.5"), Some(-1.5));
        assert_eq!(parse_number("+Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("y"), Some(true));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("f"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert!(is_sniffed_bool("T"));
        assert!(!is_sniffed_bool("yes"));
    }

    #[test]
    fn auto_cast() {
        assert_eq!(cast_auto(" 32 "), Value::Number(32.0));
        assert_eq!(cast_auto("yes"), Value::Bool(true));
        assert_eq!(cast_auto(""), Value::Null);
        assert_eq!(cast_auto("   "), Value::Null);
        assert_eq!(cast_auto(" Will "), Value::from("Will"));
        assert_eq!(cast_auto("1009999"), Value::Number(1009999.0));
    }

    #[test]
    fn number_formatting() {
        let fmt = |n: f64| {
            let mut out = String::new();
            format_number(n, &mut out);
            out
        };
        assert_eq!(fmt(32.0), "32");
        assert_eq!(fmt(-7.0), "-7");
        assert_eq!(fmt(1.5), "1.5");
        assert_eq!(fmt(0.1), "0.1");
        assert_eq!(fmt(f64::INFINITY), "Infinity");
        assert_eq!(fmt(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(fmt(f64::NAN), "NaN");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("", b'"'), "\"\"");
        assert_eq!(quote("\"", b'"'), "\"\"\"\"");
        assert_eq!(quote("a'b", b'\''), "'a''b'");
        assert_eq!(unquote("\"a\"\"b\"", b'"'), Some("a\"b".to_string()));
        assert_eq!(unquote("\"\"", b'"'), Some(String::new()));
        assert_eq!(unquote("abc", b'"'), None);
        assert_eq!(unquote("\"a\"b\"", b'"'), None);
        assert_eq!(unquote("\"", b'"'), None);
    }

    #[test]
    fn non_numeric_style() {
        let s = QuoteStyle::NonNumeric;
        assert_eq!(format(s, Value::from(32)).unwrap(), "32");
        assert_eq!(format(s, Value::from("32")).unwrap(), "32");
        assert_eq!(format(s, Value::from("Will")).unwrap(), "\"Will\"");
        assert_eq!(format(s, Value::from(true)).unwrap(), "\"true\"");
        assert_eq!(format(s, Value::Null).unwrap(), "");
        assert_eq!(format(s, Value::from("3,4")).unwrap(), "\"3,4\"");
        assert_eq!(
            format(s, Value::from("\"3,4\"")).unwrap(),
            "\"\"\"3,4\"\"\""
        );
    }

    #[test]
    fn necessary_style() {
        let s = QuoteStyle::Necessary;
        assert_eq!(format(s, Value::from("Will")).unwrap(), "Will");
        assert_eq!(format(s, Value::from("3\n4")).unwrap(), "\"3\n4\"");
        assert_eq!(format(s, Value::from("a\"b")).unwrap(), "\"a\"\"b\"");
        assert_eq!(format(s, Value::from(false)).unwrap(), "false");
    }

    #[test]
    fn always_and_never_styles() {
        assert_eq!(format(QuoteStyle::Always, Value::from(1)).unwrap(), "\"1\"");
        assert_eq!(format(QuoteStyle::Always, Value::Null).unwrap(), "\"\"");
        assert_eq!(format(QuoteStyle::Never, Value::from("a b")).unwrap(), "a b");
        assert_eq!(format(QuoteStyle::Never, Value::from("a,b")), None);
    }

    #[test]
    fn custom_terminator_requires_quotes() {
        let fmt = CellFormat {
            delimiter: b'\x1F',
            quote: b'"',
            term: Terminator::Any(b'\x1E'),
            style: QuoteStyle::Necessary,
        };
        assert!(fmt.requires_quotes("a\x1Eb"));
        assert!(fmt.requires_quotes("a\x1Fb"));
        assert!(!fmt.requires_quotes("a,b"));
    }
}
