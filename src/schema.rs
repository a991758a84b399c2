use std::borrow::Cow;
use std::sync::Arc;

use csv_codec_core::Position;

use crate::cast::{self, Cast, CastFn, ColumnCast};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::Value;

/// Where the field names of a CSV text come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Header {
    /// There are no field names. Records are plain sequences of values.
    ///
    /// This is the default.
    None,
    /// The first row holds the field names.
    ///
    /// When encoding, this writes a header line for keyed records only.
    FirstRow,
    /// The given field names.
    ///
    /// When parsing, the first row is still data unless the reader is told
    /// to replace it. When encoding, these names pick and order the columns
    /// of keyed records and are always written as a header line.
    Fields(Vec<String>),
}

impl Default for Header {
    fn default() -> Header {
        Header::None
    }
}

impl From<bool> for Header {
    fn from(yes: bool) -> Header {
        if yes {
            Header::FirstRow
        } else {
            Header::None
        }
    }
}

impl From<Vec<String>> for Header {
    fn from(fields: Vec<String>) -> Header {
        Header::Fields(fields)
    }
}

impl<'a> From<Vec<&'a str>> for Header {
    fn from(fields: Vec<&'a str>) -> Header {
        Header::Fields(fields.into_iter().map(String::from).collect())
    }
}

/// How the cells of one column become values.
#[derive(Clone)]
enum Column {
    /// Text as scanned.
    Raw,
    /// Trimmed text.
    Text,
    /// A number. Lenient columns read bad cells as `NaN`.
    Number { strict: bool },
    /// A boolean. Lenient columns read only `true` and `t` as true.
    Bool { strict: bool },
    /// Typed cell by cell.
    Auto,
    Custom(CastFn),
}

impl Column {
    fn sniff(cell: &str) -> Column {
        let cell = cell.trim();
        if cast::is_numeric(cell) {
            Column::Number { strict: false }
        } else if cast::is_sniffed_bool(cell) {
            Column::Bool { strict: false }
        } else {
            Column::Text
        }
    }

    fn explicit(cast: &ColumnCast) -> Column {
        match *cast {
            ColumnCast::Text => Column::Text,
            ColumnCast::Number => Column::Number { strict: true },
            ColumnCast::Bool => Column::Bool { strict: true },
            ColumnCast::Auto => Column::Auto,
            ColumnCast::Custom(ref f) => Column::Custom(f.clone()),
        }
    }

    fn name(&self) -> &'static str {
        match *self {
            Column::Raw | Column::Text => "text",
            Column::Number { .. } => "number",
            Column::Bool { .. } => "boolean",
            Column::Auto => "auto",
            Column::Custom(_) => "custom",
        }
    }

    /// Cast one cell. On failure, this returns the name of the type that
    /// was expected.
    fn cast(
        &self,
        cell: &str,
        trim: bool,
    ) -> std::result::Result<Value, &'static str> {
        let scanned = if trim { cell.trim() } else { cell };
        match *self {
            Column::Raw => Ok(Value::from(scanned)),
            Column::Text => Ok(Value::from(cell.trim())),
            Column::Auto => Ok(cast::cast_auto(cell)),
            Column::Custom(ref f) => Ok(f(scanned)),
            Column::Number { strict } => {
                let cell = cell.trim();
                if cell.is_empty() {
                    return Ok(Value::Null);
                }
                match cast::parse_number(cell) {
                    Some(n) => Ok(Value::Number(n)),
                    None if strict => Err(self.name()),
                    None => Ok(Value::Number(f64::NAN)),
                }
            }
            Column::Bool { strict } => {
                let cell = cell.trim();
                if cell.is_empty() {
                    return Ok(Value::Null);
                }
                if !strict {
                    let yes = cell.eq_ignore_ascii_case("true")
                        || cell.eq_ignore_ascii_case("t");
                    return Ok(Value::Bool(yes));
                }
                cast::parse_bool(cell)
                    .map(Value::Bool)
                    .ok_or_else(|| self.name())
            }
        }
    }
}

/// The shape of the records of one parse.
///
/// A schema is computed once, from the field names, the casting mode and
/// the first data row, and then applied to every row.
#[derive(Clone)]
pub(crate) struct Schema {
    fields: Option<Arc<[String]>>,
    columns: Vec<Column>,
    /// The column of every cell past the end of `columns`.
    rest: Column,
    trim: bool,
}

impl Schema {
    /// Build the schema of a parse.
    ///
    /// `sample` is the first data row. Only sniffing looks at it.
    pub(crate) fn new(
        fields: Option<Arc<[String]>>,
        sample: &[Cow<str>],
        cast: &Cast,
        trim: bool,
    ) -> Schema {
        let (columns, rest) = match *cast {
            Cast::None => (vec![], Column::Raw),
            Cast::Sniff => (
                sample.iter().map(|c| Column::sniff(c)).collect(),
                Column::Text,
            ),
            Cast::PerCell => (vec![], Column::Auto),
            Cast::Columns(ref casts) => {
                (casts.iter().map(Column::explicit).collect(), Column::Raw)
            }
        };
        let schema = Schema { fields, columns, rest, trim };
        tracing::debug!(
            columns = ?schema.column_names(),
            keyed = schema.fields.is_some(),
            "built record schema"
        );
        schema
    }

    fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Shape the raw cells of one row into `record`.
    ///
    /// `raw` is drained. `pos` is the position of the row, used to report
    /// cells that cannot be cast.
    pub(crate) fn build(
        &self,
        raw: &mut Vec<Cow<str>>,
        pos: &Position,
        record: &mut Record,
    ) -> Result<()> {
        record.clear();
        record.set_fields(self.fields.clone());
        record.set_position(*pos);
        for (i, cell) in raw.drain(..).enumerate() {
            let column = self.columns.get(i).unwrap_or(&self.rest);
            match column.cast(&cell, self.trim) {
                Ok(value) => record.push(value),
                Err(expected) => {
                    return Err(Error::Cast {
                        pos: *pos,
                        field: i,
                        value: cell.into_owned(),
                        expected,
                    })
                }
            }
        }
        Ok(())
    }
}
