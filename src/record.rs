use std::iter::FromIterator;
use std::ops;
use std::slice;
use std::sync::Arc;

use csv_codec_core::Position;
use indexmap::IndexMap;

use crate::value::Value;

/// A single parsed CSV record.
///
/// A record is an ordered sequence of values. When the reader was given
/// field names (from a header row or explicitly), the record also shares
/// those names and can be indexed by name. Such a record is *keyed*.
///
/// Rows that are longer or shorter than the field names are kept as they
/// are: a name past the end of the values has no value, and values past the
/// end of the names can only be reached by index.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Option<Arc<[String]>>,
    values: Vec<Value>,
    pos: Option<Position>,
}

impl PartialEq for Record {
    /// Records are equal when their field names and values are equal. Their
    /// positions are ignored.
    fn eq(&self, other: &Record) -> bool {
        self.fields() == other.fields() && self.values == other.values
    }
}

impl Record {
    /// Create a new empty record without field names.
    pub fn new() -> Record {
        Record::default()
    }

    /// Create a record without field names from the given values.
    pub fn from_values(values: Vec<Value>) -> Record {
        Record { fields: None, values, pos: None }
    }

    /// Create a keyed record.
    ///
    /// ```
    /// use csv_codec::{Record, Value};
    ///
    /// let rec = Record::with_fields(
    ///     vec!["name".to_string(), "age".to_string()],
    ///     vec![Value::from("Will"), Value::from(32)],
    /// );
    /// assert_eq!(rec["age"], Value::from(32));
    /// ```
    pub fn with_fields(fields: Vec<String>, values: Vec<Value>) -> Record {
        Record { fields: Some(fields.into()), values, pos: None }
    }

    /// Returns the number of values in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this record has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if this record has field names.
    pub fn is_keyed(&self) -> bool {
        self.fields.is_some()
    }

    /// Return the value at index `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.values.get(i)
    }

    /// Return the value of the field named `name`.
    ///
    /// This returns `None` when the record has no such field, and also when
    /// the field exists but this row was too short to have a value for it.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let i = self.fields()?.iter().position(|f| f == name)?;
        self.values.get(i)
    }

    /// The field names of this record, if it is keyed.
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// The values of this record, in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns an iterator over the values of this record.
    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Consume this record and return its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// The position of the row this record was parsed from.
    ///
    /// Records built by hand have no position.
    pub fn position(&self) -> Option<&Position> {
        self.pos.as_ref()
    }

    /// Copy this record into a map from field name to value.
    ///
    /// This returns `None` for records without field names. Values past the
    /// end of the field names are keyed by their column index.
    pub fn to_map(&self) -> Option<IndexMap<String, Value>> {
        let fields = self.fields()?;
        Some(
            self.values
                .iter()
                .enumerate()
                .map(|(i, v)| (key(fields, i), v.clone()))
                .collect(),
        )
    }

    /// Clear this record so that it has no values, names or position.
    pub fn clear(&mut self) {
        self.fields = None;
        self.values.clear();
        self.pos = None;
    }

    pub(crate) fn set_fields(&mut self, fields: Option<Arc<[String]>>) {
        self.fields = fields;
    }

    pub(crate) fn set_position(&mut self, pos: Position) {
        self.pos = Some(pos);
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.values.push(value);
    }
}

/// The key of column `i` given the field names.
fn key(fields: &[String], i: usize) -> String {
    match fields.get(i) {
        Some(name) => name.clone(),
        None => i.to_string(),
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Record {
        Record::from_values(values)
    }
}

impl<T: Into<Value>> FromIterator<T> for Record {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Record {
        Record::from_values(iter.into_iter().map(Into::into).collect())
    }
}

impl ops::Index<usize> for Record {
    type Output = Value;

    fn index(&self, i: usize) -> &Value {
        &self.values[i]
    }
}

impl<'a> ops::Index<&'a str> for Record {
    type Output = Value;

    fn index(&self, name: &'a str) -> &Value {
        match self.get_by_name(name) {
            Some(v) => v,
            None => panic!("no value for field {:?}", name),
        }
    }
}

impl AsRef<[Value]> for Record {
    fn as_ref(&self) -> &[Value] {
        &self.values
    }
}

impl<'r> IntoIterator for &'r Record {
    type IntoIter = slice::Iter<'r, Value>;
    type Item = &'r Value;

    fn into_iter(self) -> slice::Iter<'r, Value> {
        self.values.iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Record {
    fn serialize<S: serde::Serializer>(
        &self,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self.fields() {
            None => {
                let mut seq = ser.serialize_seq(Some(self.values.len()))?;
                for v in &self.values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Some(fields) => {
                let mut map = ser.serialize_map(Some(self.values.len()))?;
                for (i, v) in self.values.iter().enumerate() {
                    map.serialize_entry(&key(fields, i), v)?;
                }
                map.end()
            }
        }
    }
}
