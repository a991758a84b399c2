use std::fmt;

use crate::cast;

/// A single typed cell.
///
/// Parsing without casting produces only `Text` values. Casting may produce
/// any variant. Encoding accepts any variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The absence of a value.
    ///
    /// Casting turns empty cells of number, boolean and automatically typed
    /// columns into `Null`. Encoding writes `Null` as an empty cell.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. Integers and decimals share one representation.
    Number(f64),
    /// A string.
    Text(String),
}

impl Value {
    /// Returns true if this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        match *self {
            Value::Null => true,
            _ => false,
        }
    }

    /// The string of a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Text(ref s) => Some(s),
            _ => None,
        }
    }

    /// The number of a `Number` value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The boolean of a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Null
    }
}

/// Writes the cell text of a value, without any quoting.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                let mut buf = String::new();
                cast::format_number(n, &mut buf);
                f.write_str(&buf)
            }
            Value::Text(ref s) => f.write_str(s),
        }
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Value {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl From<f32> for Value {
    fn from(n: f32) -> Value {
        Value::Number(f64::from(n))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(
        &self,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match *self {
            Value::Null => ser.serialize_unit(),
            Value::Bool(b) => ser.serialize_bool(b),
            Value::Number(n) => match cast::as_integer(n) {
                Some(i) => ser.serialize_i64(i),
                None => ser.serialize_f64(n),
            },
            Value::Text(ref s) => ser.serialize_str(s),
        }
    }
}
