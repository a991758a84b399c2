/*!
The `csv-codec` crate converts CSV text into records and records back into
CSV text.

Parsing works on a complete in-memory `&str`. The cell delimiter and line
terminator can be set explicitly or detected from the text. Rows can be
shaped into keyed records using a header, and cells can be typed into
numbers, booleans and nulls. Encoding is the mirror image: rows of values (or
keyed records) are written with quotes applied only where the configured
`QuoteStyle` asks for them.

The low level scanner and dialect detector live in the `csv-codec-core`
crate and are re-exported here.

# Example: parsing

```
use csv_codec::{parse, ReaderBuilder, Value};

let text = "\
name,age,member
Will,32,true
\"Ann, Jr.\",7,f
";
let mut builder = ReaderBuilder::new();
builder.header(true).cast(true);

let recs = parse(text, &builder).unwrap();
assert_eq!(recs.len(), 2);
assert_eq!(recs[0]["age"], Value::from(32));
assert_eq!(recs[1]["name"], Value::from("Ann, Jr."));
assert_eq!(recs[1]["member"], Value::from(false));
```

# Example: encoding

```
use csv_codec::{encode_records, Header, Value, WriterBuilder};
use indexmap::IndexMap;

let mut rec = IndexMap::new();
rec.insert("name".to_string(), Value::from("Will"));
rec.insert("age".to_string(), Value::from(32));

let mut builder = WriterBuilder::new();
builder.header(Header::FirstRow);

let text = encode_records(vec![rec], &builder).unwrap();
assert_eq!(text, "\"name\",\"age\"\r\n\"Will\",32");
```

# Example: stopping early

Both directions can hand their output to a sink as soon as it is produced.
The sink stops the work by returning `ControlFlow::Break`.

```
use std::ops::ControlFlow;

use csv_codec::{parse_with, ReaderBuilder};

let mut first = None;
let done = parse_with("a\nb\nc\n", &ReaderBuilder::new(), |rec| {
    first = Some(rec);
    ControlFlow::Break(())
})
.unwrap();
assert!(!done);
assert_eq!(first.unwrap()[0].as_str(), Some("a"));
```
*/

#![deny(missing_docs)]

pub use csv_codec_core::{
    detect_delimiter, detect_delimiter_except, detect_terminator, ConfigError,
    Position, Scanner, ScannerBuilder, Terminator,
};

pub use crate::cast::{
    cast_auto, is_numeric, parse_bool, parse_number, Cast, CastFn,
    ColumnCast, FieldFormat, FormatFn, QuoteStyle,
};
pub use crate::error::{Error, Result};
pub use crate::reader::{parse, parse_with, Reader, ReaderBuilder, RecordsIter};
pub use crate::record::Record;
pub use crate::schema::Header;
pub use crate::value::Value;
pub use crate::writer::{
    encode_records, encode_records_with, encode_rows, encode_rows_with, Keyed,
    Writer, WriterBuilder,
};

pub mod cast;
mod error;
mod reader;
mod record;
mod schema;
mod value;
mod writer;
