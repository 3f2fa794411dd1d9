//! Utility modules for procsnap.

pub mod fields;

pub use fields::{FieldReader, ParseError, chop, fields, parse_u64, strip_parens};
