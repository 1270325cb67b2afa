//! Built-in parsers

pub mod boolean;
pub mod number;
pub mod string;

pub use boolean::BooleanParser;
pub use number::{
    integer_suggestions, ByteParser, DoubleParser, FloatParser, IntegerParser, LongParser,
    NumberParser, RangedNumber, ShortParser,
};
pub use string::{StringMode, StringParser};
