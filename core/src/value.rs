//! High level abstraction over a DICOM data element's payload:
//! a tagged union of scalar arrays, text, raw bytes and nested sequences.

use crate::dataset::Dataset;
use crate::header::Length;
use smallvec::SmallVec;
use snafu::Snafu;
use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;

/// An aggregation of one or more elements in a value.
///
/// The backing `SmallVec` keeps the common single-valued and
/// two-valued attributes off the heap.
pub type C<T> = SmallVec<[T; 2]>;

/// A DICOM data element value.
///
/// Text values have one trailing NUL byte stripped at construction
/// (through [`Value::text`]) and are trimmed of surrounding whitespace and
/// NUL padding on scalar access. Scalar arrays retain their stream order.
/// The `Sequence` variant owns its nested data sets.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No payload.
    Empty,
    /// A text payload; multiple values are separated by `\`.
    Str(String),
    /// A raw byte payload (OB, UN and the legacy ox/px aliases).
    Bytes(C<u8>),
    /// A sequence of unsigned 16-bit integers.
    U16(C<u16>),
    /// A sequence of signed 16-bit integers.
    I16(C<i16>),
    /// A sequence of unsigned 32-bit integers.
    U32(C<u32>),
    /// A sequence of signed 32-bit integers.
    I32(C<i32>),
    /// A sequence of 32-bit floating point numbers.
    F32(C<f32>),
    /// A sequence of 64-bit floating point numbers.
    F64(C<f64>),
    /// An ordered list of nested data sets.
    Sequence(Vec<Dataset>),
}

/// An enum representing an abstraction of a value's payload kind.
/// Useful for error reporting.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ValueType {
    /// No data.
    Empty,
    /// A text value.
    Str,
    /// A raw byte blob.
    Bytes,
    /// An array of unsigned 16-bit integers.
    U16,
    /// An array of signed 16-bit integers.
    I16,
    /// An array of unsigned 32-bit integers.
    U32,
    /// An array of signed 32-bit integers.
    I32,
    /// An array of 32-bit floating point numbers.
    F32,
    /// An array of 64-bit floating point numbers.
    F64,
    /// A nested data set sequence.
    Sequence,
}

/// An error raised when accessing a value in an inappropriate format,
/// or when requesting the first element of an empty array.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(display("bad value cast: requested {} but value is {:?}", requested, got))]
pub struct CastValueError {
    /// The value format requested
    pub requested: &'static str,
    /// The value's actual type
    pub got: ValueType,
}

/// Check whether a character is whitespace or the NUL padding byte.
pub(crate) fn whitespace_or_null(c: char) -> bool {
    c.is_whitespace() || c == '\0'
}

/// Macro for implementing the first/all accessor pairs of the scalar
/// array variants.
macro_rules! impl_value_getters {
    ($name_first: ident, $name_all: ident, $variant: ident, $ret: ty) => {
        /// Get the first value of the requested type.
        ///
        /// An error is returned if the variant is not compatible or the
        /// array is empty.
        pub fn $name_first(&self) -> Result<$ret, CastValueError> {
            match self {
                Value::$variant(values) => values.first().copied().ok_or(CastValueError {
                    requested: stringify!($name_first),
                    got: ValueType::$variant,
                }),
                _ => Err(CastValueError {
                    requested: stringify!($name_first),
                    got: self.value_type(),
                }),
            }
        }

        /// Get all values of the requested type without copying.
        ///
        /// An error is returned if the variant is not compatible.
        pub fn $name_all(&self) -> Result<&[$ret], CastValueError> {
            match self {
                Value::$variant(values) => Ok(values),
                _ => Err(CastValueError {
                    requested: stringify!($name_all),
                    got: self.value_type(),
                }),
            }
        }
    };
}

impl Value {
    /// Create a text value from the given string,
    /// stripping one trailing NUL padding byte if present.
    pub fn text<S: Into<String>>(text: S) -> Value {
        let mut text = text.into();
        if text.ends_with('\0') {
            text.pop();
        }
        Value::Str(text)
    }

    /// Retrieve the specific type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Empty => ValueType::Empty,
            Value::Str(_) => ValueType::Str,
            Value::Bytes(_) => ValueType::Bytes,
            Value::U16(_) => ValueType::U16,
            Value::I16(_) => ValueType::I16,
            Value::U32(_) => ValueType::U32,
            Value::I32(_) => ValueType::I32,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Sequence(_) => ValueType::Sequence,
        }
    }

    /// Retrieve the number of individual values encoded:
    /// backslash-separated components for text, array length for binary
    /// payloads, item count for sequences.
    pub fn multiplicity(&self) -> usize {
        match self {
            Value::Empty => 0,
            Value::Str(s) => {
                let trimmed = s.trim_matches(whitespace_or_null);
                if trimmed.is_empty() {
                    0
                } else {
                    trimmed.split('\\').count()
                }
            }
            Value::Bytes(v) => v.len(),
            Value::U16(v) => v.len(),
            Value::I16(v) => v.len(),
            Value::U32(v) => v.len(),
            Value::I32(v) => v.len(),
            Value::F32(v) => v.len(),
            Value::F64(v) => v.len(),
            Value::Sequence(items) => items.len(),
        }
    }

    /// Retrieve this value's payload size in bytes.
    /// Sequence values report an undefined length.
    pub fn byte_len(&self) -> Length {
        match self {
            Value::Empty => Length(0),
            Value::Str(s) => Length(s.len() as u32),
            Value::Bytes(v) => Length(v.len() as u32),
            Value::U16(v) => Length((v.len() * 2) as u32),
            Value::I16(v) => Length((v.len() * 2) as u32),
            Value::U32(v) => Length((v.len() * 4) as u32),
            Value::I32(v) => Length((v.len() * 4) as u32),
            Value::F32(v) => Length((v.len() * 4) as u32),
            Value::F64(v) => Length((v.len() * 8) as u32),
            Value::Sequence(_) => Length::UNDEFINED,
        }
    }

    /// Get the text value, trimmed of surrounding whitespace and NUL
    /// padding.
    ///
    /// An error is returned if the variant is not textual.
    pub fn string(&self) -> Result<&str, CastValueError> {
        match self {
            Value::Str(s) => Ok(s.trim_matches(whitespace_or_null)),
            _ => Err(CastValueError {
                requested: "string",
                got: self.value_type(),
            }),
        }
    }

    /// Get the text value with any padding preserved.
    ///
    /// An error is returned if the variant is not textual.
    pub fn raw_str(&self) -> Result<&str, CastValueError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(CastValueError {
                requested: "raw_str",
                got: self.value_type(),
            }),
        }
    }

    /// Get the raw byte payload.
    ///
    /// An error is returned if the variant is not a byte blob.
    pub fn bytes(&self) -> Result<&[u8], CastValueError> {
        match self {
            Value::Bytes(v) => Ok(v),
            _ => Err(CastValueError {
                requested: "bytes",
                got: self.value_type(),
            }),
        }
    }

    /// Get the nested data sets of a sequence value.
    ///
    /// An error is returned if the variant is not a sequence.
    pub fn items(&self) -> Result<&[Dataset], CastValueError> {
        match self {
            Value::Sequence(items) => Ok(items),
            _ => Err(CastValueError {
                requested: "items",
                got: self.value_type(),
            }),
        }
    }

    impl_value_getters!(uint16, uint16_slice, U16, u16);
    impl_value_getters!(int16, int16_slice, I16, i16);
    impl_value_getters!(uint32, uint32_slice, U32, u32);
    impl_value_getters!(int32, int32_slice, I32, i32);
    impl_value_getters!(float32, float32_slice, F32, f32);
    impl_value_getters!(float64, float64_slice, F64, f64);

    /// Render a preview of this value of at most `limit` characters,
    /// joining multiple values with `\` and truncating the excess with a
    /// trailing `...`. Sequence values render as an empty preview; the
    /// data set dump shows their item count instead.
    pub fn preview(&self, limit: usize) -> String {
        let joined = match self {
            Value::Empty | Value::Sequence(_) => String::new(),
            Value::Str(s) => s.trim_matches(whitespace_or_null).to_string(),
            Value::Bytes(v) => join_values(v.iter(), limit),
            Value::U16(v) => join_values(v.iter(), limit),
            Value::I16(v) => join_values(v.iter(), limit),
            Value::U32(v) => join_values(v.iter(), limit),
            Value::I32(v) => join_values(v.iter(), limit),
            Value::F32(v) => join_values(v.iter(), limit),
            Value::F64(v) => join_values(v.iter(), limit),
        };
        cut_str(&joined, limit).into_owned()
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::text(text)
    }
}

impl From<Vec<Dataset>> for Value {
    fn from(items: Vec<Dataset>) -> Self {
        Value::Sequence(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.preview(usize::MAX))
    }
}

/// Join displayable values with `\`, stopping early once `limit` is
/// exceeded (the caller truncates the surplus).
fn join_values<I>(values: I, limit: usize) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let mut out = String::new();
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push('\\');
        }
        let _ = write!(out, "{}", v);
        if out.len() > limit {
            break;
        }
    }
    out
}

fn cut_str(s: &str, max_characters: usize) -> Cow<str> {
    let max = max_characters.saturating_sub(3);
    if s.chars().count() > max {
        s.chars().take(max).chain("...".chars()).collect::<String>().into()
    } else {
        s.into()
    }
}
