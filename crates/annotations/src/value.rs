//! Property values and resolved field values

use crate::flags::FlagEnum;
use crate::schema::Fillable;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;

/// The zero date (`0001-01-01`); date properties holding it count as unset
pub const ZERO_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Flat mapping from document field name to resolved value
///
/// Insertion order is kept so renderers see fields in resolution order.
pub type FieldMap = IndexMap<String, FieldValue>;

/// A value ready to be written into a document field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text content of a text field
    Text(String),
    /// Checkbox state
    Bool(bool),
    /// Encoded image (JPEG or PNG) placed at the field's rectangle
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Current value of one property, as exposed by [`Fillable::property`]
pub enum Value<'a> {
    /// Absent value (`None`, null)
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Cow<'a, str>),
    Date(NaiveDate),
    /// Raw binary content, typically an image
    Bytes(Cow<'a, [u8]>),
    /// Bitmask together with the variants of its flag enum
    Flags {
        bits: i64,
        variants: &'static [(&'static str, i64)],
    },
    /// A single key/value pair
    Pair(Cow<'a, str>, Cow<'a, str>),
    /// Sequence of sub-objects; `None` entries are null elements
    List(Vec<Option<Box<dyn Fillable + 'a>>>),
}

impl<'a> Value<'a> {
    /// Bitmask value of a flag enum
    pub fn flags<E: FlagEnum>(value: &E) -> Self {
        Self::Flags {
            bits: value.bits(),
            variants: E::VARIANTS,
        }
    }

    pub fn pair(key: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, str>>) -> Self {
        Self::Pair(key.into(), value.into())
    }

    /// List of borrowed sub-objects
    pub fn list<T: Fillable + 'a>(items: &'a [T]) -> Self {
        Self::List(
            items
                .iter()
                .map(|item| Some(Box::new(item) as Box<dyn Fillable + 'a>))
                .collect(),
        )
    }

    /// List whose elements may be null
    pub fn optional_list<T: Fillable + 'a>(items: &'a [Option<T>]) -> Self {
        Self::List(
            items
                .iter()
                .map(|item| {
                    item.as_ref()
                        .map(|item| Box::new(item) as Box<dyn Fillable + 'a>)
                })
                .collect(),
        )
    }

    /// Name of the value kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Bytes(_) => "bytes",
            Self::Flags { .. } => "flags",
            Self::Pair(..) => "pair",
            Self::List(_) => "list",
        }
    }

    /// Whether this value is null or its kind's default
    ///
    /// | kind | default |
    /// |------|---------|
    /// | null | always |
    /// | int, flags | `0` |
    /// | float | `0.0` |
    /// | date | [`ZERO_DATE`] |
    /// | bool, text, bytes, pair, list | never (only null counts) |
    ///
    /// `false` is kept so split booleans still check their false field.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Date(d) => *d == ZERO_DATE,
            Self::Flags { bits, .. } => *bits == 0,
            Self::Bool(_) | Self::Text(_) | Self::Bytes(_) | Self::Pair(..) | Self::List(_) => {
                false
            }
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Flags { bits, .. } => f.debug_struct("Flags").field("bits", bits).finish(),
            Self::Pair(k, v) => f.debug_tuple("Pair").field(k).field(v).finish(),
            Self::List(items) => write!(f, "List({} items)", items.len()),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(i: $ty) -> Self {
                    Self::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value<'_> {
    fn from(x: f32) -> Self {
        Self::Float(f64::from(x))
    }
}

impl From<f64> for Value<'_> {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(Cow::Borrowed(s))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(Cow::Borrowed(s.as_str()))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Self::Text(Cow::Owned(s))
    }
}

impl From<NaiveDate> for Value<'_> {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(Cow::Borrowed(bytes))
    }
}

impl<'a> From<&'a Vec<u8>> for Value<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(Cow::Borrowed(bytes.as_slice()))
    }
}

impl<'a> From<(&'a str, &'a str)> for Value<'a> {
    fn from((key, value): (&'a str, &'a str)) -> Self {
        Self::pair(key, value)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
