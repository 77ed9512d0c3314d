use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single value bound into a statement template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Param {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => write!(f, "NULL"),
            Param::Boolean(b) => write!(f, "{}", b),
            Param::Integer(i) => write!(f, "{}", i),
            Param::Real(r) => write!(f, "{}", r),
            Param::Text(s) => write!(f, "{}", s),
            Param::Blob(b) => write!(f, "BLOB({} bytes)", b.len()),
        }
    }
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Boolean(value)
    }
}

macro_rules! integer_param {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_param!(i8, i16, i32, i64, u8, u16, u32);

/// Values beyond `i64::MAX` become reals, the way SQLite reads an
/// oversized integer literal.
macro_rules! wide_integer_param {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    match i64::try_from(value) {
                        Ok(value) => Param::Integer(value),
                        Err(_) => Param::Real(value as f64),
                    }
                }
            }
        )*
    };
}

wide_integer_param!(u64, usize, isize);

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::Real(f64::from(value))
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Real(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<Vec<u8>> for Param {
    fn from(value: Vec<u8>) -> Self {
        Param::Blob(value)
    }
}

impl From<&[u8]> for Param {
    fn from(value: &[u8]) -> Self {
        Param::Blob(value.to_vec())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

/// The parameters supplied with one statement.
///
/// `None` skips binding entirely and forwards the template verbatim, so a
/// literal `?` in unparameterized SQL is left alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Param>),
    Named(HashMap<String, Param>),
}

impl Params {
    pub fn is_none(&self) -> bool {
        matches!(self, Params::None)
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

impl From<Vec<Param>> for Params {
    fn from(values: Vec<Param>) -> Self {
        Params::Positional(values)
    }
}

impl From<HashMap<String, Param>> for Params {
    fn from(values: HashMap<String, Param>) -> Self {
        Params::Named(values)
    }
}

/// One result row: column name to JSON scalar, in column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Build positional parameters: `params![1, "two", 3.0]`
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::Positional(::std::vec::Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Params::Positional(::std::vec![$($crate::Param::from($value)),+])
    };
}

/// Build named parameters: `named_params! { "id" => 7, "name" => "x" }`
#[macro_export]
macro_rules! named_params {
    () => {
        $crate::Params::Named(::std::collections::HashMap::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = ::std::collections::HashMap::new();
        $(map.insert(::std::string::String::from($key), $crate::Param::from($value));)+
        $crate::Params::Named(map)
    }};
}
