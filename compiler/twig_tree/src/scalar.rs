//! Atomic tree values.
//!
//! Floats are stored as `u64` bits so that `Scalar` has a total equality
//! relation (and `Hash`), which literal and backreference matching rely on.

use std::fmt;

/// An opaque, indivisible tree node compared by equality.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    /// IEEE-754 bits; two floats are equal iff their bit patterns are.
    Float(u64),
    Str(Box<str>),
}

impl Scalar {
    /// Create a float scalar.
    #[inline]
    pub fn float(value: f64) -> Self {
        Scalar::Float(value.to_bits())
    }

    /// Create a string scalar.
    #[inline]
    pub fn str(value: &str) -> Self {
        Scalar::Str(value.into())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Short name of the scalar kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "str",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            Scalar::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.into())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value.into_boxed_str())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::float(value)
    }
}
