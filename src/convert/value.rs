//! Converted argument values and typed access to them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::convert::TypeTag;
use crate::error::ArgumentError;

/// A converted argument, or a handler result awaiting serialization.
#[derive(Clone)]
pub enum Value {
    /// Any integer width, widened.
    Int(i64),
    /// Any floating width, widened.
    Float(f64),
    Bool(bool),
    Char(char),
    Text(String),
    /// Capture groups of a whole-string regex match.
    Match(Captures),
    /// A member of a registered enum.
    Choice(Choice),
    List(Vec<Value>),
    /// An integrator-defined value produced by a custom deserializer.
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wrap an integrator-defined value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// Borrow the payload of an [`Value::Object`] as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(object) => object.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Char(_) => "character",
            Self::Text(_) => "text",
            Self::Match(_) => "match",
            Self::Choice(_) => "choice",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Char(v) => f.debug_tuple("Char").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Match(v) => f.debug_tuple("Match").field(v).finish(),
            Self::Choice(v) => f.debug_tuple("Choice").field(v).finish(),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Match(a), Self::Match(b)) => a == b,
            (Self::Choice(a), Self::Choice(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Match(m) => f.write_str(m.whole()),
            Self::Choice(c) => f.write_str(c.name()),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("<object>"),
        }
    }
}

/// Capture groups of a regex match. Group 0 is the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<Option<String>>,
}

impl Captures {
    pub fn new(groups: Vec<Option<String>>) -> Self {
        Self { groups }
    }

    /// The text of group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    pub fn whole(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A member of a registered enum, by declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    tag: TypeTag,
    index: usize,
    name: String,
}

impl Choice {
    pub(crate) fn new(tag: TypeTag, index: usize, name: impl Into<String>) -> Self {
        Self {
            tag,
            index,
            name: name.into(),
        }
    }

    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Position of the member in the registered list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The member name as registered (original case).
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Typed extraction from a [`Value`].
///
/// Implemented for the built-in value shapes so handlers can write
/// `args.get::<i32>(0)?`.
pub trait FromValue: Sized {
    /// Convert `value`, found at argument `index`.
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError>;
}

fn mismatch(value: &Value, index: usize, expected: &'static str) -> ArgumentError {
    ArgumentError::Mismatch {
        index,
        expected,
        found: value.kind(),
    }
}

macro_rules! from_int_value {
    ($($ty:ty),*) => {
        $(impl FromValue for $ty {
            fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
                match value {
                    Value::Int(v) => <$ty>::try_from(*v).map_err(|_| ArgumentError::OutOfRange {
                        index,
                        target: stringify!($ty),
                    }),
                    other => Err(mismatch(other, index, "integer")),
                }
            }
        })*
    };
}

from_int_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(mismatch(other, index, "float")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        f64::from_value(value, index).map(|v| v as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch(other, index, "boolean")),
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::Char(v) => Ok(*v),
            other => Err(mismatch(other, index, "character")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            Value::Choice(c) => Ok(c.name.clone()),
            Value::List(items) if items.iter().all(|i| matches!(i, Value::Char(_))) => {
                Ok(items.iter().map(ToString::to_string).collect())
            }
            other => Err(mismatch(other, index, "text")),
        }
    }
}

impl FromValue for Captures {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::Match(m) => Ok(m.clone()),
            other => Err(mismatch(other, index, "match")),
        }
    }
}

impl FromValue for Choice {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::Choice(c) => Ok(c.clone()),
            other => Err(mismatch(other, index, "choice")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, _index: usize) -> Result<Self, ArgumentError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value, index: usize) -> Result<Self, ArgumentError> {
        match value {
            Value::List(items) => items.iter().map(|v| T::from_value(v, index)).collect(),
            other => Err(mismatch(other, index, "list")),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

value_from!(i8 => Int, i16 => Int, i32 => Int, i64 => Int, u8 => Int, u16 => Int, u32 => Int,
    f32 => Float, f64 => Float, bool => Bool, char => Char, String => Text, &str => Text);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}
