//! Attribute type catalog and values.
//!
//! Every node, edge, and graph attribute carries an [`AttrValue`] drawn
//! from a closed catalog of types: boolean, the integer widths, the two
//! float widths, char, string, homogeneous arrays of those scalars, and
//! the two time-indexed containers. [`ValueKey`] wraps a value with
//! structural equality (float bit patterns) so it can key hash tables.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::attr::time::{IntervalMap, TimestampMap};
use crate::config::IdType;
use crate::error::{Error, Result};

/// Canonical attribute types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrType {
    /// Boolean.
    Bool,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Single character.
    Char,
    /// UTF-8 string.
    Str,
    /// Homogeneous array of a scalar type.
    Array(Box<AttrType>),
    /// Timestamp-indexed values of a scalar type.
    TimestampMap(Box<AttrType>),
    /// Interval-indexed values of a scalar type.
    IntervalMap(Box<AttrType>),
}

impl AttrType {
    /// Returns true for numeric scalars, which support ordered indices.
    #[must_use]
    pub fn is_sortable(&self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::F32 | Self::F64
        )
    }

    /// Returns true for time-indexed types.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::TimestampMap(_) | Self::IntervalMap(_))
    }

    /// Returns true for array types.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns true for types usable as array elements and dynamic inner
    /// values.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !self.is_array() && !self.is_dynamic()
    }

    /// The value type behind a dynamic type, if any.
    #[must_use]
    pub fn dynamic_inner(&self) -> Option<&AttrType> {
        match self {
            Self::TimestampMap(inner) | Self::IntervalMap(inner) => Some(inner),
            _ => None,
        }
    }

    /// Parses text as a scalar value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for array and dynamic types and
    /// [`Error::InvalidValueFormat`] when the text does not parse.
    pub fn parse(&self, text: &str) -> Result<AttrValue> {
        let trimmed = text.trim();
        let reject = || Error::InvalidValueFormat {
            ty: self.to_string(),
            text: text.to_string(),
        };
        match self {
            Self::Bool => match trimmed {
                "true" => Ok(AttrValue::Bool(true)),
                "false" => Ok(AttrValue::Bool(false)),
                _ => Err(reject()),
            },
            Self::I8 => trimmed.parse().map(AttrValue::I8).map_err(|_| reject()),
            Self::I16 => trimmed.parse().map(AttrValue::I16).map_err(|_| reject()),
            Self::I32 => trimmed.parse().map(AttrValue::I32).map_err(|_| reject()),
            Self::I64 => trimmed.parse().map(AttrValue::I64).map_err(|_| reject()),
            Self::F32 => trimmed.parse().map(AttrValue::F32).map_err(|_| reject()),
            Self::F64 => trimmed.parse().map(AttrValue::F64).map_err(|_| reject()),
            Self::Char => {
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(AttrValue::Char(c)),
                    _ => Err(reject()),
                }
            }
            Self::Str => Ok(AttrValue::Str(text.to_string())),
            Self::Array(_) | Self::TimestampMap(_) | Self::IntervalMap(_) => {
                Err(Error::UnsupportedType(self.to_string()))
            }
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::I8 => write!(f, "i8"),
            Self::I16 => write!(f, "i16"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::Char => write!(f, "char"),
            Self::Str => write!(f, "string"),
            Self::Array(inner) => write!(f, "array<{inner}>"),
            Self::TimestampMap(inner) => write!(f, "timestamp_map<{inner}>"),
            Self::IntervalMap(inner) => write!(f, "interval_map<{inner}>"),
        }
    }
}

/// Homogeneous array value.
///
/// The element type is stored explicitly so empty arrays keep their type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    elem: AttrType,
    values: Vec<AttrValue>,
}

impl ArrayValue {
    /// Creates an array value, validating element homogeneity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for non-scalar element types and
    /// [`Error::TypeMismatch`] when an element disagrees with `elem`.
    pub fn new(elem: AttrType, values: Vec<AttrValue>) -> Result<Self> {
        if !elem.is_scalar() {
            return Err(Error::UnsupportedType(format!("array<{elem}>")));
        }
        for value in &values {
            if value.attr_type() != elem {
                return Err(Error::TypeMismatch {
                    column: "<array element>".to_string(),
                    expected: elem.to_string(),
                    actual: value.attr_type().to_string(),
                });
            }
        }
        Ok(Self { elem, values })
    }

    /// The element type.
    #[must_use]
    pub fn elem_type(&self) -> &AttrType {
        &self.elem
    }

    /// The element values in order.
    #[must_use]
    pub fn values(&self) -> &[AttrValue] {
        &self.values
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer.
    I8(i8),
    /// 16-bit signed integer.
    I16(i16),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Single character.
    Char(char),
    /// UTF-8 string.
    Str(String),
    /// Homogeneous array.
    Array(ArrayValue),
    /// Timestamp-indexed values.
    Timestamps(TimestampMap),
    /// Interval-indexed values.
    Intervals(IntervalMap),
}

impl AttrValue {
    /// The canonical type of this value.
    #[must_use]
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::Bool(_) => AttrType::Bool,
            Self::I8(_) => AttrType::I8,
            Self::I16(_) => AttrType::I16,
            Self::I32(_) => AttrType::I32,
            Self::I64(_) => AttrType::I64,
            Self::F32(_) => AttrType::F32,
            Self::F64(_) => AttrType::F64,
            Self::Char(_) => AttrType::Char,
            Self::Str(_) => AttrType::Str,
            Self::Array(arr) => AttrType::Array(Box::new(arr.elem_type().clone())),
            Self::Timestamps(map) => AttrType::TimestampMap(Box::new(map.value_type().clone())),
            Self::Intervals(map) => AttrType::IntervalMap(Box::new(map.value_type().clone())),
        }
    }

    /// Returns true for time-indexed values.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Timestamps(_) | Self::Intervals(_))
    }

    /// The numeric value widened to i64, for integer variants.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I8(v) => Some(i64::from(*v)),
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The numeric value widened to f64, for float variants.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
            Self::Array(arr) => {
                write!(f, "[")?;
                for (i, value) in arr.values().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Self::Timestamps(map) => write!(f, "timestamps(len={})", map.len()),
            Self::Intervals(map) => write!(f, "intervals(len={})", map.len()),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Normalizes a user id against the configured id type.
///
/// Integer ids accept any integer width and widen to [`AttrValue::I64`].
///
/// # Errors
///
/// Returns [`Error::IdTypeMismatch`] for anything else.
pub fn standardize_id(value: AttrValue, id_type: IdType) -> Result<AttrValue> {
    match id_type {
        IdType::Integer => value.as_i64().map(AttrValue::I64).ok_or_else(|| {
            Error::IdTypeMismatch {
                expected: "integer".to_string(),
                actual: value.attr_type().to_string(),
            }
        }),
        IdType::String => match value {
            AttrValue::Str(_) => Ok(value),
            other => Err(Error::IdTypeMismatch {
                expected: "string".to_string(),
                actual: other.attr_type().to_string(),
            }),
        },
    }
}

/// Hashable structural-equality wrapper over [`AttrValue`].
///
/// Floats compare and hash by bit pattern, arrays by element contents.
/// Dynamic values are rejected: they never key hash tables.
#[derive(Debug, Clone)]
pub struct ValueKey(AttrValue);

impl ValueKey {
    /// Wraps a value, rejecting dynamic containers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for timestamp and interval maps.
    pub fn new(value: AttrValue) -> Result<Self> {
        if value.is_dynamic() {
            return Err(Error::UnsupportedType(value.attr_type().to_string()));
        }
        Ok(Self(value))
    }

    /// The wrapped value.
    #[must_use]
    pub fn value(&self) -> &AttrValue {
        &self.0
    }

    /// Unwraps the value.
    #[must_use]
    pub fn into_value(self) -> AttrValue {
        self.0
    }
}

fn structural_eq(a: &AttrValue, b: &AttrValue) -> bool {
    match (a, b) {
        (AttrValue::F32(x), AttrValue::F32(y)) => x.to_bits() == y.to_bits(),
        (AttrValue::F64(x), AttrValue::F64(y)) => x.to_bits() == y.to_bits(),
        (AttrValue::Array(x), AttrValue::Array(y)) => {
            x.elem_type() == y.elem_type()
                && x.len() == y.len()
                && x.values()
                    .iter()
                    .zip(y.values())
                    .all(|(va, vb)| structural_eq(va, vb))
        }
        _ => a == b,
    }
}

fn structural_hash<H: Hasher>(value: &AttrValue, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        AttrValue::Bool(v) => v.hash(state),
        AttrValue::I8(v) => v.hash(state),
        AttrValue::I16(v) => v.hash(state),
        AttrValue::I32(v) => v.hash(state),
        AttrValue::I64(v) => v.hash(state),
        AttrValue::F32(v) => v.to_bits().hash(state),
        AttrValue::F64(v) => v.to_bits().hash(state),
        AttrValue::Char(v) => v.hash(state),
        AttrValue::Str(v) => v.hash(state),
        AttrValue::Array(arr) => {
            arr.len().hash(state);
            for v in arr.values() {
                structural_hash(v, state);
            }
        }
        AttrValue::Timestamps(_) | AttrValue::Intervals(_) => {
            unreachable!("dynamic values are rejected at ValueKey construction")
        }
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(&self.0, &other.0)
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        structural_hash(&self.0, state);
    }
}
