/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Field types for mapped messages.
//!
//! This module provides:
//! - [`SemanticType`]: The closed set of types a field may carry
//! - [`FieldValue`]: A typed value for one field
//! - [`FieldSpec`]: A static schema row describing one field of a record
//! - [`FieldDescriptor`]: A named field slot inside a mapped message

use crate::error::MappingError;
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length applied to string fields that do not declare one.
pub const DEFAULT_STRING_MAX_LENGTH: usize = 25;

/// Semantic type of a mapped field.
///
/// Transport adapters translate this closed set into their own wire
/// representation. `Int16` and `Byte` are part of the set but cannot be
/// mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    /// UTF-8 string.
    String,
    /// 16-bit signed integer (unsupported).
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit float.
    Double,
    /// 32-bit float.
    Float,
    /// Single raw byte (unsupported).
    Byte,
    /// Single character.
    Char,
    /// Boolean.
    Bool,
    /// Fixed-point decimal.
    Decimal,
    /// Array of 32-bit integers.
    IntArray,
    /// Array of 64-bit floats.
    DoubleArray,
    /// Array of decimals.
    DecimalArray,
    /// Opaque byte sequence.
    ByteArray,
}

impl SemanticType {
    /// Returns true if fields of this type can be mapped.
    #[inline]
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Int16 | Self::Byte)
    }

    /// Returns the name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Double => "Double",
            Self::Float => "Float",
            Self::Byte => "Byte",
            Self::Char => "Char",
            Self::Bool => "Bool",
            Self::Decimal => "Decimal",
            Self::IntArray => "IntArray",
            Self::DoubleArray => "DoubleArray",
            Self::DecimalArray => "DecimalArray",
            Self::ByteArray => "ByteArray",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// String value.
    String(String),
    /// 16-bit integer value.
    Int16(i16),
    /// 32-bit integer value.
    Int32(i32),
    /// 64-bit integer value.
    Int64(i64),
    /// 64-bit float value.
    Double(f64),
    /// 32-bit float value.
    Float(f32),
    /// Raw byte value.
    Byte(u8),
    /// Character value.
    Char(char),
    /// Boolean value.
    Bool(bool),
    /// Decimal value.
    Decimal(Decimal),
    /// Integer array value.
    IntArray(Vec<i32>),
    /// Float array value.
    DoubleArray(Vec<f64>),
    /// Decimal array value.
    DecimalArray(Vec<Decimal>),
    /// Byte sequence value.
    ByteArray(Bytes),
}

impl FieldValue {
    /// Returns the semantic type of this value.
    #[must_use]
    pub const fn semantic_type(&self) -> SemanticType {
        match self {
            Self::String(_) => SemanticType::String,
            Self::Int16(_) => SemanticType::Int16,
            Self::Int32(_) => SemanticType::Int32,
            Self::Int64(_) => SemanticType::Int64,
            Self::Double(_) => SemanticType::Double,
            Self::Float(_) => SemanticType::Float,
            Self::Byte(_) => SemanticType::Byte,
            Self::Char(_) => SemanticType::Char,
            Self::Bool(_) => SemanticType::Bool,
            Self::Decimal(_) => SemanticType::Decimal,
            Self::IntArray(_) => SemanticType::IntArray,
            Self::DoubleArray(_) => SemanticType::DoubleArray,
            Self::DecimalArray(_) => SemanticType::DecimalArray,
            Self::ByteArray(_) => SemanticType::ByteArray,
        }
    }

    /// Returns the value as a string slice, if it is a String variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i32, if it is an Int32 variant.
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an Int64 variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an f64, if it is a Double variant.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a Bool variant.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a Decimal, if it is a Decimal variant.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Int16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Char(c) => write!(f, "{}", c),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::IntArray(v) => write!(f, "{:?}", v),
            Self::DoubleArray(v) => write!(f, "{:?}", v),
            Self::DecimalArray(v) => write!(f, "{:?}", v),
            Self::ByteArray(d) => write!(f, "<{} bytes>", d.len()),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<char> for FieldValue {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        Self::ByteArray(value)
    }
}

/// Static schema row for one field of a record.
///
/// Record types expose a `&'static [FieldSpec]` table built once and reused
/// for every message of that shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, unique within the record.
    pub name: &'static str,
    /// Semantic type of the field.
    pub semantic_type: SemanticType,
    /// Maximum length for string fields.
    pub max_length: Option<usize>,
}

impl FieldSpec {
    /// Creates a schema row with no explicit length limit.
    #[must_use]
    pub const fn new(name: &'static str, semantic_type: SemanticType) -> Self {
        Self {
            name,
            semantic_type,
            max_length: None,
        }
    }

    /// Creates a string schema row with the given maximum length.
    #[must_use]
    pub const fn string(name: &'static str, max_length: usize) -> Self {
        Self {
            name,
            semantic_type: SemanticType::String,
            max_length: Some(max_length),
        }
    }
}

/// A named field slot inside a mapped message.
///
/// A descriptor with no value is "unset", which is distinct from a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    semantic_type: SemanticType,
    value: Option<FieldValue>,
    max_length: Option<usize>,
}

impl FieldDescriptor {
    /// Creates an unset descriptor.
    ///
    /// String descriptors get [`DEFAULT_STRING_MAX_LENGTH`].
    #[must_use]
    pub(crate) fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        let max_length = match semantic_type {
            SemanticType::String => Some(DEFAULT_STRING_MAX_LENGTH),
            _ => None,
        };
        Self {
            name: name.into(),
            semantic_type,
            value: None,
            max_length,
        }
    }

    /// Creates a descriptor from a schema row.
    #[must_use]
    pub(crate) fn from_spec(spec: &FieldSpec) -> Self {
        let mut descriptor = Self::new(spec.name, spec.semantic_type);
        if spec.semantic_type == SemanticType::String
            && let Some(max_length) = spec.max_length
        {
            descriptor.max_length = Some(max_length);
        }
        descriptor
    }

    /// Returns the field name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic type.
    #[inline]
    #[must_use]
    pub const fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    /// Returns the current value, if set.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// Returns the maximum length for string fields.
    #[inline]
    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Returns true if a value is set.
    #[inline]
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Overrides the maximum length.
    pub fn set_max_length(&mut self, max_length: usize) {
        self.max_length = Some(max_length);
    }

    /// Sets the value after checking its type and length.
    ///
    /// # Errors
    /// Returns `MappingError::TypeMismatch` if the value type differs from the
    /// declared type, or `MappingError::FieldTooLong` if a string exceeds the
    /// maximum length.
    pub fn set(&mut self, value: FieldValue) -> Result<(), MappingError> {
        self.check(&value)?;
        self.value = Some(value);
        Ok(())
    }

    fn check(&self, value: &FieldValue) -> Result<(), MappingError> {
        let actual = value.semantic_type();
        if actual != self.semantic_type {
            return Err(MappingError::TypeMismatch {
                field: self.name.clone(),
                expected: self.semantic_type,
                actual,
            });
        }

        if let (FieldValue::String(s), Some(max_length)) = (value, self.max_length) {
            let length = s.chars().count();
            if length > max_length {
                return Err(MappingError::FieldTooLong {
                    field: self.name.clone(),
                    length,
                    max_length,
                });
            }
        }
        Ok(())
    }

    /// Checks a descriptor that did not come from a schema row: the type must
    /// be supported and any value must pass the same checks as [`set`](Self::set).
    pub(crate) fn validate(&self) -> Result<(), MappingError> {
        if !self.semantic_type.is_supported() {
            return Err(MappingError::UnsupportedType {
                field: self.name.clone(),
                semantic_type: self.semantic_type,
            });
        }
        match &self.value {
            Some(value) => self.check(value),
            None => Ok(()),
        }
    }

    /// Clears the value.
    #[inline]
    pub fn clear(&mut self) {
        self.value = None;
    }
}
