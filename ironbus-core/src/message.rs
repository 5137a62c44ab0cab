/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Mapped messages and the record mapping trait.
//!
//! This module provides:
//! - [`MappedMessage`]: Schema-described, transport-independent field set
//! - [`MappedRecord`]: Trait implemented by domain records to map to and from
//!   a [`MappedMessage`] through a static schema table

use crate::error::MappingError;
use crate::field::{FieldDescriptor, FieldSpec, FieldValue, SemanticType};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Trait for records that can be carried by a [`MappedMessage`].
///
/// The schema is a static table computed once per type; only values change
/// between sends.
pub trait MappedRecord: Sized {
    /// Unique name for this record shape within a domain.
    const TYPE_NAME: &'static str;

    /// Returns the static schema of this record.
    fn schema() -> &'static [FieldSpec];

    /// Writes this record's values into a message built from its schema.
    ///
    /// # Errors
    /// Returns `MappingError` if a value cannot be applied.
    fn write_fields(&self, message: &mut MappedMessage) -> Result<(), MappingError>;

    /// Reads a record back from a message built from its schema.
    ///
    /// # Errors
    /// Returns `MappingError` if a required value is missing or mistyped.
    fn read_fields(message: &MappedMessage) -> Result<Self, MappingError>;
}

/// Schema-described representation of a domain record.
///
/// Fields keep their schema order and are looked up by name. A message is
/// usually built once per record shape, then [`reset`](Self::reset) and
/// refilled before each send. `Clone` produces a fully independent copy.
///
/// Deserialized messages go through the same checks as
/// [`from_schema`](Self::from_schema) and [`apply`](Self::apply).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedMessage {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

#[derive(Deserialize)]
struct MessageParts {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl<'de> Deserialize<'de> for MappedMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = MessageParts::deserialize(deserializer)?;
        Self::from_descriptors(parts.type_name, parts.fields).map_err(serde::de::Error::custom)
    }
}

impl MappedMessage {
    /// Builds an unset message from a schema table.
    ///
    /// # Arguments
    /// * `type_name` - Unique name of the record shape
    /// * `schema` - Field rows in declaration order
    ///
    /// # Errors
    /// Returns `MappingError::UnsupportedType` for `Int16`/`Byte` fields and
    /// `MappingError::DuplicateField` if a name repeats.
    pub fn from_schema(
        type_name: impl Into<String>,
        schema: &[FieldSpec],
    ) -> Result<Self, MappingError> {
        let type_name = type_name.into();
        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(schema.len());

        for spec in schema {
            if !spec.semantic_type.is_supported() {
                return Err(MappingError::UnsupportedType {
                    field: spec.name.to_string(),
                    semantic_type: spec.semantic_type,
                });
            }
            if fields.iter().any(|f| f.name() == spec.name) {
                return Err(MappingError::DuplicateField {
                    type_name,
                    field: spec.name.to_string(),
                });
            }
            fields.push(FieldDescriptor::from_spec(spec));
        }

        Ok(Self { type_name, fields })
    }

    /// Rebuilds a message from descriptors that did not come from a schema table.
    fn from_descriptors(
        type_name: String,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, MappingError> {
        for (index, field) in fields.iter().enumerate() {
            field.validate()?;
            if fields[..index].iter().any(|f| f.name() == field.name()) {
                return Err(MappingError::DuplicateField {
                    type_name,
                    field: field.name().to_string(),
                });
            }
        }
        Ok(Self { type_name, fields })
    }

    /// Builds an unset message for a record type.
    ///
    /// # Errors
    /// Returns `MappingError` if the record schema is invalid.
    pub fn for_record<R: MappedRecord>() -> Result<Self, MappingError> {
        Self::from_schema(R::TYPE_NAME, R::schema())
    }

    /// Builds a message for a record and fills in its values.
    ///
    /// # Errors
    /// Returns `MappingError` if the schema is invalid or a value cannot be applied.
    pub fn describe<R: MappedRecord>(record: &R) -> Result<Self, MappingError> {
        let mut message = Self::for_record::<R>()?;
        record.write_fields(&mut message)?;
        Ok(message)
    }

    /// Returns the record type name.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns true if this message was built for `R`.
    #[inline]
    #[must_use]
    pub fn is_record<R: MappedRecord>(&self) -> bool {
        self.type_name == R::TYPE_NAME
    }

    /// Checks that this message was built for `R`.
    ///
    /// # Errors
    /// Returns `MappingError::TypeNameMismatch` otherwise.
    pub fn expect_record<R: MappedRecord>(&self) -> Result<(), MappingError> {
        if self.is_record::<R>() {
            Ok(())
        } else {
            Err(MappingError::TypeNameMismatch {
                expected: R::TYPE_NAME.to_string(),
                actual: self.type_name.clone(),
            })
        }
    }

    /// Returns an iterator over the fields in schema order.
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Gets a field descriptor by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut FieldDescriptor, MappingError> {
        let type_name = &self.type_name;
        self.fields
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or_else(|| MappingError::UnknownField {
                type_name: type_name.clone(),
                field: name.to_string(),
            })
    }

    fn field_ref(&self, name: &str) -> Result<&FieldDescriptor, MappingError> {
        self.field(name).ok_or_else(|| MappingError::UnknownField {
            type_name: self.type_name.clone(),
            field: name.to_string(),
        })
    }

    /// Sets a field value.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown, the type differs, or a
    /// string exceeds the field's maximum length.
    pub fn apply(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), MappingError> {
        self.field_mut(name)?.set(value.into())
    }

    /// Sets a field value, or clears it when `value` is `None`.
    ///
    /// # Errors
    /// Same as [`apply`](Self::apply).
    pub fn apply_opt<V: Into<FieldValue>>(
        &mut self,
        name: &str,
        value: Option<V>,
    ) -> Result<(), MappingError> {
        match value {
            Some(v) => self.apply(name, v),
            None => self.clear(name),
        }
    }

    /// Clears a single field value.
    ///
    /// # Errors
    /// Returns `MappingError::UnknownField` if the field does not exist.
    pub fn clear(&mut self, name: &str) -> Result<(), MappingError> {
        self.field_mut(name)?.clear();
        Ok(())
    }

    /// Reads a field value; `None` means the field is unset.
    ///
    /// # Errors
    /// Returns `MappingError::UnknownField` if the field does not exist.
    pub fn read(&self, name: &str) -> Result<Option<&FieldValue>, MappingError> {
        Ok(self.field_ref(name)?.value())
    }

    fn read_typed<'a, T>(
        &'a self,
        name: &str,
        expected: SemanticType,
        extract: impl FnOnce(&'a FieldValue) -> Option<T>,
    ) -> Result<Option<T>, MappingError> {
        let Some(value) = self.field_ref(name)?.value() else {
            return Ok(None);
        };
        extract(value).map(Some).ok_or_else(|| MappingError::TypeMismatch {
            field: name.to_string(),
            expected,
            actual: value.semantic_type(),
        })
    }

    /// Reads a string field.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown or not a string.
    pub fn read_str(&self, name: &str) -> Result<Option<&str>, MappingError> {
        self.read_typed(name, SemanticType::String, FieldValue::as_str)
    }

    /// Reads an Int32 field.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown or not an Int32.
    pub fn read_i32(&self, name: &str) -> Result<Option<i32>, MappingError> {
        self.read_typed(name, SemanticType::Int32, FieldValue::as_i32)
    }

    /// Reads an Int64 field.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown or not an Int64.
    pub fn read_i64(&self, name: &str) -> Result<Option<i64>, MappingError> {
        self.read_typed(name, SemanticType::Int64, FieldValue::as_i64)
    }

    /// Reads a Double field.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown or not a Double.
    pub fn read_f64(&self, name: &str) -> Result<Option<f64>, MappingError> {
        self.read_typed(name, SemanticType::Double, FieldValue::as_f64)
    }

    /// Reads a Bool field.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown or not a Bool.
    pub fn read_bool(&self, name: &str) -> Result<Option<bool>, MappingError> {
        self.read_typed(name, SemanticType::Bool, FieldValue::as_bool)
    }

    /// Reads a Decimal field.
    ///
    /// # Errors
    /// Returns `MappingError` if the field is unknown or not a Decimal.
    pub fn read_decimal(&self, name: &str) -> Result<Option<Decimal>, MappingError> {
        self.read_typed(name, SemanticType::Decimal, FieldValue::as_decimal)
    }

    /// Reads a string field that must be set.
    ///
    /// # Errors
    /// Returns `MappingError::MissingValue` if the field is unset.
    pub fn require_str(&self, name: &str) -> Result<&str, MappingError> {
        self.read_str(name)?.ok_or_else(|| missing(name))
    }

    /// Reads an Int32 field that must be set.
    ///
    /// # Errors
    /// Returns `MappingError::MissingValue` if the field is unset.
    pub fn require_i32(&self, name: &str) -> Result<i32, MappingError> {
        self.read_i32(name)?.ok_or_else(|| missing(name))
    }

    /// Reads an Int64 field that must be set.
    ///
    /// # Errors
    /// Returns `MappingError::MissingValue` if the field is unset.
    pub fn require_i64(&self, name: &str) -> Result<i64, MappingError> {
        self.read_i64(name)?.ok_or_else(|| missing(name))
    }

    /// Overrides the maximum length of a field.
    ///
    /// # Errors
    /// Returns `MappingError::UnknownField` if the field does not exist.
    pub fn set_max_length(&mut self, name: &str, max_length: usize) -> Result<(), MappingError> {
        self.field_mut(name)?.set_max_length(max_length);
        Ok(())
    }

    /// Clears every field value in place, keeping the schema.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }
}

fn missing(name: &str) -> MappingError {
    MappingError::MissingValue {
        field: name.to_string(),
    }
}

impl fmt::Display for MappedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        for field in &self.fields {
            match field.value() {
                Some(value) => write!(f, " : {} = <{}>", field.name(), value)?,
                None => write!(f, " : {} = <>", field.name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[derive(Debug, Clone, PartialEq)]
    struct Quote {
        symbol: String,
        level: i32,
        volume: i64,
        last: f64,
        ratio: f32,
        side: char,
        active: bool,
        price: Decimal,
        sizes: Vec<i32>,
        bids: Vec<f64>,
        asks: Vec<Decimal>,
        raw: Bytes,
    }

    static QUOTE_SCHEMA: [FieldSpec; 12] = [
        FieldSpec::string("Symbol", 12),
        FieldSpec::new("Level", SemanticType::Int32),
        FieldSpec::new("Volume", SemanticType::Int64),
        FieldSpec::new("Last", SemanticType::Double),
        FieldSpec::new("Ratio", SemanticType::Float),
        FieldSpec::new("Side", SemanticType::Char),
        FieldSpec::new("Active", SemanticType::Bool),
        FieldSpec::new("Price", SemanticType::Decimal),
        FieldSpec::new("Sizes", SemanticType::IntArray),
        FieldSpec::new("Bids", SemanticType::DoubleArray),
        FieldSpec::new("Asks", SemanticType::DecimalArray),
        FieldSpec::new("Raw", SemanticType::ByteArray),
    ];

    impl MappedRecord for Quote {
        const TYPE_NAME: &'static str = "Quote";

        fn schema() -> &'static [FieldSpec] {
            &QUOTE_SCHEMA
        }

        fn write_fields(&self, message: &mut MappedMessage) -> Result<(), MappingError> {
            message.apply("Symbol", self.symbol.as_str())?;
            message.apply("Level", self.level)?;
            message.apply("Volume", self.volume)?;
            message.apply("Last", self.last)?;
            message.apply("Ratio", self.ratio)?;
            message.apply("Side", self.side)?;
            message.apply("Active", self.active)?;
            message.apply("Price", self.price)?;
            message.apply("Sizes", FieldValue::IntArray(self.sizes.clone()))?;
            message.apply("Bids", FieldValue::DoubleArray(self.bids.clone()))?;
            message.apply("Asks", FieldValue::DecimalArray(self.asks.clone()))?;
            message.apply("Raw", self.raw.clone())
        }

        fn read_fields(message: &MappedMessage) -> Result<Self, MappingError> {
            message.expect_record::<Self>()?;
            let value = |name: &str| {
                message
                    .read(name)?
                    .cloned()
                    .ok_or_else(|| missing(name))
            };
            Ok(Self {
                symbol: message.require_str("Symbol")?.to_string(),
                level: message.require_i32("Level")?,
                volume: message.require_i64("Volume")?,
                last: message.read_f64("Last")?.unwrap_or_default(),
                ratio: match value("Ratio")? {
                    FieldValue::Float(v) => v,
                    _ => 0.0,
                },
                side: match value("Side")? {
                    FieldValue::Char(c) => c,
                    _ => ' ',
                },
                active: message.read_bool("Active")?.unwrap_or_default(),
                price: message.read_decimal("Price")?.unwrap_or_default(),
                sizes: match value("Sizes")? {
                    FieldValue::IntArray(v) => v,
                    _ => Vec::new(),
                },
                bids: match value("Bids")? {
                    FieldValue::DoubleArray(v) => v,
                    _ => Vec::new(),
                },
                asks: match value("Asks")? {
                    FieldValue::DecimalArray(v) => v,
                    _ => Vec::new(),
                },
                raw: match value("Raw")? {
                    FieldValue::ByteArray(b) => b,
                    _ => Bytes::new(),
                },
            })
        }
    }

    fn sample_quote() -> Quote {
        Quote {
            symbol: "ESZ6".to_string(),
            level: 3,
            volume: 12_000_000_000,
            last: 5012.25,
            ratio: 0.5,
            side: 'B',
            active: true,
            price: Decimal::new(501225, 2),
            sizes: vec![10, 20, 30],
            bids: vec![5012.0, 5011.75],
            asks: vec![Decimal::new(501250, 2)],
            raw: Bytes::from_static(b"\x01\x02"),
        }
    }

    #[test]
    fn test_describe_keeps_schema_order() {
        let message = MappedMessage::describe(&sample_quote()).unwrap();
        let names: Vec<&str> = message.fields().map(|f| f.name()).collect();
        let expected: Vec<&str> = QUOTE_SCHEMA.iter().map(|s| s.name).collect();
        assert_eq!(names, expected);
        assert_eq!(message.type_name(), "Quote");
    }

    #[test]
    fn test_record_round_trip() {
        let quote = sample_quote();
        let message = MappedMessage::describe(&quote).unwrap();
        assert_eq!(Quote::read_fields(&message).unwrap(), quote);
    }

    #[test]
    fn test_reset_clears_every_field() {
        let mut message = MappedMessage::describe(&sample_quote()).unwrap();
        message.reset();
        for field in message.fields() {
            assert!(message.read(field.name()).unwrap().is_none());
        }
        assert_eq!(message.field_count(), QUOTE_SCHEMA.len());
    }

    #[test]
    fn test_unset_is_distinct_from_zero() {
        let mut message = MappedMessage::for_record::<Quote>().unwrap();
        assert_eq!(message.read_i32("Level").unwrap(), None);

        message.apply("Level", 0).unwrap();
        assert_eq!(message.read_i32("Level").unwrap(), Some(0));

        message.apply_opt::<i32>("Level", None).unwrap();
        assert_eq!(message.read_i32("Level").unwrap(), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut source = MappedMessage::describe(&sample_quote()).unwrap();
        let mut copy = source.clone();

        copy.apply("Level", 9).unwrap();
        copy.clear("Symbol").unwrap();
        assert_eq!(source.read_i32("Level").unwrap(), Some(3));
        assert_eq!(source.read_str("Symbol").unwrap(), Some("ESZ6"));

        source.reset();
        assert_eq!(copy.read_i32("Level").unwrap(), Some(9));
        assert_eq!(copy.read_i64("Volume").unwrap(), Some(12_000_000_000));
    }

    #[test]
    fn test_unsupported_types_fail_at_mapping_time() {
        static SHORT: [FieldSpec; 1] = [FieldSpec::new("Flags", SemanticType::Int16)];
        static BYTE: [FieldSpec; 1] = [FieldSpec::new("Mask", SemanticType::Byte)];

        assert!(matches!(
            MappedMessage::from_schema("Short", &SHORT),
            Err(MappingError::UnsupportedType {
                semantic_type: SemanticType::Int16,
                ..
            })
        ));
        assert!(matches!(
            MappedMessage::from_schema("Byte", &BYTE),
            Err(MappingError::UnsupportedType {
                semantic_type: SemanticType::Byte,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        static DUP: [FieldSpec; 2] = [
            FieldSpec::new("Qty", SemanticType::Int32),
            FieldSpec::new("Qty", SemanticType::Int64),
        ];
        assert!(matches!(
            MappedMessage::from_schema("Dup", &DUP),
            Err(MappingError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let mut message = MappedMessage::for_record::<Quote>().unwrap();
        assert!(matches!(
            message.apply("Nope", 1),
            Err(MappingError::UnknownField { .. })
        ));
        assert!(matches!(
            message.read("Nope"),
            Err(MappingError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_typed_read_mismatch() {
        let message = MappedMessage::describe(&sample_quote()).unwrap();
        assert!(matches!(
            message.read_i64("Level"),
            Err(MappingError::TypeMismatch {
                expected: SemanticType::Int64,
                actual: SemanticType::Int32,
                ..
            })
        ));
    }

    #[test]
    fn test_set_max_length() {
        let mut message = MappedMessage::for_record::<Quote>().unwrap();
        assert!(message.apply("Symbol", "ABCDEFGHIJKLMN").is_err());

        message.set_max_length("Symbol", 20).unwrap();
        message.apply("Symbol", "ABCDEFGHIJKLMN").unwrap();
        assert_eq!(message.require_str("Symbol").unwrap(), "ABCDEFGHIJKLMN");
    }

    #[test]
    fn test_require_missing_value() {
        let message = MappedMessage::for_record::<Quote>().unwrap();
        assert_eq!(
            message.require_str("Symbol").unwrap_err(),
            MappingError::MissingValue {
                field: "Symbol".to_string()
            }
        );
    }

    #[test]
    fn test_foreign_descriptors_are_checked() {
        let unsupported = vec![FieldDescriptor::new("Flags", SemanticType::Int16)];
        assert!(matches!(
            MappedMessage::from_descriptors("Flags".to_string(), unsupported),
            Err(MappingError::UnsupportedType { .. })
        ));

        let duplicate = vec![
            FieldDescriptor::new("Level", SemanticType::Int32),
            FieldDescriptor::new("Level", SemanticType::Int32),
        ];
        assert!(matches!(
            MappedMessage::from_descriptors("Quote".to_string(), duplicate),
            Err(MappingError::DuplicateField { .. })
        ));

        let message = MappedMessage::describe(&sample_quote()).unwrap();
        let rebuilt = MappedMessage::from_descriptors(
            message.type_name().to_string(),
            message.fields().cloned().collect(),
        )
        .unwrap();
        assert_eq!(rebuilt, message);
    }

    #[test]
    fn test_display() {
        let mut message = MappedMessage::for_record::<Quote>().unwrap();
        message.apply("Level", 2).unwrap();
        let text = message.to_string();
        assert!(text.starts_with("Quote"));
        assert!(text.contains("Level = <2>"));
        assert!(text.contains("Symbol = <>"));
    }
}
