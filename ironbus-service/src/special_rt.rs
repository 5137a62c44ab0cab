/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Special realtime data record.
//!
//! Carried on the `SpecialRTData` topic. The text form is
//! `"{contract}|{field1}={value1}|{field2}={value2}..."`.

use ironbus_core::error::MappingError;
use ironbus_core::field::FieldSpec;
use ironbus_core::message::{MappedMessage, MappedRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Maximum length of the contract name.
pub const CONTRACT_MAX_LENGTH: usize = 50;

/// Maximum length of the data section.
pub const SPECIAL_RT_DATA_MAX_LENGTH: usize = 2048;

/// Mapped field names of a [`SpecialRtMessage`].
pub mod fields {
    /// Contract name.
    pub const CONTRACT: &str = "Contract";
    /// Pipe-delimited `name=value` pairs.
    pub const DATA: &str = "Data";
}

static SPECIAL_RT_SCHEMA: [FieldSpec; 2] = [
    FieldSpec::string(fields::CONTRACT, CONTRACT_MAX_LENGTH),
    FieldSpec::string(fields::DATA, SPECIAL_RT_DATA_MAX_LENGTH),
];

/// Realtime values for one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRtMessage {
    /// Contract name, e.g. `ADM1`.
    pub contract: String,
    /// Pipe-delimited `name=value` pairs.
    pub data: String,
}

impl SpecialRtMessage {
    /// Creates a message from its parts.
    #[must_use]
    pub fn new(contract: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            data: data.into(),
        }
    }

    /// Parses the pipe-delimited text form.
    ///
    /// # Errors
    /// Returns `MappingError::InvalidValue` if there is no `|` separator.
    pub fn parse(text: &str) -> Result<Self, MappingError> {
        match text.split_once('|') {
            Some((contract, data)) => Ok(Self::new(contract, data)),
            None => Err(MappingError::InvalidValue {
                field: fields::DATA.to_string(),
                reason: format!("expected contract|data, got <{text}>"),
            }),
        }
    }

    /// Iterates over the `name=value` pairs of the data section.
    ///
    /// Blank tokens and tokens without `=` are skipped.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data
            .split('|')
            .filter(|token| !token.trim().is_empty())
            .filter_map(|token| token.split_once('='))
    }

    /// Returns the value of a data field, or `None` if it is absent.
    #[must_use]
    pub fn get_value(&self, field: &str) -> Option<&str> {
        self.pairs()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Collects the data fields into a map. The first occurrence of a name wins.
    #[must_use]
    pub fn parse_fields(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::new();
        for (name, value) in self.pairs() {
            map.entry(name).or_insert(value);
        }
        map
    }
}

impl FromStr for SpecialRtMessage {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SpecialRtMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.contract, self.data)
    }
}

impl MappedRecord for SpecialRtMessage {
    const TYPE_NAME: &'static str = "SpecialRTMessage";

    fn schema() -> &'static [FieldSpec] {
        &SPECIAL_RT_SCHEMA
    }

    fn write_fields(&self, message: &mut MappedMessage) -> Result<(), MappingError> {
        message.apply(fields::CONTRACT, self.contract.as_str())?;
        message.apply(fields::DATA, self.data.as_str())
    }

    fn read_fields(message: &MappedMessage) -> Result<Self, MappingError> {
        message.expect_record::<Self>()?;
        Ok(Self {
            contract: message.require_str(fields::CONTRACT)?.to_string(),
            data: message
                .read_str(fields::DATA)?
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_form() {
        let message: SpecialRtMessage = "ADM1|bid=101.5|ask=101.75||last=101.6".parse().unwrap();
        assert_eq!(message.contract, "ADM1");
        assert_eq!(message.get_value("ask"), Some("101.75"));
        assert_eq!(message.get_value("last"), Some("101.6"));
        assert_eq!(message.get_value("volume"), None);
        assert_eq!(message.parse_fields().len(), 3);
    }

    #[test]
    fn test_parse_without_separator() {
        assert!(matches!(
            SpecialRtMessage::parse("ADM1"),
            Err(MappingError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let message = SpecialRtMessage::new("ADM2", "bid=1|ask=2");
        assert_eq!(message.to_string(), "ADM2|bid=1|ask=2");
        assert_eq!(SpecialRtMessage::parse(&message.to_string()).unwrap(), message);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let message = SpecialRtMessage::new("ADM1", "bid=1|bid=2");
        assert_eq!(message.get_value("bid"), Some("1"));
        assert_eq!(message.parse_fields()["bid"], "1");
    }

    #[test]
    fn test_mapping() {
        let message = SpecialRtMessage::new("ADM1", "bid=1");
        let mapped = MappedMessage::describe(&message).unwrap();
        assert_eq!(mapped.type_name(), "SpecialRTMessage");
        assert_eq!(SpecialRtMessage::read_fields(&mapped).unwrap(), message);

        let long = SpecialRtMessage::new("X".repeat(CONTRACT_MAX_LENGTH + 1), "");
        assert!(MappedMessage::describe(&long).is_err());
    }
}
