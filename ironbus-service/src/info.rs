/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Info message record.

use ironbus_core::codes::{Application, InfoCode};
use ironbus_core::error::MappingError;
use ironbus_core::field::{FieldSpec, SemanticType};
use ironbus_core::message::{MappedMessage, MappedRecord};
use ironbus_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of the info payload.
pub const INFO_DATA_MAX_LENGTH: usize = 2048;

/// Mapped field names of an [`InfoMessage`].
pub mod fields {
    /// Message id.
    pub const ID: &str = "ID";
    /// Creation time in nanosecond ticks.
    pub const CREATED_AT: &str = "CreatedAtTickTime";
    /// Sending application.
    pub const FROM_APP: &str = "FromApp";
    /// Info code.
    pub const INFO_CODE: &str = "InfoCode";
    /// Payload.
    pub const DATA: &str = "Data";
}

static INFO_SCHEMA: [FieldSpec; 5] = [
    FieldSpec::string(fields::ID, 36),
    FieldSpec::new(fields::CREATED_AT, SemanticType::Int64),
    FieldSpec::new(fields::FROM_APP, SemanticType::Int32),
    FieldSpec::new(fields::INFO_CODE, SemanticType::Int32),
    FieldSpec::string(fields::DATA, INFO_DATA_MAX_LENGTH),
];

/// One-way informational broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoMessage {
    /// Message id, a hyphenated v4 GUID.
    pub id: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Sending application.
    pub from_app: i32,
    /// Info code, see [`InfoCode`].
    pub info_code: i32,
    /// Free-form payload.
    pub data: String,
}

impl InfoMessage {
    /// Creates an info message with a fresh id and creation time.
    #[must_use]
    pub fn new(from_app: i32, info_code: i32, data: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Timestamp::now(),
            from_app,
            info_code,
            data: data.into(),
        }
    }

    /// Returns the info code as a well-known code, if it is one.
    #[must_use]
    pub fn info(&self) -> Option<InfoCode> {
        InfoCode::from_i32(self.info_code)
    }
}

impl MappedRecord for InfoMessage {
    const TYPE_NAME: &'static str = "InfoMessage";

    fn schema() -> &'static [FieldSpec] {
        &INFO_SCHEMA
    }

    fn write_fields(&self, message: &mut MappedMessage) -> Result<(), MappingError> {
        message.apply(fields::ID, self.id.as_str())?;
        message.apply(fields::CREATED_AT, self.created_at.as_ticks())?;
        message.apply(fields::FROM_APP, self.from_app)?;
        message.apply(fields::INFO_CODE, self.info_code)?;
        message.apply(fields::DATA, self.data.as_str())
    }

    fn read_fields(message: &MappedMessage) -> Result<Self, MappingError> {
        message.expect_record::<Self>()?;
        Ok(Self {
            id: message.require_str(fields::ID)?.to_string(),
            created_at: Timestamp::from_ticks(
                message.read_i64(fields::CREATED_AT)?.unwrap_or_default(),
            ),
            from_app: message.read_i32(fields::FROM_APP)?.unwrap_or_default(),
            info_code: message.read_i32(fields::INFO_CODE)?.unwrap_or_default(),
            data: message
                .read_str(fields::DATA)?
                .unwrap_or_default()
                .to_string(),
        })
    }
}

impl fmt::Display for InfoMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.info() {
            Some(code) => write!(f, "InfoMessage = InfoCode = {code}")?,
            None => write!(f, "InfoMessage = InfoCode = {}", self.info_code)?,
        }
        match Application::from_i32(self.from_app) {
            Some(app) => write!(f, " : From = {app}")?,
            None => write!(f, " : From = {}", self.from_app)?,
        }
        write!(f, " : Data = {} : ID = {}", self.data, self.id)
    }
}
