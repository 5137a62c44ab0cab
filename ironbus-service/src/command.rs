/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Command record.
//!
//! A command and its response share this shape; the response reuses the
//! command's `id` so the sender can correlate them.

use ironbus_core::codes::{Application, CommandCode};
use ironbus_core::error::MappingError;
use ironbus_core::field::{FieldSpec, SemanticType};
use ironbus_core::message::{MappedMessage, MappedRecord};
use ironbus_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of the command payload.
pub const COMMAND_DATA_MAX_LENGTH: usize = 1024;

/// Maximum length of a command id (hyphenated GUID).
pub const COMMAND_ID_MAX_LENGTH: usize = 36;

/// Mapped field names of a [`Command`].
pub mod fields {
    /// Correlation id.
    pub const ID: &str = "ID";
    /// Creation time in nanosecond ticks.
    pub const CREATED_AT: &str = "CreatedAtTickTime";
    /// Last send time in nanosecond ticks.
    pub const SENT_AT: &str = "SentAtTickTime";
    /// Sending application.
    pub const FROM_APP: &str = "FromApp";
    /// Target application.
    pub const TO_APP: &str = "ToApp";
    /// Command code.
    pub const COMMAND_CODE: &str = "CommandCode";
    /// Payload.
    pub const DATA: &str = "Data";
    /// Send attempt budget.
    pub const MAX_SEND_COUNT: &str = "MaxSendCount";
    /// Sends performed so far.
    pub const SEND_COUNT: &str = "SendCount";
}

static COMMAND_SCHEMA: [FieldSpec; 9] = [
    FieldSpec::string(fields::ID, COMMAND_ID_MAX_LENGTH),
    FieldSpec::new(fields::CREATED_AT, SemanticType::Int64),
    FieldSpec::new(fields::SENT_AT, SemanticType::Int64),
    FieldSpec::new(fields::FROM_APP, SemanticType::Int32),
    FieldSpec::new(fields::TO_APP, SemanticType::Int32),
    FieldSpec::new(fields::COMMAND_CODE, SemanticType::Int32),
    FieldSpec::string(fields::DATA, COMMAND_DATA_MAX_LENGTH),
    FieldSpec::new(fields::MAX_SEND_COUNT, SemanticType::Int32),
    FieldSpec::new(fields::SEND_COUNT, SemanticType::Int32),
];

/// A command or command response exchanged between applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Correlation id, a hyphenated v4 GUID for locally created commands.
    pub id: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the last send, set by the command service.
    pub sent_at: Option<Timestamp>,
    /// Sending application.
    pub from_app: i32,
    /// Target application.
    pub to_app: i32,
    /// Command code, see [`CommandCode`].
    pub command_code: i32,
    /// Free-form payload.
    pub data: String,
    /// Send attempt budget for persistent commands.
    pub max_send_count: i32,
    /// Sends performed so far for persistent commands.
    pub send_count: i32,
}

impl Command {
    /// Creates a command with a fresh id and creation time.
    ///
    /// # Arguments
    /// * `from_app` - Sending application
    /// * `to_app` - Target application
    /// * `command_code` - Command code
    /// * `data` - Payload
    #[must_use]
    pub fn new(from_app: i32, to_app: i32, command_code: i32, data: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Timestamp::now(),
            sent_at: None,
            from_app,
            to_app,
            command_code,
            data: data.into(),
            max_send_count: 0,
            send_count: 0,
        }
    }

    /// Creates a command between well-known applications.
    #[must_use]
    pub fn between(
        from: Application,
        to: Application,
        code: CommandCode,
        data: impl Into<String>,
    ) -> Self {
        Self::new(from.as_i32(), to.as_i32(), code.as_i32(), data)
    }

    /// Replaces the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builds the response to this command.
    ///
    /// The response keeps the id and swaps the applications.
    #[must_use]
    pub fn response_to(&self, command_code: i32, data: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            created_at: Timestamp::now(),
            sent_at: None,
            from_app: self.to_app,
            to_app: self.from_app,
            command_code,
            data: data.into(),
            max_send_count: 0,
            send_count: 0,
        }
    }

    /// Returns the command code as a well-known code, if it is one.
    #[must_use]
    pub fn command(&self) -> Option<CommandCode> {
        CommandCode::from_i32(self.command_code)
    }
}

impl MappedRecord for Command {
    const TYPE_NAME: &'static str = "Command";

    fn schema() -> &'static [FieldSpec] {
        &COMMAND_SCHEMA
    }

    fn write_fields(&self, message: &mut MappedMessage) -> Result<(), MappingError> {
        message.apply(fields::ID, self.id.as_str())?;
        message.apply(fields::CREATED_AT, self.created_at.as_ticks())?;
        message.apply_opt(fields::SENT_AT, self.sent_at.map(Timestamp::as_ticks))?;
        message.apply(fields::FROM_APP, self.from_app)?;
        message.apply(fields::TO_APP, self.to_app)?;
        message.apply(fields::COMMAND_CODE, self.command_code)?;
        message.apply(fields::DATA, self.data.as_str())?;
        message.apply(fields::MAX_SEND_COUNT, self.max_send_count)?;
        message.apply(fields::SEND_COUNT, self.send_count)
    }

    fn read_fields(message: &MappedMessage) -> Result<Self, MappingError> {
        message.expect_record::<Self>()?;
        Ok(Self {
            id: message.require_str(fields::ID)?.to_string(),
            created_at: Timestamp::from_ticks(
                message.read_i64(fields::CREATED_AT)?.unwrap_or_default(),
            ),
            sent_at: message.read_i64(fields::SENT_AT)?.map(Timestamp::from_ticks),
            from_app: message.read_i32(fields::FROM_APP)?.unwrap_or_default(),
            to_app: message.read_i32(fields::TO_APP)?.unwrap_or_default(),
            command_code: message.read_i32(fields::COMMAND_CODE)?.unwrap_or_default(),
            data: message
                .read_str(fields::DATA)?
                .unwrap_or_default()
                .to_string(),
            max_send_count: message.read_i32(fields::MAX_SEND_COUNT)?.unwrap_or_default(),
            send_count: message.read_i32(fields::SEND_COUNT)?.unwrap_or_default(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command() {
            Some(code) => write!(f, "CommandCode = {code}")?,
            None => write!(f, "CommandCode = {}", self.command_code)?,
        }
        match Application::from_i32(self.from_app) {
            Some(app) => write!(f, " : From = {app}")?,
            None => write!(f, " : From = {}", self.from_app)?,
        }
        match Application::from_i32(self.to_app) {
            Some(app) => write!(f, " : To = {app}")?,
            None => write!(f, " : To = {}", self.to_app)?,
        }
        write!(
            f,
            " : Data = <{}> : MaxSendCount = {} : SendCount = {} : ID = {}",
            self.data, self.max_send_count, self.send_count, self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_command_has_guid() {
        let command = Command::new(1, 2, 7, "42,NEW_LIMIT");
        assert_eq!(command.id.len(), COMMAND_ID_MAX_LENGTH);
        assert!(Uuid::parse_str(&command.id).is_ok());
        assert_eq!(command.sent_at, None);
        assert_ne!(Command::new(1, 2, 7, "").id, command.id);
    }

    #[test]
    fn test_mapping_round_trip() {
        let mut command = Command::between(
            Application::TickProgram,
            Application::TickWriter,
            CommandCode::RequestPriceSnapshot,
            "ESZ6",
        );
        command.sent_at = Some(Timestamp::from_nanos(1_700_000_000_000_000_000));
        command.max_send_count = 3;
        command.send_count = 1;

        let message = MappedMessage::describe(&command).unwrap();
        assert_eq!(message.type_name(), "Command");
        assert_eq!(Command::read_fields(&message).unwrap(), command);
    }

    #[test]
    fn test_unset_fields_read_as_defaults() {
        let mut message = MappedMessage::for_record::<Command>().unwrap();
        message.apply(fields::ID, "abc").unwrap();

        let command = Command::read_fields(&message).unwrap();
        assert_eq!(command.id, "abc");
        assert_eq!(command.data, "");
        assert_eq!(command.send_count, 0);
        assert_eq!(command.max_send_count, 0);
        assert_eq!(command.sent_at, None);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let message = MappedMessage::for_record::<Command>().unwrap();
        assert!(matches!(
            Command::read_fields(&message),
            Err(MappingError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_data_too_long() {
        let command = Command::new(1, 2, 5, "x".repeat(COMMAND_DATA_MAX_LENGTH + 1));
        assert!(matches!(
            MappedMessage::describe(&command),
            Err(MappingError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn test_response_reuses_id() {
        let command = Command::new(1, 2, 1, "ESZ6").with_id("abc");
        let response = command.response_to(2, "ok");
        assert_eq!(response.id, "abc");
        assert_eq!(response.from_app, 2);
        assert_eq!(response.to_app, 1);
        assert_eq!(
            response.command(),
            Some(CommandCode::RegisterSecurityPriceFeedResponse)
        );
    }

    #[test]
    fn test_display() {
        let command = Command::new(1, 2, 7, "9,ROLL").with_id("abc");
        assert_eq!(
            command.to_string(),
            "CommandCode = PLACE_ORDERSET : From = TICK_PROGRAM : To = TICK_WRITER : \
             Data = <9,ROLL> : MaxSendCount = 0 : SendCount = 0 : ID = abc"
        );
    }
}
