/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # IronBus Core
//!
//! Core types, traits, and error definitions for the IronBus messaging layer.
//!
//! This crate provides the fundamental building blocks used across all IronBus crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field types**: `SemanticType`, `FieldValue`, `FieldSpec`, `FieldDescriptor`
//! - **Message types**: `MappedMessage` and the `MappedRecord` trait
//! - **Core types**: `DomainId`, `Timestamp`, `LostMessageStatus`
//! - **Codes and topics**: well-known command/info codes and topic names
//!
//! ## Mapping Model
//!
//! A record type declares a static schema table once. A `MappedMessage` built
//! from that table is reused across sends: reset, refill, publish.

pub mod codes;
pub mod error;
pub mod field;
pub mod message;
pub mod topics;
pub mod types;

pub use codes::{Application, CommandCode, InfoCode, OrderSetCategory, UnknownCategory};
pub use error::{BusError, MappingError, Result, ServiceError, TransportError};
pub use field::{DEFAULT_STRING_MAX_LENGTH, FieldDescriptor, FieldSpec, FieldValue, SemanticType};
pub use message::{MappedMessage, MappedRecord};
pub use types::{DomainId, LostMessageStatus, Timestamp};
