/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # IronBus
//!
//! Application-level messaging on top of any publish/subscribe transport.
//!
//! IronBus maps typed records to schema-described messages and layers
//! command/response, broadcast and heartbeat semantics over a pluggable
//! transport.
//!
//! ## Features
//!
//! - **Schema mapping**: Records declare a static field table once
//! - **Reliable commands**: Persistent commands are resent until answered
//! - **Broadcasts**: Info and heartbeat services with listener registries
//! - **Pluggable transport**: Services only depend on the `BusFactory` trait
//! - **Async**: Background loops run as Tokio tasks with cancellation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ironbus::prelude::*;
//!
//! let (bus, _loopback) = MessageBus::in_memory();
//! let commands = CommandService::start(
//!     &bus,
//!     DomainId::new(0),
//!     topics::COMMAND,
//!     topics::COMMAND_RESPONSE,
//!     CommandServiceConfig::default(),
//! )?;
//! commands.send_persistent(Command::new(1, 2, 5, "ESZ6"), 3);
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Field mapping, errors, codes and topics
//! - [`transport`]: Transport traits, bus context and loopback bus
//! - [`service`]: Command, info and heartbeat services

pub mod core {
    //! Field mapping, errors, codes and topics.
    pub use ironbus_core::*;
}

pub mod transport {
    //! Transport traits, bus context and loopback bus.
    pub use ironbus_transport::*;
}

pub mod service {
    //! Command, info and heartbeat services.
    pub use ironbus_service::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ironbus_core::{
        Application, BusError, CommandCode, DomainId, FieldSpec, FieldValue, InfoCode,
        LostMessageStatus, MappedMessage, MappedRecord, MappingError, OrderSetCategory, Result,
        SemanticType, ServiceError, Timestamp, TransportError, topics,
    };

    // Transport
    pub use ironbus_transport::{
        BusFactory, InMemoryBus, MessageBus, MessageListener, Publisher, Subscriber,
    };

    // Services
    pub use ironbus_service::{
        Command, CommandListener, CommandService, CommandServiceConfig, DataSerializer,
        HeartbeatConfig, HeartbeatListener, HeartbeatService, InfoListener, InfoMessage,
        InfoService, ListenerId, ResponseListener, SpecialRtMessage,
    };
}
