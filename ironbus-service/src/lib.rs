/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # IronBus Service
//!
//! Application-level messaging services for the IronBus messaging layer.
//!
//! This crate provides:
//! - **Records**: `Command`, `InfoMessage`, `SpecialRtMessage`
//! - **Command service**: Command/response exchange with persistent retry
//! - **Info service**: One-way broadcasts on a topic
//! - **Heartbeat service**: Periodic liveness broadcasts with self-filtering
//! - **Notification queue**: Hand-off from transport callbacks to service loops
//! - **Configuration**: Service timings and identity
//!
//! Services spawn their loops on the Tokio runtime they are started from and
//! are stopped with `stop_service()` followed by `join().await`.

pub mod command;
pub mod command_service;
pub mod config;
pub mod heartbeat;
pub mod info;
pub mod info_service;
pub mod listeners;
pub mod queue;
pub mod registry;
pub mod serializer;
pub mod special_rt;

pub use command::Command;
pub use command_service::CommandService;
pub use config::{
    CommandServiceConfig, CommandServiceConfigBuilder, HeartbeatConfig, HeartbeatConfigBuilder,
};
pub use heartbeat::HeartbeatService;
pub use info::InfoMessage;
pub use info_service::InfoService;
pub use listeners::{
    CommandListener, HeartbeatListener, InfoListener, ListenerId, ListenerSet, ResponseListener,
};
pub use queue::{NotificationReceiver, NotificationSender, notification_queue};
pub use registry::{PendingCommand, PersistentRegistry, RetryOutcome};
pub use serializer::DataSerializer;
pub use special_rt::SpecialRtMessage;
