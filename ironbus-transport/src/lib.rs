/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # IronBus Transport
//!
//! Publish/subscribe transport layer for the IronBus messaging layer.
//!
//! This crate provides:
//! - **Transport traits**: `BusFactory`, `Publisher`, `Subscriber`, `MessageListener`
//! - **Bus context**: `MessageBus`, an explicit handle passed to services
//! - **Loopback bus**: `InMemoryBus`, a process-local transport

pub mod bus;
pub mod memory;
pub mod traits;

pub use bus::MessageBus;
pub use memory::InMemoryBus;
pub use traits::{BusFactory, MessageListener, Publisher, Subscriber, split_filters};
