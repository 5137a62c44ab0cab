/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Message bus context.
//!
//! A [`MessageBus`] is created explicitly by the application and handed to
//! every service that needs a transport. There is no process-wide instance.

use crate::memory::InMemoryBus;
use crate::traits::{BusFactory, Publisher, Subscriber};
use ironbus_core::error::TransportError;
use ironbus_core::message::MappedMessage;
use ironbus_core::types::DomainId;
use std::sync::Arc;
use tracing::info;

/// Shared handle to a transport factory.
#[derive(Clone)]
pub struct MessageBus {
    factory: Arc<dyn BusFactory>,
}

impl MessageBus {
    /// Wraps a transport factory.
    #[must_use]
    pub fn new(factory: Arc<dyn BusFactory>) -> Self {
        Self { factory }
    }

    /// Creates a bus backed by a fresh [`InMemoryBus`].
    ///
    /// Returns the bus together with the loopback handle so tests can drive
    /// loss reports and inspect subscribers.
    #[must_use]
    pub fn in_memory() -> (Self, InMemoryBus) {
        let memory = InMemoryBus::new();
        (Self::new(Arc::new(memory.clone())), memory)
    }

    /// Returns the underlying factory.
    #[must_use]
    pub fn factory(&self) -> &Arc<dyn BusFactory> {
        &self.factory
    }

    /// Creates a publisher for a record type.
    ///
    /// # Errors
    /// Returns `TransportError` if the transport rejects the topic.
    pub fn publisher(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
    ) -> Result<Arc<dyn Publisher>, TransportError> {
        self.factory.create_publisher(domain, topic, template)
    }

    /// Creates an unfiltered subscriber for a record type.
    ///
    /// # Errors
    /// Returns `TransportError` if the transport rejects the topic.
    pub fn subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
    ) -> Result<Arc<dyn Subscriber>, TransportError> {
        self.factory.create_subscriber(domain, topic, template)
    }

    /// Creates a content-filtered subscriber.
    ///
    /// # Errors
    /// Returns `TransportError` if the transport rejects the topic or field.
    pub fn filtered_subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
        filter_field: &str,
        initial_filters: &str,
    ) -> Result<Arc<dyn Subscriber>, TransportError> {
        self.factory
            .create_filtered_subscriber(domain, topic, template, filter_field, initial_filters)
    }

    /// Shuts the underlying transport down.
    pub fn shutdown(&self) {
        info!("shutting down message bus");
        self.factory.shutdown();
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironbus_core::field::{FieldSpec, SemanticType};

    static PING: [FieldSpec; 1] = [FieldSpec::new("Seq", SemanticType::Int64)];

    #[test]
    fn test_in_memory_bus_shares_state() {
        let (bus, memory) = MessageBus::in_memory();
        let template = MappedMessage::from_schema("Ping", &PING).unwrap();
        let domain = DomainId::new(3);

        let _subscriber = bus.subscriber(domain, "Info", &template).unwrap();
        assert_eq!(memory.subscriber_count(domain, "Info"), 1);

        let clone = bus.clone();
        clone.shutdown();
        assert!(memory.is_shutdown());
        assert!(bus.publisher(domain, "Info", &template).is_err());
    }

    #[test]
    fn test_filtered_subscriber_via_context() {
        let (bus, _memory) = MessageBus::in_memory();
        let template = MappedMessage::from_schema("Ping", &PING).unwrap();
        let subscriber = bus
            .filtered_subscriber(DomainId::new(0), "Info", &template, "Seq", "1,2")
            .unwrap();
        assert!(subscriber.is_filtered());
    }
}
