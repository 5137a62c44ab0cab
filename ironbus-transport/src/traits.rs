/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Transport trait definitions.
//!
//! This module defines the abstract interface every publish/subscribe
//! transport implements. Services only ever talk to these traits.

use ironbus_core::error::TransportError;
use ironbus_core::message::MappedMessage;
use ironbus_core::types::{DomainId, LostMessageStatus};
use std::sync::Arc;

/// Callback interface invoked by a subscriber.
///
/// Implementations are called on the transport's delivery thread and must
/// return quickly.
pub trait MessageListener: Send + Sync {
    /// Called with an independent copy of every delivered message.
    fn on_new_message(&self, message: MappedMessage);

    /// Called when the transport reports lost samples.
    fn on_message_lost(&self, status: LostMessageStatus);
}

/// Publishes mapped messages on one topic.
pub trait Publisher: Send + Sync {
    /// Returns the topic this publisher writes to.
    fn topic(&self) -> &str;

    /// Publishes a message.
    ///
    /// # Errors
    /// Returns `TransportError` if the publisher is closed, the message
    /// describes another record type, or the transport rejects it.
    fn send(&self, message: &MappedMessage) -> Result<(), TransportError>;

    /// Releases transport resources. Further sends fail.
    fn shutdown(&self);
}

/// Receives mapped messages from one topic.
pub trait Subscriber: Send + Sync {
    /// Returns the topic this subscriber reads from.
    fn topic(&self) -> &str;

    /// Registers a listener for delivered messages.
    fn register_listener(&self, listener: Arc<dyn MessageListener>);

    /// Adds an accepted value to the content filter.
    ///
    /// # Errors
    /// Returns `TransportError::NotFiltered` if the subscriber was created
    /// without a filter field.
    fn append_filter(&self, value: &str) -> Result<(), TransportError>;

    /// Removes an accepted value from the content filter.
    ///
    /// # Errors
    /// Returns `TransportError::NotFiltered` if the subscriber was created
    /// without a filter field.
    fn remove_filter(&self, value: &str) -> Result<(), TransportError>;

    /// Returns true if the subscriber filters on a field value.
    fn is_filtered(&self) -> bool;

    /// Stops delivery and releases transport resources.
    fn shutdown(&self);
}

/// Creates publishers and subscribers.
///
/// The `template` argument is a mapped message describing the record carried
/// on the topic; transports use it to register the topic's schema.
pub trait BusFactory: Send + Sync {
    /// Creates a publisher.
    ///
    /// # Errors
    /// Returns `TransportError` if the topic cannot be created for this schema.
    fn create_publisher(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
    ) -> Result<Arc<dyn Publisher>, TransportError>;

    /// Creates an unfiltered subscriber.
    ///
    /// # Errors
    /// Returns `TransportError` if the topic cannot be created for this schema.
    fn create_subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
    ) -> Result<Arc<dyn Subscriber>, TransportError>;

    /// Creates a subscriber that filters on one field of the schema.
    ///
    /// # Arguments
    /// * `filter_field` - Field of the template whose value is matched
    /// * `initial_filters` - Comma-delimited list of accepted values
    ///
    /// # Errors
    /// Returns `TransportError` if the topic cannot be created or the filter
    /// field is not part of the schema.
    fn create_filtered_subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
        filter_field: &str,
        initial_filters: &str,
    ) -> Result<Arc<dyn Subscriber>, TransportError>;

    /// Shuts the transport down.
    fn shutdown(&self);
}

/// Splits a comma-delimited filter list, trimming blanks.
#[must_use]
pub fn split_filters(filters: &str) -> Vec<String> {
    filters
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingListener {
        messages: Mutex<Vec<String>>,
        lost: Mutex<u64>,
    }

    impl MessageListener for CountingListener {
        fn on_new_message(&self, message: MappedMessage) {
            self.messages.lock().push(message.type_name().to_string());
        }

        fn on_message_lost(&self, status: LostMessageStatus) {
            *self.lost.lock() += status.new_lost;
        }
    }

    #[test]
    fn test_split_filters() {
        assert_eq!(split_filters("ESZ6, NQZ6,,CLF7 "), vec!["ESZ6", "NQZ6", "CLF7"]);
        assert!(split_filters("").is_empty());
        assert!(split_filters(" , ").is_empty());
    }

    #[test]
    fn test_listener_object_safety() {
        let listener = Arc::new(CountingListener::default());
        let dyn_listener: Arc<dyn MessageListener> = listener.clone();
        let message = MappedMessage::from_schema("Empty", &[]).unwrap();
        dyn_listener.on_new_message(message);
        dyn_listener.on_message_lost(LostMessageStatus::new(2, 2, "test"));
        assert_eq!(listener.messages.lock().as_slice(), ["Empty"]);
        assert_eq!(*listener.lost.lock(), 2);
    }
}
