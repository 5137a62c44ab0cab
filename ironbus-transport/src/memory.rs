/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! In-memory loopback bus.
//!
//! This module provides a process-local transport suitable for testing and
//! single-process deployments. Delivery is synchronous: `send` returns after
//! every matching subscriber listener has been called.

use crate::traits::{BusFactory, MessageListener, Publisher, Subscriber, split_filters};
use ironbus_core::error::TransportError;
use ironbus_core::message::MappedMessage;
use ironbus_core::types::{DomainId, LostMessageStatus};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

type TopicKey = (DomainId, String);

struct TopicState {
    type_name: String,
    subscribers: Vec<Arc<SubscriberCore>>,
}

struct BusInner {
    topics: RwLock<HashMap<TopicKey, TopicState>>,
    next_subscriber_id: AtomicU64,
    closed: AtomicBool,
}

impl BusInner {
    fn ensure_open(&self, topic: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            Err(TransportError::Closed {
                topic: topic.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Registers the topic schema, or verifies it matches the registered one.
    fn register_topic(
        &self,
        domain: DomainId,
        topic: &str,
        type_name: &str,
    ) -> Result<(), TransportError> {
        let mut topics = self.topics.write();
        let state = topics
            .entry((domain, topic.to_string()))
            .or_insert_with(|| TopicState {
                type_name: type_name.to_string(),
                subscribers: Vec::new(),
            });

        if state.type_name != type_name {
            return Err(TransportError::SchemaMismatch {
                topic: topic.to_string(),
                registered: state.type_name.clone(),
                offered: type_name.to_string(),
            });
        }
        Ok(())
    }

    fn attach(&self, core: Arc<SubscriberCore>) {
        let mut topics = self.topics.write();
        if let Some(state) = topics.get_mut(&(core.domain, core.topic.clone())) {
            state.subscribers.push(core);
        }
    }

    fn detach(&self, domain: DomainId, topic: &str, id: u64) {
        let mut topics = self.topics.write();
        if let Some(state) = topics.get_mut(&(domain, topic.to_string())) {
            state.subscribers.retain(|s| s.id != id);
        }
    }

    fn subscribers(&self, domain: DomainId, topic: &str) -> Vec<Arc<SubscriberCore>> {
        self.topics
            .read()
            .get(&(domain, topic.to_string()))
            .map(|state| state.subscribers.clone())
            .unwrap_or_default()
    }
}

/// Accepted values for one field of the topic schema.
struct ContentFilter {
    field: String,
    values: RwLock<HashSet<String>>,
}

impl ContentFilter {
    fn accepts(&self, message: &MappedMessage) -> bool {
        match message.field(&self.field).and_then(|f| f.value()) {
            Some(value) => self.values.read().contains(&value.to_string()),
            None => false,
        }
    }
}

struct SubscriberCore {
    id: u64,
    domain: DomainId,
    topic: String,
    listeners: RwLock<Vec<Arc<dyn MessageListener>>>,
    filter: Option<ContentFilter>,
    total_lost: AtomicU64,
    closed: AtomicBool,
}

impl SubscriberCore {
    fn deliver(&self, message: &MappedMessage) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Some(filter) = &self.filter
            && !filter.accepts(message)
        {
            return;
        }

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_new_message(message.clone());
        }
    }

    fn report_loss(&self, new_lost: u64, reason: &str) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let total_lost = self.total_lost.fetch_add(new_lost, Ordering::AcqRel) + new_lost;
        let status = LostMessageStatus::new(total_lost, new_lost, reason);

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_message_lost(status.clone());
        }
    }
}

/// Process-local publish/subscribe bus.
///
/// Topics are isolated per [`DomainId`] and bound to the record type they
/// were first created with. Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

impl InMemoryBus {
    /// Creates a new empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: RwLock::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns true once the bus has been shut down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns the number of live subscribers on a topic.
    #[must_use]
    pub fn subscriber_count(&self, domain: DomainId, topic: &str) -> usize {
        self.inner.subscribers(domain, topic).len()
    }

    /// Reports lost messages to every live subscriber of a topic.
    ///
    /// Each subscriber keeps its own cumulative total.
    ///
    /// # Returns
    /// The number of subscribers notified.
    pub fn report_loss(&self, domain: DomainId, topic: &str, new_lost: u64, reason: &str) -> usize {
        let subscribers = self.inner.subscribers(domain, topic);
        warn!(%domain, topic, new_lost, reason, "reporting lost messages");
        for subscriber in &subscribers {
            subscriber.report_loss(new_lost, reason);
        }
        subscribers.len()
    }

    fn new_subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
        filter: Option<ContentFilter>,
    ) -> Result<Arc<dyn Subscriber>, TransportError> {
        self.inner.ensure_open(topic)?;
        self.inner
            .register_topic(domain, topic, template.type_name())?;

        let core = Arc::new(SubscriberCore {
            id: self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed),
            domain,
            topic: topic.to_string(),
            listeners: RwLock::new(Vec::new()),
            filter,
            total_lost: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });
        self.inner.attach(Arc::clone(&core));
        debug!(
            %domain,
            topic,
            id = core.id,
            filtered = core.filter.is_some(),
            "subscriber created"
        );

        Ok(Arc::new(MemorySubscriber {
            inner: Arc::clone(&self.inner),
            core,
        }))
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBus")
            .field("topics", &self.inner.topics.read().len())
            .field("closed", &self.is_shutdown())
            .finish()
    }
}

impl BusFactory for InMemoryBus {
    fn create_publisher(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
    ) -> Result<Arc<dyn Publisher>, TransportError> {
        self.inner.ensure_open(topic)?;
        self.inner
            .register_topic(domain, topic, template.type_name())?;
        debug!(%domain, topic, type_name = template.type_name(), "publisher created");

        Ok(Arc::new(MemoryPublisher {
            inner: Arc::clone(&self.inner),
            domain,
            topic: topic.to_string(),
            type_name: template.type_name().to_string(),
            closed: AtomicBool::new(false),
        }))
    }

    fn create_subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
    ) -> Result<Arc<dyn Subscriber>, TransportError> {
        self.new_subscriber(domain, topic, template, None)
    }

    fn create_filtered_subscriber(
        &self,
        domain: DomainId,
        topic: &str,
        template: &MappedMessage,
        filter_field: &str,
        initial_filters: &str,
    ) -> Result<Arc<dyn Subscriber>, TransportError> {
        if template.field(filter_field).is_none() {
            return Err(TransportError::UnknownFilterField {
                topic: topic.to_string(),
                field: filter_field.to_string(),
            });
        }
        let filter = ContentFilter {
            field: filter_field.to_string(),
            values: RwLock::new(split_filters(initial_filters).into_iter().collect()),
        };
        self.new_subscriber(domain, topic, template, Some(filter))
    }

    fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut topics = self.inner.topics.write();
        for state in topics.values() {
            for subscriber in &state.subscribers {
                subscriber.closed.store(true, Ordering::Release);
            }
        }
        topics.clear();
        info!("in-memory bus shut down");
    }
}

struct MemoryPublisher {
    inner: Arc<BusInner>,
    domain: DomainId,
    topic: String,
    type_name: String,
    closed: AtomicBool,
}

impl Publisher for MemoryPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&self, message: &MappedMessage) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed {
                topic: self.topic.clone(),
            });
        }
        self.inner.ensure_open(&self.topic)?;
        if message.type_name() != self.type_name {
            return Err(TransportError::SchemaMismatch {
                topic: self.topic.clone(),
                registered: self.type_name.clone(),
                offered: message.type_name().to_string(),
            });
        }

        for subscriber in self.inner.subscribers(self.domain, &self.topic) {
            subscriber.deliver(message);
        }
        Ok(())
    }

    fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(domain = %self.domain, topic = %self.topic, "publisher shut down");
        }
    }
}

struct MemorySubscriber {
    inner: Arc<BusInner>,
    core: Arc<SubscriberCore>,
}

impl MemorySubscriber {
    fn filter(&self) -> Result<&ContentFilter, TransportError> {
        self.core
            .filter
            .as_ref()
            .ok_or_else(|| TransportError::NotFiltered {
                topic: self.core.topic.clone(),
            })
    }
}

impl Subscriber for MemorySubscriber {
    fn topic(&self) -> &str {
        &self.core.topic
    }

    fn register_listener(&self, listener: Arc<dyn MessageListener>) {
        self.core.listeners.write().push(listener);
    }

    fn append_filter(&self, value: &str) -> Result<(), TransportError> {
        self.filter()?.values.write().insert(value.to_string());
        Ok(())
    }

    fn remove_filter(&self, value: &str) -> Result<(), TransportError> {
        self.filter()?.values.write().remove(value);
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        self.core.filter.is_some()
    }

    fn shutdown(&self) {
        if !self.core.closed.swap(true, Ordering::AcqRel) {
            self.inner
                .detach(self.core.domain, &self.core.topic, self.core.id);
            debug!(
                domain = %self.core.domain,
                topic = %self.core.topic,
                id = self.core.id,
                "subscriber shut down"
            );
        }
    }
}

impl Drop for MemorySubscriber {
    fn drop(&mut self) {
        self.inner
            .detach(self.core.domain, &self.core.topic, self.core.id);
    }
}
