/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Info service.
//!
//! Publishes and receives [`InfoMessage`] broadcasts on a single topic. Every
//! service instance also receives its own broadcasts.

use crate::info::InfoMessage;
use crate::listeners::{InfoListener, ListenerId, ListenerSet};
use crate::queue::{NotificationReceiver, QueueingListener, notification_queue};
use ironbus_core::error::{BusError, ServiceError};
use ironbus_core::message::{MappedMessage, MappedRecord};
use ironbus_core::types::DomainId;
use ironbus_transport::{MessageBus, Publisher, Subscriber};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const SERVICE_NAME: &str = "InfoService";

struct InfoShared {
    domain: DomainId,
    topic: String,
    publisher: Arc<dyn Publisher>,
    subscriber: Arc<dyn Subscriber>,
    outbound: Mutex<MappedMessage>,
    listeners: ListenerSet<dyn InfoListener>,
    lost: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl InfoShared {
    fn send(&self, message: &InfoMessage) {
        let mut outbound = self.outbound.lock();
        outbound.reset();
        let result = message
            .write_fields(&mut outbound)
            .map_err(BusError::from)
            .and_then(|()| self.publisher.send(&outbound).map_err(BusError::from));

        match result {
            Ok(()) => debug!(topic = %self.topic, %message, "sent info message"),
            Err(e) => error!(
                domain = %self.domain,
                topic = %self.topic,
                id = %message.id,
                error = %e,
                "failed to send info message"
            ),
        }
    }

    fn handle_inbound(&self, message: MappedMessage) {
        match InfoMessage::read_fields(&message) {
            Ok(info) => {
                debug!(topic = %self.topic, %info, "received info message");
                self.listeners
                    .notify_until(&self.cancel, |l| l.on_info(&info));
            }
            Err(e) => {
                error!(topic = %self.topic, error = %e, "failed to read inbound info message");
            }
        }
    }
}

async fn receive_loop(shared: Arc<InfoShared>, mut receiver: NotificationReceiver<MappedMessage>) {
    while let Some(message) = receiver.recv().await {
        shared.handle_inbound(message);
    }
    let dropped = receiver.clear();
    debug!(topic = %shared.topic, dropped, "info receive loop stopped");
}

/// Sends and receives info messages on one topic.
pub struct InfoService {
    shared: Arc<InfoShared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl InfoService {
    /// Creates the publisher and subscriber and starts the receive loop.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `BusError` if there is no runtime or the transport refuses the topic.
    pub fn start(bus: &MessageBus, domain: DomainId, topic: &str) -> Result<Self, BusError> {
        let runtime = Handle::try_current().map_err(|_| ServiceError::NoRuntime {
            service: SERVICE_NAME,
        })?;

        let template = MappedMessage::for_record::<InfoMessage>()?;
        let publisher = bus.publisher(domain, topic, &template)?;
        let subscriber = bus
            .subscriber(domain, topic, &template)
            .inspect_err(|_| publisher.shutdown())?;
        info!(%domain, topic, "created info publisher and subscriber");

        let cancel = CancellationToken::new();
        let (sender, receiver) = notification_queue(cancel.clone());
        let lost = Arc::new(AtomicU64::new(0));
        subscriber.register_listener(Arc::new(QueueingListener::new(
            SERVICE_NAME,
            topic,
            sender,
            Arc::clone(&lost),
        )));

        let shared = Arc::new(InfoShared {
            domain,
            topic: topic.to_string(),
            publisher,
            subscriber,
            outbound: Mutex::new(template),
            listeners: ListenerSet::new(),
            lost,
            cancel,
        });
        let task = runtime.spawn(receive_loop(Arc::clone(&shared), receiver));

        Ok(Self {
            shared,
            task: Mutex::new(Some(task)),
        })
    }

    /// Publishes an info message. Failures are logged, not returned.
    pub fn send_info_message(&self, message: &InfoMessage) {
        self.shared.send(message);
    }

    /// Registers a listener for inbound info messages.
    pub fn register_info_listener(&self, listener: Arc<dyn InfoListener>) -> ListenerId {
        self.shared.listeners.register(listener)
    }

    /// Removes an info listener.
    pub fn remove_info_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Returns the number of messages the transport reported lost.
    #[must_use]
    pub fn lost_message_count(&self) -> u64 {
        self.shared.lost.load(Ordering::Relaxed)
    }

    /// Returns the domain of the topic.
    #[must_use]
    pub fn domain(&self) -> DomainId {
        self.shared.domain
    }

    /// Returns the topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.shared.topic
    }

    /// Returns true until [`stop_service`](Self::stop_service) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.cancel.is_cancelled()
    }

    /// Returns the token cancelled by [`stop_service`](Self::stop_service).
    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.shared.cancel
    }

    /// Stops the receive loop, drops queued messages and shuts the transport
    /// endpoints down.
    pub fn stop_service(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        self.shared.cancel.cancel();
        self.shared.publisher.shutdown();
        self.shared.subscriber.shutdown();
        info!(domain = %self.shared.domain, topic = %self.shared.topic, "info service stopped");
    }

    /// Waits for the receive loop to finish.
    pub async fn join(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            error!(error = %e, "info service task failed");
        }
    }
}

impl Drop for InfoService {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl std::fmt::Debug for InfoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoService")
            .field("domain", &self.shared.domain)
            .field("topic", &self.shared.topic)
            .field("listeners", &self.shared.listeners.len())
            .field("running", &self.is_running())
            .finish()
    }
}
