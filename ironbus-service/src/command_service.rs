/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Command service.
//!
//! Sends commands on one topic and receives commands or responses on another.
//! The same service type is used on both ends of a conversation:
//!
//! - requester: sends on `Command`, listens on `CommandResponse`
//! - responder: sends on `CommandResponse`, listens on `Command`
//!
//! Persistent commands are kept until a message with the same id arrives, and
//! are resent by a background retry loop until their send budget is spent.

use crate::command::{Command, fields};
use crate::config::CommandServiceConfig;
use crate::listeners::{CommandListener, ListenerId, ListenerSet, ResponseListener};
use crate::queue::{NotificationReceiver, QueueingListener, notification_queue};
use crate::registry::PersistentRegistry;
use ironbus_core::error::{BusError, ServiceError};
use ironbus_core::message::{MappedMessage, MappedRecord};
use ironbus_core::types::{DomainId, Timestamp};
use ironbus_transport::{MessageBus, Publisher, Subscriber};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SERVICE_NAME: &str = "CommandService";

struct CommandShared {
    domain: DomainId,
    send_topic: String,
    listen_topic: String,
    config: CommandServiceConfig,
    publisher: Arc<dyn Publisher>,
    subscriber: Arc<dyn Subscriber>,
    /// Reused outbound message.
    outbound: Mutex<MappedMessage>,
    /// Never held while publishing.
    registry: Mutex<PersistentRegistry>,
    command_listeners: ListenerSet<dyn CommandListener>,
    response_listeners: ListenerSet<dyn ResponseListener>,
    lost: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl CommandShared {
    /// Stamps, maps and publishes a command. Failures are logged.
    fn send(&self, command: &mut Command) {
        command.sent_at = Some(Timestamp::now());

        let mut outbound = self.outbound.lock();
        outbound.reset();
        let result = command
            .write_fields(&mut outbound)
            .map_err(BusError::from)
            .and_then(|()| self.publisher.send(&outbound).map_err(BusError::from));

        match result {
            Ok(()) => debug!(topic = %self.send_topic, id = %command.id, %command, "sent command"),
            Err(e) => error!(
                domain = %self.domain,
                topic = %self.send_topic,
                id = %command.id,
                error = %e,
                "failed to send command"
            ),
        }
    }

    fn handle_inbound(&self, message: MappedMessage) {
        if let Ok(Some(id)) = message.read_str(fields::ID) {
            let mut registry = self.registry.lock();
            if registry.acknowledge(id).is_some() {
                debug!(id, pending = registry.len(), "persistent command acknowledged");
            }
        }

        let command = match Command::read_fields(&message) {
            Ok(command) => command,
            Err(e) => {
                error!(topic = %self.listen_topic, error = %e, "failed to read inbound command");
                return;
            }
        };
        debug!(topic = %self.listen_topic, %command, "received command/response");

        if self
            .command_listeners
            .notify_until(&self.cancel, |l| l.on_command(&command))
        {
            self.response_listeners
                .notify_until(&self.cancel, |l| l.on_response(&command));
        }
    }

    fn retry_pass(&self) {
        let mut due = Vec::new();
        {
            let mut registry = self.registry.lock();
            if registry.is_empty() {
                return;
            }
            let outcome = registry.retry_pass(Instant::now(), self.config.resend_threshold, |c| {
                due.push(c.clone());
            });
            if outcome.expired > 0 {
                debug!(
                    expired = outcome.expired,
                    pending = registry.len(),
                    "persistent commands reached their send budget"
                );
            }
        }

        for mut command in due {
            if self.cancel.is_cancelled() {
                break;
            }
            self.send(&mut command);
        }
    }
}

async fn receive_loop(
    shared: Arc<CommandShared>,
    mut receiver: NotificationReceiver<MappedMessage>,
) {
    while let Some(message) = receiver.recv().await {
        shared.handle_inbound(message);
    }
    let dropped = receiver.clear();
    debug!(topic = %shared.listen_topic, dropped, "command receive loop stopped");
}

async fn retry_loop(shared: Arc<CommandShared>) {
    let mut ticker = interval(shared.config.retry_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            _ = ticker.tick() => shared.retry_pass(),
        }
    }
    debug!(topic = %shared.send_topic, "command retry loop stopped");
}

/// Sends commands and dispatches inbound commands and responses.
///
/// Every inbound message is delivered to both the command listeners and the
/// response listeners; listeners tell them apart by `command_code`.
pub struct CommandService {
    shared: Arc<CommandShared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CommandService {
    /// Creates the publisher and subscriber and starts the background loops.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Arguments
    /// * `bus` - Transport context
    /// * `domain` - Domain for both topics
    /// * `send_topic` - Topic commands are published on
    /// * `listen_topic` - Topic inbound commands/responses arrive on
    /// * `config` - Retry timings
    ///
    /// # Errors
    /// Returns `BusError` if there is no runtime, the configuration is
    /// invalid, or the transport refuses a topic.
    pub fn start(
        bus: &MessageBus,
        domain: DomainId,
        send_topic: &str,
        listen_topic: &str,
        config: CommandServiceConfig,
    ) -> Result<Self, BusError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ServiceError::NoRuntime {
            service: SERVICE_NAME,
        })?;

        let template = MappedMessage::for_record::<Command>()?;
        let publisher = bus.publisher(domain, send_topic, &template)?;
        info!(%domain, topic = send_topic, "created command publisher");

        let subscriber = bus
            .subscriber(domain, listen_topic, &template)
            .inspect_err(|_| publisher.shutdown())?;
        info!(%domain, topic = listen_topic, "created command subscriber");

        let cancel = CancellationToken::new();
        let (sender, receiver) = notification_queue(cancel.clone());
        let lost = Arc::new(AtomicU64::new(0));
        subscriber.register_listener(Arc::new(QueueingListener::new(
            SERVICE_NAME,
            listen_topic,
            sender,
            Arc::clone(&lost),
        )));

        let shared = Arc::new(CommandShared {
            domain,
            send_topic: send_topic.to_string(),
            listen_topic: listen_topic.to_string(),
            config,
            publisher,
            subscriber,
            outbound: Mutex::new(template),
            registry: Mutex::new(PersistentRegistry::new()),
            command_listeners: ListenerSet::new(),
            response_listeners: ListenerSet::new(),
            lost,
            cancel,
        });

        let tasks = vec![
            runtime.spawn(receive_loop(Arc::clone(&shared), receiver)),
            runtime.spawn(retry_loop(Arc::clone(&shared))),
        ];

        Ok(Self {
            shared,
            tasks: Mutex::new(tasks),
        })
    }

    /// Registers a listener for inbound commands.
    pub fn register_command_listener(&self, listener: Arc<dyn CommandListener>) -> ListenerId {
        self.shared.command_listeners.register(listener)
    }

    /// Removes a command listener.
    pub fn remove_command_listener(&self, id: ListenerId) -> bool {
        self.shared.command_listeners.remove(id)
    }

    /// Registers a listener for inbound command responses.
    pub fn register_response_listener(&self, listener: Arc<dyn ResponseListener>) -> ListenerId {
        self.shared.response_listeners.register(listener)
    }

    /// Removes a response listener.
    pub fn remove_response_listener(&self, id: ListenerId) -> bool {
        self.shared.response_listeners.remove(id)
    }

    /// Sends a command once.
    ///
    /// Sets `sent_at` on the command. Mapping and transport failures are
    /// logged, not returned.
    pub fn send_command(&self, command: &mut Command) {
        self.shared.send(command);
    }

    /// Sends a command and keeps resending it until a message with the same
    /// id arrives or `max_send_count` sends have been made.
    ///
    /// A command whose budget is spent is dropped without notification.
    pub fn send_persistent(&self, mut command: Command, max_send_count: i32) {
        if self.shared.cancel.is_cancelled() {
            warn!(id = %command.id, "command service stopped, persistent command not sent");
            return;
        }

        command.max_send_count = max_send_count;
        command.send_count = 1;
        if command.send_count < command.max_send_count {
            self.shared
                .registry
                .lock()
                .insert(command.clone(), Instant::now());
        }
        self.shared.send(&mut command);
    }

    /// Returns true if a persistent command with this id awaits a response.
    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.shared.registry.lock().contains(id)
    }

    /// Returns the number of persistent commands awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Returns the number of messages the transport reported lost.
    #[must_use]
    pub fn lost_message_count(&self) -> u64 {
        self.shared.lost.load(Ordering::Relaxed)
    }

    /// Returns the domain of both topics.
    #[must_use]
    pub fn domain(&self) -> DomainId {
        self.shared.domain
    }

    /// Returns the topic commands are sent on.
    #[must_use]
    pub fn send_topic(&self) -> &str {
        &self.shared.send_topic
    }

    /// Returns the topic inbound messages arrive on.
    #[must_use]
    pub fn listen_topic(&self) -> &str {
        &self.shared.listen_topic
    }

    /// Returns true until [`stop_service`](Self::stop_service) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.cancel.is_cancelled()
    }

    /// Stops the loops, drops queued messages and shuts the transport
    /// endpoints down. Messages still queued are discarded unprocessed.
    pub fn stop_service(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        self.shared.cancel.cancel();
        self.shared.publisher.shutdown();
        self.shared.subscriber.shutdown();
        info!(
            domain = %self.shared.domain,
            send_topic = %self.shared.send_topic,
            listen_topic = %self.shared.listen_topic,
            "command service stopped"
        );
    }

    /// Waits for the background loops to finish.
    pub async fn join(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "command service task failed");
            }
        }
    }
}

impl Drop for CommandService {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl std::fmt::Debug for CommandService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandService")
            .field("domain", &self.shared.domain)
            .field("send_topic", &self.shared.send_topic)
            .field("listen_topic", &self.shared.listen_topic)
            .field("pending", &self.pending_count())
            .field("running", &self.is_running())
            .finish()
    }
}
