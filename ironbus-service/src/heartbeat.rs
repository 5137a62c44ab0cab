/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Heartbeat service.
//!
//! Broadcasts periodic liveness messages on the `Heartbeat` topic and relays
//! heartbeats from other applications to registered listeners. Heartbeats
//! stamped with this application's id are never relayed.

use crate::config::HeartbeatConfig;
use crate::info::InfoMessage;
use crate::info_service::InfoService;
use crate::listeners::{HeartbeatListener, ListenerId, ListenerSet};
use ironbus_core::codes::InfoCode;
use ironbus_core::error::{BusError, ServiceError};
use ironbus_core::topics;
use ironbus_transport::MessageBus;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "HeartbeatService";

struct SenderTask {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

async fn send_heartbeats(
    info_service: Arc<InfoService>,
    app_id: i32,
    label: String,
    interval: Duration,
    stop: CancellationToken,
) {
    info!(app_id, %label, ?interval, "start sending heartbeat");
    loop {
        let beat = InfoMessage::new(app_id, InfoCode::Heartbeat.as_i32(), label.as_str());
        info_service.send_info_message(&beat);

        tokio::select! {
            biased;
            () = stop.cancelled() => break,
            () = sleep(interval) => {}
        }
    }
    info!(app_id, "stop sending heartbeat");
}

/// Periodic liveness broadcaster and heartbeat relay.
pub struct HeartbeatService {
    config: HeartbeatConfig,
    label: String,
    info: Arc<InfoService>,
    listeners: Arc<ListenerSet<dyn HeartbeatListener>>,
    sender: Mutex<Option<SenderTask>>,
    runtime: Handle,
}

impl HeartbeatService {
    /// Starts the underlying info service on the `Heartbeat` topic and, if
    /// configured, the heartbeat sender.
    ///
    /// # Errors
    /// Returns `BusError` if there is no runtime, the configuration is
    /// invalid, or the transport refuses the topic.
    pub fn start(bus: &MessageBus, config: HeartbeatConfig) -> Result<Self, BusError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ServiceError::NoRuntime {
            service: SERVICE_NAME,
        })?;

        let info = Arc::new(InfoService::start(bus, config.domain, topics::HEARTBEAT)?);
        let listeners: Arc<ListenerSet<dyn HeartbeatListener>> = Arc::new(ListenerSet::new());

        let relay = {
            let listeners = Arc::clone(&listeners);
            let app_id = config.app_id;
            let cancel = info.cancel_token().clone();
            move |message: &InfoMessage| {
                if message.from_app != app_id {
                    listeners.notify_until(&cancel, |l| l.on_heartbeat(message));
                }
            }
        };
        info.register_info_listener(Arc::new(relay));

        let service = Self {
            label: config.label(),
            config,
            info,
            listeners,
            sender: Mutex::new(None),
            runtime,
        };
        if service.config.start_sending {
            service.start_sending_heartbeat();
        }
        Ok(service)
    }

    /// Starts the heartbeat sender if it is not already running.
    ///
    /// # Returns
    /// `true` if a sender is running when this returns. A zero interval or a
    /// stopped service refuses to start.
    pub fn start_sending_heartbeat(&self) -> bool {
        if self.config.interval.is_zero() {
            error!(
                app_id = self.config.app_id,
                "unable to start sending heartbeats, the sending interval is zero"
            );
            return false;
        }
        if !self.info.is_running() {
            warn!(app_id = self.config.app_id, "heartbeat service stopped, sender not started");
            return false;
        }

        let mut sender = self.sender.lock();
        if let Some(task) = sender.as_ref()
            && !task.stop.is_cancelled()
        {
            return true;
        }

        let stop = CancellationToken::new();
        let handle = self.runtime.spawn(send_heartbeats(
            Arc::clone(&self.info),
            self.config.app_id,
            self.label.clone(),
            self.config.interval,
            stop.clone(),
        ));
        *sender = Some(SenderTask { stop, handle });
        true
    }

    /// Stops the heartbeat sender. The wait between beats is interrupted.
    pub fn stop_sending_heartbeat(&self) {
        if let Some(task) = self.sender.lock().as_ref() {
            task.stop.cancel();
        }
    }

    /// Returns true while the heartbeat sender runs.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .is_some_and(|task| !task.stop.is_cancelled() && !task.handle.is_finished())
    }

    /// Broadcasts a single shutdown notice.
    pub fn send_shutdown_message(&self) {
        info!(app_id = self.config.app_id, "sending a shutdown message");
        let message = InfoMessage::new(
            self.config.app_id,
            InfoCode::Shutdown.as_i32(),
            self.label.as_str(),
        );
        self.info.send_info_message(&message);
    }

    /// Registers a listener for heartbeats from other applications.
    pub fn register_heartbeat_listener(&self, listener: Arc<dyn HeartbeatListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Removes a heartbeat listener.
    pub fn remove_heartbeat_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Returns the heartbeat label, `"{APP_LABEL}_{host}"`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the application id stamped on outgoing heartbeats.
    #[must_use]
    pub fn app_id(&self) -> i32 {
        self.config.app_id
    }

    /// Returns the configuration the service was started with.
    #[must_use]
    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    /// Stops the info service and the heartbeat sender.
    pub fn stop_service(&self) {
        self.info.stop_service();
        self.stop_sending_heartbeat();
    }

    /// Waits for the sender and the info service loop to finish.
    pub async fn join(&self) {
        let task = self.sender.lock().take();
        if let Some(task) = task
            && let Err(e) = task.handle.await
        {
            error!(error = %e, "heartbeat sender task failed");
        }
        self.info.join().await;
    }
}

impl Drop for HeartbeatService {
    fn drop(&mut self) {
        self.stop_sending_heartbeat();
    }
}

impl std::fmt::Debug for HeartbeatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatService")
            .field("label", &self.label)
            .field("app_id", &self.config.app_id)
            .field("interval", &self.config.interval)
            .field("sending", &self.is_sending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironbus_core::types::DomainId;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::mpsc;

    const DOMAIN: DomainId = DomainId::new(5);

    fn config(label: &str, app_id: i32) -> HeartbeatConfig {
        HeartbeatConfig::new(label, app_id, DOMAIN)
            .with_interval(Duration::from_secs(1))
            .with_host_name("host")
    }

    fn observe(bus: &MessageBus) -> (InfoService, mpsc::UnboundedReceiver<InfoMessage>) {
        let observer = InfoService::start(bus, DOMAIN, topics::HEARTBEAT).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        observer.register_info_listener(Arc::new(move |m: &InfoMessage| {
            let _ = tx.send(m.clone());
        }));
        (observer, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<InfoMessage>) -> Vec<InfoMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_are_periodic() {
        let (bus, _memory) = MessageBus::in_memory();
        let (_observer, mut rx) = observe(&bus);
        let service = HeartbeatService::start(&bus, config("tickwriter", 2)).unwrap();

        sleep(Duration::from_millis(3500)).await;
        let beats = drain(&mut rx);

        assert_eq!(beats.len(), 4);
        assert!(beats.iter().all(|b| b.info() == Some(InfoCode::Heartbeat)));
        assert!(beats.iter().all(|b| b.from_app == 2 && b.data == "TICKWRITER_host"));
        assert_ne!(beats[0].id, beats[1].id);
        assert!(service.is_sending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_heartbeats_are_not_relayed() {
        let (bus, _memory) = MessageBus::in_memory();
        let first = HeartbeatService::start(&bus, config("program", 1)).unwrap();
        let second = HeartbeatService::start(&bus, config("writer", 2)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        first.register_heartbeat_listener(Arc::new(move |m: &InfoMessage| {
            let _ = tx.send(m.from_app);
        }));

        sleep(Duration::from_millis(2500)).await;
        let mut senders = Vec::new();
        while let Ok(app) = rx.try_recv() {
            senders.push(app);
        }

        assert!(!senders.is_empty());
        assert!(senders.iter().all(|app| *app == 2));
        assert_eq!(second.label(), "WRITER_host");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_sending() {
        let (bus, _memory) = MessageBus::in_memory();
        let (_observer, mut rx) = observe(&bus);
        let service =
            HeartbeatService::start(&bus, config("writer", 2).with_start_sending(false)).unwrap();

        sleep(Duration::from_secs(3)).await;
        assert!(drain(&mut rx).is_empty());
        assert!(!service.is_sending());

        assert!(service.start_sending_heartbeat());
        assert!(service.start_sending_heartbeat());
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(drain(&mut rx).len(), 2);

        service.stop_sending_heartbeat();
        sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert!(!service.is_sending());

        assert!(service.start_sending_heartbeat());
        sleep(Duration::from_millis(500)).await;
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_refuses_to_start() {
        let (bus, _memory) = MessageBus::in_memory();
        let service =
            HeartbeatService::start(&bus, config("writer", 2).with_interval(Duration::ZERO))
                .unwrap();
        assert!(!service.is_sending());
        assert!(!service.start_sending_heartbeat());
    }

    #[tokio::test]
    async fn test_shutdown_message() {
        let (bus, _memory) = MessageBus::in_memory();
        let (_observer, mut rx) = observe(&bus);
        let service =
            HeartbeatService::start(&bus, config("writer", 2).with_start_sending(false)).unwrap();

        service.send_shutdown_message();
        let message = rx.recv().await.unwrap();
        assert_eq!(message.info(), Some(InfoCode::Shutdown));
        assert_eq!(message.data, "WRITER_host");
        assert_eq!(message.from_app, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_service() {
        let (bus, memory) = MessageBus::in_memory();
        let service = HeartbeatService::start(&bus, config("writer", 2)).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(service.is_sending());

        service.stop_service();
        service.join().await;

        assert!(!service.is_sending());
        assert!(!service.start_sending_heartbeat());
        assert_eq!(memory.subscriber_count(DOMAIN, topics::HEARTBEAT), 0);
    }

    #[tokio::test]
    async fn test_stop_inside_listener_suppresses_rest() {
        let (bus, _memory) = MessageBus::in_memory();
        let peer =
            HeartbeatService::start(&bus, config("program", 1).with_start_sending(false)).unwrap();
        let service = Arc::new(
            HeartbeatService::start(&bus, config("writer", 2).with_start_sending(false)).unwrap(),
        );

        let slot = Arc::new(Mutex::new(Some(Arc::clone(&service))));
        service.register_heartbeat_listener(Arc::new(move |_: &InfoMessage| {
            if let Some(service) = slot.lock().take() {
                service.stop_service();
            }
        }));
        let later = Arc::new(AtomicU64::new(0));
        {
            let later = Arc::clone(&later);
            service.register_heartbeat_listener(Arc::new(move |_: &InfoMessage| {
                later.fetch_add(1, Ordering::Relaxed);
            }));
        }

        peer.send_shutdown_message();
        service.join().await;

        assert_eq!(later.load(Ordering::Relaxed), 0);
        assert!(!service.is_sending());
    }

    #[tokio::test]
    async fn test_remove_heartbeat_listener() {
        let (bus, _memory) = MessageBus::in_memory();
        let service =
            HeartbeatService::start(&bus, config("writer", 2).with_start_sending(false)).unwrap();
        let id = service.register_heartbeat_listener(Arc::new(|_: &InfoMessage| {}));
        assert!(service.remove_heartbeat_listener(id));
        assert!(!service.remove_heartbeat_listener(id));
    }
}
