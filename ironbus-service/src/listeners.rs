/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Listener traits and registries.
//!
//! Services fan inbound records out to registered listeners. Registration
//! returns a [`ListenerId`] used for removal. Notification iterates over a
//! snapshot, so a listener may register or remove listeners while being called.

use crate::command::Command;
use crate::info::InfoMessage;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Receives inbound commands.
pub trait CommandListener: Send + Sync {
    /// Called for every inbound command.
    fn on_command(&self, command: &Command);
}

impl<F> CommandListener for F
where
    F: Fn(&Command) + Send + Sync,
{
    fn on_command(&self, command: &Command) {
        self(command);
    }
}

/// Receives inbound command responses.
pub trait ResponseListener: Send + Sync {
    /// Called for every inbound command response.
    fn on_response(&self, response: &Command);
}

impl<F> ResponseListener for F
where
    F: Fn(&Command) + Send + Sync,
{
    fn on_response(&self, response: &Command) {
        self(response);
    }
}

/// Receives inbound info messages.
pub trait InfoListener: Send + Sync {
    /// Called for every inbound info message.
    fn on_info(&self, message: &InfoMessage);
}

impl<F> InfoListener for F
where
    F: Fn(&InfoMessage) + Send + Sync,
{
    fn on_info(&self, message: &InfoMessage) {
        self(message);
    }
}

/// Receives heartbeats from other applications.
pub trait HeartbeatListener: Send + Sync {
    /// Called for every heartbeat not sent by this application.
    fn on_heartbeat(&self, message: &InfoMessage);
}

impl<F> HeartbeatListener for F
where
    F: Fn(&InfoMessage) + Send + Sync,
{
    fn on_heartbeat(&self, message: &InfoMessage) {
        self(message);
    }
}

/// Thread-safe set of listeners keyed by [`ListenerId`].
pub struct ListenerSet<L: ?Sized> {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Arc<L>)>>,
}

impl<L: ?Sized> ListenerSet<L> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Adds a listener.
    pub fn register(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Removes a listener.
    ///
    /// # Returns
    /// `true` if the listener was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Returns a copy of the current listeners in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Calls `f` for every listener in the current snapshot.
    pub fn notify(&self, mut f: impl FnMut(&L)) {
        for listener in self.snapshot() {
            f(&*listener);
        }
    }

    /// Calls `f` for every listener in the current snapshot until `cancel`
    /// fires. The token is checked before each call.
    ///
    /// # Returns
    /// `false` if the fan-out was cut short by cancellation.
    pub fn notify_until(&self, cancel: &CancellationToken, mut f: impl FnMut(&L)) -> bool {
        for listener in self.snapshot() {
            if cancel.is_cancelled() {
                return false;
            }
            f(&*listener);
        }
        !cancel.is_cancelled()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_register_and_remove() {
        let set: ListenerSet<dyn CommandListener> = ListenerSet::new();
        let first = set.register(Arc::new(|_: &Command| {}));
        let second = set.register(Arc::new(|_: &Command| {}));

        assert_ne!(first, second);
        assert_eq!(set.len(), 2);
        assert!(set.remove(first));
        assert!(!set.remove(first));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_notify_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set: ListenerSet<dyn InfoListener> = ListenerSet::new();
        for tag in 0..3 {
            let seen = Arc::clone(&seen);
            set.register(Arc::new(move |_: &InfoMessage| seen.lock().push(tag)));
        }

        let message = InfoMessage::new(1, 100, "");
        set.notify(|l| l.on_info(&message));
        assert_eq!(seen.lock().as_slice(), [0, 1, 2]);
    }

    #[test]
    fn test_listener_may_remove_itself() {
        let set: Arc<ListenerSet<dyn CommandListener>> = Arc::new(ListenerSet::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicU64::new(0));

        let listener = {
            let set = Arc::clone(&set);
            let slot = Arc::clone(&slot);
            let calls = Arc::clone(&calls);
            move |_: &Command| {
                calls.fetch_add(1, Ordering::Relaxed);
                if let Some(id) = *slot.lock() {
                    set.remove(id);
                }
            }
        };
        *slot.lock() = Some(set.register(Arc::new(listener)));

        let command = Command::new(1, 2, 5, "");
        set.notify(|l| l.on_command(&command));
        set.notify(|l| l.on_command(&command));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_notify_until_stops_at_cancellation() {
        let cancel = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set: ListenerSet<dyn CommandListener> = ListenerSet::new();
        for tag in 0..3 {
            let seen = Arc::clone(&seen);
            let cancel = cancel.clone();
            set.register(Arc::new(move |_: &Command| {
                seen.lock().push(tag);
                if tag == 1 {
                    cancel.cancel();
                }
            }));
        }

        let command = Command::new(1, 2, 5, "");
        assert!(!set.notify_until(&cancel, |l| l.on_command(&command)));
        assert_eq!(seen.lock().as_slice(), [0, 1]);

        assert!(!set.notify_until(&cancel, |l| l.on_command(&command)));
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_notify_until_completes_when_not_cancelled() {
        let set: ListenerSet<dyn InfoListener> = ListenerSet::new();
        let calls = Arc::new(AtomicU64::new(0));
        {
            let calls = Arc::clone(&calls);
            set.register(Arc::new(move |_: &InfoMessage| {
                calls.fetch_add(1, Ordering::Relaxed);
            }));
        }
        let message = InfoMessage::new(1, 100, "");
        assert!(set.notify_until(&CancellationToken::new(), |l| l.on_info(&message)));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_listener_id_display() {
        let set: ListenerSet<dyn HeartbeatListener> = ListenerSet::default();
        let id = set.register(Arc::new(|_: &InfoMessage| {}));
        assert_eq!(id.to_string(), "listener-1");
        assert_eq!(id.value(), 1);
    }
}
