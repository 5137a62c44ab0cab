/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Persistent command registry.
//!
//! Holds commands awaiting a response, keyed by command id. Elapsed time is
//! measured on the monotonic Tokio clock.

use crate::command::Command;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// A command awaiting acknowledgement.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    /// The command as last sent.
    pub command: Command,
    /// Monotonic time of the last send.
    pub last_sent: Instant,
}

/// Result of one retry pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Commands resent during the pass.
    pub resent: usize,
    /// Commands evicted after reaching their send budget.
    pub expired: usize,
}

/// Commands awaiting a response.
#[derive(Debug, Default)]
pub struct PersistentRegistry {
    pending: HashMap<String, PendingCommand>,
}

impl PersistentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a command, replacing any entry with the same id.
    pub fn insert(&mut self, command: Command, sent_at: Instant) {
        self.pending.insert(
            command.id.clone(),
            PendingCommand {
                command,
                last_sent: sent_at,
            },
        );
    }

    /// Removes the entry matching a response id.
    ///
    /// # Returns
    /// The removed entry, or `None` for a late or unknown response.
    pub fn acknowledge(&mut self, id: &str) -> Option<PendingCommand> {
        self.pending.remove(id)
    }

    /// Returns true if a command with this id is awaiting a response.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Returns the pending entry for an id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PendingCommand> {
        self.pending.get(id)
    }

    /// Returns the number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending command.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Resends every command whose last send is older than `threshold`.
    ///
    /// Each due command has its `send_count` incremented before `resend` is
    /// called, and is evicted once `send_count >= max_send_count`.
    pub fn retry_pass(
        &mut self,
        now: Instant,
        threshold: Duration,
        mut resend: impl FnMut(&mut Command),
    ) -> RetryOutcome {
        let mut outcome = RetryOutcome::default();
        let ids: Vec<String> = self.pending.keys().cloned().collect();

        for id in ids {
            let Some(entry) = self.pending.get_mut(&id) else {
                continue;
            };
            if now.saturating_duration_since(entry.last_sent) <= threshold {
                continue;
            }

            entry.command.send_count += 1;
            resend(&mut entry.command);
            entry.last_sent = now;
            outcome.resent += 1;

            if entry.command.send_count >= entry.command.max_send_count {
                self.pending.remove(&id);
                outcome.expired += 1;
            }
        }
        outcome
    }
}
