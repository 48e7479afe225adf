//! Bounded work queues feeding the `execute` method.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, select};
use tracing::warn;

use crate::protocol::Command;

const QUEUE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::queues");

/// Fresh and redelivered FIFO queues.
///
/// Both are bounded; producers block while a queue is full. Consumers prefer
/// redelivered work: [`next`](Self::next) drains that queue first and only
/// then waits on both.
#[derive(Debug, Clone)]
pub struct DispatchQueues {
    fresh_tx: Sender<Command>,
    fresh_rx: Receiver<Command>,
    redelivered_tx: Sender<Command>,
    redelivered_rx: Receiver<Command>,
    poll_timeout: Duration,
}

impl DispatchQueues {
    /// Builds both queues with `capacity` slots each.
    pub fn new(capacity: usize, poll_timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        let (fresh_tx, fresh_rx) = channel::bounded(capacity);
        let (redelivered_tx, redelivered_rx) = channel::bounded(capacity);
        Self {
            fresh_tx,
            fresh_rx,
            redelivered_tx,
            redelivered_rx,
            poll_timeout,
        }
    }

    /// Queues new work, blocking while the fresh queue is full.
    pub fn enqueue(&self, command: Command) {
        // Both ends live in `self`, so the channel cannot disconnect.
        if self.fresh_tx.send(command).is_err() {
            warn!(target: QUEUE_TARGET, "fresh queue disconnected");
        }
    }

    /// Queues expired work for another attempt, blocking while full.
    pub fn redeliver(&self, command: Command) {
        if self.redelivered_tx.send(command).is_err() {
            warn!(target: QUEUE_TARGET, "redelivered queue disconnected");
        }
    }

    /// Waits up to the poll timeout for the next command.
    ///
    /// Returns `None` when nothing arrived in time.
    pub fn next(&self) -> Option<Command> {
        if let Ok(command) = self.redelivered_rx.try_recv() {
            return Some(command);
        }
        select! {
            recv(self.redelivered_rx) -> command => command.ok(),
            recv(self.fresh_rx) -> command => command.ok(),
            default(self.poll_timeout) => None,
        }
    }

    /// Current `(fresh, redelivered)` queue lengths.
    pub fn pending(&self) -> (usize, usize) {
        (self.fresh_rx.len(), self.redelivered_rx.len())
    }

    /// How long an `execute` call waits on the fresh queue before giving up.
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }
}
