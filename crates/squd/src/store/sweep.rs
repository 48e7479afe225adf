//! Background ageing loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam::channel::{Receiver, after, select};
use tracing::debug;

use super::{CommandStore, RedeliveryHandler, STORE_TARGET};

pub(super) struct Sweep {
    pub(super) store: Weak<CommandStore>,
    pub(super) stop: Receiver<()>,
    pub(super) interval: Duration,
    pub(super) running: Arc<AtomicBool>,
    pub(super) handler: RedeliveryHandler,
}

impl Sweep {
    /// Ticks until a stop signal arrives or the store is dropped.
    ///
    /// The timer restarts after each tick, so time spent in callbacks pushes
    /// later ticks back.
    pub(super) fn run(self) {
        debug!(target: STORE_TARGET, "sweep thread started");
        loop {
            select! {
                recv(self.stop) -> _ => break,
                recv(after(self.interval)) -> _ => {
                    let Some(store) = self.store.upgrade() else {
                        break;
                    };
                    let redelivered = store.sweep_once(&*self.handler);
                    if redelivered > 0 {
                        debug!(
                            target: STORE_TARGET,
                            redelivered,
                            remaining = store.volume(),
                            "sweep tick finished"
                        );
                    }
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
        debug!(target: STORE_TARGET, "sweep thread stopped");
    }
}
