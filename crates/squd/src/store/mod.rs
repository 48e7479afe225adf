//! In-flight command store with TTL redelivery.
//!
//! Commands handed to an executer are parked here under their task id until
//! the executer reports a result ([`CommandStore::free`]) or the entry's TTL
//! elapses. A background sweep ages every entry once per interval and hands
//! expired commands to a [`RedeliveryHandler`], which normally feeds them back
//! into the redelivered queue.
//!
//! Expiry and the callback run shard by shard on the sweep thread, so a slow
//! callback delays later shards within the same tick. Redelivery therefore
//! happens somewhere in `[ttl - interval, ttl + interval]` plus that drift.

mod errors;
mod index;
mod shard;
mod subsystem;
mod sweep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};
use tracing::{debug, info};

use crate::millis::saturating_millis;
use crate::protocol::Command;

pub use self::errors::StoreError;
use self::index::{SHARD_COUNT, shard_index};
use self::shard::Shard;

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");
const STOP_POLL: Duration = Duration::from_millis(5);
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Callback receiving `(task id, command)` for every expired entry.
pub type RedeliveryHandler = Box<dyn Fn(String, Command) + Send + 'static>;

/// Sharded TTL store for commands awaiting a result.
#[derive(Debug)]
pub struct CommandStore {
    shards: Box<[Shard]>,
    interval: Duration,
    accepting: AtomicBool,
    running: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl CommandStore {
    /// Builds a store and starts its sweep thread.
    ///
    /// Intervals below one millisecond are raised to one millisecond.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SpawnSweep`] when the sweep thread cannot be
    /// started.
    pub fn start(interval: Duration, handler: RedeliveryHandler) -> Result<Arc<Self>, StoreError> {
        let interval = interval.max(MIN_INTERVAL);
        let (stop_tx, stop_rx) = channel::bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        let store = Arc::new(Self {
            shards: (0..SHARD_COUNT).map(|_| Shard::default()).collect(),
            interval,
            accepting: AtomicBool::new(true),
            running: Arc::clone(&running),
            stop_tx,
            sweeper: Mutex::new(None),
        });

        let sweep = sweep::Sweep {
            store: Arc::downgrade(&store),
            stop: stop_rx,
            interval,
            running,
            handler,
        };
        let handle = thread::Builder::new()
            .name("squ-store-sweep".to_owned())
            .spawn(move || sweep.run())
            .map_err(|source| StoreError::SpawnSweep { source })?;
        *store.sweeper.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        info!(
            target: STORE_TARGET,
            interval_ms = saturating_millis(interval),
            shards = SHARD_COUNT,
            "command store started"
        );
        Ok(store)
    }

    /// Parks `command` under `key` for at least `ttl`.
    ///
    /// Returns `false` without touching the store once [`stop`](Self::stop)
    /// has begun. An existing entry for `key` is replaced and its age reset.
    pub fn push(&self, key: &str, command: Command, ttl: Duration) -> bool {
        if !self.accepting.load(Ordering::SeqCst) {
            return false;
        }
        let wait_limit = u64::try_from(ttl.as_millis() / self.interval.as_millis())
            .unwrap_or(u64::MAX);
        self.shards[shard_index(key)].insert(key, command, wait_limit);
        true
    }

    /// Removes the entry for `key`, returning whether it was present.
    pub fn free(&self, key: &str) -> bool {
        self.shards[shard_index(key)].remove(key)
    }

    /// Total number of parked commands.
    pub fn volume(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns true while the store accepts work.
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Returns true while the sweep thread is running.
    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Period between TTL sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.interval
    }

    /// Stops accepting work and terminates the sweep thread.
    ///
    /// Waits at most one sweep interval for the thread to finish. Only the
    /// first call has any effect.
    pub fn stop(&self) {
        if !self.accepting.swap(false, Ordering::SeqCst) {
            return;
        }
        // Capacity one and a single sender, so this never blocks.
        let _ = self.stop_tx.try_send(());

        let deadline = Instant::now() + self.interval;
        while self.is_active() && Instant::now() < deadline {
            thread::sleep(STOP_POLL);
        }
        if self.is_active() {
            debug!(
                target: STORE_TARGET,
                "sweep thread still finishing a tick after stop"
            );
            return;
        }
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        info!(target: STORE_TARGET, remaining = self.volume(), "command store stopped");
    }

    /// Runs one sweep tick over every shard in index order.
    fn sweep_once(&self, handler: &(dyn Fn(String, Command) + Send)) -> usize {
        let mut redelivered = 0;
        for shard in self.shards.iter() {
            for (key, command) in shard.sweep() {
                debug!(
                    target: STORE_TARGET,
                    task = %key,
                    %command,
                    "command expired, redelivering"
                );
                handler(key, command);
                redelivered += 1;
            }
        }
        redelivered
    }
}

impl Drop for CommandStore {
    fn drop(&mut self) {
        self.accepting.store(false, Ordering::SeqCst);
        let _ = self.stop_tx.try_send(());
    }
}

#[cfg(test)]
mod tests;
