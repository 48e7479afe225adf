//! Timing and concurrency tests for the command store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};
use rstest::rstest;

use super::*;
use crate::lifecycle::{Ack, LifecycleCommand, Subsystem, SubsystemId};
use crate::task::TaskIdGenerator;

const TASK: &str = "1012936e40712e253d61e2334e7521d7c7ae9049";

fn recording_store(interval: Duration) -> (Arc<CommandStore>, Receiver<(String, Command, Instant)>) {
    let (tx, rx) = channel::unbounded();
    let store = CommandStore::start(
        interval,
        Box::new(move |key, command| {
            let _ = tx.send((key, command, Instant::now()));
        }),
    )
    .expect("start store");
    (store, rx)
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn expired_command_is_redelivered_once() {
    const INTERVAL: Duration = Duration::from_millis(250);
    const TTL: Duration = Duration::from_millis(600);
    // Scheduler jitter on a loaded test host.
    const SLOP: Duration = Duration::from_millis(50);

    let (store, expired) = recording_store(INTERVAL);
    let command = Command::new(5, "test_1").with_params(r#"{"n":1}"#);

    let pushed_at = Instant::now();
    assert!(store.push(TASK, command.clone(), TTL));
    assert_eq!(store.volume(), 1);

    let (key, returned, at) = expired
        .recv_timeout(Duration::from_millis(1500))
        .expect("command should be redelivered");
    let delay = at.duration_since(pushed_at);
    assert_eq!(key, TASK);
    assert_eq!(returned, command);
    assert!(
        delay >= TTL - INTERVAL && delay <= TTL + INTERVAL + SLOP,
        "redelivered after {delay:?}"
    );
    assert_eq!(store.volume(), 0);
    assert!(expired.recv_timeout(Duration::from_millis(600)).is_err());

    store.stop();
}

#[test]
fn freed_command_is_never_redelivered() {
    let (store, expired) = recording_store(Duration::from_millis(20));
    assert!(store.push(TASK, Command::new(1, "job"), Duration::from_millis(40)));

    assert!(store.free(TASK));
    assert!(!store.free(TASK));
    assert!(expired.recv_timeout(Duration::from_millis(200)).is_err());
    store.stop();
}

#[test]
fn push_after_stop_is_refused() {
    let (store, _expired) = recording_store(Duration::from_millis(20));
    store.stop();

    assert!(!store.is_accepting());
    assert!(!store.is_active());
    assert!(!store.push(TASK, Command::new(1, "job"), Duration::from_secs(1)));
    assert_eq!(store.volume(), 0);
    store.stop();
}

#[test]
fn zero_interval_is_raised() {
    let (store, _expired) = recording_store(Duration::ZERO);
    assert_eq!(store.sweep_interval(), Duration::from_millis(1));
    store.stop();
}

#[rstest]
#[case(2)]
#[case(4)]
fn concurrent_pushes_are_freed_or_redelivered(#[case] producers: usize) {
    const PER_PRODUCER: usize = 100;

    let redelivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&redelivered);
    let store = CommandStore::start(
        Duration::from_millis(50),
        Box::new(move |key, command| {
            if command.params == key {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }),
    )
    .expect("start store");
    let freed = Arc::new(AtomicUsize::new(0));
    let (free_tx, free_rx) = channel::unbounded::<String>();

    let freer = {
        let store = Arc::clone(&store);
        let freed = Arc::clone(&freed);
        thread::spawn(move || {
            for key in free_rx {
                if store.free(&key) {
                    freed.fetch_add(1, Ordering::SeqCst);
                }
            }
        })
    };

    let ids = Arc::new(TaskIdGenerator::new());
    let workers: Vec<_> = (0..producers)
        .map(|group| {
            let store = Arc::clone(&store);
            let ids = Arc::clone(&ids);
            let free_tx = free_tx.clone();
            let ttl = Duration::from_millis(300 + 5 * group as u64);
            thread::spawn(move || {
                for index in 0..PER_PRODUCER {
                    let key = ids.generate();
                    let command =
                        Command::new(index as i64, format!("method_{index}")).with_params(key.clone());
                    assert!(store.push(&key, command, ttl));
                    if index % 2 == 0 {
                        let _ = free_tx.send(key);
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("producer panicked");
    }
    drop(free_tx);
    freer.join().expect("freer panicked");

    let total = producers * PER_PRODUCER;
    let settled = wait_until(Duration::from_secs(3), || {
        redelivered.load(Ordering::SeqCst) + freed.load(Ordering::SeqCst) == total
            && store.volume() == 0
    });
    assert!(
        settled,
        "redelivered {} + freed {} != {total}, volume {}",
        redelivered.load(Ordering::SeqCst),
        freed.load(Ordering::SeqCst),
        store.volume()
    );
    store.stop();
}

#[test]
fn stop_command_is_acknowledged_after_quiescing() {
    let (store, _expired) = recording_store(Duration::from_millis(20));
    let (acks_tx, acks_rx) = channel::unbounded();

    store.handle_command(LifecycleCommand::Stop, &acks_tx);

    assert_eq!(
        acks_rx.try_recv().expect("stop acknowledged"),
        Ack::new(SubsystemId::COMMAND_STORE, LifecycleCommand::Stop)
    );
    assert!(!store.is_active());
}

#[test]
fn status_command_is_ignored() {
    let (store, _expired) = recording_store(Duration::from_millis(20));
    let (acks_tx, acks_rx) = channel::unbounded();

    store.handle_command(LifecycleCommand::Status, &acks_tx);
    store.handle_command(LifecycleCommand::Start, &acks_tx);

    assert_eq!(
        acks_rx.try_iter().collect::<Vec<_>>(),
        [Ack::new(SubsystemId::COMMAND_STORE, LifecycleCommand::Start)]
    );
    store.stop();
}
