//! The collector runtime: binds the sFlow UDP socket, drives the receiver
//! and aggregator threads, and exposes the `Idle → Running → Stopping →
//! Stopped` lifecycle described in the design.

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::counter_table::CounterTable;
use crate::flow_table::{FlowInfo, FlowTable};
use crate::threads;
use crate::types::FlowKey;

/// A short read timeout keeps the receiver's blocking `recv_from` responsive
/// to shutdown without busy-looping.
const RECEIVER_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopping,
    Stopped,
}

struct Threads {
    receiver: JoinHandle<()>,
    aggregator: JoinHandle<()>,
}

/// Owns the flow/counter tables and the two worker threads that mutate and
/// collapse them.
pub struct Collector {
    listener_addr: SocketAddr,
    buffer_size: usize,
    tick_interval: Duration,
    flow_table: Arc<FlowTable>,
    counter_table: Arc<CounterTable>,
    running: Arc<AtomicBool>,
    state: Mutex<State>,
    threads: Mutex<Option<Threads>>,
}

impl Collector {
    pub fn new(listener_addr: SocketAddr, buffer_size: usize, tick_interval: Duration) -> Self {
        Self::with_sampling_rate(listener_addr, buffer_size, tick_interval, crate::flow_table::DEFAULT_SAMPLING_RATE)
    }

    pub fn with_sampling_rate(listener_addr: SocketAddr, buffer_size: usize, tick_interval: Duration, sampling_rate: u64) -> Self {
        Collector {
            listener_addr,
            buffer_size,
            tick_interval,
            flow_table: Arc::new(FlowTable::with_sampling_rate(sampling_rate)),
            counter_table: Arc::new(CounterTable::new()),
            running: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(State::Idle),
            threads: Mutex::new(None),
        }
    }

    /// Bind the UDP socket and spawn the receiver and aggregator threads.
    ///
    /// Legal only from `Idle`. Socket bind/creation failure propagates.
    pub fn start(&self) -> std::io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if *state != State::Idle {
            warn!("start() called while collector is not idle ({:?}); ignoring", *state);
            return Ok(());
        }

        let socket = UdpSocket::bind(self.listener_addr)?;
        socket.set_read_timeout(Some(RECEIVER_POLL_INTERVAL))?;
        info!("sFlow collector listening on {}", self.listener_addr);
        let socket = Arc::new(socket);

        self.running.store(true, Ordering::Relaxed);

        let receiver = {
            let socket = socket.clone();
            let flow_table = self.flow_table.clone();
            let counter_table = self.counter_table.clone();
            let running = self.running.clone();
            let buffer_size = self.buffer_size;
            std::thread::Builder::new()
                .name("sflow-receiver".to_string())
                .spawn(move || threads::receiver::run(socket, buffer_size, flow_table, counter_table, running))
                .expect("spawning the receiver thread")
        };

        let aggregator = {
            let flow_table = self.flow_table.clone();
            let running = self.running.clone();
            let tick_interval = self.tick_interval;
            std::thread::Builder::new()
                .name("sflow-aggregator".to_string())
                .spawn(move || threads::aggregator::run(flow_table, tick_interval, running))
                .expect("spawning the aggregator thread")
        };

        *self.threads.lock().unwrap() = Some(Threads { receiver, aggregator });
        *state = State::Running;
        Ok(())
    }

    /// Signal shutdown and join both worker threads. Idempotent: calling
    /// `stop()` more than once, or before `start()`, is a no-op.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                State::Idle => {
                    *state = State::Stopped;
                    return;
                }
                State::Stopping | State::Stopped => return,
                State::Running => *state = State::Stopping,
            }
        }

        self.running.store(false, Ordering::Relaxed);

        if let Some(threads) = self.threads.lock().unwrap().take() {
            let _ = threads.receiver.join();
            let _ = threads.aggregator.join();
        }

        *self.state.lock().unwrap() = State::Stopped;
        info!("sFlow collector stopped");
    }

    /// A consistent copy of every FlowKey → FlowInfo entry.
    pub fn flow_snapshot(&self) -> HashMap<FlowKey, FlowInfo> {
        self.flow_table.snapshot()
    }

    pub fn flow_table(&self) -> &Arc<FlowTable> {
        &self.flow_table
    }

    pub fn counter_table(&self) -> &Arc<CounterTable> {
        &self.counter_table
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_stop_transitions_to_stopped() {
        let collector = Collector::new("127.0.0.1:0".parse().unwrap(), 2048, Duration::from_millis(50));
        collector.start().unwrap();
        collector.stop();
        assert_eq!(*collector.state.lock().unwrap(), State::Stopped);
    }

    #[test]
    fn stop_without_start_is_idempotent() {
        let collector = Collector::new("127.0.0.1:0".parse().unwrap(), 2048, Duration::from_millis(50));
        collector.stop();
        collector.stop();
        assert_eq!(*collector.state.lock().unwrap(), State::Stopped);
    }

    #[test]
    fn double_stop_after_start_is_idempotent() {
        let collector = Collector::new("127.0.0.1:0".parse().unwrap(), 2048, Duration::from_millis(50));
        collector.start().unwrap();
        collector.stop();
        collector.stop();
        assert_eq!(*collector.state.lock().unwrap(), State::Stopped);
    }
}
