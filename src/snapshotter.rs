//! The topology snapshotter's lifecycle: owns the poller thread and the
//! published graph, and exposes a consistent `snapshot()` to readers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

use crate::threads;
use crate::topology::{ControllerClient, TopologyGraph};

pub struct Snapshotter {
    client: Arc<ControllerClient>,
    tick_interval: Duration,
    graph: Arc<RwLock<TopologyGraph>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Snapshotter {
    pub fn new(client: ControllerClient, tick_interval: Duration) -> Self {
        Snapshotter {
            client: Arc::new(client),
            tick_interval,
            graph: Arc::new(RwLock::new(TopologyGraph::default())),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        if self.running.swap(true, Ordering::Relaxed) {
            return; // already running
        }

        let client = self.client.clone();
        let graph = self.graph.clone();
        let running = self.running.clone();
        let tick_interval = self.tick_interval;

        let handle = std::thread::Builder::new()
            .name("topology-poller".to_string())
            .spawn(move || threads::topology::run(client, graph, tick_interval, running))
            .expect("spawning the topology poller thread");

        *self.handle.lock().unwrap() = Some(handle);
    }

    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return; // wasn't running
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        info!("topology snapshotter stopped");
    }

    /// A consistent copy of the current graph; readers never observe a
    /// partial reconciliation because the poller swaps the whole graph in
    /// one write-lock critical section.
    pub fn snapshot(&self) -> TopologyGraph {
        self.graph.read().unwrap().clone()
    }
}

impl Drop for Snapshotter {
    fn drop(&mut self) {
        self.stop();
    }
}
