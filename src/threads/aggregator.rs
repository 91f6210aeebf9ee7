//! The aggregator thread: wakes up once per tick interval and collapses the
//! flow table's accumulators into rate estimates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::trace;

use crate::flow_table::FlowTable;

pub fn run(flow_table: Arc<FlowTable>, tick_interval: Duration, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        std::thread::sleep(tick_interval);
        if !running.load(Ordering::Relaxed) {
            break;
        }
        flow_table.tick();
        trace!("aggregator tick complete");
    }
}
