//! The receiver thread: blocks on UDP `recv_from`, decodes each datagram,
//! and dispatches recognized samples into the flow and counter tables.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::counter_table::{unix_now, CounterTable};
use crate::decoder::{decode_datagram, Sample, IPPROTO_TCP};
use crate::flow_table::FlowTable;
use crate::types::{FlowKey, ObservationPoint};

/// Apply one decoded sample to the flow/counter tables. Split out from
/// `run` so the dispatch rules (TCP-only flow recording, in particular) are
/// testable without a real socket.
fn dispatch_sample(sample: &Sample, agent_ip: Ipv4Addr, flow_table: &FlowTable, counter_table: &CounterTable) {
    match sample {
        Sample::Flow(flow) => {
            if flow.protocol != IPPROTO_TCP {
                return;
            }
            let key = FlowKey::new(flow.src_ip, flow.dst_ip, flow.src_port, flow.dst_port);
            let point = ObservationPoint::new(agent_ip, flow.input_port);
            flow_table.record_tcp(key, point, flow.frame_length as u64);
        }
        Sample::Counter(counter) => {
            let point = ObservationPoint::new(agent_ip, counter.interface_index);
            if let Some(rate) = counter_table.record_counter(point, unix_now(), counter.input_octets, counter.output_octets) {
                debug!("link utilization {}: in={} B/s out={} B/s", point, rate.input_bps, rate.output_bps);
            }
        }
    }
}

/// Receive and dispatch datagrams until `running` is cleared.
///
/// The socket has a short read timeout so a blocked `recv_from` rechecks
/// `running` periodically, instead of closing the socket out from under it.
pub fn run(socket: Arc<UdpSocket>, buffer_size: usize, flow_table: Arc<FlowTable>, counter_table: Arc<CounterTable>, running: Arc<AtomicBool>) {
    let mut buf = vec![0u8; buffer_size];

    while running.load(Ordering::Relaxed) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                debug!("UDP receive stopped: {}", e);
                return;
            }
        };
        trace!("received {} bytes from {}", len, from);

        let datagram = match decode_datagram(&buf[..len]) {
            Ok(d) => d,
            Err(e) => {
                warn!("dropping datagram from {}: {}", from, e);
                continue;
            }
        };

        for sample in &datagram.samples {
            dispatch_sample(sample, datagram.agent_ip, &flow_table, &counter_table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::FlowSample;

    fn flow_sample(protocol: u8) -> Sample {
        Sample::Flow(FlowSample {
            input_port: 1,
            frame_length: 1000,
            protocol,
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 1000,
            dst_port: 53,
        })
    }

    #[test]
    fn s4_udp_sample_leaves_flow_table_empty() {
        let flow_table = FlowTable::new();
        let counter_table = CounterTable::new();
        dispatch_sample(&flow_sample(17), Ipv4Addr::new(192, 168, 1, 1), &flow_table, &counter_table);
        assert!(flow_table.snapshot().is_empty());
    }

    #[test]
    fn tcp_sample_is_recorded() {
        let flow_table = FlowTable::new();
        let counter_table = CounterTable::new();
        dispatch_sample(&flow_sample(IPPROTO_TCP), Ipv4Addr::new(192, 168, 1, 1), &flow_table, &counter_table);
        assert_eq!(flow_table.snapshot().len(), 1);
    }
}
