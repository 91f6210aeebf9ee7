//! Per-(flow, observation-point) byte accumulation and rate estimation.
//!
//! One `Mutex` guards the table; `record_tcp` and `tick` both take it.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{FlowKey, ObservationPoint};

/// Default packet-sampling denominator: packets are sampled 1-in-N and
/// observed bytes are scaled up by N to extrapolate total traffic.
pub const DEFAULT_SAMPLING_RATE: u64 = 256;

/// Per-(FlowKey, ObservationPoint) byte accumulator and derived rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowStats {
    pub byte_count_current: u64,
    pub byte_count_previous: u64,
    pub avg_rate: u64,
}

/// All observation points witnessing one flow, plus the averaged estimate.
#[derive(Debug, Clone, Default)]
pub struct FlowInfo {
    pub observation_points: BTreeMap<ObservationPoint, FlowStats>,
    pub estimated_flow_sending_rate: u64,
}

/// The flow table: per-FlowKey accumulators, mutated by the receiver and
/// collapsed into rate estimates by the aggregator.
pub struct FlowTable {
    inner: Mutex<HashMap<FlowKey, FlowInfo>>,
    sampling_rate: u64,
}

impl FlowTable {
    pub fn new() -> Self {
        Self::with_sampling_rate(DEFAULT_SAMPLING_RATE)
    }

    pub fn with_sampling_rate(sampling_rate: u64) -> Self {
        FlowTable {
            inner: Mutex::new(HashMap::new()),
            sampling_rate,
        }
    }

    /// Add `frame_length` bytes to the current-tick accumulator for
    /// `(flow_key, observation_point)`. Only called for TCP samples; the
    /// caller is responsible for the protocol gate (see `Collector`).
    pub fn record_tcp(&self, flow_key: FlowKey, observation_point: ObservationPoint, frame_length: u64) {
        let mut table = self.inner.lock().unwrap();
        let info = table.entry(flow_key).or_default();
        let stats = info.observation_points.entry(observation_point).or_default();
        stats.byte_count_current += frame_length;
    }

    /// Collapse one tick: for every flow, promote `current → previous`,
    /// clear `current`, derive `avg_rate`, and publish
    /// `estimated_flow_sending_rate` as the mean of the nonzero `avg_rate`s.
    /// A flow with no observation point reporting traffic this tick keeps
    /// its previous `estimated_flow_sending_rate` rather than dividing by
    /// zero.
    pub fn tick(&self) {
        let mut table = self.inner.lock().unwrap();
        for info in table.values_mut() {
            let mut rate_sum: u64 = 0;
            let mut witnesses: u64 = 0;

            for stats in info.observation_points.values_mut() {
                let bytes = stats.byte_count_current;
                stats.byte_count_previous = bytes;
                stats.byte_count_current = 0;
                stats.avg_rate = bytes * 8 * self.sampling_rate;

                if stats.avg_rate != 0 {
                    rate_sum += stats.avg_rate;
                    witnesses += 1;
                }
            }

            if witnesses > 0 {
                info.estimated_flow_sending_rate = rate_sum / witnesses;
            }
        }
    }

    /// A consistent copy of every FlowKey → FlowInfo entry, for external
    /// readers. Taken under the same lock `tick` uses, so a reader never
    /// observes a half-updated tick.
    pub fn snapshot(&self) -> HashMap<FlowKey, FlowInfo> {
        self.inner.lock().unwrap().clone()
    }
}

impl Default for FlowTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key(n: u16) -> FlowKey {
        FlowKey::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2), n, 80)
    }

    fn obs(port: u32) -> ObservationPoint {
        ObservationPoint::new(Ipv4Addr::new(192, 168, 1, 1), port)
    }

    #[test]
    fn s1_single_switch_tcp_flow() {
        let table = FlowTable::new();
        table.record_tcp(key(1000), obs(1), 1500);
        table.tick();

        let snap = table.snapshot();
        let info = &snap[&key(1000)];
        let stats = &info.observation_points[&obs(1)];
        assert_eq!(stats.byte_count_previous, 1500);
        assert_eq!(stats.avg_rate, 1500 * 8 * 256);
        assert_eq!(info.estimated_flow_sending_rate, 3_072_000);
    }

    #[test]
    fn s2_multi_switch_same_flow_averages() {
        let table = FlowTable::new();
        table.record_tcp(key(1000), obs(1), 1500);
        table.record_tcp(key(1000), obs(2), 1500);
        table.tick();

        let snap = table.snapshot();
        let info = &snap[&key(1000)];
        assert_eq!(info.estimated_flow_sending_rate, 3_072_000);
    }

    #[test]
    fn s3_partial_witness_excludes_zero_rate_points() {
        let table = FlowTable::new();
        table.record_tcp(key(1000), obs(1), 3000);
        // obs(2) never reports traffic this tick, so its avg_rate stays 0
        // once the entry is created.
        table.record_tcp(key(1000), obs(2), 0);
        table.tick();

        let snap = table.snapshot();
        let info = &snap[&key(1000)];
        assert_eq!(info.observation_points[&obs(1)].avg_rate, 6_144_000);
        assert_eq!(info.observation_points[&obs(2)].avg_rate, 0);
        assert_eq!(info.estimated_flow_sending_rate, 6_144_000);
    }

    #[test]
    fn tick_zeroes_current_and_is_idempotent() {
        let table = FlowTable::new();
        table.record_tcp(key(1), obs(1), 100);
        table.tick();
        table.tick();

        let snap = table.snapshot();
        let stats = &snap[&key(1)].observation_points[&obs(1)];
        assert_eq!(stats.byte_count_current, 0);
        assert_eq!(stats.byte_count_previous, 0);
        assert_eq!(stats.avg_rate, 0);
    }

    #[test]
    fn tick_skips_flows_with_no_witnesses_this_round() {
        let table = FlowTable::new();
        table.record_tcp(key(1), obs(1), 1000);
        table.tick();
        let rate_after_first_tick = table.snapshot()[&key(1)].estimated_flow_sending_rate;

        // Second tick: nobody reported traffic, estimate must not divide by zero
        // and must retain the last published value.
        table.tick();
        let rate_after_second_tick = table.snapshot()[&key(1)].estimated_flow_sending_rate;
        assert_eq!(rate_after_first_tick, rate_after_second_tick);
    }

    #[test]
    fn accumulator_is_non_decreasing_within_a_tick() {
        let table = FlowTable::new();
        table.record_tcp(key(1), obs(1), 100);
        let first = table.snapshot()[&key(1)].observation_points[&obs(1)].byte_count_current;
        table.record_tcp(key(1), obs(1), 50);
        let second = table.snapshot()[&key(1)].observation_points[&obs(1)].byte_count_current;
        assert!(second >= first);
    }
}
