//! Per-(agent, interface) counter deltas, used to derive link utilization.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::ObservationPoint;

/// One observation point's last-seen counter sample.
#[derive(Debug, Clone, Copy)]
pub struct CounterRecord {
    pub last_report_time: u64,
    pub last_input_octets: u64,
    pub last_output_octets: u64,
}

/// A derived link rate, in bytes/sec, for one counter sample against its
/// predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRate {
    pub input_bps: u64,
    pub output_bps: u64,
}

pub struct CounterTable {
    inner: Mutex<HashMap<ObservationPoint, CounterRecord>>,
}

impl CounterTable {
    pub fn new() -> Self {
        CounterTable {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Records a counter sample, returns the derived byte rate if a prior
    /// sample exists. `None` on first sample, zero interval, or reset
    /// (`current < previous`); a reset rebases the baseline silently.
    pub fn record_counter(&self, point: ObservationPoint, now: u64, input_octets: u64, output_octets: u64) -> Option<LinkRate> {
        let mut table = self.inner.lock().unwrap();

        let rate = match table.get(&point) {
            None => None,
            Some(prev) => {
                let delta_t = now.saturating_sub(prev.last_report_time);
                if delta_t == 0 {
                    None
                } else if input_octets < prev.last_input_octets || output_octets < prev.last_output_octets {
                    // Counter reset (wraparound or exporter restart): discard
                    // this delta, rebase below.
                    None
                } else {
                    Some(LinkRate {
                        input_bps: (input_octets - prev.last_input_octets) / delta_t,
                        output_bps: (output_octets - prev.last_output_octets) / delta_t,
                    })
                }
            }
        };

        table.insert(
            point,
            CounterRecord {
                last_report_time: now,
                last_input_octets: input_octets,
                last_output_octets: output_octets,
            },
        );

        rate
    }
}

impl Default for CounterTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Current Unix time in seconds, used as the `now` clock for counter deltas.
pub fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn point() -> ObservationPoint {
        ObservationPoint::new(Ipv4Addr::new(192, 168, 1, 1), 3)
    }

    #[test]
    fn first_sample_has_no_baseline() {
        let table = CounterTable::new();
        assert_eq!(table.record_counter(point(), 0, 1_000_000, 0), None);
    }

    #[test]
    fn s5_counter_delta_over_ten_seconds() {
        let table = CounterTable::new();
        table.record_counter(point(), 0, 1_000_000, 0);
        let rate = table.record_counter(point(), 10, 2_000_000, 0).unwrap();
        assert_eq!(rate.input_bps, 100_000);
    }

    #[test]
    fn counter_reset_is_discarded_not_underflowed() {
        let table = CounterTable::new();
        table.record_counter(point(), 0, 5_000_000, 5_000_000);
        // Exporter restarted: counters dropped back to a small value.
        let rate = table.record_counter(point(), 10, 100, 100);
        assert_eq!(rate, None);

        // Baseline is rebased, so the next sample computes a sane delta.
        let rate = table.record_counter(point(), 20, 1_100, 600).unwrap();
        assert_eq!(rate.input_bps, 100);
        assert_eq!(rate.output_bps, 50);
    }

    #[test]
    fn zero_interval_produces_no_rate() {
        let table = CounterTable::new();
        table.record_counter(point(), 5, 1000, 1000);
        assert_eq!(table.record_counter(point(), 5, 2000, 2000), None);
    }
}
