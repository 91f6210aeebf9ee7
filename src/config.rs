//! Configuration constants (§6), gathered from the command line.
//!
//! This is deliberately the only configuration surface: a flat CLI flag set,
//! no file-based layer. That keeps ambient engineering hygiene (the binary
//! is still configurable, still logs its settings at startup) without
//! building out a configuration *system* the spec doesn't call for.

use std::net::SocketAddr;
use std::time::Duration;

use structopt::StructOpt;

/// Default sFlow v5 UDP port.
pub const DEFAULT_SFLOW_PORT: u16 = 6343;
/// Maximum sFlow datagram size this core will read.
pub const DEFAULT_BUFFER_SIZE: usize = 65535;

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "sflow-collector", about = "Passive sFlow telemetry collector and topology snapshotter")]
pub struct Opts {
    /// Log level to use.
    #[structopt(long = "log", default_value = "info")]
    pub log_level: String,

    /// Address:port to bind the sFlow UDP listener on.
    #[structopt(short = "l", long = "listener", default_value = "0.0.0.0:6343")]
    pub listener: SocketAddr,

    /// Maximum datagram size to read off the UDP socket.
    #[structopt(long = "buffer-size", default_value = "65535")]
    pub buffer_size: usize,

    /// Packet-sampling denominator (1-in-N) used to extrapolate observed bytes.
    #[structopt(long = "sampling-rate", default_value = "256")]
    pub sampling_rate: u64,

    /// Aggregation tick interval, in seconds.
    #[structopt(long = "tick-interval", default_value = "1")]
    pub tick_interval_secs: u64,

    /// SDN controller "list switches" endpoint.
    #[structopt(long = "switches-url")]
    pub switches_url: String,

    /// SDN controller "list hosts" endpoint.
    #[structopt(long = "hosts-url")]
    pub hosts_url: String,

    /// SDN controller "list links" endpoint.
    #[structopt(long = "links-url")]
    pub links_url: String,
}

impl Opts {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}
