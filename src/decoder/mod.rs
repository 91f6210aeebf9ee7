//! sFlow v5 wire decoder.
//!
//! Field offsets match the prior `SFlowCollector::handlePacket` exporter trace, not a fresh RFC 3176 reading.

use std::convert::TryInto;
use std::net::Ipv4Addr;

use log::warn;

use crate::error::DecodeError;

/// sFlow datagrams this core understands are always version 5.
pub const SFLOW_VERSION: u32 = 5;

/// sFlow sample_type for a flow sample.
const SAMPLE_TYPE_FLOW: u32 = 1;
/// sFlow sample_type for a counter sample.
const SAMPLE_TYPE_COUNTER: u32 = 2;

/// Header size in 32-bit words before the first sample begins.
const HEADER_WORDS: usize = 7;

/// A decoded sFlow v5 datagram: the exporter's identity plus the samples it
/// carried that this core recognizes. Unrecognized sample types are skipped
/// and logged, not surfaced here.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub agent_ip: Ipv4Addr,
    pub sub_agent_id: u32,
    pub sequence_number: u32,
    pub uptime_ms: u32,
    pub samples: Vec<Sample>,
}

/// One recognized sample within a datagram.
#[derive(Debug, Clone)]
pub enum Sample {
    Flow(FlowSample),
    Counter(CounterSample),
}

/// A type-1 (flow) sample: one sampled packet header.
#[derive(Debug, Clone, Copy)]
pub struct FlowSample {
    pub input_port: u32,
    pub frame_length: u32,
    pub protocol: u8,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
}

/// A type-2 (counter) sample: one interface's cumulative octet counters.
#[derive(Debug, Clone, Copy)]
pub struct CounterSample {
    pub interface_index: u32,
    pub interface_speed: u64,
    pub input_octets: u64,
    pub output_octets: u64,
}

/// TCP, the only protocol this core records flow stats for.
pub const IPPROTO_TCP: u8 = 6;

/// Read the big-endian 32-bit word at word-index `i`, bounds-checked against
/// the buffer length.
fn word(buf: &[u8], i: usize) -> Result<u32, DecodeError> {
    let start = i * 4;
    let end = start + 4;
    if end > buf.len() {
        return Err(DecodeError::TruncatedDatagram {
            need: end,
            have: buf.len(),
        });
    }
    Ok(u32::from_be_bytes(buf[start..end].try_into().unwrap()))
}

/// Reconstruct an IPv4 address from the two packed words the sampled packet
/// header spans, using the same byte-shuffling the source exporter relies on.
fn unpack_ip(front: u32, back: u32) -> Ipv4Addr {
    let b0 = ((front & 0xFFFF) >> 8) as u8;
    let b1 = (front & 0xFF) as u8;
    let b2 = (back >> 24) as u8;
    let b3 = ((back >> 16) & 0xFF) as u8;
    Ipv4Addr::new(b0, b1, b2, b3)
}

fn decode_counter_sample(buf: &[u8], index: usize) -> Result<CounterSample, DecodeError> {
    let base = index + 4 + 15;
    let interface_index = word(buf, base + 3)?;
    let interface_speed = (word(buf, base + 5)? as u64) << 32 | word(buf, base + 6)? as u64;
    let input_octets = (word(buf, base + 9)? as u64) << 32 | word(buf, base + 10)? as u64;
    let output_octets = (word(buf, base + 17)? as u64) << 32 | word(buf, base + 18)? as u64;
    Ok(CounterSample {
        interface_index,
        interface_speed,
        input_octets,
        output_octets,
    })
}

fn decode_flow_sample(buf: &[u8], index: usize) -> Result<FlowSample, DecodeError> {
    let input_port = word(buf, index + 7)?;
    let frame_length = word(buf, index + 13)?;
    let protocol = (word(buf, index + 21)? & 0xFF) as u8;
    let src_ip_front = word(buf, index + 22)?;
    let src_ip_back = word(buf, index + 23)?;
    let dst_ip_front = word(buf, index + 23)?;
    let dst_ip_back = word(buf, index + 24)?;
    let src_port = (word(buf, index + 24)? & 0xFFFF) as u16;
    let dst_port = (word(buf, index + 25)? >> 16) as u16;

    Ok(FlowSample {
        input_port,
        frame_length,
        protocol,
        src_ip: unpack_ip(src_ip_front, src_ip_back),
        dst_ip: unpack_ip(dst_ip_front, dst_ip_back),
        src_port,
        dst_port,
    })
}

/// Decode one sFlow v5 datagram.
///
/// Recognized sample types (1, 2) are decoded and returned; unrecognized
/// types are logged and skipped, but the decoder still advances past them by
/// `sample_length / 4 + 2` words, per the sFlow framing rule, so a single
/// exotic sample never desynchronizes the rest of the datagram. A datagram
/// that claims more samples than it has bytes for is rejected wholesale with
/// `DecodeError::TruncatedDatagram`, since at that point there is no safe way
/// to locate the next sample boundary.
pub fn decode_datagram(buf: &[u8]) -> Result<Datagram, DecodeError> {
    let version = word(buf, 0)?;
    if version != SFLOW_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let agent_ip_start = 2 * 4;
    if agent_ip_start + 4 > buf.len() {
        return Err(DecodeError::TruncatedDatagram {
            need: agent_ip_start + 4,
            have: buf.len(),
        });
    }
    let agent_ip = Ipv4Addr::new(
        buf[agent_ip_start],
        buf[agent_ip_start + 1],
        buf[agent_ip_start + 2],
        buf[agent_ip_start + 3],
    );

    let sub_agent_id = word(buf, 3)?;
    let sequence_number = word(buf, 4)?;
    let uptime_ms = word(buf, 5)?;
    let sample_count = word(buf, 6)?;

    let mut samples = Vec::with_capacity(sample_count as usize);
    let mut index = HEADER_WORDS;

    for _ in 0..sample_count {
        let sample_type = word(buf, index)?;
        let sample_length = word(buf, index + 1)?;

        match sample_type {
            SAMPLE_TYPE_COUNTER => samples.push(Sample::Counter(decode_counter_sample(buf, index)?)),
            SAMPLE_TYPE_FLOW => samples.push(Sample::Flow(decode_flow_sample(buf, index)?)),
            other => warn!("skipping unrecognized sFlow sample type {}", other),
        }

        index += (sample_length / 4) as usize + 2;
    }

    // Validate the final advance landed within the datagram; a sample whose
    // declared length overruns the buffer means the rest of the datagram
    // cannot be trusted.
    if index * 4 > buf.len() + 3 {
        return Err(DecodeError::TruncatedDatagram {
            need: index * 4,
            have: buf.len(),
        });
    }

    Ok(Datagram {
        agent_ip,
        sub_agent_id,
        sequence_number,
        uptime_ms,
        samples,
    })
}
