//! Error types local to the decoder and the topology snapshotter.
//!
//! Neither is fatal to the process: both are logged at the call site and the
//! caller moves on to the next sample / next poll tick. Only socket
//! bind/creation failure at `Collector::start` is allowed to propagate.

use std::fmt;

/// Errors returned while decoding a single sFlow sample or datagram.
///
/// All variants are recoverable: the decoder skips the offending sample (or
/// the whole datagram, for `UnsupportedVersion`) and continues.
#[derive(Debug)]
pub enum DecodeError {
    /// First word of the datagram was not 5.
    UnsupportedVersion(u32),
    /// Advancing by the declared sample length would run past the buffer.
    TruncatedDatagram { need: usize, have: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::UnsupportedVersion(v) => write!(f, "unsupported sFlow version: {}", v),
            DecodeError::TruncatedDatagram { need, have } => write!(
                f,
                "truncated datagram: need {} bytes to advance, have {}",
                need, have
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors raised while polling or parsing the controller's topology
/// endpoints.
#[derive(Debug)]
pub enum ControllerError {
    /// The HTTP GET itself failed (timeout, connection refused, DNS, ...).
    Unreachable(String),
    /// The response body was not valid JSON or not shaped as expected.
    ParseError(String),
    /// A link named a switch dpid that is not present in this tick's graph.
    UnknownSwitchInLink(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControllerError::Unreachable(msg) => write!(f, "controller unreachable: {}", msg),
            ControllerError::ParseError(msg) => write!(f, "controller response parse error: {}", msg),
            ControllerError::UnknownSwitchInLink(dpid) => {
                write!(f, "link refers to unknown switch dpid {}", dpid)
            }
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<reqwest::Error> for ControllerError {
    fn from(err: reqwest::Error) -> Self {
        ControllerError::Unreachable(err.to_string())
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(err: serde_json::Error) -> Self {
        ControllerError::ParseError(err.to_string())
    }
}
