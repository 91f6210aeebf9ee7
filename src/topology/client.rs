//! Controller REST client: three GET endpoints, JSON bodies.
//!
//! Unknown fields in the responses are ignored by `serde`'s default
//! (non-`deny_unknown_fields`) behavior; fields this core doesn't need are
//! simply never named in the DTOs below.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ControllerError;

/// `{"dpid": "<hex string>", ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchDto {
    #[serde(default)]
    pub dpid: String,
}

/// `{"ipv4": ["<dotted-quad>", ...], ...}`, only `ipv4[0]` is used.
#[derive(Debug, Clone, Deserialize)]
pub struct HostDto {
    #[serde(default)]
    pub ipv4: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkEndpoint {
    #[serde(default)]
    pub dpid: String,
}

/// `{"src": {"dpid": "..."}, "dst": {"dpid": "..."}}`
#[derive(Debug, Clone, Deserialize)]
pub struct LinkDto {
    pub src: LinkEndpoint,
    pub dst: LinkEndpoint,
}

/// The three URLs this core polls, and the blocking HTTP client used to
/// reach them.
pub struct ControllerClient {
    switches_url: String,
    hosts_url: String,
    links_url: String,
    http: reqwest::blocking::Client,
}

/// Bounded read timeout for every controller request, so snapshotter
/// liveness never depends on controller health.
const CONTROLLER_TIMEOUT: Duration = Duration::from_secs(5);

impl ControllerClient {
    pub fn new(switches_url: String, hosts_url: String, links_url: String) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(CONTROLLER_TIMEOUT)
            .build()
            .expect("building the controller HTTP client");

        ControllerClient {
            switches_url,
            hosts_url,
            links_url,
            http,
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ControllerError> {
        let body = self.http.get(url).send()?.error_for_status()?.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch and parse all three endpoints for one poll tick.
    pub fn fetch_all(&self) -> Result<(Vec<SwitchDto>, Vec<HostDto>, Vec<LinkDto>), ControllerError> {
        let switches = self.get_json(&self.switches_url)?;
        let hosts = self.get_json(&self.hosts_url)?;
        let links = self.get_json(&self.links_url)?;
        Ok((switches, hosts, links))
    }
}
