//! The reconciled topology graph and its pure, HTTP-free construction.
//!
//! Vertices sit in `petgraph`'s arena, edges reference them by index.

use std::net::Ipv4Addr;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

use super::client::{HostDto, LinkDto, SwitchDto};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexType {
    Switch,
    Host,
}

/// Vertex payload: a switch carries a `dpid`, a host carries an IPv4
/// address; the two are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexProperties {
    pub vertex_type: VertexType,
    pub switch_dpid: Option<String>,
    pub host_ip: Option<Ipv4Addr>,
}

impl VertexProperties {
    fn switch(dpid: String) -> Self {
        VertexProperties {
            vertex_type: VertexType::Switch,
            switch_dpid: Some(dpid),
            host_ip: None,
        }
    }

    fn host(ip: Ipv4Addr) -> Self {
        VertexProperties {
            vertex_type: VertexType::Host,
            switch_dpid: None,
            host_ip: Some(ip),
        }
    }
}

/// An immutable, cloneable view of the reconciled network graph.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: UnGraph<VertexProperties, ()>,
}

impl TopologyGraph {
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn switches(&self) -> impl Iterator<Item = &VertexProperties> {
        self.graph.node_weights().filter(|v| v.vertex_type == VertexType::Switch)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &VertexProperties> {
        self.graph.node_weights().filter(|v| v.vertex_type == VertexType::Host)
    }

    /// Edges as (src_dpid, dst_dpid) pairs, for display or equality checks in tests.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| {
                let src = self.graph[e.source()].switch_dpid.clone().unwrap_or_default();
                let dst = self.graph[e.target()].switch_dpid.clone().unwrap_or_default();
                (src, dst)
            })
            .collect()
    }
}

/// Reconcile three independent listings from the controller into one graph.
///
/// Switches first, then hosts (dropping missing/`0.0.0.0` addresses), then
/// links (skipping, with a warning, any link naming an unknown dpid).
/// Rebuilds from scratch every call rather than diffing against the prior one.
pub fn build_graph(switches: &[SwitchDto], hosts: &[HostDto], links: &[LinkDto]) -> (TopologyGraph, Vec<String>) {
    let mut graph = UnGraph::new_undirected();
    let mut warnings = Vec::new();

    for sw in switches {
        if sw.dpid.is_empty() {
            warnings.push("skipping switch with empty dpid".to_string());
            continue;
        }
        graph.add_node(VertexProperties::switch(sw.dpid.clone()));
    }

    for host in hosts {
        let ip = match host.ipv4.first() {
            Some(ip) => ip,
            None => {
                warnings.push("skipping host with no ipv4 address".to_string());
                continue;
            }
        };
        match ip.parse::<Ipv4Addr>() {
            Ok(addr) if addr != Ipv4Addr::new(0, 0, 0, 0) => {
                graph.add_node(VertexProperties::host(addr));
            }
            _ => warnings.push(format!("skipping host with invalid or 0.0.0.0 ip {:?}", ip)),
        }
    }

    let find_switch = |graph: &UnGraph<VertexProperties, ()>, dpid: &str| {
        graph
            .node_indices()
            .find(|&i| graph[i].vertex_type == VertexType::Switch && graph[i].switch_dpid.as_deref() == Some(dpid))
    };

    for link in links {
        if link.src.dpid.is_empty() || link.dst.dpid.is_empty() {
            warnings.push("skipping link with missing endpoint dpid".to_string());
            continue;
        }
        let src = find_switch(&graph, &link.src.dpid);
        let dst = find_switch(&graph, &link.dst.dpid);
        match (src, dst) {
            (Some(src), Some(dst)) => {
                graph.add_edge(src, dst, ());
            }
            (None, _) => warnings.push(format!("link refers to unknown switch dpid {}", link.src.dpid)),
            (_, None) => warnings.push(format!("link refers to unknown switch dpid {}", link.dst.dpid)),
        }
    }

    (TopologyGraph { graph }, warnings)
}
