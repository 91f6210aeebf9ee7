pub mod client;
pub mod graph;

pub use client::ControllerClient;
pub use graph::{build_graph, TopologyGraph, VertexProperties, VertexType};
