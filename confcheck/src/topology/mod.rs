// Confcheck: Verifying Connectivity Properties of Network Configurations
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Topology Graph
//!
//! Builds the undirected, labeled graph of devices and links from a [`NetworkModel`]. The build
//! is a pure function: it reads the model and returns a fresh [`TopologyGraph`], holding no state
//! across calls.
//!
//! Construction runs in two passes. Pass one creates one node per device, in name-sorted order,
//! with its role classification and interface count. Pass two walks every interface: a resolved
//! neighbor becomes an edge, and an addressed interface without a neighbor is matched against the
//! other devices by shared subnet, the same test the
//! [adjacency inference](crate::netmodel::inference) applies. The builder therefore produces
//! correct links even for a model that was never passed through inference.
//!
//! Edges are collected under a content key (both endpoint devices and both interface names,
//! normalized), so the same link seen from either side collapses to one edge, and repeated builds
//! of an unmodified model serialize identically.

use crate::error::Error;
use crate::netmodel::{Interface, NetworkModel};
use log::*;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Undirected;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Role of a device in the topology, guessed from its name. The keyword list is ordered and the
/// first matching keyword wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    /// Core layer device
    Core,
    /// Border or edge device
    Border,
    /// Distribution layer device
    Distribution,
    /// Department or access device
    Department,
    /// End host
    Host,
    /// No keyword matched
    Unknown,
}

static ROLE_KEYWORDS: [(&str, DeviceRole); 5] = [
    ("core", DeviceRole::Core),
    ("border", DeviceRole::Border),
    ("dist", DeviceRole::Distribution),
    ("dept", DeviceRole::Department),
    ("host", DeviceRole::Host),
];

impl DeviceRole {
    /// Classify a device by substring match on its name, case insensitive.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        ROLE_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, role)| *role)
            .unwrap_or(DeviceRole::Unknown)
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => write!(f, "Core"),
            Self::Border => write!(f, "Border"),
            Self::Distribution => write!(f, "Distribution"),
            Self::Department => write!(f, "Department"),
            Self::Host => write!(f, "Host"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Node payload of the topology graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyNode {
    /// Device name, also the node id
    pub label: String,
    /// Tooltip text describing the device
    pub title: String,
    /// Role classification
    pub group: DeviceRole,
    /// Interface count, used as the node weight
    pub value: usize,
}

/// Edge payload of the topology graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyEdge {
    /// Deterministic edge id, derived from the two interface identities
    pub id: String,
    /// The two interface names
    pub label: String,
    /// Tooltip text combining addressing and peer identity
    pub title: String,
}

pub(crate) type TopoGraph = Graph<TopologyNode, TopologyEdge, Undirected, u32>;

/// # Topology Graph
///
/// The undirected device graph, together with a name lookup. All verifier operations run on this
/// structure. The node set is exactly the device-name set of the model it was built from; an edge
/// whose peer device does not exist in the model is dropped during the build.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    graph: TopoGraph,
    index: BTreeMap<String, NodeIndex>,
}

impl TopologyGraph {
    /// Build the topology graph from a model. Pure: the same model always yields the same node
    /// and edge sequence.
    pub fn build(model: &NetworkModel) -> Self {
        let mut graph: TopoGraph = Graph::new_undirected();
        let mut index: BTreeMap<String, NodeIndex> = BTreeMap::new();

        // pass 1: one node per device
        for device in model.devices() {
            let addresses: Vec<String> = device
                .interfaces
                .iter()
                .filter_map(|i| i.ip_address.map(|a| a.to_string()))
                .collect();
            let title = format!(
                "Device: {}\nType: {:?}\nInterfaces: {}\nIP Addresses: {}",
                device.name,
                device.device_type,
                device.interfaces.len(),
                if addresses.is_empty() { "None".to_string() } else { addresses.join(", ") },
            );
            let node = TopologyNode {
                label: device.name.clone(),
                title,
                group: DeviceRole::classify(&device.name),
                value: device.interfaces.len(),
            };
            index.insert(device.name.clone(), graph.add_node(node));
        }

        // pass 2: collect edges under a content key, then insert in key order
        let mut edges: BTreeMap<(String, String, String, String), TopologyEdge> = BTreeMap::new();
        for device in model.devices() {
            for intf in device.interfaces.iter() {
                let peer = match &intf.neighbor {
                    Some(neighbor) => {
                        let peer_if = resolve_peer_interface(model, &device.name, intf);
                        Some((neighbor.device.clone(), peer_if))
                    }
                    None if intf.network_address().is_some() && !intf.is_loopback() => {
                        find_subnet_peer(model, &device.name, intf)
                    }
                    None => None,
                };
                let (peer_device, peer_if) = match peer {
                    Some(p) => p,
                    None => continue,
                };
                if peer_device == device.name {
                    continue;
                }
                if !index.contains_key(&peer_device) {
                    debug!(
                        "Dropping link on {} ({}): peer {} is not in this batch",
                        device.name, intf.name, peer_device
                    );
                    continue;
                }

                let key = normalized_key(&device.name, &intf.name, &peer_device, &peer_if);
                edges.entry(key.clone()).or_insert_with(|| {
                    let (a_dev, a_if, b_dev, b_if) = key;
                    let a_addr = interface_address(model, &a_dev, &a_if);
                    let b_addr = interface_address(model, &b_dev, &b_if);
                    TopologyEdge {
                        id: format!("{}:{}--{}:{}", a_dev, a_if, b_dev, b_if),
                        label: format!("{} <-> {}", a_if, b_if),
                        title: format!(
                            "{}:{} ({}) <-> {}:{} ({})",
                            a_dev, a_if, a_addr, b_dev, b_if, b_addr
                        ),
                    }
                });
            }
        }
        for ((a_dev, _, b_dev, _), edge) in edges {
            graph.add_edge(index[&a_dev], index[&b_dev], edge);
        }

        info!(
            "Built topology with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph, index }
    }

    /// Look up a node by its device name.
    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.index.get(label).copied()
    }

    /// The device name of a node. Fails only on an internally inconsistent graph.
    pub fn label_of(&self, node: NodeIndex) -> Result<&str, Error> {
        self.graph
            .node_weight(node)
            .map(|n| n.label.as_str())
            .ok_or_else(|| Error::InconsistentTopology(format!("unknown node index {:?}", node)))
    }

    /// The role classification of a node. Fails only on an internally inconsistent graph.
    pub fn role_of(&self, node: NodeIndex) -> Result<DeviceRole, Error> {
        self.graph
            .node_weight(node)
            .map(|n| n.group)
            .ok_or_else(|| Error::InconsistentTopology(format!("unknown node index {:?}", node)))
    }

    /// Neighbors of a node in label-sorted order, so every traversal is deterministic.
    pub fn neighbors_ordered(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.sort_by_key(|n| self.graph.node_weight(*n).map(|w| w.label.clone()));
        neighbors.dedup();
        neighbors
    }

    /// All node labels in sorted order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(|k| k.as_str())
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Serialize the graph into the visualization shape.
    pub fn view(&self) -> TopologyView {
        let nodes = self
            .index
            .values()
            .filter_map(|idx| self.graph.node_weight(*idx))
            .map(|n| NodeView {
                id: n.label.clone(),
                label: n.label.clone(),
                title: n.title.clone(),
                group: n.group.to_string(),
                value: n.value,
            })
            .collect();
        let edges = self
            .graph
            .edge_references()
            .filter_map(|e| {
                let from = self.graph.node_weight(e.source())?.label.clone();
                let to = self.graph.node_weight(e.target())?.label.clone();
                Some(EdgeView {
                    id: e.weight().id.clone(),
                    from,
                    to,
                    label: e.weight().label.clone(),
                    title: e.weight().title.clone(),
                })
            })
            .collect();
        TopologyView { nodes, edges }
    }
}

/// One node of the serialized topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    /// Node id (the device name)
    pub id: String,
    /// Display label
    pub label: String,
    /// Tooltip text
    pub title: String,
    /// Role group
    pub group: String,
    /// Node weight (interface count)
    pub value: usize,
}

/// One edge of the serialized topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    /// Deterministic edge id
    pub id: String,
    /// Source node id
    pub from: String,
    /// Target node id
    pub to: String,
    /// Display label (the two interface names)
    pub label: String,
    /// Tooltip text
    pub title: String,
}

/// The serialized topology, consumed field-for-field by the visualization front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyView {
    /// All nodes
    pub nodes: Vec<NodeView>,
    /// All edges
    pub edges: Vec<EdgeView>,
}

/// Normalize an edge to a direction-independent content key.
fn normalized_key(
    a_dev: &str,
    a_if: &str,
    b_dev: &str,
    b_if: &str,
) -> (String, String, String, String) {
    if (a_dev, a_if) <= (b_dev, b_if) {
        (a_dev.to_string(), a_if.to_string(), b_dev.to_string(), b_if.to_string())
    } else {
        (b_dev.to_string(), b_if.to_string(), a_dev.to_string(), a_if.to_string())
    }
}

/// Resolve the peer interface name for an explicit neighbor reference. If the reference does not
/// name one, look for an interface on the peer that points back, and fall back to the shared
/// subnet test.
fn resolve_peer_interface(model: &NetworkModel, device: &str, intf: &Interface) -> String {
    let neighbor = match &intf.neighbor {
        Some(n) => n,
        None => return String::new(),
    };
    if let Some(name) = &neighbor.interface {
        return name.clone();
    }
    if let Some(peer) = model.get_device(&neighbor.device) {
        // prefer the interface that references us back
        if let Some(back) = peer.interfaces.iter().find(|i| {
            i.neighbor.as_ref().map(|n| n.device == device).unwrap_or(false)
        }) {
            return back.name.clone();
        }
        if let Some(net) = intf.network_address() {
            if let Some(same_net) =
                peer.interfaces.iter().find(|i| i.network_address() == Some(net))
            {
                return same_net.name.clone();
            }
        }
    }
    String::new()
}

/// The same first-match shared-subnet scan the adjacency inference performs, used here so the
/// builder also links models that were never passed through inference.
fn find_subnet_peer(
    model: &NetworkModel,
    device: &str,
    intf: &Interface,
) -> Option<(String, String)> {
    let net = intf.network_address()?;
    model
        .devices()
        .filter(|d| d.name != device)
        .flat_map(|d| d.interfaces.iter().map(move |i| (d, i)))
        .find(|(_, i)| !i.is_loopback() && i.network_address() == Some(net))
        .map(|(d, i)| (d.name.clone(), i.name.clone()))
}

fn interface_address(model: &NetworkModel, device: &str, intf: &str) -> String {
    model
        .get_device(device)
        .and_then(|d| d.get_interface(intf))
        .and_then(|i| i.ip_address)
        .map(|a| a.to_string())
        .unwrap_or_else(|| "no address".to_string())
}
