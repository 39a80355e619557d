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

//! Reachability and isolation, the two readings of one breadth-first search.

use crate::error::Error;
use crate::topology::TopologyGraph;
use log::*;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of a reachability query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityResult {
    /// Whether a path between source and target exists
    pub reachable: bool,
    /// A shortest path by hop count, empty if none exists
    pub path: Vec<String>,
    /// Human-readable explanation of the verdict
    pub reason: String,
}

/// Result of an isolation query. Isolation is the negation of reachability; a witness path is
/// included whenever the two devices are not isolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationResult {
    /// Whether no path between source and target exists
    pub isolated: bool,
    /// A witness path if the devices are connected, empty otherwise
    pub path: Vec<String>,
    /// Human-readable explanation of the verdict
    pub reason: String,
}

/// Check whether `target` is reachable from `source`. The returned path is a shortest path by
/// hop count, found by breadth-first search with label-sorted neighbor expansion. An unknown
/// source or target yields `reachable = false` with a reason, not an error.
pub fn check_reachability(
    topo: &TopologyGraph,
    source: &str,
    target: &str,
) -> Result<ReachabilityResult, Error> {
    let (src, dst) = match resolve_endpoints(topo, source, target) {
        Ok(pair) => pair,
        Err(reason) => {
            return Ok(ReachabilityResult { reachable: false, path: Vec::new(), reason })
        }
    };

    match bfs_path(topo, src, dst, &HashSet::new(), &HashSet::new()) {
        Some(path) => {
            let path = labels_of(topo, &path)?;
            debug!("{} reaches {} via {:?}", source, target, path);
            Ok(ReachabilityResult {
                reachable: true,
                reason: format!("{} reaches {} in {} hops", source, target, path.len() - 1),
                path,
            })
        }
        None => Ok(ReachabilityResult {
            reachable: false,
            path: Vec::new(),
            reason: format!("no path between {} and {} exists", source, target),
        }),
    }
}

/// Check whether `source` and `target` are isolated from each other. This runs the same search
/// as [`check_reachability`] and inverts the interpretation.
pub fn check_isolation(
    topo: &TopologyGraph,
    source: &str,
    target: &str,
) -> Result<IsolationResult, Error> {
    let result = check_reachability(topo, source, target)?;
    let reason = if result.reachable {
        format!("{} and {} are connected: {}", source, target, result.path.join(" -> "))
    } else {
        result.reason
    };
    Ok(IsolationResult { isolated: !result.reachable, path: result.path, reason })
}

/// Resolve the two endpoint labels, or report which one is missing.
pub(crate) fn resolve_endpoints(
    topo: &TopologyGraph,
    source: &str,
    target: &str,
) -> Result<(NodeIndex, NodeIndex), String> {
    let src = topo
        .node_index(source)
        .ok_or_else(|| format!("source device {} does not exist in the topology", source))?;
    let dst = topo
        .node_index(target)
        .ok_or_else(|| format!("target device {} does not exist in the topology", target))?;
    Ok((src, dst))
}

/// Map a node path back to device names.
pub(crate) fn labels_of(
    topo: &TopologyGraph,
    path: &[NodeIndex],
) -> Result<Vec<String>, Error> {
    path.iter().map(|n| topo.label_of(*n).map(String::from)).collect()
}

/// Normalize an undirected edge for use in a banned set.
pub(crate) fn edge_key(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Breadth-first search for a shortest path, skipping banned nodes and edges. Neighbors are
/// expanded in label-sorted order, so among equally short paths the lexicographically least one
/// is found first.
pub(crate) fn bfs_path(
    topo: &TopologyGraph,
    source: NodeIndex,
    target: NodeIndex,
    banned_nodes: &HashSet<NodeIndex>,
    banned_edges: &HashSet<(NodeIndex, NodeIndex)>,
) -> Option<Vec<NodeIndex>> {
    if banned_nodes.contains(&source) || banned_nodes.contains(&target) {
        return None;
    }
    if source == target {
        return Some(vec![source]);
    }

    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    parent.insert(source, source);
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        for next in topo.neighbors_ordered(current) {
            if parent.contains_key(&next)
                || banned_nodes.contains(&next)
                || banned_edges.contains(&edge_key(current, next))
            {
                continue;
            }
            parent.insert(next, current);
            if next == target {
                let mut path = vec![next];
                let mut node = next;
                while node != source {
                    node = parent[&node];
                    path.push(node);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}
