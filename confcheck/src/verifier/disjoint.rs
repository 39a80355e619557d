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

//! Greedy disjoint-path extraction.
//!
//! This is a best-effort approximation, not a max-flow computation: each round takes a shortest
//! path and removes its interior nodes (or its edges) from consideration, which can block a
//! combination of disjoint paths that an optimal algorithm would find. The approximate nature is
//! part of the contract and must not be silently upgraded.

use super::reachability::{bfs_path, edge_key, labels_of, resolve_endpoints};
use crate::error::Error;
use crate::topology::TopologyGraph;
use itertools::Itertools;
use log::*;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Disjointness criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisjointMode {
    /// Paths share no intermediate node
    Node,
    /// Paths share no edge
    Edge,
}

impl DisjointMode {
    /// Parse a mode name. Unrecognized names fall back to [`DisjointMode::Node`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "node" => Self::Node,
            "edge" => Self::Edge,
            other => {
                warn!("Unknown disjoint mode {:?}, falling back to node", other);
                Self::Node
            }
        }
    }
}

impl fmt::Display for DisjointMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Edge => write!(f, "edge"),
        }
    }
}

/// Result of a disjoint-path query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisjointResult {
    /// Whether exactly the requested number of disjoint paths was extracted
    pub found: bool,
    /// The extracted paths, possibly fewer than requested
    pub paths: Vec<Vec<String>>,
    /// The disjointness criterion that was applied
    #[serde(rename = "type")]
    pub mode: DisjointMode,
    /// Human-readable summary
    pub message: String,
}

/// Extract up to `max_paths` mutually disjoint paths between `source` and `target`, greedily.
/// Each round runs a breadth-first search for a shortest remaining path, then bans its interior
/// nodes (`mode = node`) or its edges (`mode = edge`) for the following rounds. `found` is true
/// only if exactly `max_paths` paths were extracted. An unknown source or target yields
/// `found = false` with a reason, not an error.
pub fn find_disjoint_paths(
    topo: &TopologyGraph,
    source: &str,
    target: &str,
    mode: DisjointMode,
    max_paths: usize,
) -> Result<DisjointResult, Error> {
    let (src, dst) = match resolve_endpoints(topo, source, target) {
        Ok(pair) => pair,
        Err(reason) => {
            return Ok(DisjointResult {
                found: false,
                paths: Vec::new(),
                mode,
                message: reason,
            })
        }
    };

    let mut banned_nodes: HashSet<NodeIndex> = HashSet::new();
    let mut banned_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    let mut found_paths: Vec<Vec<NodeIndex>> = Vec::new();

    while found_paths.len() < max_paths {
        let path = match bfs_path(topo, src, dst, &banned_nodes, &banned_edges) {
            Some(p) => p,
            None => break,
        };
        // a direct link leaves nothing to ban in node mode; stop instead of repeating it
        if found_paths.contains(&path) {
            break;
        }
        match mode {
            DisjointMode::Node => {
                for node in path.iter().skip(1).take(path.len().saturating_sub(2)) {
                    banned_nodes.insert(*node);
                }
            }
            DisjointMode::Edge => {
                for (a, b) in path.iter().tuple_windows() {
                    banned_edges.insert(edge_key(*a, *b));
                }
            }
        }
        found_paths.push(path);
    }

    let found = found_paths.len() == max_paths;
    let paths = found_paths
        .iter()
        .map(|p| labels_of(topo, p))
        .collect::<Result<Vec<_>, Error>>()?;
    let message = if found {
        format!(
            "found {} {}-disjoint paths between {} and {}",
            paths.len(),
            mode,
            source,
            target
        )
    } else {
        format!(
            "only {} of {} requested {}-disjoint paths between {} and {} exist (best-effort \
             greedy extraction)",
            paths.len(),
            max_paths,
            mode,
            source,
            target
        )
    };
    debug!("{}", message);
    Ok(DisjointResult { found, paths, mode, message })
}
