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

//! Loop detection with canonical cycle deduplication.
//!
//! A depth-first search is seeded at every node (global scope) or at one named node. A cycle is
//! recorded whenever an edge closes back to the start node of the search with at least three
//! nodes on the path, so the trivial two-node back-and-forth over one undirected link never
//! counts. Every recorded cycle is normalized to a canonical form, collapsing the same physical
//! loop discovered from different starting points or in opposite directions into one entry.

use super::reachability::labels_of;
use super::CheckStatus;
use crate::error::Error;
use crate::topology::TopologyGraph;
use log::*;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Where loop detection starts its searches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopScope {
    /// Search from every node
    Global,
    /// Search from one named node only
    Node(String),
}

/// Result of a loop-detection query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopResult {
    /// `PASSED` iff no loop was found
    pub status: CheckStatus,
    /// All distinct loops in canonical form
    pub loops: Vec<Vec<String>>,
    /// Human-readable summary
    pub message: String,
}

/// Detect forwarding loops in the topology. An unknown node name in
/// [`LoopScope::Node`] yields an empty `PASSED` result whose message names the missing device.
pub fn detect_loops(topo: &TopologyGraph, scope: LoopScope) -> Result<LoopResult, Error> {
    let starts: Vec<NodeIndex> = match &scope {
        LoopScope::Global => topo.labels().filter_map(|l| topo.node_index(l)).collect(),
        LoopScope::Node(name) => match topo.node_index(name) {
            Some(idx) => vec![idx],
            None => {
                return Ok(LoopResult {
                    status: CheckStatus::Passed,
                    loops: Vec::new(),
                    message: format!("device {} does not exist in the topology", name),
                })
            }
        },
    };

    let mut canonical: BTreeSet<Vec<String>> = BTreeSet::new();
    for start in starts {
        let mut path = vec![start];
        let mut on_path: HashSet<NodeIndex> = HashSet::new();
        on_path.insert(start);
        walk(topo, start, start, &mut path, &mut on_path, &mut canonical)?;
    }

    let loops: Vec<Vec<String>> = canonical.into_iter().collect();
    let status = if loops.is_empty() { CheckStatus::Passed } else { CheckStatus::Failed };
    let message = match (&scope, loops.len()) {
        (_, 0) => "no forwarding loops found".to_string(),
        (LoopScope::Global, n) => format!("{} distinct forwarding loops found", n),
        (LoopScope::Node(name), n) => {
            format!("{} distinct forwarding loops found through {}", n, name)
        }
    };
    if status == CheckStatus::Failed {
        debug!("{}", message);
    }
    Ok(LoopResult { status, loops, message })
}

fn walk(
    topo: &TopologyGraph,
    start: NodeIndex,
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut HashSet<NodeIndex>,
    canonical: &mut BTreeSet<Vec<String>>,
) -> Result<(), Error> {
    for next in topo.neighbors_ordered(current) {
        if next == start {
            if path.len() >= 3 {
                canonical.insert(canonical_cycle(&labels_of(topo, path)?));
            }
        } else if !on_path.contains(&next) {
            path.push(next);
            on_path.insert(next);
            walk(topo, start, next, path, on_path, canonical)?;
            path.pop();
            on_path.remove(&next);
        }
    }
    Ok(())
}

/// Normalize a cycle to its canonical form: rotate the label sequence to start at the smallest
/// label, do the same for the reversed sequence, and keep the lexicographically smaller of the
/// two. Structurally identical cycles, regardless of starting point or direction, map to the
/// same canonical sequence.
pub fn canonical_cycle(cycle: &[String]) -> Vec<String> {
    let forward = rotate_to_min(cycle);
    let mut reversed = cycle.to_vec();
    reversed.reverse();
    let reversed = rotate_to_min(&reversed);
    forward.min(reversed)
}

fn rotate_to_min(cycle: &[String]) -> Vec<String> {
    let pos = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle.iter().cycle().skip(pos).take(cycle.len()).cloned().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canonicalization_collapses_rotations_and_directions() {
        let triangle = canonical_cycle(&labels(&["A", "B", "C"]));
        assert_eq!(canonical_cycle(&labels(&["B", "C", "A"])), triangle);
        assert_eq!(canonical_cycle(&labels(&["C", "B", "A"])), triangle);
        assert_eq!(triangle, labels(&["A", "B", "C"]));
    }

    #[test]
    fn canonicalization_picks_smaller_direction() {
        // A -> C -> B reversed is B -> C -> A, rotated A, B, C
        assert_eq!(canonical_cycle(&labels(&["A", "C", "B"])), labels(&["A", "B", "C"]));
        // a four-cycle where the direction matters
        assert_eq!(
            canonical_cycle(&labels(&["A", "D", "C", "B"])),
            labels(&["A", "B", "C", "D"])
        );
    }
}
