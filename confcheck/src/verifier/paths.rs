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

//! Exhaustive simple-path enumeration with strategy-driven best-path selection.
//!
//! The enumeration is exponential in the worst case, which is acceptable for the small
//! topologies this engine targets, but it is still bounded by [`MAX_ENUMERATED_PATHS`] so a
//! pathological input cannot run away. Hitting the bound is reported in the result message.

use super::reachability::{labels_of, resolve_endpoints};
use crate::error::Error;
use crate::topology::{DeviceRole, TopologyGraph};
use log::*;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Upper bound on the number of enumerated simple paths per query
pub static MAX_ENUMERATED_PATHS: usize = 10_000;

/// How the best path is chosen from the set of all found paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Minimum hop count
    Shortest,
    /// Prefer paths touching the most core devices, tie-broken by hop count
    CorePreferred,
    /// Prefer paths touching the most border devices, tie-broken by hop count
    BorderPreferred,
    /// Prefer the path sharing the fewest nodes with the other found paths, tie-broken by hop
    /// count
    Redundant,
}

impl PathStrategy {
    /// Parse a strategy name. Unrecognized names fall back to [`PathStrategy::Shortest`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "shortest" => Self::Shortest,
            "core_preferred" => Self::CorePreferred,
            "border_preferred" => Self::BorderPreferred,
            "redundant" => Self::Redundant,
            other => {
                warn!("Unknown path strategy {:?}, falling back to shortest", other);
                Self::Shortest
            }
        }
    }
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shortest => write!(f, "shortest"),
            Self::CorePreferred => write!(f, "core_preferred"),
            Self::BorderPreferred => write!(f, "border_preferred"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Result of an all-paths query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsResult {
    /// Whether at least one path exists
    pub found: bool,
    /// Every simple path between source and target
    pub paths: Vec<Vec<String>>,
    /// The path selected by the strategy, empty if none exists
    pub best_path: Vec<String>,
    /// Human-readable summary
    pub message: String,
}

/// Enumerate every simple path between `source` and `target` and select the best one according
/// to `strategy`. An unknown source or target yields `found = false` with a reason, not an
/// error.
pub fn find_all_paths(
    topo: &TopologyGraph,
    source: &str,
    target: &str,
    strategy: PathStrategy,
) -> Result<PathsResult, Error> {
    let (src, dst) = match resolve_endpoints(topo, source, target) {
        Ok(pair) => pair,
        Err(reason) => {
            return Ok(PathsResult {
                found: false,
                paths: Vec::new(),
                best_path: Vec::new(),
                message: reason,
            })
        }
    };

    let mut found_paths: Vec<Vec<NodeIndex>> = Vec::new();
    let mut truncated = false;
    let mut path = vec![src];
    let mut on_path: HashSet<NodeIndex> = HashSet::new();
    on_path.insert(src);
    enumerate(topo, src, dst, &mut path, &mut on_path, &mut found_paths, &mut truncated);

    if found_paths.is_empty() {
        return Ok(PathsResult {
            found: false,
            paths: Vec::new(),
            best_path: Vec::new(),
            message: format!("no path between {} and {} exists", source, target),
        });
    }

    let best = select_best(topo, &found_paths, strategy)?;
    let best_path = labels_of(topo, &found_paths[best])?;
    let paths = found_paths
        .iter()
        .map(|p| labels_of(topo, p))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut message = format!(
        "found {} paths between {} and {}, best by {} strategy",
        paths.len(),
        source,
        target,
        strategy
    );
    if truncated {
        message.push_str(&format!(
            " (enumeration stopped after {} paths)",
            MAX_ENUMERATED_PATHS
        ));
    }
    Ok(PathsResult { found: true, paths, best_path, message })
}

/// Depth-first enumeration of simple paths, in label-sorted neighbor order.
fn enumerate(
    topo: &TopologyGraph,
    current: NodeIndex,
    target: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut HashSet<NodeIndex>,
    out: &mut Vec<Vec<NodeIndex>>,
    truncated: &mut bool,
) {
    if out.len() >= MAX_ENUMERATED_PATHS {
        *truncated = true;
        return;
    }
    if current == target {
        out.push(path.clone());
        return;
    }
    for next in topo.neighbors_ordered(current) {
        if on_path.contains(&next) {
            continue;
        }
        path.push(next);
        on_path.insert(next);
        enumerate(topo, next, target, path, on_path, out, truncated);
        path.pop();
        on_path.remove(&next);
    }
}

/// Index of the best path under the given strategy. Ties resolve to the first-enumerated path,
/// which is deterministic because enumeration order is.
fn select_best(
    topo: &TopologyGraph,
    paths: &[Vec<NodeIndex>],
    strategy: PathStrategy,
) -> Result<usize, Error> {
    let cost = |i: usize| -> Result<(i64, usize), Error> {
        let path = &paths[i];
        match strategy {
            PathStrategy::Shortest => Ok((0, path.len())),
            PathStrategy::CorePreferred | PathStrategy::BorderPreferred => {
                let role = if strategy == PathStrategy::CorePreferred {
                    DeviceRole::Core
                } else {
                    DeviceRole::Border
                };
                let mut matching = 0i64;
                for node in path {
                    if topo.role_of(*node)? == role {
                        matching += 1;
                    }
                }
                Ok((-matching, path.len()))
            }
            PathStrategy::Redundant => {
                let own: HashSet<NodeIndex> = path.iter().copied().collect();
                let shared: usize = paths
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, other)| other.iter().filter(|n| own.contains(*n)).count())
                    .sum();
                Ok((shared as i64, path.len()))
            }
        }
    };

    let mut best = 0;
    let mut best_cost = cost(0)?;
    for i in 1..paths.len() {
        let c = cost(i)?;
        if c < best_cost {
            best = i;
            best_cost = c;
        }
    }
    Ok(best)
}
