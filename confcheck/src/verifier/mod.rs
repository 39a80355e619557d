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

//! # Verifier
//!
//! The property and path queries running on a [`TopologyGraph`](crate::topology::TopologyGraph).
//! Every operation is single-shot: graph in, result out, no state across calls.
//!
//! A property that does not hold is a result, not an error. Each result structure carries its own
//! boolean-like discriminator (`reachable`, `found`, or a [`CheckStatus`]) plus a human-readable
//! reason or message. A query naming a device that does not exist in the topology yields a
//! negative result with a reason. `Err` is returned only for internal faults, such as a graph
//! whose edges reference unknown nodes.

pub mod disjoint;
pub mod loops;
pub mod paths;
pub mod reachability;

pub use disjoint::{find_disjoint_paths, DisjointMode, DisjointResult};
pub use loops::{detect_loops, LoopResult, LoopScope};
pub use paths::{find_all_paths, PathStrategy, PathsResult};
pub use reachability::{
    check_isolation, check_reachability, IsolationResult, ReachabilityResult,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a property check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// The checked property holds
    #[serde(rename = "PASSED")]
    Passed,
    /// The checked property is violated
    #[serde(rename = "FAILED")]
    Failed,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}
