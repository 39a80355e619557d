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

#![deny(missing_docs)]

//! # Confcheck: Verifying Connectivity Properties of Network Configurations
//!
//! This is a library for reconstructing a logical network topology from raw router and switch
//! configuration files, and for answering graph-theoretic questions about it: whether one device
//! can reach another, whether two devices are isolated, whether forwarding loops exist, and what
//! paths (all of them, the best one under a chosen strategy, or mutually disjoint ones) connect
//! two devices.
//!
//! ## Structure
//!
//! Data flows strictly forward through four stages, each a pure function of its input:
//!
//! - **[`config`]**: Parses one raw configuration text into a
//!   [`Device`](netmodel::Device) record: name, interfaces with their addressing and status, any
//!   explicitly stated peers, and the BGP section. Parsing is best-effort; malformed statements
//!   leave fields absent instead of failing the parse.
//!
//! - **[`netmodel`]**: The [`NetworkModel`](netmodel::NetworkModel) collects all devices of one
//!   load batch, then [adjacency inference](netmodel::inference) fills in the neighbor links the
//!   configurations never state explicitly, by testing interface pairs for shared-subnet
//!   membership.
//!
//! - **[`topology`]**: Builds the undirected, labeled
//!   [`TopologyGraph`](topology::TopologyGraph) from the batch, and serializes it into the
//!   node/edge shape consumed by visualization front-ends.
//!
//! - **[`verifier`]**: The query suite. Breadth-first reachability (and its negation,
//!   isolation), exhaustive simple-path enumeration with pluggable best-path strategies, greedy
//!   disjoint-path extraction, and loop detection with canonical cycle deduplication.
//!
//! The [`snapshot`] module persists a parsed batch as JSON and is the only place in this
//! library that touches the filesystem. There is no network I/O anywhere; delegating to an
//! external verification service, serving HTTP, or rendering reports is the business of the
//! calling layer.
//!
//! ## Example usage
//!
//! ```rust
//! use confcheck::config::ConfigParser;
//! use confcheck::netmodel::{DuplicatePolicy, NetworkModel};
//! use confcheck::topology::TopologyGraph;
//! use confcheck::verifier::check_reachability;
//!
//! fn main() -> Result<(), confcheck::Error> {
//!     let parser = ConfigParser::new();
//!     let mut model = NetworkModel::new();
//!     model.add_device(
//!         parser.parse("r1", "hostname R1\ninterface Gig0/0\nip address 10.0.0.1/30\n!\n"),
//!         DuplicatePolicy::Overwrite,
//!     )?;
//!     model.add_device(
//!         parser.parse("r2", "hostname R2\ninterface Gig0/0\nip address 10.0.0.2/30\n!\n"),
//!         DuplicatePolicy::Overwrite,
//!     )?;
//!     model.infer_adjacency();
//!
//!     let topo = TopologyGraph::build(&model);
//!     let result = check_reachability(&topo, "R1", "R2")?;
//!     assert!(result.reachable);
//!     assert_eq!(result.path, vec!["R1".to_string(), "R2".to_string()]);
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod netmodel;
pub mod snapshot;
pub mod topology;
pub mod verifier;

// test modules
mod test;

pub use error::{Error, ModelError};
