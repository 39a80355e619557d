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

//! Test the full pipeline from raw configuration text to the serialized topology.

use crate::config::ConfigParser;
use crate::netmodel::{DuplicatePolicy, NetworkModel};
use crate::topology::TopologyGraph;
use maplit::hashset;
use std::collections::HashSet;

/// Build a batch from `(file_stem, config_text)` pairs and run inference.
fn load(configs: &[(&str, &str)]) -> NetworkModel {
    let parser = ConfigParser::new();
    let mut model = NetworkModel::new();
    for (stem, content) in configs {
        model.add_device(parser.parse(stem, content), DuplicatePolicy::Overwrite).unwrap();
    }
    model.infer_adjacency();
    model
}

/// # Test network
///
/// ```text
/// core-r1 ---- border-r1 ---- dept-sw1
///     `---------.
///               |
///            dist-r1
/// ```
fn campus() -> NetworkModel {
    load(&[
        (
            "core-r1",
            "hostname core-r1\n\
             interface Gig0/0\n\
             ip address 10.0.12.1 255.255.255.252\n\
             !\n\
             interface Gig0/1\n\
             ip address 10.0.13.1/30\n\
             !\n",
        ),
        (
            "border-r1",
            "hostname border-r1\n\
             interface Gig0/0\n\
             ip address 10.0.12.2 255.255.255.252\n\
             !\n\
             interface Gig0/2\n\
             ip address 10.0.24.1/30\n\
             !\n",
        ),
        (
            "dist-r1",
            "hostname dist-r1\n\
             interface Gig0/0\n\
             ip address 10.0.13.2/30\n\
             !\n",
        ),
        (
            "dept-sw1",
            "hostname dept-sw1\n\
             interface Gig0/0\n\
             ip address 10.0.24.2/30\n\
             !\n",
        ),
    ])
}

#[test]
fn node_set_matches_device_set() {
    let model = campus();
    let topo = TopologyGraph::build(&model);
    let nodes: HashSet<String> = topo.labels().map(String::from).collect();
    assert_eq!(
        nodes,
        hashset! {
            "core-r1".to_string(),
            "border-r1".to_string(),
            "dist-r1".to_string(),
            "dept-sw1".to_string(),
        }
    );
}

#[test]
fn inferred_links_appear_as_edges() {
    let topo = TopologyGraph::build(&campus());
    assert_eq!(topo.num_nodes(), 4);
    assert_eq!(topo.num_edges(), 3);
}

#[test]
fn groups_and_values() {
    let topo = TopologyGraph::build(&campus());
    let view = topo.view();
    let group_of = |id: &str| {
        view.nodes.iter().find(|n| n.id == id).map(|n| n.group.clone()).unwrap()
    };
    assert_eq!(group_of("core-r1"), "Core");
    assert_eq!(group_of("border-r1"), "Border");
    assert_eq!(group_of("dist-r1"), "Distribution");
    assert_eq!(group_of("dept-sw1"), "Department");
    let core = view.nodes.iter().find(|n| n.id == "core-r1").unwrap();
    assert_eq!(core.value, 2);
}

#[test]
fn repeated_builds_are_identical() {
    let model = campus();
    let a = serde_json::to_string(&TopologyGraph::build(&model).view()).unwrap();
    let b = serde_json::to_string(&TopologyGraph::build(&model).view()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn inference_and_builder_rederivation_agree() {
    // the builder must produce the same edges whether or not inference ran
    let parser = ConfigParser::new();
    let mut uninferred = NetworkModel::new();
    for (stem, content) in &[
        ("core-r1", "hostname core-r1\ninterface Gig0/0\nip address 10.0.12.1/30\n!\n"),
        ("border-r1", "hostname border-r1\ninterface Gig0/0\nip address 10.0.12.2/30\n!\n"),
    ] {
        uninferred
            .add_device(parser.parse(stem, content), DuplicatePolicy::Overwrite)
            .unwrap();
    }
    let mut inferred = uninferred.clone();
    inferred.infer_adjacency();

    let from_uninferred = TopologyGraph::build(&uninferred).view();
    let from_inferred = TopologyGraph::build(&inferred).view();
    assert_eq!(from_uninferred.edges, from_inferred.edges);
}

#[test]
fn explicit_neighbors_link_without_addresses() {
    let model = load(&[
        ("sw1", "hostname sw1\ninterface eth0\nneighbor sw2:eth0\n!\n"),
        ("sw2", "hostname sw2\ninterface eth0\nneighbor sw1:eth0\n!\n"),
    ]);
    let topo = TopologyGraph::build(&model);
    assert_eq!(topo.num_nodes(), 2);
    assert_eq!(topo.num_edges(), 1);
    let view = topo.view();
    assert_eq!(view.edges[0].id, "sw1:eth0--sw2:eth0");
}

#[test]
fn duplicate_hostname_keeps_last_file() {
    // two files resolving to the same hostname: the later one wins under Overwrite
    let model = load(&[
        ("r1a", "hostname r1\ninterface Gig0/0\n!\n"),
        ("r1b", "hostname r1\ninterface Gig0/0\n!\ninterface Gig0/1\n!\n"),
    ]);
    assert_eq!(model.num_devices(), 1);
    assert_eq!(model.get_device("r1").unwrap().interfaces.len(), 2);
}
