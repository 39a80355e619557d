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

//! # Adjacency Inference
//!
//! Fills in neighbor assignments that the configurations never state explicitly. Two interfaces
//! on different devices are considered adjacent iff they compute the same network address, each
//! under its own mask. This matches two-sided subnet configuration, where the two ends of a link
//! may even carry masks of different length.
//!
//! Devices are scanned in name-sorted order and interfaces in configuration order, and the first
//! matching peer wins. When three or more devices share one subnet, the pairing is therefore
//! deterministic (the lexicographically smallest eligible peer is chosen), but no claim is made
//! that this pairing reflects the physical cabling.
//!
//! The pass is idempotent: an interface that already carries a neighbor, whether explicit or
//! inferred by an earlier run, is never touched again, and the symmetric assignment never
//! overwrites an existing entry on the peer side.

use super::{NeighborRef, NetworkModel};
use log::*;

/// Fill in missing neighbor assignments over the complete batch. See the module documentation
/// for the matching and tie-break rules.
pub fn infer_adjacency(model: &mut NetworkModel) {
    let names: Vec<String> = model.device_map().keys().cloned().collect();

    for a_name in &names {
        let num_interfaces = model.device_map()[a_name].interfaces.len();
        for a_idx in 0..num_interfaces {
            let a_if = model.device_map()[a_name].interfaces[a_idx].clone();
            if a_if.neighbor.is_some() || a_if.is_loopback() {
                continue;
            }
            let a_net = match a_if.network_address() {
                Some(net) => net,
                None => continue,
            };

            // first match wins, scanning devices in name order
            let found = {
                let devices = model.device_map();
                names
                    .iter()
                    .filter(|b_name| b_name.as_str() != a_name.as_str())
                    .flat_map(|b_name| {
                        devices[b_name]
                            .interfaces
                            .iter()
                            .enumerate()
                            .map(move |(b_idx, b_if)| (b_name, b_idx, b_if))
                    })
                    .find(|(_, _, b_if)| {
                        !b_if.is_loopback() && b_if.network_address() == Some(a_net)
                    })
                    .map(|(b_name, b_idx, b_if)| (b_name.clone(), b_idx, b_if.name.clone()))
            };

            if let Some((b_name, b_idx, b_if_name)) = found {
                debug!(
                    "Inferred link {} ({}) <-> {} ({}) on network {}",
                    a_name, a_if.name, b_name, b_if_name, a_net
                );
                if let Some(device) = model.devices_mut().get_mut(a_name) {
                    device.interfaces[a_idx].neighbor = Some(NeighborRef {
                        device: b_name.clone(),
                        interface: Some(b_if_name),
                    });
                }
                // symmetric assignment, unless the peer side already has a neighbor
                if let Some(device) = model.devices_mut().get_mut(&b_name) {
                    let b_if = &mut device.interfaces[b_idx];
                    if b_if.neighbor.is_none() {
                        b_if.neighbor = Some(NeighborRef {
                            device: a_name.clone(),
                            interface: Some(a_if.name.clone()),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::netmodel::{
        Device, DeviceType, DuplicatePolicy, Interface, InterfaceStatus, NetworkModel,
    };

    fn addressed_interface(name: &str, ip: &str, mask: &str) -> Interface {
        Interface {
            name: name.to_string(),
            ip_address: Some(ip.parse().unwrap()),
            subnet_mask: Some(mask.parse().unwrap()),
            status: InterfaceStatus::Up,
            neighbor: None,
        }
    }

    fn device(name: &str, interfaces: Vec<Interface>) -> Device {
        Device { name: name.to_string(), device_type: DeviceType::Cisco, interfaces, bgp: None }
    }

    fn model_of(devices: Vec<Device>) -> NetworkModel {
        let mut model = NetworkModel::new();
        for d in devices {
            model.add_device(d, DuplicatePolicy::Overwrite).unwrap();
        }
        model
    }

    #[test]
    fn symmetric_link() {
        let mut model = model_of(vec![
            device("R1", vec![addressed_interface("Gig0/0", "10.0.0.1", "255.255.255.252")]),
            device("R2", vec![addressed_interface("Gig0/0", "10.0.0.2", "255.255.255.252")]),
        ]);
        model.infer_adjacency();

        let r1_neighbor = model.get_device("R1").unwrap().interfaces[0].neighbor.clone().unwrap();
        let r2_neighbor = model.get_device("R2").unwrap().interfaces[0].neighbor.clone().unwrap();
        assert_eq!(r1_neighbor.device, "R2");
        assert_eq!(r2_neighbor.device, "R1");
        assert_eq!(r1_neighbor.interface.as_deref(), Some("Gig0/0"));
        assert_eq!(r2_neighbor.interface.as_deref(), Some("Gig0/0"));
    }

    #[test]
    fn different_mask_lengths_still_match() {
        // both sides compute the network 10.0.0.0, each under its own mask
        let mut model = model_of(vec![
            device("R1", vec![addressed_interface("Gig0/0", "10.0.0.1", "255.0.0.0")]),
            device("R2", vec![addressed_interface("Gig0/0", "10.0.0.2", "255.255.255.0")]),
        ]);
        model.infer_adjacency();
        assert_eq!(
            model.get_device("R1").unwrap().interfaces[0].neighbor.as_ref().unwrap().device,
            "R2"
        );
    }

    #[test]
    fn different_networks_do_not_match() {
        let mut model = model_of(vec![
            device("R1", vec![addressed_interface("Gig0/0", "10.0.0.1", "255.255.255.252")]),
            device("R2", vec![addressed_interface("Gig0/0", "10.0.0.130", "255.255.255.128")]),
        ]);
        model.infer_adjacency();
        assert!(model.get_device("R1").unwrap().interfaces[0].neighbor.is_none());
        assert!(model.get_device("R2").unwrap().interfaces[0].neighbor.is_none());
    }

    #[test]
    fn explicit_neighbor_preserved() {
        let mut r1_if = addressed_interface("Gig0/0", "10.0.0.1", "255.255.255.252");
        r1_if.neighbor = Some(crate::netmodel::NeighborRef {
            device: "R9".to_string(),
            interface: None,
        });
        let mut model = model_of(vec![
            device("R1", vec![r1_if]),
            device("R2", vec![addressed_interface("Gig0/0", "10.0.0.2", "255.255.255.252")]),
        ]);
        model.infer_adjacency();

        // the explicit (even dangling) assignment on R1 survives, R2 links back to R1
        assert_eq!(
            model.get_device("R1").unwrap().interfaces[0].neighbor.as_ref().unwrap().device,
            "R9"
        );
        assert_eq!(
            model.get_device("R2").unwrap().interfaces[0].neighbor.as_ref().unwrap().device,
            "R1"
        );
    }

    #[test]
    fn idempotent() {
        let mut model = model_of(vec![
            device("R1", vec![addressed_interface("Gig0/0", "10.0.0.1", "255.255.255.252")]),
            device("R2", vec![addressed_interface("Gig0/0", "10.0.0.2", "255.255.255.252")]),
            device("R3", vec![addressed_interface("Gig0/1", "192.168.1.1", "255.255.255.0")]),
        ]);
        model.infer_adjacency();
        let once = model.clone();
        model.infer_adjacency();
        assert_eq!(model, once);
    }

    #[test]
    fn three_way_subnet_deterministic() {
        // A, B and C share 10.0.0.0/24. A links to B (smallest peer), C links to A.
        let mut model = model_of(vec![
            device("A", vec![addressed_interface("eth0", "10.0.0.1", "255.255.255.0")]),
            device("B", vec![addressed_interface("eth0", "10.0.0.2", "255.255.255.0")]),
            device("C", vec![addressed_interface("eth0", "10.0.0.3", "255.255.255.0")]),
        ]);
        model.infer_adjacency();
        assert_eq!(
            model.get_device("A").unwrap().interfaces[0].neighbor.as_ref().unwrap().device,
            "B"
        );
        assert_eq!(
            model.get_device("B").unwrap().interfaces[0].neighbor.as_ref().unwrap().device,
            "A"
        );
        assert_eq!(
            model.get_device("C").unwrap().interfaces[0].neighbor.as_ref().unwrap().device,
            "A"
        );
    }

    #[test]
    fn loopbacks_ignored() {
        let mut model = model_of(vec![
            device("R1", vec![addressed_interface("Loopback0", "10.0.0.1", "255.255.255.0")]),
            device("R2", vec![addressed_interface("Gig0/0", "10.0.0.2", "255.255.255.0")]),
        ]);
        model.infer_adjacency();
        assert!(model.get_device("R1").unwrap().interfaces[0].neighbor.is_none());
        assert!(model.get_device("R2").unwrap().interfaces[0].neighbor.is_none());
    }
}
