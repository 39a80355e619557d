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

//! # Network Model
//!
//! This module contains the device and interface records produced by the
//! [parser](crate::config), and the [`NetworkModel`], the batch of all devices loaded together.
//! The batch is assembled in two explicit phases: first every device is added, then
//! [adjacency inference](crate::netmodel::inference) runs once over the complete set. Devices are
//! stored keyed by name in sorted order, so every downstream stage iterates deterministically.

pub mod inference;

use crate::error::ModelError;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Operational status of an interface. An interface comes up only when an address was configured
/// on it and it was not administratively shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceStatus {
    /// The interface carries an address and is active
    Up,
    /// The interface carries no address, or was shut down explicitly
    Down,
}

/// Vendor family of a parsed configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// Cisco IOS style configuration
    Cisco,
    /// Juniper Junos `set` style configuration
    Juniper,
    /// Anything else, parsed on a best-effort basis
    Generic,
}

/// Reference from an interface to the peer it is connected to. The referenced device must exist
/// in the same batch; references to unknown devices are kept in the model but ignored by the
/// topology builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRef {
    /// Name of the peer device
    pub device: String,
    /// Name of the interface on the peer device, if known
    pub interface: Option<String>,
}

/// A single addressable port on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Interface name, as it appears in the configuration
    pub name: String,
    /// Configured address, if any
    pub ip_address: Option<Ipv4Addr>,
    /// Configured subnet mask, if any
    pub subnet_mask: Option<Ipv4Addr>,
    /// Operational status
    pub status: InterfaceStatus,
    /// The peer this interface connects to, either stated explicitly in the configuration or
    /// filled in by adjacency inference
    pub neighbor: Option<NeighborRef>,
}

impl Interface {
    /// Create a new interface with no address, status down, and no neighbor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_address: None,
            subnet_mask: None,
            status: InterfaceStatus::Down,
            neighbor: None,
        }
    }

    /// Returns the network address of the interface under its own mask, or `None` if the
    /// interface is not fully addressed.
    pub fn network_address(&self) -> Option<Ipv4Addr> {
        match (self.ip_address, self.subnet_mask) {
            (Some(ip), Some(mask)) => Some(Ipv4Addr::from(u32::from(ip) & u32::from(mask))),
            _ => None,
        }
    }

    /// Loopback interfaces never take part in adjacency inference.
    pub fn is_loopback(&self) -> bool {
        self.name.to_ascii_lowercase().starts_with("lo")
    }
}

/// A single BGP peering statement, correlated by neighbor address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpNeighbor {
    /// Address of the BGP neighbor
    pub ip: String,
    /// Remote AS number, `"unknown"` if the configuration never states it
    pub remote_as: String,
    /// Local interface used as update source, if stated
    pub local_interface: Option<String>,
}

/// The BGP section of a device configuration. Carried in the model and in snapshots; it drives no
/// routing computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpConfig {
    /// Configured router id, if stated
    pub router_id: Option<String>,
    /// All peering statements, in configuration order
    pub neighbors: Vec<BgpNeighbor>,
}

/// A parsed network element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device name, unique within a batch
    pub name: String,
    /// Vendor family detected from the configuration text
    pub device_type: DeviceType,
    /// All interfaces, in configuration order
    pub interfaces: Vec<Interface>,
    /// The BGP section, if the configuration carries one
    pub bgp: Option<BgpConfig>,
}

impl Device {
    /// Get an interface by name.
    pub fn get_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Policy applied when two configuration files resolve to the same device name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later device replaces the earlier one. A warning is logged.
    Overwrite,
    /// Adding the duplicate fails with [`ModelError::DuplicateDevice`].
    Reject,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::Overwrite
    }
}

/// # Network Model
///
/// The batch of all devices loaded together. Assemble it by calling [`NetworkModel::add_device`]
/// for every parsed configuration, then run [`NetworkModel::infer_adjacency`] exactly once.
/// Running inference again is harmless, as it never alters an existing neighbor assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkModel {
    devices: BTreeMap<String, Device>,
}

impl NetworkModel {
    /// Generate an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device to the batch. Devices with an empty name are rejected. On a name collision,
    /// the chosen [`DuplicatePolicy`] decides whether the new device replaces the old one or the
    /// call fails.
    pub fn add_device(
        &mut self,
        device: Device,
        policy: DuplicatePolicy,
    ) -> Result<(), ModelError> {
        if device.name.is_empty() {
            return Err(ModelError::EmptyDeviceName);
        }
        if self.devices.contains_key(&device.name) {
            match policy {
                DuplicatePolicy::Overwrite => {
                    warn!("Device {} was loaded twice, keeping the later one", device.name)
                }
                DuplicatePolicy::Reject => {
                    return Err(ModelError::DuplicateDevice(device.name));
                }
            }
        }
        self.devices.insert(device.name.clone(), device);
        Ok(())
    }

    /// Get a device by name.
    pub fn get_device(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Returns true if a device with the given name exists in the batch.
    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Iterate over all devices in name-sorted order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Number of devices in the batch
    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    /// Fill in missing neighbor assignments from shared-subnet membership. See the
    /// [inference](crate::netmodel::inference) module.
    pub fn infer_adjacency(&mut self) {
        inference::infer_adjacency(self)
    }

    pub(crate) fn devices_mut(&mut self) -> &mut BTreeMap<String, Device> {
        &mut self.devices
    }

    pub(crate) fn device_map(&self) -> &BTreeMap<String, Device> {
        &self.devices
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn device(name: &str) -> Device {
        Device {
            name: name.to_string(),
            device_type: DeviceType::Cisco,
            interfaces: vec![],
            bgp: None,
        }
    }

    #[test]
    fn duplicate_overwrite() {
        let mut model = NetworkModel::new();
        let mut first = device("r1");
        first.interfaces.push(Interface::new("Gig0/0"));
        model.add_device(first, DuplicatePolicy::Overwrite).unwrap();
        model.add_device(device("r1"), DuplicatePolicy::Overwrite).unwrap();
        assert_eq!(model.num_devices(), 1);
        // the later, interface-less device wins
        assert!(model.get_device("r1").unwrap().interfaces.is_empty());
    }

    #[test]
    fn duplicate_reject() {
        let mut model = NetworkModel::new();
        model.add_device(device("r1"), DuplicatePolicy::Reject).unwrap();
        assert_eq!(
            model.add_device(device("r1"), DuplicatePolicy::Reject),
            Err(ModelError::DuplicateDevice("r1".to_string()))
        );
    }

    #[test]
    fn empty_name_rejected() {
        let mut model = NetworkModel::new();
        assert_eq!(
            model.add_device(device(""), DuplicatePolicy::Overwrite),
            Err(ModelError::EmptyDeviceName)
        );
    }

    #[test]
    fn network_address() {
        let mut intf = Interface::new("Gig0/0");
        assert_eq!(intf.network_address(), None);
        intf.ip_address = Some("10.0.0.1".parse().unwrap());
        intf.subnet_mask = Some("255.255.255.252".parse().unwrap());
        assert_eq!(intf.network_address(), Some("10.0.0.0".parse().unwrap()));
    }
}
