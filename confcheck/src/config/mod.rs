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

//! # Configuration Parser
//!
//! Parses one raw configuration text into a [`Device`]. Parsing is best-effort extraction, not a
//! strict grammar: a statement that does not match any known pattern leaves the corresponding
//! field absent, and the parser never fails on structurally incomplete input.
//!
//! The text is first classified as Cisco IOS, Juniper Junos or generic by keyword inspection.
//! Cisco configurations are walked line by line with a small state machine: an `interface <name>`
//! line opens an interface block, a line starting with `!` (or the end of input) closes it, and a
//! `router bgp <asn>` line opens the BGP section. Junos configurations are read from their
//! flattened `set` statements, and the generic fallback scans for anything that looks like an
//! interface token with an address on the same line.

use crate::netmodel::{
    BgpConfig, BgpNeighbor, Device, DeviceType, Interface, InterfaceStatus, NeighborRef,
};
use log::*;
use regex::Regex;
use std::net::Ipv4Addr;

/// Convert a CIDR prefix length into a dotted subnet mask. Prefix lengths above 32 yield `None`.
pub fn cidr_to_mask(prefix: u32) -> Option<Ipv4Addr> {
    if prefix > 32 {
        return None;
    }
    let mask: u32 = if prefix == 0 { 0 } else { (0xffff_ffff >> (32 - prefix)) << (32 - prefix) };
    Some(Ipv4Addr::from(mask))
}

/// Classify a configuration text by vendor family. Junos is checked first, since its `set
/// interfaces` statements would otherwise trip the Cisco `interface` keyword.
pub fn detect_device_type(content: &str) -> DeviceType {
    let lower = content.to_lowercase();
    if ["juniper", "junos", "set interfaces", "routing-options"]
        .iter()
        .any(|k| lower.contains(k))
    {
        DeviceType::Juniper
    } else if ["cisco", "ios", "interface", "ip address", "router"]
        .iter()
        .any(|k| lower.contains(k))
    {
        DeviceType::Cisco
    } else {
        DeviceType::Generic
    }
}

/// Parser for raw device configurations. Construct it once and reuse it for every file of a
/// batch; all statement patterns are compiled in [`ConfigParser::new`].
#[derive(Debug)]
pub struct ConfigParser {
    hostname_re: Regex,
    ip_dotted_re: Regex,
    ip_cidr_re: Regex,
    neighbor_re: Regex,
    bgp_router_id_re: Regex,
    bgp_remote_as_re: Regex,
    bgp_update_source_re: Regex,
    junos_hostname_re: Regex,
    junos_address_re: Regex,
    generic_interface_re: Regex,
    generic_ip_re: Regex,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser {
    /// Create a new parser with all statement patterns compiled.
    pub fn new() -> Self {
        Self {
            hostname_re: Regex::new(r"^hostname\s+(\S+)").unwrap(),
            ip_dotted_re: Regex::new(
                r"^ip\s+address\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)",
            )
            .unwrap(),
            ip_cidr_re: Regex::new(r"^ip\s+address\s+(\d+\.\d+\.\d+\.\d+)/(\d+)").unwrap(),
            neighbor_re: Regex::new(r"^neighbor\s+(\S+)").unwrap(),
            bgp_router_id_re: Regex::new(r"^bgp\s+router-id\s+(\S+)").unwrap(),
            bgp_remote_as_re: Regex::new(r"^neighbor\s+(\S+)\s+remote-as\s+(\S+)").unwrap(),
            bgp_update_source_re: Regex::new(r"^neighbor\s+(\S+)\s+update-source\s+(\S+)")
                .unwrap(),
            junos_hostname_re: Regex::new(r"^set\s+system\s+host-name\s+(\S+)").unwrap(),
            junos_address_re: Regex::new(
                r"^set\s+interfaces\s+(\S+)\s+unit\s+\d+\s+family\s+inet\s+address\s+(\d+\.\d+\.\d+\.\d+)/(\d+)",
            )
            .unwrap(),
            generic_interface_re: Regex::new(r"(?i)(?:interface|port|eth)\s*[:=]?\s*(\S+)")
                .unwrap(),
            generic_ip_re: Regex::new(r"(\d+\.\d+\.\d+\.\d+)(?:/(\d+))?").unwrap(),
        }
    }

    /// Parse one raw configuration text into a [`Device`]. The device name is taken from the
    /// hostname statement, or from `name_hint` (usually the file stem) if there is none.
    pub fn parse(&self, name_hint: &str, content: &str) -> Device {
        let device_type = detect_device_type(content);
        match device_type {
            DeviceType::Cisco => self.parse_cisco(name_hint, content),
            DeviceType::Juniper => self.parse_junos(name_hint, content),
            DeviceType::Generic => self.parse_generic(name_hint, content),
        }
    }

    fn parse_cisco(&self, name_hint: &str, content: &str) -> Device {
        let mut name: Option<String> = None;
        let mut interfaces: Vec<Interface> = Vec::new();
        let mut bgp: Option<BgpConfig> = None;
        let mut section = Section::Global;

        for line in content.lines() {
            let line = line.trim();

            // a comment or bang line terminates the current section
            if line.starts_with('!') {
                section.finish(&mut interfaces, &mut bgp);
                section = Section::Global;
                continue;
            }

            section = match section {
                Section::Global => self.enter_section(line, &mut name),
                Section::Interface { mut intf, shutdown } => {
                    if line.starts_with("interface ") || line.starts_with("router bgp ") {
                        // a new section starts without an explicit terminator
                        Section::Interface { intf, shutdown }
                            .finish(&mut interfaces, &mut bgp);
                        self.enter_section(line, &mut name)
                    } else if let Some(cap) = self.ip_cidr_re.captures(line) {
                        match (cap[1].parse::<Ipv4Addr>(), cap[2].parse::<u32>()) {
                            (Ok(ip), Ok(prefix)) => {
                                if let Some(mask) = cidr_to_mask(prefix) {
                                    intf.ip_address = Some(ip);
                                    intf.subnet_mask = Some(mask);
                                } else {
                                    warn!("Ignoring invalid prefix length on {}: {}", intf.name, line);
                                }
                            }
                            _ => debug!("Ignoring unparsable address on {}: {}", intf.name, line),
                        }
                        Section::Interface { intf, shutdown }
                    } else if let Some(cap) = self.ip_dotted_re.captures(line) {
                        match (cap[1].parse::<Ipv4Addr>(), cap[2].parse::<Ipv4Addr>()) {
                            (Ok(ip), Ok(mask)) => {
                                intf.ip_address = Some(ip);
                                intf.subnet_mask = Some(mask);
                            }
                            _ => debug!("Ignoring unparsable address on {}: {}", intf.name, line),
                        }
                        Section::Interface { intf, shutdown }
                    } else if line == "shutdown" {
                        Section::Interface { intf, shutdown: true }
                    } else if let Some(cap) = self.neighbor_re.captures(line) {
                        intf.neighbor = Some(parse_neighbor_ref(&cap[1]));
                        Section::Interface { intf, shutdown }
                    } else {
                        Section::Interface { intf, shutdown }
                    }
                }
                Section::Bgp { mut config } => {
                    if line.starts_with("interface ") || line.starts_with("router bgp ") {
                        Section::Bgp { config }.finish(&mut interfaces, &mut bgp);
                        self.enter_section(line, &mut name)
                    } else if let Some(cap) = self.bgp_router_id_re.captures(line) {
                        config.router_id = Some(cap[1].to_string());
                        Section::Bgp { config }
                    } else if let Some(cap) = self.bgp_remote_as_re.captures(line) {
                        let remote_as = cap[2].to_string();
                        bgp_entry(&mut config.neighbors, &cap[1]).remote_as = remote_as;
                        Section::Bgp { config }
                    } else if let Some(cap) = self.bgp_update_source_re.captures(line) {
                        let source = cap[2].to_string();
                        bgp_entry(&mut config.neighbors, &cap[1]).local_interface = Some(source);
                        Section::Bgp { config }
                    } else {
                        Section::Bgp { config }
                    }
                }
            };
        }
        section.finish(&mut interfaces, &mut bgp);

        Device {
            name: resolve_name(name, name_hint),
            device_type: DeviceType::Cisco,
            interfaces,
            bgp,
        }
    }

    /// Dispatch a line in global context, opening an interface or BGP section if it starts one.
    fn enter_section(&self, line: &str, name: &mut Option<String>) -> Section {
        if let Some(cap) = self.hostname_re.captures(line) {
            if name.is_none() {
                *name = Some(cap[1].to_string());
            }
            Section::Global
        } else if let Some(rest) = line.strip_prefix("interface ") {
            Section::Interface { intf: Interface::new(rest.trim()), shutdown: false }
        } else if line.starts_with("router bgp ") {
            Section::Bgp { config: BgpConfig { router_id: None, neighbors: Vec::new() } }
        } else {
            Section::Global
        }
    }

    fn parse_junos(&self, name_hint: &str, content: &str) -> Device {
        let mut name: Option<String> = None;
        let mut interfaces: Vec<Interface> = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if let Some(cap) = self.junos_hostname_re.captures(line) {
                if name.is_none() {
                    name = Some(cap[1].to_string());
                }
            } else if let Some(cap) = self.junos_address_re.captures(line) {
                let mut intf = Interface::new(&cap[1]);
                match (cap[2].parse::<Ipv4Addr>(), cap[3].parse::<u32>()) {
                    (Ok(ip), Ok(prefix)) => {
                        if let Some(mask) = cidr_to_mask(prefix) {
                            intf.ip_address = Some(ip);
                            intf.subnet_mask = Some(mask);
                            intf.status = InterfaceStatus::Up;
                        }
                    }
                    _ => debug!("Ignoring unparsable junos address: {}", line),
                }
                interfaces.push(intf);
            }
        }

        Device {
            name: resolve_name(name, name_hint),
            device_type: DeviceType::Juniper,
            interfaces,
            bgp: None,
        }
    }

    fn parse_generic(&self, name_hint: &str, content: &str) -> Device {
        let mut interfaces: Vec<Interface> = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if let Some(cap) = self.generic_interface_re.captures(line) {
                let mut intf = Interface::new(&cap[1]);
                if let Some(ip_cap) = self.generic_ip_re.captures(line) {
                    if let Ok(ip) = ip_cap[1].parse::<Ipv4Addr>() {
                        intf.ip_address = Some(ip);
                        intf.status = InterfaceStatus::Up;
                        intf.subnet_mask = ip_cap
                            .get(2)
                            .and_then(|p| p.as_str().parse::<u32>().ok())
                            .and_then(cidr_to_mask);
                    }
                }
                interfaces.push(intf);
            }
        }

        Device {
            name: resolve_name(None, name_hint),
            device_type: DeviceType::Generic,
            interfaces,
            bgp: None,
        }
    }
}

enum Section {
    Global,
    Interface { intf: Interface, shutdown: bool },
    Bgp { config: BgpConfig },
}

impl Section {
    /// Close the current section, committing its accumulated data.
    fn finish(self, interfaces: &mut Vec<Interface>, bgp: &mut Option<BgpConfig>) {
        match self {
            Section::Global => {}
            Section::Interface { mut intf, shutdown } => {
                intf.status = if intf.ip_address.is_some() && !shutdown {
                    InterfaceStatus::Up
                } else {
                    InterfaceStatus::Down
                };
                interfaces.push(intf);
            }
            Section::Bgp { config } => {
                *bgp = Some(config);
            }
        }
    }
}

/// An explicit peer statement. A `:`-separated peer names the remote interface as well.
fn parse_neighbor_ref(peer: &str) -> NeighborRef {
    match peer.split_once(':') {
        Some((device, interface)) if !interface.is_empty() => NeighborRef {
            device: device.to_string(),
            interface: Some(interface.to_string()),
        },
        _ => NeighborRef { device: peer.to_string(), interface: None },
    }
}

/// Find or create the BGP record for a neighbor address.
fn bgp_entry<'a>(neighbors: &'a mut Vec<BgpNeighbor>, ip: &str) -> &'a mut BgpNeighbor {
    if let Some(pos) = neighbors.iter().position(|n| n.ip == ip) {
        &mut neighbors[pos]
    } else {
        neighbors.push(BgpNeighbor {
            ip: ip.to_string(),
            remote_as: "unknown".to_string(),
            local_interface: None,
        });
        neighbors.last_mut().unwrap()
    }
}

fn resolve_name(name: Option<String>, name_hint: &str) -> String {
    match name {
        Some(n) => n,
        None if !name_hint.is_empty() => name_hint.to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cidr_masks() {
        assert_eq!(cidr_to_mask(0), Some(Ipv4Addr::new(0, 0, 0, 0)));
        assert_eq!(cidr_to_mask(8), Some(Ipv4Addr::new(255, 0, 0, 0)));
        assert_eq!(cidr_to_mask(24), Some(Ipv4Addr::new(255, 255, 255, 0)));
        assert_eq!(cidr_to_mask(30), Some(Ipv4Addr::new(255, 255, 255, 252)));
        assert_eq!(cidr_to_mask(32), Some(Ipv4Addr::new(255, 255, 255, 255)));
        assert_eq!(cidr_to_mask(33), None);
    }

    #[test]
    fn hostname_or_file_stem() {
        let parser = ConfigParser::new();
        let device = parser.parse("r1", "hostname core-router\ninterface Gig0/0\n!\n");
        assert_eq!(device.name, "core-router");
        let device = parser.parse("r1", "interface Gig0/0\n!\n");
        assert_eq!(device.name, "r1");
    }

    #[test]
    fn interface_block() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "r1",
            "hostname r1\n\
             interface GigabitEthernet0/0\n\
             ip address 10.0.0.1 255.255.255.252\n\
             !\n\
             interface GigabitEthernet0/1\n\
             !\n",
        );
        assert_eq!(device.device_type, DeviceType::Cisco);
        assert_eq!(device.interfaces.len(), 2);
        let up = &device.interfaces[0];
        assert_eq!(up.name, "GigabitEthernet0/0");
        assert_eq!(up.ip_address, Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(up.subnet_mask, Some(Ipv4Addr::new(255, 255, 255, 252)));
        assert_eq!(up.status, InterfaceStatus::Up);
        let down = &device.interfaces[1];
        assert_eq!(down.ip_address, None);
        assert_eq!(down.status, InterfaceStatus::Down);
    }

    #[test]
    fn cidr_address() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "r1",
            "interface Gig0/0\nip address 192.168.1.1/24\n!\n",
        );
        assert_eq!(device.interfaces[0].ip_address, Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(device.interfaces[0].subnet_mask, Some(Ipv4Addr::new(255, 255, 255, 0)));
    }

    #[test]
    fn shutdown_forces_down() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "r1",
            "interface Gig0/0\nip address 10.0.0.1 255.255.255.0\nshutdown\n!\n",
        );
        assert_eq!(device.interfaces[0].status, InterfaceStatus::Down);
        // the address is still recorded
        assert!(device.interfaces[0].ip_address.is_some());
    }

    #[test]
    fn explicit_neighbor() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "r1",
            "interface Gig0/0\nneighbor r2:Gig0/3\n!\ninterface Gig0/1\nneighbor r3\n!\n",
        );
        let n0 = device.interfaces[0].neighbor.as_ref().unwrap();
        assert_eq!(n0.device, "r2");
        assert_eq!(n0.interface.as_deref(), Some("Gig0/3"));
        let n1 = device.interfaces[1].neighbor.as_ref().unwrap();
        assert_eq!(n1.device, "r3");
        assert_eq!(n1.interface, None);
    }

    #[test]
    fn missing_terminator_at_end_of_input() {
        let parser = ConfigParser::new();
        let device = parser.parse("r1", "interface Gig0/0\nip address 10.0.0.1/30");
        assert_eq!(device.interfaces.len(), 1);
        assert_eq!(device.interfaces[0].status, InterfaceStatus::Up);
    }

    #[test]
    fn bgp_section() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "r1",
            "hostname r1\n\
             router bgp 65001\n\
             bgp router-id 1.1.1.1\n\
             neighbor 10.0.0.2 remote-as 65002\n\
             neighbor 10.0.0.2 update-source Loopback0\n\
             neighbor 10.0.0.6 remote-as 65003\n\
             !\n",
        );
        let bgp = device.bgp.unwrap();
        assert_eq!(bgp.router_id.as_deref(), Some("1.1.1.1"));
        assert_eq!(bgp.neighbors.len(), 2);
        assert_eq!(bgp.neighbors[0].ip, "10.0.0.2");
        assert_eq!(bgp.neighbors[0].remote_as, "65002");
        assert_eq!(bgp.neighbors[0].local_interface.as_deref(), Some("Loopback0"));
        assert_eq!(bgp.neighbors[1].remote_as, "65003");
        assert_eq!(bgp.neighbors[1].local_interface, None);
    }

    #[test]
    fn malformed_lines_leave_fields_absent() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "r1",
            "interface Gig0/0\nip address 10.0.0.300 255.255.255.0\nip address garbage\n!\n",
        );
        assert_eq!(device.interfaces.len(), 1);
        assert_eq!(device.interfaces[0].ip_address, None);
        assert_eq!(device.interfaces[0].status, InterfaceStatus::Down);
    }

    #[test]
    fn junos_config() {
        let parser = ConfigParser::new();
        let device = parser.parse(
            "j1",
            "set system host-name edge1\n\
             set interfaces ge-0/0/0 unit 0 family inet address 10.0.0.1/30\n\
             set interfaces ge-0/0/1 unit 0 family inet address 192.168.0.1/24\n",
        );
        assert_eq!(device.device_type, DeviceType::Juniper);
        assert_eq!(device.name, "edge1");
        assert_eq!(device.interfaces.len(), 2);
        assert_eq!(device.interfaces[0].name, "ge-0/0/0");
        assert_eq!(
            device.interfaces[0].subnet_mask,
            Some(Ipv4Addr::new(255, 255, 255, 252))
        );
    }

    #[test]
    fn generic_config() {
        let parser = ConfigParser::new();
        let device = parser.parse("sw1", "port: p1 10.1.0.1/16\nsomething else\n");
        assert_eq!(device.device_type, DeviceType::Generic);
        assert_eq!(device.name, "sw1");
        assert_eq!(device.interfaces.len(), 1);
        assert_eq!(device.interfaces[0].ip_address, Some(Ipv4Addr::new(10, 1, 0, 1)));
        assert_eq!(device.interfaces[0].subnet_mask, Some(Ipv4Addr::new(255, 255, 0, 0)));
    }
}
