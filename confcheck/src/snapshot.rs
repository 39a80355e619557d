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

//! # Snapshot
//!
//! A snapshot is the persisted form of one configuration batch: the parse results keyed by
//! device name, together with the source file list and a caller-supplied timestamp. Reading and
//! writing snapshots is the only file I/O in this library; everything downstream of a loaded
//! snapshot is a pure computation. Verifying against a snapshot is safe for concurrent readers
//! as long as nobody rewrites the file underneath them; the engine itself never mutates it.

use crate::error::Error;
use crate::netmodel::{Device, DuplicatePolicy, NetworkModel};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A persisted configuration batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Caller-supplied creation timestamp
    pub timestamp: String,
    /// The configuration files this snapshot was parsed from
    pub files: Vec<PathBuf>,
    /// Parse results, keyed by device name
    pub configs: BTreeMap<String, Device>,
}

impl Snapshot {
    /// Capture the current batch into a snapshot.
    pub fn capture(
        timestamp: impl Into<String>,
        files: Vec<PathBuf>,
        model: &NetworkModel,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            files,
            configs: model.devices().map(|d| (d.name.clone(), d.clone())).collect(),
        }
    }

    /// Rebuild the batch from this snapshot. The stored devices already carry their inferred
    /// neighbors, but inference is re-run to fill any gap; it never alters existing
    /// assignments.
    pub fn to_model(&self) -> NetworkModel {
        let mut model = NetworkModel::new();
        for device in self.configs.values() {
            // names are unique map keys already, the policy can never trigger
            if let Err(e) = model.add_device(device.clone(), DuplicatePolicy::Overwrite) {
                warn!("Skipping stored device: {}", e);
            }
        }
        model.infer_adjacency();
        model
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Stored snapshot with {} devices at {:?}", self.configs.len(), path);
        Ok(())
    }

    /// Read a snapshot back from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let snapshot: Snapshot = serde_json::from_str(&fs::read_to_string(path.as_ref())?)?;
        info!(
            "Loaded snapshot from {:?} with {} devices",
            path.as_ref(),
            snapshot.configs.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ConfigParser;

    #[test]
    fn round_trip() {
        let parser = ConfigParser::new();
        let mut model = NetworkModel::new();
        model
            .add_device(
                parser.parse("R1", "interface Gig0/0\nip address 10.0.0.1/30\n!\n"),
                DuplicatePolicy::Overwrite,
            )
            .unwrap();
        model
            .add_device(
                parser.parse("R2", "interface Gig0/0\nip address 10.0.0.2/30\n!\n"),
                DuplicatePolicy::Overwrite,
            )
            .unwrap();
        model.infer_adjacency();

        let snapshot = Snapshot::capture("20210401_000000", vec!["r1.cfg".into()], &model);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, restored);
        assert_eq!(restored.to_model(), model);
    }
}
