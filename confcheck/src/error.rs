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

//! Module containing all error types

use thiserror::Error;

/// Main error type
///
/// Domain non-results (an unreachable pair, an absent loop, fewer disjoint paths than requested)
/// are not errors. They are encoded in the result structures of the [`verifier`](crate::verifier)
/// module. This type covers faults only: a batch that cannot be assembled, a topology that
/// references unknown nodes, or a snapshot that cannot be read or written.
#[derive(Debug, Error)]
pub enum Error {
    /// Error raised while assembling the network model
    #[error("Model Error: {0}")]
    ModelError(#[from] ModelError),
    /// The topology graph is internally inconsistent
    #[error("Inconsistent topology: {0}")]
    InconsistentTopology(String),
    /// IO error while reading or writing a snapshot
    #[error("Snapshot IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// Serialization error while reading or writing a snapshot
    #[error("Snapshot JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors raised while assembling a [`NetworkModel`](crate::netmodel::NetworkModel)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A device with the same name was already loaded in this batch, and the chosen
    /// [`DuplicatePolicy`](crate::netmodel::DuplicatePolicy) rejects duplicates.
    #[error("Device {0} was already loaded in this batch!")]
    DuplicateDevice(String),
    /// The device carries no name
    #[error("Device name must not be empty!")]
    EmptyDeviceName,
}
