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

use confcheck::config::ConfigParser;
use confcheck::netmodel::{DuplicatePolicy, NetworkModel};
use confcheck::snapshot::Snapshot;
use confcheck::topology::TopologyGraph;
use confcheck::verifier::{
    check_isolation, check_reachability, detect_loops, find_all_paths, find_disjoint_paths,
    DisjointMode, LoopScope, PathStrategy,
};

use clap::{Args, Parser, Subcommand};
use log::*;
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[clap(
    name = "confcheck",
    version,
    about = "Parse router and switch configurations and verify connectivity properties"
)]
struct CommandLineArguments {
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Build the topology and print it as visualization JSON
    Topology {
        #[clap(flatten)]
        input: InputArgs,
    },
    /// Check whether the target device is reachable from the source device
    Reachability {
        #[clap(flatten)]
        input: InputArgs,
        /// Source device name
        source: String,
        /// Target device name
        target: String,
    },
    /// Check whether two devices are isolated from each other
    Isolation {
        #[clap(flatten)]
        input: InputArgs,
        /// Source device name
        source: String,
        /// Target device name
        target: String,
    },
    /// Enumerate all simple paths between two devices and select the best one
    Paths {
        #[clap(flatten)]
        input: InputArgs,
        /// Source device name
        source: String,
        /// Target device name
        target: String,
        /// Best-path strategy: shortest, core_preferred, border_preferred or redundant
        #[clap(long, default_value = "shortest")]
        strategy: String,
    },
    /// Extract mutually disjoint paths between two devices (best-effort greedy)
    Disjoint {
        #[clap(flatten)]
        input: InputArgs,
        /// Source device name
        source: String,
        /// Target device name
        target: String,
        /// Disjointness criterion: node or edge
        #[clap(long, default_value = "node")]
        mode: String,
        /// Number of disjoint paths to extract
        #[clap(long, default_value = "2")]
        max_paths: usize,
    },
    /// Detect forwarding loops
    Loops {
        #[clap(flatten)]
        input: InputArgs,
        /// Search only from this device instead of from every device
        #[clap(long)]
        node: Option<String>,
    },
    /// Parse configuration files and store the batch as a snapshot
    Snapshot {
        /// Configuration files to parse
        #[clap(short = 'f', long = "file")]
        files: Vec<PathBuf>,
        /// Reject duplicate device names instead of keeping the later file
        #[clap(long)]
        reject_duplicates: bool,
        /// Where to write the snapshot
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Configuration files to parse
    #[clap(short = 'f', long = "file")]
    files: Vec<PathBuf>,
    /// Load a previously stored snapshot instead of raw configuration files
    #[clap(long, conflicts_with = "files")]
    snapshot: Option<PathBuf>,
    /// Reject duplicate device names instead of keeping the later file
    #[clap(long)]
    reject_duplicates: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    match args.cmd {
        MainCommand::Topology { input } => {
            let topo = build_topology(&input)?;
            print_result(&topo.view())
        }
        MainCommand::Reachability { input, source, target } => {
            let topo = build_topology(&input)?;
            print_result(&check_reachability(&topo, &source, &target)?)
        }
        MainCommand::Isolation { input, source, target } => {
            let topo = build_topology(&input)?;
            print_result(&check_isolation(&topo, &source, &target)?)
        }
        MainCommand::Paths { input, source, target, strategy } => {
            let topo = build_topology(&input)?;
            let strategy = PathStrategy::from_name(&strategy);
            print_result(&find_all_paths(&topo, &source, &target, strategy)?)
        }
        MainCommand::Disjoint { input, source, target, mode, max_paths } => {
            let topo = build_topology(&input)?;
            let mode = DisjointMode::from_name(&mode);
            print_result(&find_disjoint_paths(&topo, &source, &target, mode, max_paths)?)
        }
        MainCommand::Loops { input, node } => {
            let topo = build_topology(&input)?;
            let scope = match node {
                Some(name) => LoopScope::Node(name),
                None => LoopScope::Global,
            };
            print_result(&detect_loops(&topo, scope)?)
        }
        MainCommand::Snapshot { files, reject_duplicates, output } => {
            let model = parse_files(&files, reject_duplicates)?;
            let timestamp =
                SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs().to_string();
            let snapshot = Snapshot::capture(timestamp, files, &model);
            snapshot.store(&output)?;
            info!("Snapshot written to {:?}", output);
            Ok(())
        }
    }
}

/// Load the batch from the chosen input and build the topology graph.
fn build_topology(input: &InputArgs) -> Result<TopologyGraph, Box<dyn Error>> {
    let model = if let Some(path) = &input.snapshot {
        Snapshot::load(path)?.to_model()
    } else {
        parse_files(&input.files, input.reject_duplicates)?
    };
    Ok(TopologyGraph::build(&model))
}

/// Parse all configuration files into one batch and run adjacency inference over it.
fn parse_files(
    files: &[PathBuf],
    reject_duplicates: bool,
) -> Result<NetworkModel, Box<dyn Error>> {
    let policy = if reject_duplicates {
        DuplicatePolicy::Reject
    } else {
        DuplicatePolicy::Overwrite
    };
    let parser = ConfigParser::new();
    let mut model = NetworkModel::new();
    for file in files {
        let content = fs::read_to_string(file)?;
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown");
        model.add_device(parser.parse(stem, &content), policy)?;
        info!("Loaded configuration from {:?}", file);
    }
    model.infer_adjacency();
    info!("Batch contains {} devices", model.num_devices());
    Ok(model)
}

fn print_result<T: Serialize>(result: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
