//! `tiller` — consistent-hashing load balancer console.
//!
//! # Usage
//!
//! ```text
//! tiller console                         # interactive menu over a fresh pool
//! tiller console -c tiller.toml          # with a config file
//! tiller map -k user:42 10.0.0.1 10.0.0.2 10.0.0.3
//! tiller simulate -n 20 -k 100000        # distribution report
//! tiller simulate -n 20 -k 100000 -r 3   # plus a removal phase
//! ```

mod config;
mod console;
mod telemetry;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tiller_cluster::{LoadBalancer, ServerNode};
use tiller_hash::HashAlgorithm;
use tracing::info;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "tiller", version, about = "Consistent-hashing load balancer")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Digest algorithm (crc32, md5, sha256); overrides the config file.
    #[arg(short, long, global = true)]
    algorithm: Option<HashAlgorithm>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a load balancer interactively.
    Console,

    /// Map a single key against an ad-hoc set of nodes.
    Map {
        /// The key to look up.
        #[arg(short, long)]
        key: String,

        /// Node addresses forming the pool, in join order.
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Hash a keyspace against a synthetic pool and report the distribution.
    Simulate {
        /// Number of nodes in the pool.
        #[arg(short, long, default_value = "10")]
        nodes: usize,

        /// Number of keys to hash.
        #[arg(short, long, default_value = "100000")]
        keys: usize,

        /// Nodes to remove after the first pass, to measure remapping.
        #[arg(short, long, default_value = "0")]
        remove: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;
    telemetry::init(&config.log.level);

    // CLI args override config file values.
    let algorithm = cli.algorithm.unwrap_or(config.hash.algorithm);
    info!(%algorithm, "starting");

    match cli.command {
        Commands::Console => {
            let mut lb = LoadBalancer::with_algorithm(algorithm);
            console::run(&mut lb, config.console.random_addr_space)
        }
        Commands::Map { key, nodes } => map_key(algorithm, &key, &nodes),
        Commands::Simulate {
            nodes,
            keys,
            remove,
        } => simulate(algorithm, nodes, keys, remove),
    }
}

/// One-shot lookup: build a pool from the given addresses and map the key.
fn map_key(algorithm: HashAlgorithm, key: &str, addresses: &[String]) -> anyhow::Result<()> {
    let nodes = addresses
        .iter()
        .map(|a| a.parse::<ServerNode>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut lb = LoadBalancer::with_algorithm(algorithm);
    lb.add_nodes(&nodes)?;

    let node = lb.node_for(key)?;
    let bucket = lb.pool().bucket_of(&node).expect("node just resolved");
    println!("Key {key:?} maps to node {node} (bucket {bucket})");
    Ok(())
}

/// Distribution report over a synthetic pool, with an optional removal phase
/// measuring how many keys actually moved.
fn simulate(
    algorithm: HashAlgorithm,
    node_count: usize,
    key_count: usize,
    remove: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(node_count > 0, "need at least one node");
    anyhow::ensure!(node_count < 1 << 24, "node count exceeds the 10.0.0.0/8 space");
    anyhow::ensure!(remove < node_count, "cannot remove the whole pool");

    let nodes: Vec<ServerNode> = (0..node_count).map(sim_node).collect();
    let mut lb = LoadBalancer::with_algorithm(algorithm);
    lb.add_nodes(&nodes)?;

    let keys: Vec<String> = (0..key_count).map(|i| format!("key-{i}")).collect();
    let placements: Vec<ServerNode> = keys
        .iter()
        .map(|k| lb.node_for(k))
        .collect::<Result<_, _>>()?;

    let mut counts: HashMap<ServerNode, usize> = HashMap::new();
    for node in &placements {
        *counts.entry(*node).or_default() += 1;
    }

    let ideal = key_count as f64 / node_count as f64;
    println!("{key_count} keys over {node_count} nodes ({algorithm}), ideal {ideal:.0} keys/node:");

    let mut rows: Vec<_> = lb.nodes().collect();
    rows.sort_by_key(|&(_, bucket)| bucket);
    let mut worst = 0.0f64;
    for (node, bucket) in rows {
        let count = counts.get(&node).copied().unwrap_or(0);
        let deviation = (count as f64 - ideal) / ideal * 100.0;
        worst = worst.max(deviation.abs());
        println!("  bucket {bucket:<4} {:<15} {count:>8} keys  {deviation:>+6.2}%", node.to_string());
    }
    println!("worst deviation: {worst:.2}%");

    if remove > 0 {
        let departing = &nodes[..remove];
        lb.remove_nodes(departing)?;

        let mut moved = 0usize;
        for (key, old) in keys.iter().zip(&placements) {
            if lb.node_for(key)? != *old {
                moved += 1;
            }
        }

        let fraction = moved as f64 / key_count as f64;
        let ideal_fraction = remove as f64 / node_count as f64;
        println!(
            "removed {remove} nodes: {moved} keys moved ({:.2}%, ideal {:.2}%)",
            fraction * 100.0,
            ideal_fraction * 100.0,
        );
    }

    Ok(())
}

/// Deterministic simulation address: index `i` mapped into 10.0.0.0/8.
fn sim_node(i: usize) -> ServerNode {
    ServerNode::from_v4_bytes([10, (i >> 16) as u8, (i >> 8) as u8, i as u8])
}
