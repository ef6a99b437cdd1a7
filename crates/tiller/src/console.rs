//! Interactive console for driving a load balancer by hand.
//!
//! A line-oriented menu over stdin, mirroring what an operator would do to a
//! real pool: grow it with random nodes, add or drop a specific address, and
//! probe which node a key lands on. Invalid input reprompts; EOF quits.

use std::io::{self, BufRead, Write};

use rand::Rng;
use tiller_cluster::{LoadBalancer, ServerNode};

const MENU: &str = "\
1. Add nodes
2. Add node
3. Delete node
4. Map key
5. Show nodes
6. Show buckets
7. Exit";

/// Run the menu loop until the operator exits or stdin closes.
pub fn run(lb: &mut LoadBalancer, random_addr_space: u32) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("{MENU}");
        let Some(op) = prompt(&mut lines, "Operation: ")? else {
            break;
        };

        match op.as_str() {
            "1" => {
                let Some(text) = prompt(&mut lines, "Enter number of nodes to add: ")? else {
                    break;
                };
                match text.parse::<usize>() {
                    Ok(count) => add_random_nodes(lb, count, random_addr_space),
                    Err(_) => println!("Invalid number of nodes: {text:?}"),
                }
            }
            "2" => {
                let Some(text) = prompt(&mut lines, "Enter address of node to add: ")? else {
                    break;
                };
                add_node(lb, &text);
            }
            "3" => {
                let Some(text) = prompt(&mut lines, "Enter address of node to delete: ")? else {
                    break;
                };
                del_node(lb, &text);
            }
            "4" => {
                let Some(key) = prompt(&mut lines, "Enter key to map: ")? else {
                    break;
                };
                match lb.node_for(&key) {
                    Ok(node) => println!("Key {key:?} maps to node {node}"),
                    Err(e) => println!("Error mapping key: {e}"),
                }
            }
            "5" => {
                println!("Nodes in the cluster:");
                let mut nodes: Vec<_> = lb.nodes().collect();
                nodes.sort_by_key(|&(_, bucket)| bucket);
                for (node, bucket) in nodes {
                    println!("Node: {:<15} Bucket: {bucket}", node.to_string());
                }
            }
            "6" => {
                println!("Buckets in the cluster ({}):", lb.ring());
                let mut buckets: Vec<_> = lb.buckets().collect();
                buckets.sort();
                for (bucket, node) in buckets {
                    println!("Bucket: {bucket:<4} Node: {node}");
                }
            }
            "7" => break,
            other => println!("Invalid operation: {other:?}"),
        }

        if prompt(&mut lines, "Hit [Enter] to continue.")?.is_none() {
            break;
        }
    }

    Ok(())
}

/// Print a prompt and read one trimmed line. `None` means stdin closed.
fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    text: &str,
) -> anyhow::Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

/// Add `count` nodes with random IPv4 addresses drawn from `[1, space)`.
fn add_random_nodes(lb: &mut LoadBalancer, count: usize, space: u32) {
    let mut rng = rand::rng();
    let mut batch = Vec::with_capacity(count);

    for _ in 0..count {
        let addr: u32 = rng.random_range(1..space.max(2));
        let node = ServerNode::from_v4_bytes(addr.to_be_bytes());
        if lb.pool().bucket_of(&node).is_some() || batch.contains(&node) {
            // Collision in a small address space; the slot is simply lost.
            continue;
        }
        println!("Adding node with address: {node}");
        batch.push(node);
    }

    if batch.is_empty() {
        println!("No nodes to add");
        return;
    }
    if let Err(e) = lb.add_nodes(&batch) {
        println!("Error adding nodes: {e}");
    } else {
        println!("Added {} nodes ({} total)", batch.len(), lb.node_count());
    }
}

fn add_node(lb: &mut LoadBalancer, address: &str) {
    let node: ServerNode = match address.parse() {
        Ok(node) => node,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    if lb.pool().bucket_of(&node).is_some() {
        println!("Node already present");
        return;
    }

    println!("Adding node with address: {node}");
    if let Err(e) = lb.add_nodes(&[node]) {
        println!("Error adding node: {e}");
    }
}

fn del_node(lb: &mut LoadBalancer, address: &str) {
    let node: ServerNode = match address.parse() {
        Ok(node) => node,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    if lb.pool().bucket_of(&node).is_none() {
        println!("Node not found");
        return;
    }

    println!("Deleting node with address: {node}");
    if let Err(e) = lb.remove_nodes(&[node]) {
        println!("Error deleting node: {e}");
    }
}
