//! Integration test: membership churn through the balancer.
//!
//! The pool and the ring must stay in lock-step across joins, departures and
//! re-joins, and bucket ids must be reused exactly the way the removal stack
//! promises.

use tiller_hash::HashAlgorithm;
use tiller_integration_tests::{balancer_with, keys, node_seq};

/// Departing nodes free their buckets; newcomers take them back in reverse
/// departure order.
#[test]
fn test_buckets_recycle_in_reverse_departure_order() {
    let (mut lb, nodes) = balancer_with(5, HashAlgorithm::Crc32);

    // nodes[1] owned bucket 1, nodes[3] owned bucket 3.
    lb.remove_nodes(&[nodes[1], nodes[3]]).unwrap();
    assert_eq!(lb.node_count(), 3);

    let replacements = node_seq(7);
    assert_eq!(lb.add_nodes(&[replacements[5]]).unwrap(), vec![3]);
    assert_eq!(lb.add_nodes(&[replacements[6]]).unwrap(), vec![1]);
    assert_eq!(lb.node_count(), 5);

    // The ring is clean again: the next id is fresh.
    let extra = node_seq(8)[7];
    assert_eq!(lb.add_nodes(&[extra]).unwrap(), vec![5]);
}

/// Pool size, ring size and iterator counts agree after every operation.
#[test]
fn test_pool_and_ring_stay_in_lock_step() {
    let (mut lb, nodes) = balancer_with(6, HashAlgorithm::Crc32);

    let check = |lb: &tiller_cluster::LoadBalancer, expected: usize| {
        assert_eq!(lb.node_count(), expected);
        assert_eq!(lb.pool().len(), expected);
        assert_eq!(lb.ring().len(), expected);
        assert_eq!(lb.nodes().count(), expected);
        assert_eq!(lb.buckets().count(), expected);
    };

    check(&lb, 6);
    lb.remove_nodes(&[nodes[0], nodes[5]]).unwrap();
    check(&lb, 4);
    lb.add_nodes(&node_seq(8)[6..8]).unwrap();
    check(&lb, 6);
    lb.remove_nodes(&nodes[1..3]).unwrap();
    check(&lb, 4);
}

/// Every key resolves to a currently-registered node at every churn step.
#[test]
fn test_lookups_always_hit_registered_nodes() {
    for algorithm in tiller_integration_tests::ALGORITHMS {
        let (mut lb, nodes) = balancer_with(7, algorithm);

        let probe = |lb: &tiller_cluster::LoadBalancer| {
            for key in keys(500) {
                let node = lb.node_for(&key).unwrap();
                assert!(
                    lb.pool().bucket_of(&node).is_some(),
                    "{algorithm}: {key} -> unregistered {node}"
                );
            }
        };

        probe(&lb);
        lb.remove_nodes(&[nodes[2]]).unwrap();
        probe(&lb);
        lb.remove_nodes(&[nodes[6]]).unwrap();
        probe(&lb);
        lb.add_nodes(&node_seq(8)[7..8]).unwrap();
        probe(&lb);
    }
}

/// Work objects ride their bucket: a departing node strands them, and
/// re-placing routes them to a live node.
#[test]
fn test_objects_follow_membership() {
    let (mut lb, _) = balancer_with(4, HashAlgorithm::Crc32);

    let mut homes = Vec::new();
    for id in 0..64u64 {
        let key = format!("object-{id}");
        homes.push(lb.place_object(id, &key).unwrap());
    }
    assert_eq!(lb.pool().object_count(), 64);

    // Kick the node hosting object 0.
    let victim = homes[0];
    let victim_bucket = lb.pool().bucket_of(&victim).unwrap();
    let stranded: Vec<u64> = lb.pool().objects_on(victim_bucket).collect();
    lb.remove_nodes(&[victim]).unwrap();

    for id in &stranded {
        assert_eq!(lb.pool().object(*id).unwrap().bucket(), None);
    }

    // Re-placing lands every stranded object on a surviving node.
    for id in stranded {
        let key = format!("object-{id}");
        let node = lb.place_object(id, &key).unwrap();
        assert_ne!(node, victim);
        assert_eq!(
            lb.pool().object(id).unwrap().bucket(),
            lb.pool().bucket_of(&node)
        );
    }
}

/// The two iterator views expose the same pairing.
#[test]
fn test_iterator_views_agree() {
    let (lb, _) = balancer_with(9, HashAlgorithm::Crc32);

    let mut from_nodes: Vec<(i32, _)> = lb.nodes().map(|(n, b)| (b, n)).collect();
    let mut from_buckets: Vec<(i32, _)> = lb.buckets().collect();
    from_nodes.sort();
    from_buckets.sort();
    assert_eq!(from_nodes, from_buckets);

    // Buckets are dense on a never-shrunk pool.
    let issued: Vec<i32> = from_buckets.iter().map(|&(b, _)| b).collect();
    assert_eq!(issued, (0..9).collect::<Vec<_>>());
}
