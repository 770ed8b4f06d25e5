//! A decomposed diffusion must agree with the same diffusion on one rank.

use halo_core::{CommError, Offset};
use halo_layer::{DiffusionLayer, LayerError, MeanDiffusor, WeightedDiffusor};
use halo_test_utils::fixtures::grid_config;
use halo_test_utils::run_ranks;
use halo_topology::{LocalCluster, LocalClusterConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn seed(c: &[i32]) -> f64 {
    f64::from((c[0] * 7 + c[1] * 3) % 5)
}

fn run(procs: &[usize], periodic: bool, steps: usize) -> BTreeMap<Offset, f64> {
    let world: usize = procs.iter().product();
    let diffusor = WeightedDiffusor::builder()
        .coefficient(0.4)
        .decay(0.01)
        .build()
        .unwrap();
    let parts = run_ranks(world, |comm| {
        let mut layer =
            DiffusionLayer::from_config(comm, &grid_config(procs, 12, 2, periodic), 0.0).unwrap();
        for (c, _) in layer.local_values().unwrap() {
            layer.set_value_at(&c, seed(&c)).unwrap();
        }
        layer.synchronize().unwrap();
        for step in 0..steps {
            if step % 2 == 0 {
                layer.diffuse(&diffusor).unwrap();
            } else {
                layer.diffuse(&MeanDiffusor::new(2)).unwrap();
            }
        }
        layer.local_values().unwrap()
    });
    parts.into_iter().flatten().collect()
}

fn assert_close(a: &BTreeMap<Offset, f64>, b: &BTreeMap<Offset, f64>) {
    assert_eq!(a.len(), b.len());
    for (c, v) in a {
        let w = b[c];
        assert!((v - w).abs() < 1e-9, "cell {:?}: {v} vs {w}", c.as_slice());
    }
}

#[test]
fn periodic_decomposition_matches_single_rank() {
    let reference = run(&[1, 1], true, 4);
    assert_eq!(reference.len(), 144);
    assert_close(&run(&[2, 2], true, 4), &reference);
    assert_close(&run(&[3, 2], true, 4), &reference);
    assert_close(&run(&[1, 4], true, 4), &reference);
}

#[test]
fn bounded_decomposition_matches_single_rank() {
    let reference = run(&[1, 1], false, 3);
    assert_close(&run(&[2, 3], false, 3), &reference);
    assert_close(&run(&[3, 3], false, 3), &reference);
}

#[test]
fn exchange_failure_names_rank_and_operation() {
    let cluster = LocalCluster::with_config(&LocalClusterConfig {
        size: 2,
        recv_timeout: Some(Duration::from_millis(50)),
    })
    .unwrap();
    let mut ends = cluster.into_endpoints();
    let _silent = ends.pop().unwrap();
    let comm = Arc::new(ends.pop().unwrap());
    let mut layer =
        DiffusionLayer::from_config(comm, &grid_config(&[2], 8, 1, true), 0.0).unwrap();
    match layer.diffuse(&MeanDiffusor::default()) {
        Err(LayerError::Exchange { rank, op, source }) => {
            assert_eq!(rank.0, 0);
            assert_eq!(op, "diffuse");
            assert!(matches!(source, CommError::Timeout { .. }));
        }
        other => panic!("expected exchange error, got {other:?}"),
    }
}
