//! Invariant-check helpers shared by the topology test modules.

use crate::cartesian::CartesianTopology;
use crate::relative::RelativeLocation;
use halo_core::{Coordinate, GridDimensions, Rank};
use std::collections::HashSet;

/// Assert that `values()` yields every vector of the box exactly once.
pub fn assert_enumeration_complete(rel: &RelativeLocation) {
    let all: Vec<_> = rel.values().collect();
    assert_eq!(
        all.len(),
        rel.total_values(),
        "enumeration of {:?}..{:?} has the wrong length",
        rel.minima(),
        rel.maxima()
    );
    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(unique.len(), all.len(), "enumeration repeats a vector");
    for v in &all {
        for (i, &c) in v.iter().enumerate() {
            assert!(
                c >= rel.minimum(i) && c <= rel.maximum(i),
                "{v:?} escapes the box in dimension {i}"
            );
        }
    }
}

/// Assert that the cursor's index equals its enumeration position.
pub fn assert_index_tracks_enumeration(rel: &RelativeLocation) {
    let mut cursor = rel.clone();
    cursor.reset();
    let mut position = 0usize;
    loop {
        assert_eq!(
            cursor.index(),
            position,
            "index of {:?} is off its enumeration position",
            cursor.current()
        );
        if !cursor.increment() {
            break;
        }
        position += 1;
    }
}

/// Assert `coordinates(rank_of(c)) == c` for every rank.
pub fn assert_rank_roundtrip(topo: &CartesianTopology) {
    let zero = vec![0; topo.dimensions()];
    for r in 0..topo.size() {
        let coords = topo.coordinates(Rank(r)).expect("rank in range");
        assert_eq!(
            topo.rank_of(&coords, &zero),
            Some(Rank(r)),
            "rank {r} does not round-trip through {coords:?}"
        );
    }
}

/// Assert that the ranks' local boxes tile `global` exactly.
///
/// Checks that every rank's box stays inside the global box, that along
/// every mesh line adjacent boxes touch exactly, and that the extents
/// along each line sum to the global extent.
pub fn assert_partitions_tile<C: Coordinate>(topo: &CartesianTopology, global: &GridDimensions<C>) {
    let boxes: Vec<GridDimensions<C>> = (0..topo.size())
        .map(|r| topo.local_bounds(Rank(r), global).expect("valid rank"))
        .collect();
    for (r, b) in boxes.iter().enumerate() {
        for i in 0..topo.dimensions() {
            assert!(b.origin_at(i) >= global.origin_at(i), "rank {r} below origin");
            assert!(b.upper_at(i) <= global.upper_at(i), "rank {r} beyond upper");
        }
    }
    for r in 0..topo.size() {
        let coords = topo.coordinates(Rank(r)).expect("rank in range");
        for i in 0..topo.dimensions() {
            let mut step = vec![0; topo.dimensions()];
            step[i] = 1;
            if coords[i] + 1 < topo.procs_per_dim()[i] as i32 {
                let next = topo.rank_of(&coords, &step).expect("interior neighbor");
                assert_eq!(
                    boxes[r].upper_at(i),
                    boxes[next.0].origin_at(i),
                    "gap or overlap between ranks {r} and {next} in dimension {i}"
                );
            }
            if coords[i] == 0 {
                let mut sum = C::ZERO;
                let mut cur = coords.clone();
                for c in 0..topo.procs_per_dim()[i] as i32 {
                    cur[i] = c;
                    let zero = vec![0; topo.dimensions()];
                    let rr = topo.rank_of(&cur, &zero).expect("in mesh");
                    sum = sum + boxes[rr.0].extent_at(i);
                }
                assert!(
                    (sum.to_f64() - global.extent_at(i).to_f64()).abs() < 1e-9,
                    "extents along dimension {i} sum to {sum}, expected {}",
                    global.extent_at(i)
                );
            }
        }
    }
}
