use atomkd::{KdTree, LinearScan, SpatialIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_points(count: usize, extent: f64, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            [
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
            ]
        })
        .collect()
}

#[test]
fn test_within_radius_matches_linear_scan() {
    let points = random_points(3000, 40.0, 1234);
    let tree = KdTree::build(&points).unwrap();
    let scan = LinearScan::new(&points);

    for q in random_points(100, 40.0, 4321) {
        for radius in [0.5, 2.0, 4.0, 10.0, 100.0] {
            assert_eq!(
                tree.within_radius(q, radius),
                scan.within_radius(q, radius),
                "radius {} at {:?}", radius, q
            );
        }
    }
}

#[test]
fn test_within_radius_excludes_self() {
    let points = random_points(500, 10.0, 2);
    let tree = KdTree::build(&points).unwrap();

    for (i, &p) in points.iter().enumerate().take(50) {
        let found = tree.within_radius(p, 3.0);
        assert!(found.iter().all(|n| n.index != i), "Point {} should not report itself", i);
        assert!(found.iter().all(|n| n.distance() <= 3.0 && n.distance_sq > 0.0));

        let inclusive = tree.within_radius_inclusive(p, 3.0);
        assert_eq!(inclusive.len(), found.len() + 1);
        assert_eq!(inclusive[0].index, i);
    }
}

#[test]
fn test_within_radius_boundary_is_inclusive() {
    let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]];
    let tree = KdTree::build(&points).unwrap();

    let found: Vec<usize> = tree.within_radius([0.0, 0.0, 0.0], 2.0).iter().map(|n| n.index).collect();
    assert_eq!(found, vec![1, 2]);
}

#[test]
fn test_within_radius_sorted_and_complete_for_large_radius() {
    let points = random_points(200, 5.0, 8);
    let tree = KdTree::build(&points).unwrap();

    let found = tree.within_radius([-100.0, -100.0, -100.0], 1e6);
    assert_eq!(found.len(), 200);
    for pair in found.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn test_within_radius_degenerate_radius() {
    let points = random_points(50, 5.0, 9);
    let tree = KdTree::build(&points).unwrap();
    let q = points[0];

    assert!(tree.within_radius(q, -1.0).is_empty());
    assert!(tree.within_radius(q, f64::NAN).is_empty());
    assert!(tree.within_radius(q, 0.0).is_empty());
    assert_eq!(tree.within_radius_inclusive(q, 0.0).len(), 1);
}

#[test]
fn test_within_radius_far_away_query() {
    let points = random_points(100, 1.0, 10);
    let tree = KdTree::build(&points).unwrap();
    assert!(tree.within_radius([50.0, 50.0, 50.0], 5.0).is_empty());
}
