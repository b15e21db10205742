use atomkd::{KdTree, LinearScan, Position, SpatialIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_points(count: usize, extent: f64, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            [
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            ]
        })
        .collect()
}

#[test]
fn test_nearest_three_points() {
    let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [5.0, 5.0, 5.0]];
    let tree = KdTree::build(&points).expect("Should build a tree");

    let hit = tree.nearest([0.9, 0.0, 0.0]).expect("Should find a point");
    assert_eq!(hit.index, 1);
    assert!((hit.distance_sq - 0.01).abs() < 1e-12, "Expected 0.01, got {}", hit.distance_sq);
    assert!((hit.distance() - 0.1).abs() < 1e-12);
}

#[test]
fn test_nearest_matches_linear_scan() {
    let points = random_points(2000, 50.0, 7);
    let tree = KdTree::build(&points).unwrap();
    let scan = LinearScan::new(&points);

    for (i, q) in random_points(500, 60.0, 8).into_iter().enumerate() {
        let a = tree.nearest(q).unwrap();
        let b = scan.nearest(q).unwrap();
        // Indices may differ only on a tie, so compare distances.
        assert_eq!(
            a.distance_sq, b.distance_sq,
            "Query {} ({:?}): tree found {:?}, scan found {:?}", i, q, a, b
        );
    }
}

#[test]
fn test_nearest_of_indexed_point_is_itself() {
    let points = random_points(300, 10.0, 21);
    let tree = KdTree::build(&points).unwrap();

    for (i, &p) in points.iter().enumerate() {
        let hit = tree.nearest(p).unwrap();
        assert_eq!(hit.index, i);
        assert_eq!(hit.distance_sq, 0.0);
    }
}

#[test]
fn test_nearest_on_integer_lattice() {
    // Lots of equal coordinates on every axis.
    let mut points = Vec::new();
    for x in 0..6 {
        for y in 0..6 {
            for z in 0..6 {
                points.push([x as f64, y as f64, z as f64]);
            }
        }
    }
    let tree = KdTree::build(&points).unwrap();
    let scan = LinearScan::new(&points);

    for q in random_points(300, 7.0, 3) {
        assert_eq!(tree.nearest(q).unwrap().distance_sq, scan.nearest(q).unwrap().distance_sq);
    }
}

#[test]
fn test_empty_input_has_no_tree() {
    let points: Vec<[f64; 3]> = Vec::new();
    let tree = KdTree::build(&points);
    assert!(tree.is_none());

    // A missing tree is still an index, one that finds nothing.
    assert_eq!(tree.len(), 0);
    assert!(tree.nearest([0.0, 0.0, 0.0]).is_none());
    assert!(tree.k_nearest([0.0, 0.0, 0.0], 4).is_empty());
    assert!(tree.within_radius([0.0, 0.0, 0.0], 10.0).is_empty());
}

#[test]
fn test_single_point() {
    let tree = KdTree::build(&[[3.0, -1.0, 2.0]]).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.depth(), 1);

    let hit = tree.nearest([0.0, 0.0, 0.0]).unwrap();
    assert_eq!(hit.index, 0);
    assert!((hit.distance_sq - 14.0).abs() < 1e-12);
}

#[test]
fn test_non_finite_query_finds_nothing() {
    let tree = KdTree::build(&random_points(10, 1.0, 1)).unwrap();
    assert!(tree.nearest([f64::NAN, 0.0, 0.0]).is_none());
    assert!(tree.nearest([0.0, f64::INFINITY, 0.0]).is_none());
}

#[test]
fn test_nearest_when_squared_distances_overflow() {
    // Squared distances of 1e400 overflow to infinity, yet a closest point still exists.
    let points = [[1e200, 0.0, 0.0], [-1e200, 0.0, 0.0]];
    let tree = KdTree::build(&points).unwrap();
    let scan = LinearScan::new(&points);
    let origin = [0.0, 0.0, 0.0];

    let hit = tree.nearest(origin).expect("A finite query over a non-empty tree finds a point");
    assert_eq!(hit.distance_sq, f64::INFINITY);
    assert_eq!(hit.distance_sq, scan.nearest(origin).unwrap().distance_sq);
    assert_eq!(tree.k_nearest(origin, 1), scan.k_nearest(origin, 1));
    assert_eq!(tree.k_nearest_iterated(origin, 1).len(), 1);
    assert!(tree.nearest_other(origin, 1.0).is_some());
}

#[test]
fn test_nearest_other_skips_the_query_atom() {
    let points = random_points(400, 10.0, 77);
    let tree = KdTree::build(&points).unwrap();
    let scan = LinearScan::new(&points);

    for (i, &p) in points.iter().enumerate() {
        let hit = tree.nearest_other(p, 0.001).expect("Every atom has another atom");
        assert_ne!(hit.index, i);
        assert!(hit.distance() > 0.001);
        assert_eq!(hit.distance_sq, scan.nearest_other(p, 0.001).unwrap().distance_sq);

        // Nothing other than the atom itself is closer.
        let second = tree.k_nearest(p, 2)[1];
        assert_eq!(hit.distance_sq, second.distance_sq);
    }
}

#[test]
fn test_nearest_other_epsilon() {
    let points = [[0.0, 0.0, 0.0], [0.0005, 0.0, 0.0], [1.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
    let tree = KdTree::build(&points).unwrap();
    let origin = [0.0, 0.0, 0.0];

    // Point 1 sits within epsilon of the query, so it counts as the same atom.
    assert_eq!(tree.nearest_other(origin, 0.001).unwrap().index, 2);
    assert_eq!(tree.nearest_other(origin, 0.0).unwrap().index, 1);
    assert_eq!(tree.nearest_other(origin, 1.5).unwrap().index, 3);
    assert!(tree.nearest_other(origin, 10.0).is_none());

    // A negative or NaN epsilon skips nothing.
    assert_eq!(tree.nearest_other(origin, -1.0), tree.nearest(origin));
    assert_eq!(tree.nearest_other(origin, f64::NAN), tree.nearest(origin));
    assert!(tree.nearest_other([f64::NAN, 0.0, 0.0], 0.001).is_none());

    let none: Option<KdTree> = KdTree::build::<[f64; 3]>(&[]);
    assert!(none.nearest_other(origin, 0.001).is_none());
}

struct Atom {
    name: &'static str,
    position: [f32; 3],
}

impl Position for Atom {
    fn position(&self) -> [f64; 3] {
        self.position.position()
    }
}

#[test]
fn test_build_from_atoms() {
    let atoms = vec![
        Atom { name: "N", position: [0.0, 0.0, 0.0] },
        Atom { name: "CA", position: [1.46, 0.0, 0.0] },
        Atom { name: "C", position: [2.0, 1.4, 0.0] },
        Atom { name: "O", position: [1.3, 2.4, 0.0] },
    ];

    let tree = KdTree::build(&atoms).unwrap();
    let hit = tree.nearest([1.4, 2.2, 0.1]).unwrap();
    assert_eq!(atoms[hit.index].name, "O");

    let by = KdTree::build_by(&atoms, |a| [a.position[0] as f64, a.position[1] as f64, a.position[2] as f64]).unwrap();
    assert_eq!(by, tree, "Both entry points should build the same tree");
}

#[test]
fn test_flat_and_tuple_inputs_agree() {
    let points = random_points(100, 5.0, 99);
    let flat: Vec<f64> = points.iter().flatten().copied().collect();
    let tuples: Vec<(f64, f64, f64)> = points.iter().map(|p| (p[0], p[1], p[2])).collect();

    let a = KdTree::build(&points).unwrap();
    let b = KdTree::from_flat(&flat).unwrap();
    let c = KdTree::build(&tuples).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);

    // A trailing partial triple is ignored.
    let mut ragged = flat.clone();
    ragged.push(1.0);
    assert_eq!(KdTree::from_flat(&ragged).unwrap().len(), 100);
}
